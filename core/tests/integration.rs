//! Full policy lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every facade
//! operation over real HTTP through `AirlockClient`, so request building,
//! transport and response parsing are checked end-to-end.

use std::net::SocketAddr;

use airlock_core::{AirlockClient, ClientConfig, ClientError, FilterRequest};

const DEFAULT_POLICY: &str = r#"{"name":"default","identifiers":{"ssn":{}}}"#;
const STRICT_POLICY: &str = r#"{"name":"strict","identifiers":{}}"#;

/// Start the mock server on its own thread and return its address.
fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> AirlockClient {
    AirlockClient::new(ClientConfig::new(format!("http://{addr}")).with_timeout_secs(5)).unwrap()
}

#[test]
fn policy_lifecycle() {
    let client = client(start_mock_server());

    // Step 1: status.
    let status = client.status().unwrap();
    assert_eq!(status.status, "Healthy");
    assert!(status.is_healthy());

    // Step 2: list — should be empty.
    assert!(client.list_policies().unwrap().is_empty());

    // Step 3: save two policies.
    client.save_policy(STRICT_POLICY).unwrap();
    client.save_policy(DEFAULT_POLICY).unwrap();

    // Step 4: list — service order is preserved.
    assert_eq!(client.list_policies().unwrap(), vec!["default", "strict"]);

    // Step 5: read-your-writes.
    assert_eq!(client.get_policy("default").unwrap(), DEFAULT_POLICY);

    // Step 6: overwrite and read again.
    let updated = r#"{"name":"default","identifiers":{"ssn":{},"phone":{}}}"#;
    client.save_policy(updated).unwrap();
    assert_eq!(client.get_policy("default").unwrap(), updated);

    // Step 7: apply without a document id — the service assigns one.
    let result = client
        .apply(&FilterRequest::new("default", "SSN 123-45-6789").with_context("claims"))
        .unwrap();
    assert_eq!(result.get_str("filteredText"), Some("SSN ***-**-****"));
    assert_eq!(result.get_str("context"), Some("claims"));
    assert!(result.get_str("documentId").is_some_and(|id| !id.is_empty()));

    // Step 8: apply with a document id — echoed back.
    let result = client
        .apply(&FilterRequest::new("default", "plain").with_document_id("doc 42"))
        .unwrap();
    assert_eq!(result.get_str("documentId"), Some("doc 42"));

    // Step 9: delete, then the policy is gone.
    client.delete_policy("default").unwrap();
    let err = client.get_policy("default").unwrap_err();
    assert!(matches!(err, ClientError::UnknownResponse { status: 404 }));

    // Step 10: delete again — 404.
    let err = client.delete_policy("default").unwrap_err();
    assert!(matches!(err, ClientError::UnknownResponse { status: 404 }));

    // Step 11: apply with the deleted policy — 404.
    let err = client
        .apply(&FilterRequest::new("default", "123"))
        .unwrap_err();
    assert_eq!(err.status(), Some(404));

    // Step 12: list — only the remaining policy.
    assert_eq!(client.list_policies().unwrap(), vec!["strict"]);
}

#[test]
fn malformed_policy_is_rejected_by_the_service() {
    let client = client(start_mock_server());
    let err = client.save_policy("{not json").unwrap_err();
    assert!(matches!(err, ClientError::UnknownResponse { status: 400 }));
}

#[test]
fn concurrent_callers_share_one_client() {
    let client = client(start_mock_server());
    client.save_policy(DEFAULT_POLICY).unwrap();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let client = &client;
            scope.spawn(move || {
                for i in 0..10 {
                    let text = format!("worker {worker} call {i}");
                    let result = client
                        .apply(&FilterRequest::new("default", text))
                        .unwrap();
                    assert_eq!(
                        result.get_str("filteredText"),
                        Some("worker * call *")
                    );
                }
            });
        }
    });
}
