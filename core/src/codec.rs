//! Request builder and response parser for the Airlock API.
//!
//! # Design
//! `Codec` holds only the parsed endpoint and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Method, path and content negotiation come from
//! [`Operation`]; nothing here touches the network.

use url::Url;

use crate::config::check_endpoint;
use crate::contract::{Operation, NAME_SEGMENT, PARAM_CONTEXT, PARAM_DOCUMENT_ID, PARAM_POLICY};
use crate::error::{classify, ClientError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{FilterRequest, FilterResult, ServiceStatus};

#[derive(Debug, Clone)]
pub struct Codec {
    endpoint: Url,
}

impl Codec {
    /// Fails unless `endpoint` is an `http`/`https` URL with a host.
    pub fn new(endpoint: Url) -> Result<Self> {
        check_endpoint(&endpoint)?;
        Ok(Self { endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_status(&self) -> HttpRequest {
        self.request(Operation::Status, self.url(Operation::Status, None), None)
    }

    pub fn build_apply(&self, request: &FilterRequest) -> HttpRequest {
        let mut url = self.url(Operation::Apply, None);
        {
            let mut query = url.query_pairs_mut();
            if let Some(context) = &request.context {
                query.append_pair(PARAM_CONTEXT, context);
            }
            query.append_pair(PARAM_POLICY, &request.policy_name);
            if let Some(document_id) = &request.document_id {
                query.append_pair(PARAM_DOCUMENT_ID, document_id);
            }
        }
        self.request(Operation::Apply, url, Some(request.text.clone()))
    }

    pub fn build_list_policies(&self) -> HttpRequest {
        self.request(
            Operation::ListPolicies,
            self.url(Operation::ListPolicies, None),
            None,
        )
    }

    pub fn build_get_policy(&self, name: &str) -> Result<HttpRequest> {
        check_policy_name(name)?;
        Ok(self.request(
            Operation::GetPolicy,
            self.url(Operation::GetPolicy, Some(name)),
            None,
        ))
    }

    /// `content` is sent verbatim; it is not parsed or re-serialized.
    pub fn build_save_policy(&self, content: &str) -> HttpRequest {
        self.request(
            Operation::SavePolicy,
            self.url(Operation::SavePolicy, None),
            Some(content.to_string()),
        )
    }

    pub fn build_delete_policy(&self, name: &str) -> Result<HttpRequest> {
        check_policy_name(name)?;
        Ok(self.request(
            Operation::DeletePolicy,
            self.url(Operation::DeletePolicy, Some(name)),
            None,
        ))
    }

    pub fn parse_status(&self, response: HttpResponse) -> Result<ServiceStatus> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(ClientError::Decode)
    }

    /// An empty 2xx body yields an empty result rather than an error.
    pub fn parse_apply(&self, response: HttpResponse) -> Result<FilterResult> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(FilterResult::default());
        }
        serde_json::from_str(&response.body).map_err(ClientError::Decode)
    }

    pub fn parse_list_policies(&self, response: HttpResponse) -> Result<Vec<String>> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(ClientError::Decode)
    }

    pub fn parse_get_policy(&self, response: HttpResponse) -> Result<String> {
        check_status(&response)?;
        Ok(response.body)
    }

    pub fn parse_save_policy(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    pub fn parse_delete_policy(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    /// Endpoint with the operation's absolute path. Query and fragment of the
    /// configured endpoint are dropped. `new` guarantees the endpoint can be a
    /// base, so `path_segments_mut` cannot fail here.
    fn url(&self, operation: Operation, name: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear();
            for segment in operation.path_template().trim_start_matches('/').split('/') {
                match name {
                    Some(name) if segment == NAME_SEGMENT => segments.push(name),
                    _ => segments.push(segment),
                };
            }
        }
        url
    }

    fn request(&self, operation: Operation, url: Url, body: Option<String>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(accept) = operation.accept() {
            headers.push(("accept".to_string(), accept.to_string()));
        }
        if let Some(content_type) = operation.content_type() {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        HttpRequest {
            method: operation.method(),
            url: url.into(),
            headers,
            body,
        }
    }
}

/// `.` and `..` are dot segments: URL normalization removes them, in
/// percent-encoded form too, which would retarget the request at
/// `/api/policies`.
fn check_policy_name(name: &str) -> Result<()> {
    if matches!(name, "." | "..") {
        return Err(ClientError::InvalidPolicyName(name.to_string()));
    }
    Ok(())
}

/// Pass 2xx through; map everything else via [`classify`] without looking at
/// the body.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(classify(response.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::HttpMethod;

    fn codec() -> Codec {
        Codec::new(Url::parse("https://airlock.local:8080").unwrap()).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_status_produces_correct_request() {
        let req = codec().build_status();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://airlock.local:8080/api/status");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_apply_binds_query_and_text_body() {
        let input = FilterRequest::new("default", "My SSN is 123-45-6789.")
            .with_context("claims 2024")
            .with_document_id("doc/1");
        let req = codec().build_apply(&input);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "https://airlock.local:8080/api/policies/apply?c=claims+2024&p=default&d=doc%2F1"
        );
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("accept"), Some("text/plain"));
        assert_eq!(req.body.as_deref(), Some("My SSN is 123-45-6789."));
    }

    #[test]
    fn build_apply_omits_absent_optionals() {
        let req = codec().build_apply(&FilterRequest::new("strict", "text"));
        assert_eq!(req.url, "https://airlock.local:8080/api/policies/apply?p=strict");
    }

    #[test]
    fn build_get_policy_encodes_name() {
        let req = codec().build_get_policy("pii rules/v2").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://airlock.local:8080/api/policies/pii%20rules%2Fv2"
        );
        assert_eq!(req.header("accept"), Some("text/plain"));
    }

    #[test]
    fn dot_segment_names_are_rejected() {
        let c = codec();
        for name in [".", ".."] {
            let err = c.build_get_policy(name).unwrap_err();
            assert!(matches!(&err, ClientError::InvalidPolicyName(n) if n == name), "{err:?}");
            let err = c.build_delete_policy(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPolicyName);
        }
    }

    #[test]
    fn dotted_names_that_are_not_dot_segments_are_kept() {
        let req = codec().build_get_policy("...").unwrap();
        assert_eq!(req.url, "https://airlock.local:8080/api/policies/...");
        let req = codec().build_delete_policy("v1.2").unwrap();
        assert_eq!(req.url, "https://airlock.local:8080/api/policies/v1.2");
    }

    #[test]
    fn endpoint_must_be_a_base_http_url() {
        for endpoint in ["mailto:ops@airlock.local", "data:text/plain,hi", "ftp://airlock.local"] {
            let err = Codec::new(Url::parse(endpoint).unwrap()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{endpoint}");
        }
    }

    #[test]
    fn build_save_policy_sends_content_verbatim() {
        let content = r#"{ "name": "default",  "identifiers": {} }"#;
        let req = codec().build_save_policy(content);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://airlock.local:8080/api/policies");
        assert_eq!(req.headers, vec![("content-type".to_string(), "application/json".to_string())]);
        assert_eq!(req.body.as_deref(), Some(content));
    }

    #[test]
    fn build_delete_policy_produces_correct_request() {
        let req = codec().build_delete_policy("default").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, "https://airlock.local:8080/api/policies/default");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn endpoint_path_and_query_are_replaced() {
        let codec = Codec::new(Url::parse("https://airlock.local/base/?x=1#frag").unwrap()).unwrap();
        assert_eq!(codec.build_list_policies().url, "https://airlock.local/api/policies");
    }

    #[test]
    fn trailing_slash_is_irrelevant() {
        let with = Codec::new(Url::parse("http://localhost:3000/").unwrap()).unwrap();
        let without = Codec::new(Url::parse("http://localhost:3000").unwrap()).unwrap();
        assert_eq!(with.build_status().url, without.build_status().url);
        assert_eq!(with.build_status().url, "http://localhost:3000/api/status");
    }

    #[test]
    fn parse_status_success() {
        let status = codec()
            .parse_status(response(200, r#"{"status":"Healthy"}"#))
            .unwrap();
        assert_eq!(status.status, "Healthy");
    }

    #[test]
    fn parse_list_policies_keeps_order() {
        let names = codec()
            .parse_list_policies(response(200, r#"["strict","default"]"#))
            .unwrap();
        assert_eq!(names, vec!["strict", "default"]);
    }

    #[test]
    fn parse_list_policies_bad_json() {
        let err = codec()
            .parse_list_policies(response(200, "not json"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn parse_apply_empty_body_is_empty_result() {
        let result = codec().parse_apply(response(200, "")).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn parse_apply_decodes_object() {
        let result = codec()
            .parse_apply(response(
                200,
                r#"{"documentId":"abc","filteredText":"My SSN is ***-**-****."}"#,
            ))
            .unwrap();
        assert_eq!(result.get_str("documentId"), Some("abc"));
    }

    #[test]
    fn parse_get_policy_returns_body_verbatim() {
        let body = "{\n  \"name\": \"default\"\n}";
        assert_eq!(codec().parse_get_policy(response(200, body)).unwrap(), body);
    }

    #[test]
    fn error_bodies_are_not_decoded() {
        let err = codec()
            .parse_status(response(500, r#"{"status":"Healthy"}"#))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownResponse { status: 500 }));
    }

    #[test]
    fn parse_maps_dedicated_statuses() {
        let c = codec();
        assert_eq!(
            c.parse_save_policy(response(401, "")).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            c.parse_delete_policy(response(503, "")).unwrap_err().kind(),
            ErrorKind::ServiceUnavailable
        );
        assert!(c.parse_delete_policy(response(204, "")).is_ok());
    }
}
