//! Shared request plumbing for the HTTP handlers.
//!
//! Every endpoint repeats the same few steps: pull a field out of the query
//! string or the JSON body, shape a JSON response, map a failure to a
//! status code. Those steps live here so the handler modules only contain
//! what is specific to their operation.

use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ServiceError;

/// Look up a required field in the query string, falling back to a JSON
/// body. A body that is present but not valid JSON counts as the field
/// being absent, which the caller reports as a validation failure.
pub fn query_or_body_param(req: &Request, name: &str) -> Option<String> {
    if let Some(value) = req.query_string_parameters().first(name) {
        return Some(value.to_owned());
    }

    body_json::<Value>(req)
        .ok()
        .and_then(|body| body.get(name).and_then(Value::as_str).map(str::to_owned))
}

pub fn body_text(req: &Request) -> Option<&str> {
    match req.body() {
        Body::Text(text) => Some(text),
        Body::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        Body::Empty => None,
    }
}

/// Parse the request body as JSON in a single step.
pub fn body_json<T: DeserializeOwned>(req: &Request) -> Result<T, ServiceError> {
    let text = body_text(req)
        .ok_or_else(|| ServiceError::Validation("Invalid JSON format".to_owned()))?;
    serde_json::from_str(text)
        .map_err(|_| ServiceError::Validation("Invalid JSON format".to_owned()))
}

pub fn json_response<S: Serialize>(
    status: StatusCode,
    payload: &S,
) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(payload)?;
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))?)
}

/// Two legacy endpoints answer a missing identifier in plain text; every
/// other response in the service is JSON.
pub fn text_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder().status(status).body(Body::from(message))?)
}

/// The generic failure response: the error's kind picks the status code and
/// its message is echoed as `{"error": ...}`.
pub fn error_response(err: &ServiceError) -> Result<Response<Body>, Error> {
    json_response(err.status_code(), &json!({ "error": err.to_string() }))
}

#[cfg(test)]
pub(crate) fn response_body_text(resp: &Response<Body>) -> &str {
    match resp.body() {
        Body::Text(text) => text,
        Body::Empty => "",
        Body::Binary(_) => panic!("unexpected binary response body"),
    }
}

#[cfg(test)]
pub(crate) fn response_body_json(resp: &Response<Body>) -> Value {
    serde_json::from_str(response_body_text(resp)).expect("response body should be JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn get_request(query: &[(&str, &str)]) -> Request {
        let params: HashMap<String, Vec<String>> = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), vec![(*v).to_owned()]))
            .collect();

        lambda_http::http::Request::builder()
            .method("GET")
            .uri("/readstatus")
            .body(Body::Empty)
            .unwrap()
            .with_query_string_parameters(params)
    }

    fn post_request(body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method("POST")
            .uri("/readstatus")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn param_prefers_query_string() {
        let req = get_request(&[("part_id", "P100")]);
        assert_eq!(query_or_body_param(&req, "part_id").as_deref(), Some("P100"));
    }

    #[test]
    fn param_falls_back_to_json_body() {
        let req = post_request(r#"{"part_id": "P200"}"#);
        assert_eq!(query_or_body_param(&req, "part_id").as_deref(), Some("P200"));
    }

    #[test]
    fn param_absent_everywhere_is_none() {
        let req = get_request(&[]);
        assert_eq!(query_or_body_param(&req, "part_id"), None);
    }

    #[test]
    fn unparseable_body_counts_as_absent() {
        let req = post_request("this is not json");
        assert_eq!(query_or_body_param(&req, "part_id"), None);
    }

    #[test]
    fn body_json_rejects_malformed_input() {
        let req = post_request("{broken");
        match body_json::<Value>(&req) {
            Err(ServiceError::Validation(msg)) => assert_eq!(msg, "Invalid JSON format"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn json_response_sets_content_type() {
        let resp = json_response(StatusCode::OK, &json!({ "message": "ok" })).unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response_body_json(&resp)["message"], "ok");
    }

    #[test]
    fn error_response_echoes_kind_and_message() {
        let err = ServiceError::Database("no route to host".to_owned());
        let resp = error_response(&err).unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_body_json(&resp)["error"], "no route to host");
    }

    #[test]
    fn text_response_is_plain() {
        let resp = text_response(StatusCode::BAD_REQUEST, "missing").unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response_body_text(&resp), "missing");
    }
}
