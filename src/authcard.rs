//! NFC/RFID card authentication.
//!
//! The stored procedure owns the decision; this handler only relays its
//! verdict. The procedure's `status` column doubles as the outward HTTP
//! signal: `success` answers 200 and anything else answers 401. That
//! includes a database failure, which is folded into the same result
//! envelope the procedure would have produced, so callers cannot tell an
//! unknown card from a broken database. The deployed system behaves the
//! same way.

use lambda_http::http::{Method, StatusCode};
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{body_json, json_response};

const AUTHENTICATE: &str =
    "SELECT status, message, employee_name, employee_id FROM sp_authenticate_card($1)";

#[derive(FromRow)]
struct AuthRow {
    status: String,
    message: Option<String>,
    employee_name: Option<String>,
    employee_id: Option<String>,
}

#[derive(Serialize)]
struct AuthResult {
    status: String,
    message: Option<String>,
    employee_name: Option<String>,
    employee_id: Option<String>,
}

impl AuthResult {
    fn error(message: impl Into<String>) -> Self {
        AuthResult {
            status: "error".to_owned(),
            message: Some(message.into()),
            employee_name: None,
            employee_id: None,
        }
    }
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    // GET presents the card in the query string, POST in the body.
    let card_id = if req.method() == Method::GET {
        req.query_string_parameters()
            .first("card_id")
            .map(str::to_owned)
    } else {
        body_json::<Value>(req)
            .ok()
            .and_then(|body| body.get("card_id").and_then(Value::as_str).map(str::to_owned))
    };

    let Some(card_id) = card_id else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &AuthResult::error("Missing required parameter: card_id"),
        );
    };

    let cmd = Command::new("sp_authenticate_card", AUTHENTICATE, card_id.clone()).arg(card_id);

    let result = match db::fetch::<AuthRow>(cfg, cmd).await {
        Ok(rows) => match rows.into_iter().next() {
            Some(row) => AuthResult {
                status: row.status,
                message: row.message,
                employee_name: row.employee_name,
                employee_id: row.employee_id,
            },
            None => AuthResult::error("No result from database"),
        },
        Err(e) => AuthResult::error(format!("Database error: {e}")),
    };

    let status = if result.status == "success" {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    json_response(status, &result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response_body_json;

    #[tokio::test]
    async fn missing_card_id_is_rejected_with_full_envelope() {
        let req = lambda_http::http::Request::builder()
            .method("GET")
            .uri("/authenticatecard")
            .body(Body::Empty)
            .unwrap();

        let resp = handler(&req, &DbConfig::for_tests()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = response_body_json(&resp);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Missing required parameter: card_id");
        assert_eq!(body["employee_name"], Value::Null);
        assert_eq!(body["employee_id"], Value::Null);
    }

    #[tokio::test]
    async fn post_with_unparseable_body_is_rejected() {
        let req = lambda_http::http::Request::builder()
            .method("POST")
            .uri("/authenticatecard")
            .body(Body::from("not json"))
            .unwrap();

        let resp = handler(&req, &DbConfig::for_tests()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
