//! Protocol-part linkage: attach a measurement protocol to a part.
//!
//! Served both over HTTP and from the protocol queue; both paths funnel
//! into the same insert. Only `part_id` and `protocol_id` are mandatory,
//! the remaining traceability fields pass through as NULLs when absent.

use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::json;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::error::ServiceError;
use crate::http::{body_json, error_response, json_response};

const INSERT_PROTOCOL_PART: &str =
    "CALL insert_protocol_part($1, $2, $3, $4, $5::timestamp, $6, $7)";

#[derive(Deserialize)]
struct ProtocolPartRequest {
    part_id: Option<String>,
    employee_id: Option<String>,
    station_id: Option<String>,
    status: Option<String>,
    status_timestamp: Option<String>,
    shipping_id: Option<String>,
    protocol_id: Option<String>,
}

impl ProtocolPartRequest {
    fn is_complete(&self) -> bool {
        !self.part_id.as_deref().unwrap_or("").is_empty()
            && !self.protocol_id.as_deref().unwrap_or("").is_empty()
    }
}

async fn insert(data: ProtocolPartRequest, cfg: &DbConfig) -> Result<(), ServiceError> {
    let key = data.part_id.clone().unwrap_or_default();
    let cmd = Command::new("insert_protocol_part", INSERT_PROTOCOL_PART, key)
        .arg(data.part_id)
        .arg(data.employee_id)
        .arg(data.station_id)
        .arg(data.status)
        .arg(data.status_timestamp)
        .arg(data.shipping_id)
        .arg(data.protocol_id);
    db::execute(cfg, cmd).await
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("application/json") {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Content-Type must be application/json" }),
        );
    }

    let data: ProtocolPartRequest = match body_json(req) {
        Ok(data) => data,
        Err(e) => return error_response(&e),
    };
    if !data.is_complete() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Request body must contain 'part_id' and 'protocol_id'" }),
        );
    }

    match insert(data, cfg).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({ "message": "Protocol part data inserted successfully" }),
        ),
        Err(ServiceError::Database(_) | ServiceError::Connectivity(_)) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "Database connection error. Check logs for details." }),
        ),
        Err(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "An internal server error occurred. Check logs for details." }),
        ),
    }
}

/// Queue flavor of the same insert. Every failure re-raises so the queue
/// transport decides about redelivery.
pub async fn queue_handler(body: &str, cfg: &DbConfig) -> Result<(), Error> {
    tracing::info!("processing protocol part queue message: {body}");

    let data: ProtocolPartRequest = serde_json::from_str(body).map_err(|e| {
        tracing::error!("invalid protocol part message, expected JSON: {e}");
        Error::from(format!("invalid protocol part message: {e}"))
    })?;

    if !data.is_complete() {
        tracing::error!("protocol part message missing part_id or protocol_id");
        return Err("queue message must contain 'part_id' and 'protocol_id'".into());
    }

    insert(data, cfg).await?;
    Ok(())
}
