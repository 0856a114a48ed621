//! Gitterbox status change.
//!
//! Validation here is JSON-ness only: absent fields travel to the stored
//! procedure as NULLs and the procedure owns the rules.

use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::json;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{body_json, error_response, json_response};

const SET_GITTER_STATUS: &str = "CALL set_gitter_status($1, $2, $3::timestamp, $4, $5)";

#[derive(Deserialize)]
struct ChangeStatusRequest {
    station_id: Option<String>,
    status: Option<String>,
    status_timestamp: Option<String>,
    shipping_id: Option<String>,
    current_workspace_id: Option<String>,
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let body: ChangeStatusRequest = match body_json(req) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let key = body.station_id.clone().unwrap_or_default();
    let cmd = Command::new("set_gitter_status", SET_GITTER_STATUS, key)
        .arg(body.station_id)
        .arg(body.status)
        .arg(body.status_timestamp)
        .arg(body.shipping_id)
        .arg(body.current_workspace_id);

    match db::execute(cfg, cmd).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({ "message": "Status updated successfully" }),
        ),
        Err(e) => error_response(&e),
    }
}
