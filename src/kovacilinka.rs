//! Forging line ("kovaci linka") scan workstream.
//!
//! Scanners at the forging line post gitterbox scans, and a companion check
//! endpoint reports the most recent scan for a gitterbox so the scanner
//! terminal can signal whether it has seen the box before.

use chrono::NaiveDateTime;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{body_json, error_response, json_response};

const LATEST_SCAN: &str = "\
    SELECT gitter_id, employee_id, \"timestamp\", position \
    FROM kovaci_linka_scans \
    WHERE gitter_id = $1 \
    ORDER BY \"timestamp\" DESC \
    LIMIT 1";

const INSERT_SCAN: &str = "CALL InsertKovaciLinkaScan($1, $2, $3)";

/// Scanner mounts on the forging line.
const POSITIONS: [&str; 2] = ["A", "B"];

#[derive(FromRow)]
struct ScanRow {
    gitter_id: String,
    employee_id: Option<String>,
    timestamp: Option<NaiveDateTime>,
    position: Option<String>,
}

#[derive(Serialize)]
struct ScanResult {
    exists: bool,
    gitter_id: String,
    employee_id: Option<String>,
    timestamp: Option<NaiveDateTime>,
    position: Option<String>,
}

pub async fn check_handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let body: Value = match body_json(req) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let Some(raw) = body.get("gitter_id") else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Missing required field: gitter_id" }),
        );
    };
    let gitter_id = raw.as_str().unwrap_or("").trim();
    if gitter_id.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "gitter_id cannot be empty" }),
        );
    }

    let cmd = Command::new("KovaciLinkaCheck", LATEST_SCAN, gitter_id).arg(gitter_id.to_owned());
    match db::fetch::<ScanRow>(cfg, cmd).await {
        Ok(rows) => match rows.into_iter().next() {
            Some(row) => json_response(
                StatusCode::OK,
                &ScanResult {
                    exists: true,
                    gitter_id: row.gitter_id,
                    employee_id: row.employee_id,
                    timestamp: row.timestamp,
                    position: row.position,
                },
            ),
            // Unknown gitterbox: the terminal blinks green and scans it in.
            None => json_response(
                StatusCode::OK,
                &json!({ "exists": false, "message": "Gitter ID not found" }),
            ),
        },
        Err(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "Failed to check gitter_id" }),
        ),
    }
}

pub async fn scan_handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let body: Value = match body_json(req) {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    let missing: Vec<&str> = ["gitter_id", "employee_id", "position"]
        .into_iter()
        .filter(|field| body.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": format!("Missing required fields: {}", missing.join(", ")) }),
        );
    }

    let gitter_id = field_text(&body, "gitter_id");
    let employee_id = field_text(&body, "employee_id");
    let position = field_text(&body, "position");

    if gitter_id.is_empty() || employee_id.is_empty() || position.is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Missing required fields: gitter_id, employee_id, or position" }),
        );
    }
    if !POSITIONS.contains(&position.as_str()) {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Position must be either 'A' or 'B'" }),
        );
    }

    let cmd = Command::new("InsertKovaciLinkaScan", INSERT_SCAN, gitter_id.clone())
        .arg(gitter_id)
        .arg(employee_id)
        .arg(position);

    match db::execute(cfg, cmd).await {
        Ok(()) => json_response(StatusCode::OK, &json!({ "message": "Scan saved successfully" })),
        Err(_) => json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({ "error": "Failed to process scan" }),
        ),
    }
}

fn field_text(body: &Value, name: &str) -> String {
    body.get(name)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned()
}
