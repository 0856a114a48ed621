//! Latest-status lookup for a single part.

use chrono::NaiveDateTime;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{error_response, json_response, query_or_body_param, text_response};

const PART_STATUS: &str = "\
    SELECT last_status, station_id, status_timestamp, create_timestamp, \
           employee_id, shipping_id \
    FROM part_status \
    WHERE part_id = $1";

#[derive(FromRow)]
struct PartStatusRow {
    last_status: Option<String>,
    station_id: Option<i32>,
    status_timestamp: Option<NaiveDateTime>,
    create_timestamp: Option<NaiveDateTime>,
    employee_id: Option<String>,
    shipping_id: Option<String>,
}

#[derive(Serialize)]
struct PartStatus {
    part_id: String,
    latest_status: Option<String>,
    latest_workspace_id: Option<String>,
    status_timestamp: Option<NaiveDateTime>,
    create_timestamp: Option<NaiveDateTime>,
    employee_id: Option<String>,
    shipping_id: Option<String>,
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let Some(part_id) = query_or_body_param(req, "part_id") else {
        return text_response(
            StatusCode::BAD_REQUEST,
            "Please pass part_id in the query string or request body",
        );
    };

    let cmd = Command::new("ReadStatus", PART_STATUS, part_id.clone()).arg(part_id.clone());
    let rows = match db::fetch::<PartStatusRow>(cfg, cmd).await {
        Ok(rows) => rows,
        Err(e) => return error_response(&e),
    };

    match rows.into_iter().next() {
        Some(row) => json_response(
            StatusCode::OK,
            &PartStatus {
                part_id,
                latest_status: row.last_status,
                // the frontend expects the workspace id as text
                latest_workspace_id: row.station_id.map(|id| id.to_string()),
                status_timestamp: row.status_timestamp,
                create_timestamp: row.create_timestamp,
                employee_id: row.employee_id,
                shipping_id: row.shipping_id,
            },
        ),
        // Absence of data is not an error for this endpoint.
        None => json_response(
            StatusCode::OK,
            &json!({ "message": format!("No record found for part ID: {part_id}") }),
        ),
    }
}
