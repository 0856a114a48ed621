//! Full history trail for a single part.
//!
//! The trail merges the live transaction log with the historized part
//! status table, so a row can describe either a scan event or a recorded
//! status change; the `zmena` marker tells the frontend which is which.

use chrono::NaiveDateTime;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{error_response, json_response, query_or_body_param, text_response};

// The station name is reported under the station_id key; that is what the
// frontend has always consumed.
const PART_HISTORY: &str = r#"
    SELECT
        COALESCE(tl.part_id, hps.part_id)                   AS part_id,
        cst.station_name                                    AS station_id,
        COALESCE(tl.status, hps.status)                     AS rezim_cteni,
        COALESCE(tl.status_timestamp, hps.status_timestamp) AS "timestamp",
        COALESCE(tl.employee_id, hps.employee_id)           AS employee_id,
        COALESCE(tl.shipping_id, hps.shipping_id)           AS gitterbox_id,
        pp.protocol_id                                      AS protocol_id,
        hps.status                                          AS history_status,
        CASE WHEN hps.status IS NOT NULL THEN 'zmena statusu' END AS zmena
    FROM traceability_log tl
    FULL OUTER JOIN h_part_status hps
        ON tl.part_id = hps.part_id
        AND tl.status_timestamp = hps.status_timestamp
    LEFT JOIN c_station cst
        ON cst.station_id = COALESCE(tl.station_id, hps.station_id)
    LEFT JOIN (
        SELECT DISTINCT shipping_id, station_id, protocol_id
        FROM protocol_part
    ) pp
        ON pp.shipping_id = tl.shipping_id
        AND pp.station_id = tl.station_id
    WHERE COALESCE(tl.part_id, hps.part_id) = $1
    ORDER BY COALESCE(tl.status_timestamp, hps.status_timestamp) DESC
"#;

#[derive(FromRow, Serialize)]
struct PartHistoryRow {
    part_id: Option<String>,
    station_id: Option<String>,
    rezim_cteni: Option<String>,
    timestamp: Option<NaiveDateTime>,
    employee_id: Option<String>,
    gitterbox_id: Option<String>,
    protocol_id: Option<String>,
    history_status: Option<String>,
    zmena: Option<String>,
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let Some(part_id) = query_or_body_param(req, "part_id") else {
        tracing::error!("no part_id provided in request");
        return text_response(
            StatusCode::BAD_REQUEST,
            "Please pass part_id in the query string or request body",
        );
    };

    tracing::info!("fetching history for part {part_id}");

    let cmd = Command::new("InfoStatus", PART_HISTORY, part_id.clone()).arg(part_id.clone());
    let rows = match db::fetch::<PartHistoryRow>(cfg, cmd).await {
        Ok(rows) => rows,
        Err(e) => return error_response(&e),
    };

    if rows.is_empty() {
        json_response(
            StatusCode::OK,
            &json!({ "message": format!("No record found for part ID: {part_id}") }),
        )
    } else {
        json_response(StatusCode::OK, &json!({ "part_history": rows }))
    }
}
