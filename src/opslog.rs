//! Traceability-log ingestion from the operations queue.
//!
//! Workstations enqueue scan events; each message becomes one row in the
//! traceability log. A message that is not JSON is logged and dropped:
//! redelivery cannot fix a malformed payload. A database failure re-raises
//! so the queue transport redelivers the message.

use lambda_runtime::Error;
use serde::Deserialize;

use crate::config::DbConfig;
use crate::db::{self, Command};

const INSERT_LOG: &str = "CALL InsertTraceabilityLog($1, $2, $3, $4, $5::timestamp, $6)";

#[derive(Deserialize)]
struct LogEntry {
    part_id: Option<String>,
    employee_id: Option<String>,
    station_id: Option<String>,
    status: Option<String>,
    status_timestamp: Option<String>,
    shipping_id: Option<String>,
}

pub async fn queue_handler(body: &str, cfg: &DbConfig) -> Result<(), Error> {
    tracing::info!("processing queue message: {body}");

    let entry: LogEntry = match serde_json::from_str(body) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::error!("invalid message format, expected JSON: {e}");
            return Ok(());
        }
    };

    let key = entry.part_id.clone().unwrap_or_default();
    let cmd = Command::new("InsertTraceabilityLog", INSERT_LOG, key)
        .arg(entry.part_id)
        .arg(entry.employee_id)
        .arg(entry.station_id)
        .arg(entry.status)
        .arg(entry.status_timestamp)
        .arg(entry.shipping_id);

    db::execute(cfg, cmd).await?;
    Ok(())
}
