//! The Lambda-powered manufacturing-traceability services.
//!
//! This library crate implements the request handlers for the traceability
//! backend: part status changes, gitterbox contents, card-based employee
//! authentication, and the forging-line scan workstream. The common
//! codebase is compiled into three executables:
//! `traceability-lambda-proxyevent` serves the HTTP endpoints through the
//! API gateway's "proxy event" framework, `traceability-lambda-queue`
//! consumes the storage-queue workstreams, and `traceability-lambda-oneshot`
//! runs a single queue operation locally for testing.
//!
//! Every handler does the same small dance: validate and normalize the
//! trigger payload into a [`db::Command`], hand it to the one-shot
//! dispatcher in [`db`], and shape the outcome into a JSON response. All
//! business rules live in the database's stored procedures; nothing here
//! holds state across requests.

use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde_json::json;

mod authcard;
mod changestatus;
mod config;
mod db;
mod error;
mod gitterinfo;
mod http;
mod infostatus;
mod kovacilinka;
mod opslog;
mod protocolpart;
mod queue;
mod readstatus;

pub use config::DbConfig;
pub use error::ServiceError;
pub use queue::QueueEvent;

pub struct Services {
    db: Result<DbConfig, ServiceError>,
}

impl Services {
    /// Create the state object for the traceability Lambda services.
    ///
    /// Configuration is resolved here, once. An incomplete configuration
    /// does not abort startup: the host would only restart us into the same
    /// environment, so the failure is held and reported per request as a
    /// 500-class response instead.
    pub async fn init() -> Result<Self, Error> {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false) // don't print the module name
            .without_time() // don't print time (the log sink has it)
            .init();

        let db = DbConfig::from_env();
        match &db {
            Ok(cfg) => tracing::info!("configured database driver: {}", cfg.driver()),
            Err(e) => tracing::error!("database configuration incomplete: {e}"),
        }

        Ok(Services { db })
    }

    /// Handle one HTTP invocation, routed by the trailing segment of the
    /// request path so gateway stage prefixes don't matter.
    pub async fn dispatch(&self, req: Request) -> Result<Response<Body>, Error> {
        let cfg = match &self.db {
            Ok(cfg) => cfg,
            Err(e) => return http::error_response(e),
        };

        match route_tail(req.uri().path()) {
            "authenticatecard" => authcard::handler(&req, cfg).await,
            "ChangeStatus" => changestatus::handler(&req, cfg).await,
            "GetInfoGitter" => gitterinfo::handler(&req, cfg).await,
            "InfoStatus" => infostatus::handler(&req, cfg).await,
            "KovaciLinkaCheck" => kovacilinka::check_handler(&req, cfg).await,
            "KovaciLinkaScan" => kovacilinka::scan_handler(&req, cfg).await,
            "ProtocolPartInsert" => protocolpart::handler(&req, cfg).await,
            "readstatus" => readstatus::handler(&req, cfg).await,
            other => http::json_response(
                StatusCode::NOT_FOUND,
                &json!({ "error": format!("unhandled route: {other}") }),
            ),
        }
    }

    /// Handle a batch of queue records. The first failing record fails the
    /// invocation; redelivery is the transport's concern, not ours.
    pub async fn dispatch_queue(&self, event: QueueEvent) -> Result<(), Error> {
        for record in &event.records {
            self.dispatch_queue_message(record.queue_name(), &record.body)
                .await?;
        }
        Ok(())
    }

    /// Handle one queue message, routed by queue name.
    pub async fn dispatch_queue_message(&self, queue: &str, body: &str) -> Result<(), Error> {
        let cfg = match &self.db {
            Ok(cfg) => cfg,
            Err(e) => return Err(e.clone().into()),
        };
        queue::dispatch(queue, body, cfg).await
    }
}

fn route_tail(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{response_body_json, response_body_text};

    fn services() -> Services {
        Services {
            db: Ok(DbConfig::for_tests()),
        }
    }

    fn get(path: &str) -> Request {
        lambda_http::http::Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::Empty)
            .unwrap()
    }

    #[test]
    fn route_tail_strips_stage_prefixes() {
        assert_eq!(route_tail("/readstatus"), "readstatus");
        assert_eq!(route_tail("/prod/api/KovaciLinkaCheck"), "KovaciLinkaCheck");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let resp = services().dispatch(get("/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn known_route_reaches_its_handler() {
        // No part_id: the readstatus handler answers its legacy plain text.
        let resp = services().dispatch(get("/readstatus")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_body_text(&resp),
            "Please pass part_id in the query string or request body"
        );
    }

    #[tokio::test]
    async fn incomplete_configuration_reports_per_request() {
        let svcs = Services {
            db: Err(ServiceError::Configuration(
                "AZURE_SQL_DB_USER is not set".to_owned(),
            )),
        };

        let resp = svcs.dispatch(get("/readstatus?part_id=P1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response_body_json(&resp)["error"],
            "AZURE_SQL_DB_USER is not set"
        );
    }

    #[tokio::test]
    async fn incomplete_configuration_fails_queue_messages() {
        let svcs = Services {
            db: Err(ServiceError::Configuration(
                "AZURE_SQL_DB_USER is not set".to_owned(),
            )),
        };

        let result = svcs
            .dispatch_queue_message("operations-log-insert", "{}")
            .await;
        assert!(result.is_err());
    }
}
