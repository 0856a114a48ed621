//! Gitterbox contents: every part recorded against one shipping id.

use chrono::NaiveDateTime;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;

use crate::config::DbConfig;
use crate::db::{self, Command};
use crate::http::{error_response, json_response, query_or_body_param};

const GITTER_PARTS: &str = "\
    SELECT ps.part_id, ps.create_timestamp, ps.employee_id, ps.station_id, \
           ps.last_status, ps.status_timestamp, ps.shipping_id \
    FROM part_status ps \
    WHERE ps.shipping_id = $1 \
    ORDER BY ps.status_timestamp DESC";

#[derive(FromRow, Serialize)]
struct GitterPartRow {
    part_id: Option<String>,
    create_timestamp: Option<NaiveDateTime>,
    employee_id: Option<String>,
    station_id: Option<i32>,
    last_status: Option<String>,
    status_timestamp: Option<NaiveDateTime>,
    shipping_id: Option<String>,
}

pub async fn handler(req: &Request, cfg: &DbConfig) -> Result<Response<Body>, Error> {
    let Some(shipping_id) = query_or_body_param(req, "shipping_id") else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({ "error": "Please pass shipping_id in the query string or request body" }),
        );
    };

    let cmd =
        Command::new("GetInfoGitter", GITTER_PARTS, shipping_id.clone()).arg(shipping_id.clone());
    match db::fetch::<GitterPartRow>(cfg, cmd).await {
        // An unknown shipping id is an empty gitterbox, not an error.
        Ok(rows) => json_response(StatusCode::OK, &json!({ "gitter_history": rows })),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response_body_json;

    #[tokio::test]
    async fn missing_shipping_id_is_a_json_error() {
        let req = lambda_http::http::Request::builder()
            .method("GET")
            .uri("/GetInfoGitter")
            .body(Body::Empty)
            .unwrap();

        let resp = handler(&req, &DbConfig::for_tests()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response_body_json(&resp)["error"],
            "Please pass shipping_id in the query string or request body"
        );
    }

    #[test]
    fn rows_serialize_under_gitter_history() {
        let rows = vec![GitterPartRow {
            part_id: Some("P1".to_owned()),
            create_timestamp: None,
            employee_id: Some("E-3".to_owned()),
            station_id: Some(7),
            last_status: Some("OK".to_owned()),
            status_timestamp: None,
            shipping_id: Some("GB-55".to_owned()),
        }];

        let value = json!({ "gitter_history": rows });
        assert_eq!(value["gitter_history"][0]["part_id"], "P1");
        assert_eq!(value["gitter_history"][0]["station_id"], 7);
    }
}
