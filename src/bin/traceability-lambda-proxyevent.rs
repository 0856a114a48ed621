//! "Proxy event" version of the traceability service implementations.
//!
//! This executable defines a server that expects to be interacted with
//! according to the API gateway's "proxy event" protocol, which is how the
//! HTTP endpoints are deployed. Requests are routed to handlers by path.

use lambda_http::{run, service_fn, Error, Request};

use traceability_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|req: Request| async move {
        ref_svcs.dispatch(req).await
    }))
    .await?;
    Ok(())
}
