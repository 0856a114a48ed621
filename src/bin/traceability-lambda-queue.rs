//! Queue-trigger version of the traceability service implementations.
//!
//! This executable consumes the storage-queue workstreams
//! (`operations-log-insert` and `protocol-part-insert-test`). A failed
//! record fails the invocation so the transport's redelivery policy can
//! take over; there are no retries here.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};

use traceability_lambda::{QueueEvent, Services};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let svcs = Services::init().await?;
    let ref_svcs = &svcs;

    run(service_fn(|event: LambdaEvent<QueueEvent>| async move {
        let (event, _context) = event.into_parts();
        ref_svcs.dispatch_queue(event).await
    }))
    .await?;
    Ok(())
}
