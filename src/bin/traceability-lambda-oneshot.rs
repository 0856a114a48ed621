//! "Oneshot" version of the traceability service implementations.
//!
//! This executable runs one queue operation, based on arguments given on
//! the command line. Useful for exercising the insert paths locally
//! without a queue transport.

use lambda_runtime::Error;
use std::env;

use traceability_lambda::Services;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let mut args = env::args();
    args.next(); // skip argv[0]

    let queue = args.next().ok_or_else(|| -> Error {
        "first argument should be the queue name (operations-log-insert, protocol-part-insert-test)"
            .into()
    })?;

    let body = args
        .next()
        .ok_or_else(|| -> Error { "second argument should be the message body JSON".into() })?;

    let svcs = Services::init().await?;
    svcs.dispatch_queue_message(&queue, &body).await?;
    println!("{queue}: message processed");
    Ok(())
}
