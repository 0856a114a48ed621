//! One-shot database dispatch.
//!
//! Every database operation in this service is a single stored-procedure
//! call or parameterized query, described by a [`Command`]. Each command
//! runs on its own short-lived worker task with a connection opened for just
//! that call; the awaiting handler suspends on the join handle until the
//! worker finishes. Reads materialize all of their rows before the
//! connection is released, writes commit before it is released, and the
//! connection is closed on every exit path.
//!
//! There is deliberately no pool, no retry, and no cancellation of an
//! in-flight statement: one dispatch is exactly one attempt, and a caller
//! that wants another attempt re-dispatches the whole command. Handlers may
//! run independent read commands concurrently by joining two dispatches;
//! the workers share no state.

use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, Connection, FromRow, PgConnection};

use crate::config::{DbConfig, CONNECT_TIMEOUT};
use crate::error::ServiceError;

/// A validated request to run one named database operation.
///
/// The operation name and key identify the call in log output; the
/// statement is what actually runs. Parameters are nullable text, bound in
/// the order they were added, which must match the statement's placeholders
/// exactly.
pub struct Command {
    operation: &'static str,
    statement: &'static str,
    key: String,
    params: Vec<Option<String>>,
}

impl Command {
    pub fn new(operation: &'static str, statement: &'static str, key: impl Into<String>) -> Self {
        Command {
            operation,
            statement,
            key: key.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn arg(mut self, value: impl Into<Option<String>>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Run a read command and return its rows, most of the time zero or one.
pub async fn fetch<T>(cfg: &DbConfig, cmd: Command) -> Result<Vec<T>, ServiceError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    let operation = cmd.operation;
    let key = cmd.key.clone();
    let cfg = cfg.clone();

    let outcome = join_worker(tokio::spawn(async move { run_fetch(cfg, cmd).await })).await;
    if let Err(e) = &outcome {
        tracing::error!("{operation} failed for {key}: {e}");
    }
    outcome
}

/// Run a write command, committing before the worker's connection is
/// released.
pub async fn execute(cfg: &DbConfig, cmd: Command) -> Result<(), ServiceError> {
    let operation = cmd.operation;
    let key = cmd.key.clone();
    let cfg = cfg.clone();

    let outcome = join_worker(tokio::spawn(async move { run_execute(cfg, cmd).await })).await;
    match &outcome {
        Ok(()) => tracing::info!("{operation} committed for {key}"),
        Err(e) => tracing::error!("{operation} failed for {key}: {e}"),
    }
    outcome
}

/// Suspend until the worker task finishes. A panicked worker surfaces as a
/// failure outcome, never as a panic in the handler.
async fn join_worker<T>(
    handle: tokio::task::JoinHandle<Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => Err(ServiceError::Unknown(format!("database worker failed: {e}"))),
    }
}

async fn connect(cfg: &DbConfig) -> Result<PgConnection, ServiceError> {
    let options = cfg.connect_options();
    match tokio::time::timeout(CONNECT_TIMEOUT, options.connect()).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(ServiceError::from(e)),
        Err(_) => Err(ServiceError::Connectivity(
            "timed out establishing a database connection".to_owned(),
        )),
    }
}

async fn run_fetch<T>(cfg: DbConfig, cmd: Command) -> Result<Vec<T>, ServiceError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut conn = connect(&cfg).await?;

    let mut query = sqlx::query_as::<_, T>(cmd.statement);
    for param in &cmd.params {
        query = query.bind(param.clone());
    }

    let rows = query.fetch_all(&mut conn).await;
    let _ = conn.close().await;
    rows.map_err(ServiceError::from)
}

async fn run_execute(cfg: DbConfig, cmd: Command) -> Result<(), ServiceError> {
    let mut conn = connect(&cfg).await?;
    let result = write_in_tx(&mut conn, &cmd).await;
    let _ = conn.close().await;
    result
}

async fn write_in_tx(conn: &mut PgConnection, cmd: &Command) -> Result<(), ServiceError> {
    let mut tx = conn.begin().await?;

    let mut query = sqlx::query(cmd.statement);
    for param in &cmd.params {
        query = query.bind(param.clone());
    }
    query.execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_bind_in_declaration_order() {
        let cmd = Command::new("InsertKovaciLinkaScan", "CALL x($1, $2, $3)", "GB-1")
            .arg("GB-1".to_owned())
            .arg("E-77".to_owned())
            .arg(None::<String>);

        assert_eq!(cmd.operation, "InsertKovaciLinkaScan");
        assert_eq!(cmd.key, "GB-1");
        assert_eq!(
            cmd.params,
            vec![Some("GB-1".to_owned()), Some("E-77".to_owned()), None]
        );
    }

    #[tokio::test]
    async fn crashed_worker_surfaces_as_unknown() {
        let handle: tokio::task::JoinHandle<Result<(), ServiceError>> =
            tokio::spawn(async { panic!("worker died") });

        match join_worker(handle).await {
            Err(ServiceError::Unknown(msg)) => assert!(msg.contains("worker")),
            other => panic!("expected unknown error, got {other:?}"),
        }
    }
}
