use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::error::SimulatorError;

/// Wait until `shutdown` fires, the OPC UA server thread ends, or one of
/// `tasks` finishes.
///
/// The server ending on its own (bind failure, panic) is an error so the
/// process exits non-zero.
pub async fn supervise<F>(
    shutdown: F,
    server_done: oneshot::Receiver<()>,
    tasks: &mut JoinSet<&'static str>,
) -> Result<(), SimulatorError>
where
    F: Future,
{
    tokio::select! {
        _ = shutdown => {
            tracing::info!("Received shutdown signal");
            Ok(())
        }
        _ = server_done => {
            tracing::error!("OPC UA server terminated");
            Err(SimulatorError::ServerTerminated)
        }
        Some(result) = tasks.join_next() => {
            let name = result?;
            tracing::info!("{} terminated", name);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn server_exit_is_an_error() {
        let (tx, rx) = oneshot::channel();
        let mut tasks = JoinSet::new();

        std::thread::spawn(move || {
            let _ = tx.send(());
        });

        let result = supervise(pending::<()>(), rx, &mut tasks).await;
        assert!(matches!(result, Err(SimulatorError::ServerTerminated)));
    }

    #[tokio::test]
    async fn dropped_server_thread_is_an_error() {
        let (tx, rx) = oneshot::channel::<()>();
        let mut tasks = JoinSet::new();
        drop(tx);

        let result = supervise(pending::<()>(), rx, &mut tasks).await;
        assert!(matches!(result, Err(SimulatorError::ServerTerminated)));
    }

    #[tokio::test]
    async fn shutdown_signal_is_clean() {
        let (_tx, rx) = oneshot::channel::<()>();
        let mut tasks = JoinSet::new();

        let result = supervise(async {}, rx, &mut tasks).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn finished_task_is_clean() {
        let (_tx, rx) = oneshot::channel::<()>();
        let mut tasks = JoinSet::new();
        tasks.spawn(async { "Dashboard server" });

        let result = supervise(pending::<()>(), rx, &mut tasks).await;
        assert!(result.is_ok());
    }
}
