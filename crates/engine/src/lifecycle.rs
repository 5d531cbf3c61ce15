use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Owns the long-running loops and the shutdown signal they share.
///
/// A loop that panics is logged and started again after `restart_delay`.
/// A loop that returns normally is finished and is not restarted.
pub struct Supervisor {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
    restart_delay: Duration,
}

impl Supervisor {
    pub fn new(restart_delay: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            tasks: Vec::new(),
            restart_delay,
        }
    }

    /// A receiver that flips to `true` when shutdown begins.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Spawn a supervised loop. `factory` builds a fresh run of the loop
    /// from a shutdown receiver each time it (re)starts.
    pub fn spawn<F, Fut>(&mut self, name: &str, factory: F)
    where
        F: Fn(watch::Receiver<bool>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = name.to_string();
        let shutdown = self.shutdown_tx.subscribe();
        let delay = self.restart_delay;

        let handle = tokio::spawn(async move {
            loop {
                let mut run = AbortOnDrop(tokio::spawn(factory(shutdown.clone())));
                match (&mut run.0).await {
                    Ok(()) => {
                        info!(task = %task_name, "Task finished");
                        break;
                    }
                    Err(e) if e.is_panic() => {
                        if *shutdown.borrow() {
                            error!(task = %task_name, "Task panicked during shutdown");
                            break;
                        }
                        error!(task = %task_name, restart_in = ?delay, "Task panicked, restarting");
                        tokio::time::sleep(delay).await;
                    }
                    Err(_) => {
                        warn!(task = %task_name, "Task cancelled");
                        break;
                    }
                }
            }
        });

        info!(task = name, "Task spawned");
        self.tasks.push((name.to_string(), handle));
    }

    /// Signal every loop to stop and wait up to `grace` for each one;
    /// loops still running after that are aborted.
    pub async fn shutdown(self, grace: Duration) {
        info!("Shutting down supervised tasks");
        self.shutdown_tx.send_replace(true);

        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(_) => info!(task = %name, "Task stopped"),
                Err(_) => {
                    warn!(task = %name, "Task did not stop in time, aborting");
                    handle.abort();
                }
            }
        }
    }
}

/// Aborts the inner run when the supervising task itself is aborted.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
