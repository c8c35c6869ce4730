//! Interrupt watcher.
//!
//! Waits for Ctrl+C (or SIGTERM on unix) on a background thread and marks
//! the run cancelled. It never touches the runtime itself: the main thread
//! notices the flag at its next step boundary or poll and runs teardown.

use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::core::orchestrator::RunState;

#[cfg(unix)]
type Terminate = Option<tokio::signal::unix::Signal>;

#[cfg(not(unix))]
type Terminate = Option<()>;

#[cfg(unix)]
fn install_terminate() -> Terminate {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(sig) => Some(sig),
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            None
        }
    }
}

#[cfg(not(unix))]
fn install_terminate() -> Terminate {
    None
}

async fn terminated(sig: &mut Terminate) {
    #[cfg(unix)]
    if let Some(sig) = sig.as_mut() {
        sig.recv().await;
        return;
    }
    let _ = sig;
    std::future::pending::<()>().await;
}

/// Start watching for interrupts on behalf of `state`.
///
/// The thread lives until the process exits. Repeated signals are
/// recorded again but never cut teardown short.
pub fn watch(state: Arc<RunState>) {
    let spawned = thread::Builder::new()
        .name("vpnpod-signal".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "cannot start signal watcher");
                    return;
                }
            };

            runtime.block_on(async move {
                let mut terminate = install_terminate();

                loop {
                    tokio::select! {
                        result = tokio::signal::ctrl_c() => {
                            if let Err(e) = result {
                                warn!(error = %e, "failed to install Ctrl+C handler");
                                return;
                            }
                        }
                        _ = terminated(&mut terminate) => {}
                    }

                    if state.teardown_started() {
                        info!("interrupt received, cleanup already running");
                    } else {
                        info!("interrupt received, stopping after the current step");
                    }
                    state.interrupt();
                }
            });
        });

    match spawned {
        Ok(_) => debug!("signal watcher started"),
        Err(e) => warn!(error = %e, "cannot spawn signal watcher"),
    }
}
