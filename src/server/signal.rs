use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `token` on Ctrl-C or SIGTERM. The task also ends quietly if the
/// token is cancelled some other way first.
pub fn spawn_shutdown_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_termination() => {
                log::info!("Termination signal received, stopping server");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

async fn wait_for_termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {:?}", e);
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
