// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// Elsewhere only Ctrl+C is observed.

/// Resolves once the process is asked to stop
///
/// If a handler cannot be registered the future never resolves for that
/// signal; the other one still works.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    let terminate = async {
        match sigterm {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                eprintln!("[SIGNAL] Failed to register SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    let interrupt = async {
        match sigint {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                eprintln!("[SIGNAL] Failed to register SIGINT handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = terminate => eprintln!("[SIGNAL] SIGTERM received, shutting down"),
        () = interrupt => eprintln!("[SIGNAL] SIGINT received, shutting down"),
    }
}

/// Ctrl+C only
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => eprintln!("[SIGNAL] Ctrl+C received, shutting down"),
        Err(e) => {
            eprintln!("[SIGNAL] Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
