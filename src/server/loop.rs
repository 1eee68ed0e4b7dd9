// Server loop module
// Accepts connections until the shutdown future resolves, then drains

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::engine::Engine;
use crate::error::Result;

/// How long in-flight connections get to finish after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Serve `listener` until `shutdown` resolves
///
/// After shutdown no new connections are accepted; open connections are given
/// `DRAIN_TIMEOUT` to complete.
pub async fn serve<S>(engine: Arc<Engine>, listener: TcpListener, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    engine.logger().log_server_start(&addr, engine.config());

    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &engine, &active_connections);
                    }
                    Err(e) => {
                        engine.logger().error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
            () = &mut shutdown => {
                engine.logger().info("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }

    drop(listener);
    drain(&engine, &active_connections).await;
    Ok(())
}

async fn drain(engine: &Engine, active_connections: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 {
            engine.logger().info("All connections closed, server stopped");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            engine.logger().warn(&format!(
                "Server stopped with {active} connections still open"
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
