// Connection handling module
// Serves one accepted TCP connection: HTTP/1.1, body limit, engine dispatch

use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_LENGTH;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;

use crate::engine::Engine;
use crate::http::{build_413_response, build_500_response, build_text_response};
use crate::middleware::recovery::panic_message;

/// Accept a connection, enforcing the connection limit.
///
/// The counter is incremented before the limit check so that concurrent
/// accepts cannot both slip under it.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    engine: &Arc<Engine>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = engine.config().performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            engine.logger().warn(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if engine.config().logging.access_log {
        engine.logger().log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(engine), Arc::clone(conn_counter));
}

/// Releases one connection slot when dropped
struct ConnectionSlot(Arc<AtomicUsize>);

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve a connection in its own task; the slot is released however the task ends
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    engine: Arc<Engine>,
    conn_counter: Arc<AtomicUsize>,
) {
    let slot = ConnectionSlot(conn_counter);
    tokio::spawn(async move {
        let _slot = slot;
        let io = TokioIo::new(stream);

        let performance = &engine.config().performance;
        let timeout_duration = Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));
        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_engine = Arc::clone(&engine);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let engine = Arc::clone(&service_engine);
                async move { Ok::<_, Infallible>(handle_request(req, peer_addr, &engine).await) }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => engine.logger().log_connection_error(&err),
            Err(_) => engine.logger().warn(&format!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout_duration.as_secs()
            )),
        }
    });
}

/// Buffer the request body within the configured limit and hand the request
/// to the engine
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    engine: &Engine,
) -> Response<Full<Bytes>> {
    let max_body_size = engine.config().http.max_body_size;
    if let Some(size) = declared_body_size(&req) {
        if size > max_body_size {
            engine.logger().error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return build_413_response();
        }
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            engine.logger().error(&format!(
                "Request body exceeded {max_body_size} bytes while reading"
            ));
            return build_413_response();
        }
        Err(e) => {
            engine.logger().warn(&format!("Failed to read request body: {e}"));
            return build_text_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    let request = Request::from_parts(parts, body);
    match panic::catch_unwind(AssertUnwindSafe(|| engine.serve_http(request, Some(peer_addr)))) {
        Ok(response) => response,
        Err(payload) => {
            engine.logger().error(&format!(
                "Handler panicked for {peer_addr}: {}",
                panic_message(payload.as_ref())
            ));
            build_500_response()
        }
    }
}

/// Content-Length of the request, if present and valid
fn declared_body_size<B>(req: &Request<B>) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
