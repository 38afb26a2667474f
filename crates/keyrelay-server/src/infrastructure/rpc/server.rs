//! TCP accept loop, per-connection tasks, and the single dispatch worker.
//!
//! Connections are cheap: each gets its own task that reads request lines and
//! writes response lines.  None of them touch the dispatcher directly.  They
//! forward every parsed request over an `mpsc` channel to one worker task,
//! which runs requests strictly one at a time and answers through a
//! `oneshot`.  Release timers run as their own tasks and are not serialised
//! behind the worker; they only contend for the device lock.
//!
//! Shutdown is driven by a shared `AtomicBool`, cleared by the Ctrl-C handler
//! in `main.rs`.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::dispatch::CommandDispatcher;
use crate::infrastructure::rpc::messages::{RpcRequest, RpcResponse};

/// How long `accept` may block before the shutdown flag is checked again.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Queued requests beyond this make connection tasks wait.
const WORKER_QUEUE_DEPTH: usize = 64;

/// One request on its way to the worker.
struct RpcCall {
    request: RpcRequest,
    reply: oneshot::Sender<RpcResponse>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the RPC listener.
///
/// # Errors
///
/// Returns an error if the address is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {addr}"))
}

/// Serves RPC connections on `listener` until `running` is cleared, then
/// returns `Ok(())`.
///
/// Connections still open at that point keep running on their own tasks.
///
/// # Errors
///
/// Returns an error only when the server cannot keep accepting.  A failed
/// `accept` or a broken connection is logged and does not end the loop.
pub async fn run_server(
    listener: TcpListener,
    dispatcher: Arc<CommandDispatcher>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("RPC server listening on {addr}");
    }
    let worker = spawn_worker(dispatcher);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let session_id = Uuid::new_v4();
                let span = info_span!("session", id = %session_id, peer = %peer_addr);
                let worker = worker.clone();
                tokio::spawn(
                    async move {
                        info!("client connected");
                        match serve_connection(stream, worker).await {
                            Ok(()) => info!("client disconnected"),
                            Err(e) => warn!("connection closed with error: {e:#}"),
                        }
                    }
                    .instrument(span),
                );
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

/// Runs one request against the dispatcher and builds the reply.
pub async fn handle_request(dispatcher: &CommandDispatcher, request: RpcRequest) -> RpcResponse {
    let outcome = match request {
        RpcRequest::Init { seed } => {
            debug!(?seed, "init seed ignored");
            return RpcResponse::init(dispatcher.init());
        }
        RpcRequest::Send { key, down_ms } => dispatcher.send_key(key, down_ms).await.map(drop),
        RpcRequest::SendUp { key } => dispatcher.send_key_up(key).await.map(drop),
        RpcRequest::SendDown { key } => dispatcher.send_key_down(key).await.map(drop),
        RpcRequest::SendMouse {
            width,
            height,
            x,
            y,
            action,
        } => dispatcher
            .send_mouse(width, height, x, y, action)
            .await
            .map(drop),
    };

    match outcome {
        Ok(()) => RpcResponse::ack(),
        Err(e) => {
            warn!("request failed: {e}");
            RpcResponse::error(e.to_string())
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

fn spawn_worker(dispatcher: Arc<CommandDispatcher>) -> mpsc::Sender<RpcCall> {
    let (tx, mut rx) = mpsc::channel::<RpcCall>(WORKER_QUEUE_DEPTH);
    tokio::spawn(async move {
        while let Some(call) = rx.recv().await {
            let response = handle_request(&dispatcher, call.request).await;
            // The connection may have gone away while we were busy.
            let _ = call.reply.send(response);
        }
        debug!("dispatch worker stopped");
    });
    tx
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn serve_connection(stream: TcpStream, worker: mpsc::Sender<RpcCall>) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await.context("read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => {
                debug!(?request, "request received");
                forward(&worker, request).await?
            }
            Err(e) => {
                warn!("malformed request: {e}");
                RpcResponse::error(format!("malformed request: {e}"))
            }
        };

        let mut out = serde_json::to_vec(&response).context("encode response")?;
        out.push(b'\n');
        write_half.write_all(&out).await.context("write response")?;
    }
    Ok(())
}

async fn forward(worker: &mpsc::Sender<RpcCall>, request: RpcRequest) -> anyhow::Result<RpcResponse> {
    let (reply, response) = oneshot::channel();
    worker
        .send(RpcCall { request, reply })
        .await
        .map_err(|_| anyhow::anyhow!("dispatch worker is gone"))?;
    response.await.context("dispatch worker dropped the request")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::device::DeviceLink;
    use crate::infrastructure::cursor::FixedCursorLocator;
    use crate::infrastructure::serial::RecordingChannel;
    use keyrelay_core::domain::{CoordinateMode, MouseAction};

    fn make_dispatcher() -> (CommandDispatcher, RecordingChannel) {
        let recorder = RecordingChannel::new();
        let dispatcher = CommandDispatcher::new(
            DeviceLink::new(Box::new(recorder.clone())),
            Arc::new(FixedCursorLocator::new(0, 0)),
            Duration::ZERO,
        );
        (dispatcher, recorder)
    }

    #[tokio::test]
    async fn test_handle_init_reports_screen_mode() {
        let (dispatcher, recorder) = make_dispatcher();

        let resp = handle_request(
            &dispatcher,
            RpcRequest::Init {
                seed: Some(serde_json::json!([1, 2, 3])),
            },
        )
        .await;

        assert_eq!(resp, RpcResponse::init(CoordinateMode::Screen));
        assert!(recorder.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_handle_send_down_acks_and_writes() {
        let (dispatcher, recorder) = make_dispatcher();

        let resp = handle_request(&dispatcher, RpcRequest::SendDown { key: 1 }).await;

        assert_eq!(resp, RpcResponse::ack());
        assert_eq!(recorder.bytes(), vec![0x01, b'b']);
    }

    #[tokio::test]
    async fn test_handle_unknown_key_returns_error_response() {
        let (dispatcher, recorder) = make_dispatcher();

        let resp = handle_request(&dispatcher, RpcRequest::SendUp { key: 500 }).await;

        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("unknown key id: 500"));
        assert!(recorder.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_handle_write_failure_returns_error_response() {
        let (dispatcher, recorder) = make_dispatcher();
        recorder.set_failing(true);

        let resp = handle_request(&dispatcher, RpcRequest::SendDown { key: 0 }).await;

        assert!(!resp.ok);
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_handle_mouse_move_acks() {
        let (dispatcher, recorder) = make_dispatcher();

        let resp = handle_request(
            &dispatcher,
            RpcRequest::SendMouse {
                width: 0,
                height: 0,
                x: 2,
                y: -1,
                action: MouseAction::Move,
            },
        )
        .await;

        assert!(resp.ok);
        assert_eq!(recorder.bytes(), vec![0x03, 2, 0, 0xFF, 0xFF]);
    }

    #[tokio::test]
    async fn test_worker_answers_in_order() {
        // Arrange
        let (dispatcher, recorder) = make_dispatcher();
        let worker = spawn_worker(Arc::new(dispatcher));

        // Act
        let first = forward(&worker, RpcRequest::SendDown { key: 0 }).await.unwrap();
        let second = forward(&worker, RpcRequest::SendUp { key: 0 }).await.unwrap();

        // Assert
        assert!(first.ok && second.ok);
        assert_eq!(recorder.bytes(), vec![0x01, b'a', 0x02, b'a']);
    }

    #[tokio::test]
    async fn test_run_server_returns_ok_once_shutdown_flag_is_cleared() {
        // Arrange
        let (dispatcher, _recorder) = make_dispatcher();
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let server = tokio::spawn(run_server(listener, Arc::new(dispatcher), running.clone()));

        // Act
        running.store(false, Ordering::Relaxed);
        let result = timeout(Duration::from_secs(5), server).await;

        // Assert
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
