//! Native-messaging Host
//!
//! Reads frames from the browser, answers requests concurrently and funnels
//! every outbound frame through a single writer task so frames never
//! interleave on stdout.

pub mod bridge;
pub mod framing;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub use bridge::{NativeBridge, DEFAULT_REPLY_TIMEOUT};
pub use framing::{decode_frame, encode_frame, read_frame, write_frame, MAX_FRAME_LEN};

use crate::commands;
use crate::models::messages::{InboundFrame, OutboundFrame};
use crate::services::Coordinator;
use crate::utils::error::{AppError, AppResult};

/// Serve one browser connection until `reader` hits EOF.
pub async fn serve<R, W>(
    mut reader: R,
    writer: W,
    coordinator: Arc<Coordinator>,
    bridge: Arc<NativeBridge>,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
) -> AppResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let writer_task = tokio::spawn(writer_loop(writer, outbound, shutdown_rx));
    let mut tasks = JoinSet::new();

    let result = loop {
        let value = match read_frame(&mut reader).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                info!("browser closed the connection");
                break Ok(());
            }
            Err(AppError::Serialization(e)) => {
                warn!(error = %e, "dropping frame with invalid JSON");
                continue;
            }
            Err(e) => {
                error!(error = %e, "failed to read frame");
                break Err(e);
            }
        };

        match InboundFrame::from_value(value) {
            Ok(InboundFrame::Reply { reply_to, response }) => {
                bridge.resolve_reply(reply_to, response);
            }
            Ok(InboundFrame::Request { id, body }) => {
                let coordinator = coordinator.clone();
                let bridge = bridge.clone();
                tasks.spawn(async move {
                    let response = commands::handle(&coordinator, body).await;
                    if let Err(e) = bridge.send(OutboundFrame::Response { id, response }) {
                        warn!(id, error = %e, "response not delivered");
                    }
                });
            }
            Err(e) => warn!(error = %e, "ignoring unrecognized frame"),
        }

        // Reap finished handlers so the set does not grow unbounded.
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                error!(error = %e, "request handler panicked");
            }
        }
    };

    bridge.fail_pending();
    tasks.shutdown().await;
    let _ = shutdown_tx.send(());
    if let Err(e) = writer_task.await {
        error!(error = %e, "writer task failed");
    }
    result
}

async fn writer_loop<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    mut shutdown: oneshot::Receiver<()>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else { return };
                if !write_outbound(&mut writer, &frame).await {
                    return;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    // Flush whatever was queued before shutdown.
    while let Ok(frame) = outbound.try_recv() {
        if !write_outbound(&mut writer, &frame).await {
            return;
        }
    }
}

async fn write_outbound<W>(writer: &mut W, frame: &OutboundFrame) -> bool
where
    W: AsyncWrite + Unpin,
{
    let value = match serde_json::to_value(frame) {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "failed to serialize outbound frame");
            return true;
        }
    };
    match write_frame(writer, &value).await {
        Ok(()) => {
            debug!(kind = value["kind"].as_str().unwrap_or_default(), "frame written");
            true
        }
        Err(e) => {
            error!(error = %e, "stdout closed");
            false
        }
    }
}
