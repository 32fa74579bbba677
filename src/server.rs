//! JSON-lines stdio server and permission watcher

use crate::probe::{PermissionProbe, PermissionReport};
use crate::protocol::{ErrorCode, Message, MessageContent, Request, ResponseData};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::oneshot;

/// Answer one request line. The caller's `id` is echoed on every response it can be read from.
pub fn handle_line(probe: &PermissionProbe, line: &str) -> Message {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return Message::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {}", e));
        }
    };

    let id = value.get("id").cloned();

    match value.get("protocol_version").and_then(|v| v.as_str()) {
        Some(version) if version == Message::PROTOCOL_VERSION => {}
        Some(other) => {
            return Message::error(
                ErrorCode::InvalidRequest,
                format!("Unsupported protocol version: {}", other),
            )
            .with_id(id);
        }
        None => {
            return Message::error(ErrorCode::InvalidRequest, "Missing protocol_version")
                .with_id(id);
        }
    }

    let message: Message = match serde_json::from_value(value.clone()) {
        Ok(msg) => msg,
        Err(e) => {
            let reason = match value.get("method") {
                Some(serde_json::Value::String(method)) => format!("Unknown method: {}", method),
                Some(method) => format!("Unknown method: {}", method),
                None => format!("Invalid request: {}", e),
            };
            return Message::error(ErrorCode::InvalidRequest, reason).with_id(id);
        }
    };

    let request = match message.content {
        MessageContent::Request(req) => req,
        MessageContent::Response(_) => {
            return Message::error(ErrorCode::InvalidRequest, "Expected request, got response")
                .with_id(id);
        }
    };

    handle_request(probe, request).with_id(id)
}

fn handle_request(probe: &PermissionProbe, request: Request) -> Message {
    tracing::debug!(?request, "Handling request");

    let result = match request {
        Request::IsTrusted => probe
            .is_trusted()
            .map(|trusted| ResponseData::Trusted { trusted }),
        Request::IsTrustedPrompt => probe
            .is_trusted_prompt()
            .map(|trusted| ResponseData::Trusted { trusted }),
        Request::IsMasEnvironment => probe
            .is_mas_environment()
            .map(|sandboxed| ResponseData::Sandboxed { sandboxed }),
        Request::GetPermissionStatus => probe.get_permission_status().map(ResponseData::Status),
    };

    match result {
        Ok(data) => Message::success(data),
        Err(e) => {
            tracing::warn!("Request {:?} failed: {}", request, e);
            Message::from(e)
        }
    }
}

async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let json = serde_json::to_string(value).context("Failed to serialize message")?;
    writer
        .write_all(json.as_bytes())
        .await
        .context("Failed to write message")?;
    writer
        .write_all(b"\n")
        .await
        .context("Failed to write newline")?;
    writer.flush().await.context("Failed to flush output")?;
    Ok(())
}

/// Serve requests from `reader` until EOF or shutdown, one response line per request line
pub async fn serve<R, W>(
    probe: Arc<PermissionProbe>,
    mut reader: R,
    mut writer: W,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();

        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::info!("Server shutting down");
                break;
            }
            result = reader.read_line(&mut line) => {
                let read = result.context("Error reading request")?;
                if read == 0 {
                    tracing::info!("Input closed, shutting down");
                    break;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let response = handle_line(&probe, trimmed);
                write_json(&mut writer, &response).await?;
            }
        }
    }

    Ok(())
}

/// Emit a report line whenever the permission state changes, starting with the current one.
///
/// A failing query ends the watch with that error. A zero interval is rejected.
pub async fn watch<W>(
    probe: Arc<PermissionProbe>,
    interval: Duration,
    mut writer: W,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if interval.is_zero() {
        anyhow::bail!("poll interval must be non-zero");
    }

    let mut ticker = tokio::time::interval(interval);
    let mut last: Option<PermissionReport> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::info!("Watch stopped");
                break;
            }
            _ = ticker.tick() => {
                let report = probe
                    .get_permission_status()
                    .context("Failed to read permission status")?;

                if last.as_ref() != Some(&report) {
                    tracing::info!(trusted = report.trusted, sandboxed = report.sandboxed, "Permission state changed");
                    write_json(&mut writer, &report).await?;
                    last = Some(report);
                }
            }
        }
    }

    Ok(())
}
