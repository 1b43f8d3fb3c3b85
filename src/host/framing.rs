//! Native-messaging framing
//!
//! Each message is a 32-bit length in native byte order followed by that many
//! bytes of UTF-8 JSON.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::utils::error::{AppError, AppResult};

/// Largest frame accepted from the browser (64 MiB).
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

const HEADER_LEN: usize = 4;

/// Encode one JSON value as a length-prefixed frame.
pub fn encode_frame(value: &Value) -> AppResult<Vec<u8>> {
    let body = serde_json::to_vec(value)?;
    let len = u32::try_from(body.len())
        .map_err(|_| AppError::validation(format!("Frame too large: {} bytes", body.len())))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decode one frame from the front of `input`.
///
/// Returns `Ok(None)` when more bytes are needed, otherwise the value and the
/// number of bytes consumed.
pub fn decode_frame(input: &[u8]) -> AppResult<Option<(Value, usize)>> {
    let Some(header) = input.get(..HEADER_LEN) else {
        return Ok(None);
    };
    let len = body_len(header)?;
    let Some(body) = input.get(HEADER_LEN..HEADER_LEN + len) else {
        return Ok(None);
    };
    Ok(Some((serde_json::from_slice(body)?, HEADER_LEN + len)))
}

fn body_len(header: &[u8]) -> AppResult<usize> {
    let mut bytes = [0u8; HEADER_LEN];
    bytes.copy_from_slice(header);
    let len = u32::from_ne_bytes(bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(AppError::validation(format!(
            "Frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_LEN
        )));
    }
    Ok(len)
}

/// Read the next frame. `Ok(None)` means the browser closed the pipe.
pub async fn read_frame<R>(reader: &mut R) -> AppResult<Option<Value>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = body_len(&header)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, value: &Value) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(value)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
