// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire encoding for the parent<->worker protocol: 4-byte big-endian length
//! prefix + JSON payload. Used as-is by an out-of-process worker (pipe or
//! socket framed I/O); the in-process worker implementation in
//! `loadtest-adapters` exchanges the same [`crate::message::WorkerMessage`]
//! values directly over a channel and never touches this codec, but both
//! paths share one serialization format so swapping transports is a matter
//! of which side of this module a caller uses.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message exceeds max frame size ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("unexpected end of stream while reading frame")]
    UnexpectedEof,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Frames larger than this are rejected rather than silently buffered —
/// a malformed or hostile worker cannot force unbounded memory growth.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Serialize a value to JSON with no framing (used by tests and by callers
/// that already have their own transport framing, e.g. a WebSocket text frame).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one length-prefixed JSON frame.
pub async fn write_message<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
) -> Result<(), ProtocolError> {
    let payload = encode(value)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed JSON frame.
pub async fn read_message<R: AsyncRead + Unpin, T: DeserializeOwned>(
    reader: &mut R,
) -> Result<T, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::UnexpectedEof)
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    decode(&payload)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
