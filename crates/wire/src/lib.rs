// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loadtest-wire: the parent<->worker message protocol and its wire
//! encoding. Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod message;

/// Framed codec (`encode`/`decode`/`read_message`/`write_message`,
/// `MAX_FRAME_BYTES`) for the out-of-process worker boundary — a child
/// reached over a pipe or socket rather than an in-process task. The current
/// `SimulatedWorker` (loadtest-adapters) is in-process and exchanges
/// `WorkerMessage`s over an `mpsc` channel directly, so this codec is
/// exercised by its own tests but has no caller yet; a process-based
/// `WorkerFactory` is what wires it up.
pub use codec::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME_BYTES};
/// `ParentMessage::Start` is the framed counterpart of `WorkerFactory::spawn`'s
/// direct `Spec` argument — needed once a worker is an actual child process
/// reading its `start` message off a pipe instead of receiving it as a
/// function argument.
pub use message::{ParentMessage, WorkerMessage};
