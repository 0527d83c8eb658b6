//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! # Serialix Core
//!
//! The transport-independent half of the serialix workspace: the serial port
//! contract shared by every backend.
//!
//! ## Core Components
//!
//! ### [`SerialPort`]
//!
//! An async trait describing a serial port. Backends implement the transport
//! primitives (open, close, read, write, modem lines, reconfiguration) and
//! inherit the framed convenience operations ([`SerialPort::read_until`],
//! [`SerialPort::read_line`], [`SerialPort::write_read_line`] and friends)
//! as well as the configuration setters, which reconfigure a live port.
//!
//! ### [`SerialConfig`]
//!
//! The user-settable communication parameters: baud rate, byte size, parity,
//! stop bits, flow control, timeouts, line terminator.
//!
//! ### [`SerialError`]
//!
//! The typed error surface every operation reports through. Backends never
//! leak raw lower-level errors other than wrapped [`std::io::Error`].
//!
//! ### [`Timeout`]
//!
//! A monotonic deadline helper used by the backends to implement
//! whole-operation deadlines.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod config;
mod error;
mod port;
mod timeout;

pub use self::config::{DataBits, Parity, Rs485Config, SerialConfig, StopBits};
pub use self::error::{SerialError, SerialResult};
pub use self::port::SerialPort;
pub use self::timeout::Timeout;
