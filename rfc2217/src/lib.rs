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

//! # Serialix RFC 2217 Transport
//!
//! A client for remote serial ports driven over the RFC 2217 Telnet Com
//! Port Control protocol, as served by ser2net, sredird and most terminal
//! servers.
//!
//! ## Overview
//!
//! RFC 2217 rides on a telnet connection (RFC 854): the raw serial byte
//! stream shares the wire with telnet option negotiation and with Com Port
//! subnegotiations that set the baud rate, byte size, parity, stop bits,
//! control lines and buffer purges, and that carry modem/line state
//! notifications back from the server.
//!
//! ## Core Components
//!
//! ### [`Rfc2217Port`]
//!
//! The serial port facade. It implements the
//! [`SerialPort`](serialix_core::SerialPort) contract: `open` connects and
//! negotiates, `read`/`write` move payload bytes with IAC escaping handled
//! transparently, the setters reconfigure the remote side, and the modem
//! line accessors answer from the server-pushed state cache.
//!
//! ### [`Rfc2217Codec`]
//!
//! The stateful byte classifier between the socket and everything else.
//! One instance lives in the background reader task; the encoder half
//! builds the outbound negotiation and subnegotiation frames.
//!
//! ### [`OptionTable`] and [`ParamTable`]
//!
//! Negotiation state: the telnet options this client speaks (ECHO, SGA,
//! BINARY and COM-PORT, each per direction) and the six Com Port
//! parameters with their request/acknowledge tracking.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use serialix_core::SerialPort;
//! use serialix_rfc2217::Rfc2217Port;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut port = Rfc2217Port::new("rfc2217://192.168.0.100:6610?poll_modem")?;
//! port.open().await?;
//! port.set_baudrate(115200).await?;
//! port.write(b"*IDN?\n").await?;
//! let answer = port.read_line(None).await?;
//! println!("{}", String::from_utf8_lossy(&answer));
//! port.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire Protocol Notes
//!
//! - 0xFF (`IAC`) is doubled in both directions, in user data and inside
//!   subnegotiation values.
//! - Com Port requests are acknowledged by the server echoing the value
//!   under the request code + 100; acknowledgment is a prefix match.
//! - Modem and line state arrive unsolicited; `poll_modem` additionally
//!   requests a refresh when the cached state goes stale.

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

mod codec;
pub mod consts;
mod event;
mod options;
mod port;
mod reader;
mod suboption;
mod url;

pub use self::codec::{Rfc2217Codec, TelnetFrame, escape_iac};
pub use self::event::TelnetEvent;
pub use self::options::{OptionState, OptionTable, TelnetOption};
pub use self::port::Rfc2217Port;
pub use self::suboption::{ComPortParameter, ParamTable, encode_baudrate};
pub use self::url::{PortUrl, UrlOptions, parse_url};
