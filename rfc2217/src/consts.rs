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

//! RFC 854 / RFC 2217 wire constants, defined once.

use serialix_core::{DataBits, Parity, StopBits};

/// End of subnegotiation parameters.
pub const SE: u8 = 0xF0;
/// Subnegotiation begin.
pub const SB: u8 = 0xFA;
/// Sender wants to enable an option on its side.
pub const WILL: u8 = 0xFB;
/// Sender wants to disable an option on its side.
pub const WONT: u8 = 0xFC;
/// Sender asks the receiver to enable an option.
pub const DO: u8 = 0xFD;
/// Sender asks the receiver to disable an option.
pub const DONT: u8 = 0xFE;
/// Interpret As Command. Doubled to transmit a literal 0xFF data byte.
pub const IAC: u8 = 0xFF;

/// Readable name of a negotiation verb, for debug output.
pub fn command_name(command: u8) -> &'static str {
    match command {
        WILL => "WILL",
        WONT => "WONT",
        DO => "DO",
        DONT => "DONT",
        SB => "SB",
        SE => "SE",
        IAC => "IAC",
        _ => "?",
    }
}

/// Telnet option codes used by the Com Port Control protocol.
pub mod option {
    /// Binary Transmission (RFC 856)
    pub const BINARY: u8 = 0x00;
    /// Echo (RFC 857)
    pub const ECHO: u8 = 0x01;
    /// Suppress Go Ahead (RFC 858)
    pub const SGA: u8 = 0x03;
    /// Com Port Control Option (RFC 2217)
    pub const COM_PORT_OPTION: u8 = 0x2C;
}

/// Com Port Control sub-option codes and values (RFC 2217 section 2).
pub mod comport {
    /// Added to a client-to-server code to form the server-to-client ack.
    pub const SERVER_OFFSET: u8 = 100;

    /// Set the baud rate (4-byte value, network byte order)
    pub const SET_BAUDRATE: u8 = 1;
    /// Set the data bit size (1-byte value)
    pub const SET_DATASIZE: u8 = 2;
    /// Set the parity (1-byte value)
    pub const SET_PARITY: u8 = 3;
    /// Set the stop bit size (1-byte value)
    pub const SET_STOPSIZE: u8 = 4;
    /// Set control lines, break, or flow control (1-byte value)
    pub const SET_CONTROL: u8 = 5;
    /// Line state notification
    pub const NOTIFY_LINESTATE: u8 = 6;
    /// Modem state notification
    pub const NOTIFY_MODEMSTATE: u8 = 7;
    /// Remote asks us to suspend transmission
    pub const FLOWCONTROL_SUSPEND: u8 = 8;
    /// Remote allows transmission again
    pub const FLOWCONTROL_RESUME: u8 = 9;
    /// Set the line state notification mask
    pub const SET_LINESTATE_MASK: u8 = 10;
    /// Set the modem state notification mask
    pub const SET_MODEMSTATE_MASK: u8 = 11;
    /// Purge server-side buffers (1-byte value)
    pub const PURGE_DATA: u8 = 12;

    /// Server ack for [`SET_BAUDRATE`]
    pub const SERVER_SET_BAUDRATE: u8 = SET_BAUDRATE + SERVER_OFFSET;
    /// Server ack for [`SET_DATASIZE`]
    pub const SERVER_SET_DATASIZE: u8 = SET_DATASIZE + SERVER_OFFSET;
    /// Server ack for [`SET_PARITY`]
    pub const SERVER_SET_PARITY: u8 = SET_PARITY + SERVER_OFFSET;
    /// Server ack for [`SET_STOPSIZE`]
    pub const SERVER_SET_STOPSIZE: u8 = SET_STOPSIZE + SERVER_OFFSET;
    /// Server ack for [`SET_CONTROL`]
    pub const SERVER_SET_CONTROL: u8 = SET_CONTROL + SERVER_OFFSET;
    /// Server-pushed line state
    pub const SERVER_NOTIFY_LINESTATE: u8 = NOTIFY_LINESTATE + SERVER_OFFSET;
    /// Server-pushed modem state
    pub const SERVER_NOTIFY_MODEMSTATE: u8 = NOTIFY_MODEMSTATE + SERVER_OFFSET;
    /// Server ack for [`PURGE_DATA`]
    pub const SERVER_PURGE_DATA: u8 = PURGE_DATA + SERVER_OFFSET;

    /// SET_CONTROL: use no flow control
    pub const SET_CONTROL_USE_NO_FLOW_CONTROL: u8 = 1;
    /// SET_CONTROL: use software flow control (XON/XOFF)
    pub const SET_CONTROL_USE_SW_FLOW_CONTROL: u8 = 2;
    /// SET_CONTROL: use hardware flow control (RTS/CTS)
    pub const SET_CONTROL_USE_HW_FLOW_CONTROL: u8 = 3;
    /// SET_CONTROL: assert break
    pub const SET_CONTROL_BREAK_ON: u8 = 5;
    /// SET_CONTROL: release break
    pub const SET_CONTROL_BREAK_OFF: u8 = 6;
    /// SET_CONTROL: assert DTR
    pub const SET_CONTROL_DTR_ON: u8 = 8;
    /// SET_CONTROL: release DTR
    pub const SET_CONTROL_DTR_OFF: u8 = 9;
    /// SET_CONTROL: assert RTS
    pub const SET_CONTROL_RTS_ON: u8 = 11;
    /// SET_CONTROL: release RTS
    pub const SET_CONTROL_RTS_OFF: u8 = 12;

    /// PURGE_DATA: discard the server receive buffer
    pub const PURGE_RECEIVE_BUFFER: u8 = 1;
    /// PURGE_DATA: discard the server transmit buffer
    pub const PURGE_TRANSMIT_BUFFER: u8 = 2;
    /// PURGE_DATA: discard both server buffers
    pub const PURGE_BOTH_BUFFERS: u8 = 3;

    /// Modem state: Clear To Send
    pub const MODEMSTATE_MASK_CTS: u8 = 0x10;
    /// Modem state: Data Set Ready
    pub const MODEMSTATE_MASK_DSR: u8 = 0x20;
    /// Modem state: Ring Indicator
    pub const MODEMSTATE_MASK_RI: u8 = 0x40;
    /// Modem state: Carrier Detect
    pub const MODEMSTATE_MASK_CD: u8 = 0x80;

    /// Line state: data ready
    pub const LINESTATE_MASK_DATA_READY: u8 = 0x01;
    /// Line state: overrun error
    pub const LINESTATE_MASK_OVERRUN_ERROR: u8 = 0x02;
    /// Line state: parity error
    pub const LINESTATE_MASK_PARITY_ERROR: u8 = 0x04;
    /// Line state: framing error
    pub const LINESTATE_MASK_FRAMING_ERROR: u8 = 0x08;
    /// Line state: break detected
    pub const LINESTATE_MASK_BREAK_DETECT: u8 = 0x10;
    /// Line state: transmit holding register empty
    pub const LINESTATE_MASK_THR_EMPTY: u8 = 0x20;
    /// Line state: transmit shift register empty
    pub const LINESTATE_MASK_TSR_EMPTY: u8 = 0x40;
    /// Line state: timeout error
    pub const LINESTATE_MASK_TIMEOUT_ERROR: u8 = 0x80;
}

/// Wire encoding of a parity mode (RFC 2217 SET_PARITY values).
pub fn parity_code(parity: Parity) -> u8 {
    match parity {
        Parity::None => 1,
        Parity::Odd => 2,
        Parity::Even => 3,
        Parity::Mark => 4,
        Parity::Space => 5,
    }
}

/// Wire encoding of a stop bit count (RFC 2217 SET_STOPSIZE values).
pub fn stop_bits_code(stop_bits: StopBits) -> u8 {
    match stop_bits {
        StopBits::One => 1,
        StopBits::Two => 2,
        StopBits::OnePointFive => 3,
    }
}

/// Wire encoding of a data bit count (RFC 2217 SET_DATASIZE values).
pub fn data_bits_code(data_bits: DataBits) -> u8 {
    data_bits.bits()
}
