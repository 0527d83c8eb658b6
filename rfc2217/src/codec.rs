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

use super::{TelnetEvent, consts};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serialix_core::SerialError;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// A codec for the telnet layer of the RFC 2217 protocol.
///
/// The decoder classifies the incoming byte stream one byte at a time into
/// [`TelnetEvent`]s; feeding it arbitrary chunk boundaries yields the same
/// event sequence as feeding one large buffer. Unlike a general telnet
/// codec, data bytes received while a subnegotiation is open are collected
/// into the subnegotiation payload rather than emitted, since RFC 2217
/// servers interleave data and Com Port sub-options freely on one stream.
///
/// The encoder produces the outbound frames the client transmits: user data
/// with every `IAC` doubled, negotiation triples, and subnegotiation frames
/// whose value bytes are escaped while the frame structure is not.
pub struct Rfc2217Codec {
    state: DecoderState,
    suboption: Option<BytesMut>,
}

impl Rfc2217Codec {
    /// Creates a new codec in the normal-data state.
    pub fn new() -> Rfc2217Codec {
        Rfc2217Codec::default()
    }

    fn emit(&mut self, byte: u8) -> Option<TelnetEvent> {
        if let Some(buffer) = self.suboption.as_mut() {
            buffer.put_u8(byte);
            None
        } else {
            Some(TelnetEvent::Data(byte))
        }
    }
}

impl Default for Rfc2217Codec {
    fn default() -> Self {
        Rfc2217Codec {
            state: DecoderState::Normal,
            suboption: None,
        }
    }
}

impl Decoder for Rfc2217Codec {
    type Item = TelnetEvent;
    type Error = SerialError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetEvent>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            match (self.state, byte) {
                (DecoderState::Normal, consts::IAC) => {
                    self.state = DecoderState::IacSeen;
                }
                (DecoderState::Normal, _) => {
                    if let Some(event) = self.emit(byte) {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::IacSeen, consts::IAC) => {
                    // doubled IAC is a literal 0xFF data byte
                    self.state = DecoderState::Normal;
                    if let Some(event) = self.emit(consts::IAC) {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::IacSeen, consts::SB) => {
                    self.state = DecoderState::Normal;
                    self.suboption = Some(BytesMut::new());
                }
                (DecoderState::IacSeen, consts::SE) => {
                    self.state = DecoderState::Normal;
                    match self.suboption.take() {
                        Some(payload) => return Ok(Some(TelnetEvent::Suboption(payload))),
                        None => warn!("IAC SE without a pending subnegotiation"),
                    }
                }
                (
                    DecoderState::IacSeen,
                    consts::DO | consts::DONT | consts::WILL | consts::WONT,
                ) => {
                    self.state = DecoderState::Negotiate(byte);
                }
                (DecoderState::IacSeen, _) => {
                    self.state = DecoderState::Normal;
                    return Ok(Some(TelnetEvent::Command(byte)));
                }
                (DecoderState::Negotiate(command), _) => {
                    self.state = DecoderState::Normal;
                    return Ok(Some(TelnetEvent::Negotiation(command, byte)));
                }
            }
        }
        Ok(None)
    }
}

///
/// Outbound frames the client transmits.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetFrame {
    /// User payload; every 0xFF byte is doubled on the wire.
    Data(Bytes),
    /// `IAC <command> <option>`.
    Negotiation(u8, u8),
    /// `IAC SB COM_PORT_OPTION <suboption> <value> IAC SE` with IAC bytes
    /// inside `value` doubled.
    Suboption(u8, Bytes),
}

impl Encoder<TelnetFrame> for Rfc2217Codec {
    type Error = SerialError;

    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetFrame::Data(payload) => {
                escape_iac(&payload, dst);
            }
            TelnetFrame::Negotiation(command, option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(command);
                dst.put_u8(option);
            }
            TelnetFrame::Suboption(suboption, value) => {
                dst.reserve(6 + 2 * value.len());
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(consts::option::COM_PORT_OPTION);
                dst.put_u8(suboption);
                escape_iac(&value, dst);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
        }
        Ok(())
    }
}

/// Append `data` to `dst` with every `IAC` (0xFF) byte doubled.
pub fn escape_iac(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(data.len());
    for &byte in data {
        if byte == consts::IAC {
            dst.put_u8(consts::IAC);
        }
        dst.put_u8(byte);
    }
}

#[derive(Clone, Copy, Debug)]
enum DecoderState {
    /// Normal data
    Normal,
    /// Received IAC, next byte is a command
    IacSeen,
    /// Received DO/DONT/WILL/WONT, next byte is the option
    Negotiate(u8),
}
