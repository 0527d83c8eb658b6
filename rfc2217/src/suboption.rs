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

use crate::OptionState;
use crate::consts::comport;
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use tokio::sync::watch;
use tracing::debug;

/// One negotiable Com Port parameter (RFC 2217 sub-sub option).
///
/// Tracks the value last requested from the server and the answer state.
/// The server acknowledges a request by echoing the value back under the
/// ack code (client code + 100); the comparison is a prefix match, so a
/// server that appends informational bytes still acknowledges.
#[derive(Debug)]
pub struct ComPortParameter {
    name: &'static str,
    option: u8,
    ack_option: u8,
    value: Bytes,
    state: OptionState,
    state_tx: watch::Sender<OptionState>,
}

impl ComPortParameter {
    /// Create a parameter for the given client-to-server sub-option code.
    pub fn new(name: &'static str, option: u8) -> Self {
        let (state_tx, _) = watch::channel(OptionState::Inactive);
        Self {
            name,
            option,
            ack_option: option + comport::SERVER_OFFSET,
            value: Bytes::new(),
            state: OptionState::Inactive,
            state_tx,
        }
    }

    /// The parameter name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The server-to-client code this parameter is acknowledged under.
    pub fn ack_option(&self) -> u8 {
        self.ack_option
    }

    /// The current answer state.
    pub fn state(&self) -> OptionState {
        self.state
    }

    /// Whether the last requested value was acknowledged.
    pub fn active(&self) -> bool {
        self.state == OptionState::Active
    }

    /// The value last requested.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Record a new requested value and rearm the completion signal.
    /// Returns the `(sub-option, value)` pair to transmit.
    pub fn prepare(&mut self, value: Bytes) -> (u8, Bytes) {
        self.value = value.clone();
        self.state = OptionState::Requested;
        self.state_tx.send_replace(OptionState::Requested);
        (self.option, value)
    }

    /// Subscribe to the completion signal for the current request.
    pub fn subscribe(&self) -> watch::Receiver<OptionState> {
        self.state_tx.subscribe()
    }

    /// Check an incoming answer block. `suboption` has the sub-option
    /// header already cut off; a prefix match against the pending value
    /// acknowledges, anything else is a terminal rejection.
    pub fn check_answer(&mut self, suboption: &[u8]) {
        self.state = if suboption.len() >= self.value.len()
            && suboption[..self.value.len()] == self.value[..]
        {
            OptionState::Active
        } else {
            OptionState::ReallyInactive
        };
        self.state_tx.send_replace(self.state);
        debug!("SB answer {} -> {:02X?} -> {:?}", self.name, suboption, self.state);
    }
}

/// The six Com Port parameters of one connection.
#[derive(Debug)]
pub struct ParamTable {
    /// Baud rate (4-byte big-endian value)
    pub baudrate: ComPortParameter,
    /// Data bit size
    pub datasize: ComPortParameter,
    /// Parity
    pub parity: ComPortParameter,
    /// Stop bit size
    pub stopsize: ComPortParameter,
    /// Buffer purge
    pub purge: ComPortParameter,
    /// Control lines, break and flow control
    pub control: ComPortParameter,
}

impl ParamTable {
    /// Build the parameter set for one connection.
    pub fn new() -> Self {
        Self {
            baudrate: ComPortParameter::new("baudrate", comport::SET_BAUDRATE),
            datasize: ComPortParameter::new("datasize", comport::SET_DATASIZE),
            parity: ComPortParameter::new("parity", comport::SET_PARITY),
            stopsize: ComPortParameter::new("stopsize", comport::SET_STOPSIZE),
            purge: ComPortParameter::new("purge", comport::PURGE_DATA),
            control: ComPortParameter::new("control", comport::SET_CONTROL),
        }
    }

    /// Find the parameter acknowledged by the given server-to-client code.
    pub fn by_ack_option(&mut self, ack_option: u8) -> Option<&mut ComPortParameter> {
        [
            &mut self.baudrate,
            &mut self.datasize,
            &mut self.parity,
            &mut self.stopsize,
            &mut self.purge,
            &mut self.control,
        ]
        .into_iter()
        .find(|parameter| parameter.ack_option == ack_option)
    }
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a baud rate as the 4-byte network-byte-order SET_BAUDRATE value.
pub fn encode_baudrate(baudrate: u32) -> Bytes {
    let mut value = [0u8; 4];
    BigEndian::write_u32(&mut value, baudrate);
    Bytes::copy_from_slice(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_options_are_offset_by_100() {
        let params = ParamTable::new();
        assert_eq!(params.baudrate.ack_option(), comport::SERVER_SET_BAUDRATE);
        assert_eq!(params.datasize.ack_option(), comport::SERVER_SET_DATASIZE);
        assert_eq!(params.parity.ack_option(), comport::SERVER_SET_PARITY);
        assert_eq!(params.stopsize.ack_option(), comport::SERVER_SET_STOPSIZE);
        assert_eq!(params.purge.ack_option(), comport::SERVER_PURGE_DATA);
        assert_eq!(params.control.ack_option(), comport::SERVER_SET_CONTROL);
    }

    #[test]
    fn baudrate_payload_is_big_endian() {
        assert_eq!(&encode_baudrate(115_200)[..], &[0x00, 0x01, 0xC2, 0x00]);
        assert_eq!(&encode_baudrate(9_600)[..], &[0x00, 0x00, 0x25, 0x80]);
    }

    #[test]
    fn matching_echo_acknowledges() {
        let mut params = ParamTable::new();
        let (option, value) = params.baudrate.prepare(encode_baudrate(115_200));
        assert_eq!(option, comport::SET_BAUDRATE);
        assert_eq!(&value[..], &[0x00, 0x01, 0xC2, 0x00]);
        assert_eq!(params.baudrate.state(), OptionState::Requested);

        params.baudrate.check_answer(&[0x00, 0x01, 0xC2, 0x00]);
        assert!(params.baudrate.active());
    }

    #[test]
    fn prefix_match_acknowledges_longer_echo() {
        let mut parameter = ComPortParameter::new("control", comport::SET_CONTROL);
        parameter.prepare(Bytes::from_static(&[comport::SET_CONTROL_DTR_ON]));
        parameter.check_answer(&[comport::SET_CONTROL_DTR_ON, 0x00]);
        assert!(parameter.active());
    }

    #[test]
    fn mismatched_echo_is_terminal() {
        let mut params = ParamTable::new();
        params.baudrate.prepare(encode_baudrate(115_200));
        params.baudrate.check_answer(&[0x00, 0x00, 0x04, 0x00]);
        assert_eq!(params.baudrate.state(), OptionState::ReallyInactive);
        assert!(!params.baudrate.active());
    }

    #[test]
    fn prepare_rearms_after_rejection() {
        let mut parameter = ComPortParameter::new("baudrate", comport::SET_BAUDRATE);
        parameter.prepare(encode_baudrate(115_200));
        parameter.check_answer(&[0x00, 0x00, 0x04, 0x00]);
        assert_eq!(parameter.state(), OptionState::ReallyInactive);

        parameter.prepare(encode_baudrate(9_600));
        assert_eq!(parameter.state(), OptionState::Requested);
        parameter.check_answer(&encode_baudrate(9_600)[..]);
        assert!(parameter.active());
    }

    #[test]
    fn completion_signal_follows_state() {
        let mut parameter = ComPortParameter::new("purge", comport::PURGE_DATA);
        let mut signal = parameter.subscribe();
        parameter.prepare(Bytes::from_static(&[comport::PURGE_RECEIVE_BUFFER]));
        assert_eq!(*signal.borrow_and_update(), OptionState::Requested);
        parameter.check_answer(&[comport::PURGE_RECEIVE_BUFFER]);
        assert_eq!(*signal.borrow_and_update(), OptionState::Active);
    }
}
