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

//! Serial port configuration

use crate::{SerialError, SerialResult};
use std::time::Duration;

/// Number of data bits per character.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum DataBits {
    /// 5 data bits (Baudot-era equipment)
    Five,
    /// 6 data bits
    Six,
    /// 7 data bits (ASCII)
    Seven,
    /// 8 data bits
    #[default]
    Eight,
}

impl DataBits {
    /// The numeric byte size.
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity checking mode.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
    /// Parity bit always 1
    Mark,
    /// Parity bit always 0
    Space,
}

/// Number of stop bits per character.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum StopBits {
    /// 1 stop bit
    #[default]
    One,
    /// 1.5 stop bits
    OnePointFive,
    /// 2 stop bits
    Two,
}

/// RS-485 transceiver settings.
///
/// Carried in the configuration for backends that drive an RS-485
/// transceiver through the RTS line. Transports that cannot honor them
/// ignore the settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rs485Config {
    /// RTS level while transmitting
    pub rts_level_for_tx: bool,
    /// RTS level while receiving
    pub rts_level_for_rx: bool,
    /// Receive our own transmission
    pub loopback: bool,
    /// Delay after asserting RTS before transmitting
    pub delay_before_tx: Option<Duration>,
    /// Delay after transmitting before releasing RTS
    pub delay_before_rx: Option<Duration>,
}

impl Default for Rs485Config {
    fn default() -> Self {
        Self {
            rts_level_for_tx: true,
            rts_level_for_rx: false,
            loopback: false,
            delay_before_tx: None,
            delay_before_rx: None,
        }
    }
}

/// Serial port communication parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SerialConfig {
    /// Baud rate (bits per second)
    pub baudrate: u32,

    /// Number of data bits
    pub data_bits: DataBits,

    /// Parity checking
    pub parity: Parity,

    /// Number of stop bits
    pub stop_bits: StopBits,

    /// Read timeout applied per operation (None blocks forever)
    pub timeout: Option<Duration>,

    /// Maximum gap allowed between bytes of one read (None disables)
    pub inter_byte_timeout: Option<Duration>,

    /// Software flow control (XON/XOFF)
    pub xonxoff: bool,

    /// Hardware flow control (RTS/CTS)
    pub rtscts: bool,

    /// Hardware flow control (DSR/DTR)
    pub dsrdtr: bool,

    /// RS-485 transceiver settings (None disables RS-485 mode)
    pub rs485: Option<Rs485Config>,

    /// Line terminator used by the line-oriented operations
    pub eol: u8,

    /// Retry an operation once over a fresh connection after a transport error
    pub auto_reconnect: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: None,
            inter_byte_timeout: None,
            xonxoff: false,
            rtscts: false,
            dsrdtr: false,
            rs485: None,
            eol: b'\n',
            auto_reconnect: false,
        }
    }
}

impl SerialConfig {
    /// Create a configuration with default parameters (9600 8N1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baud rate
    pub fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    /// Set the number of data bits
    pub fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    /// Set the parity mode
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the number of stop bits
    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set the read timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the inter-byte timeout
    pub fn with_inter_byte_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inter_byte_timeout = timeout;
        self
    }

    /// Enable software flow control
    pub fn with_xonxoff(mut self, enabled: bool) -> Self {
        self.xonxoff = enabled;
        self
    }

    /// Enable RTS/CTS hardware flow control
    pub fn with_rtscts(mut self, enabled: bool) -> Self {
        self.rtscts = enabled;
        self
    }

    /// Enable DSR/DTR hardware flow control
    pub fn with_dsrdtr(mut self, enabled: bool) -> Self {
        self.dsrdtr = enabled;
        self
    }

    /// Set the RS-485 transceiver settings
    pub fn with_rs485(mut self, rs485: Option<Rs485Config>) -> Self {
        self.rs485 = rs485;
        self
    }

    /// Set the line terminator
    pub fn with_eol(mut self, eol: u8) -> Self {
        self.eol = eol;
        self
    }

    /// Enable automatic reconnection
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Check the configuration for parameter combinations no backend can
    /// honor.
    ///
    /// XON/XOFF and RTS/CTS flow control are mutually exclusive; a zero baud
    /// rate is rejected before it reaches the wire.
    pub fn validate(&self) -> SerialResult<()> {
        if self.baudrate == 0 {
            return Err(SerialError::Config(format!(
                "not a valid baudrate: {}",
                self.baudrate
            )));
        }
        if self.rtscts && self.xonxoff {
            return Err(SerialError::Config(
                "xonxoff and rtscts together are not supported".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_9600_8n1() {
        let config = SerialConfig::default();
        assert_eq!(config.baudrate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.eol, b'\n');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let config = SerialConfig::new()
            .with_baudrate(115_200)
            .with_data_bits(DataBits::Seven)
            .with_parity(Parity::Even)
            .with_stop_bits(StopBits::Two)
            .with_timeout(Some(Duration::from_secs(1)));
        assert_eq!(config.baudrate, 115_200);
        assert_eq!(config.data_bits.bits(), 7);
        assert_eq!(config.parity, Parity::Even);
        assert_eq!(config.stop_bits, StopBits::Two);
        assert_eq!(config.timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn zero_baudrate_rejected() {
        let config = SerialConfig::new().with_baudrate(0);
        assert!(matches!(config.validate(), Err(SerialError::Config(_))));
    }

    #[test]
    fn exclusive_flow_control_rejected() {
        let config = SerialConfig::new().with_rtscts(true).with_xonxoff(true);
        assert!(matches!(config.validate(), Err(SerialError::Config(_))));

        let config = SerialConfig::new().with_rtscts(true);
        assert!(config.validate().is_ok());
        let config = SerialConfig::new().with_xonxoff(true);
        assert!(config.validate().is_ok());
    }
}
