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

//! The serial port contract

use crate::{DataBits, Parity, Rs485Config, SerialConfig, SerialError, SerialResult, StopBits, Timeout};
use bytes::{Bytes, BytesMut};
use std::time::Duration;

/// The transport-independent serial port contract.
///
/// Backends implement the transport primitives; the framed operations and
/// the configuration setters are provided on top of them. All provided
/// setters reconfigure a live port through [`SerialPort::reconfigure`], so a
/// parameter change on an open port takes effect immediately.
#[async_trait::async_trait]
pub trait SerialPort: Send + Sync {
    /// The port identity, as given at construction (usually a URL).
    fn name(&self) -> &str;

    /// Current communication parameters.
    fn config(&self) -> &SerialConfig;

    /// Mutable access to the communication parameters.
    ///
    /// Mutating the configuration directly does not reconfigure an open
    /// port; use the setters for that.
    fn config_mut(&mut self) -> &mut SerialConfig;

    /// Whether the port is open.
    fn is_open(&self) -> bool;

    /// Open the port.
    async fn open(&mut self) -> SerialResult<()>;

    /// Close the port. Idempotent.
    async fn close(&mut self) -> SerialResult<()>;

    /// Apply the current configuration to an open port.
    async fn reconfigure(&mut self) -> SerialResult<()>;

    /// Read exactly `size` bytes under a caller-provided deadline, or
    /// fewer if the stream ends first.
    ///
    /// The transport consults `deadline.time_left()` before every
    /// suspension point, so a composed operation can spread one time
    /// budget over several reads. Expiry surfaces as a typed
    /// connection-timeout error and leaves undelivered bytes buffered.
    async fn read_with_deadline(
        &self,
        size: usize,
        deadline: &mut Timeout,
    ) -> SerialResult<Bytes>;

    /// Read exactly `size` bytes, or fewer if the stream ends first.
    ///
    /// One deadline built from the configured read timeout covers the
    /// whole read.
    async fn read(&self, size: usize) -> SerialResult<Bytes> {
        let mut deadline = Timeout::new(self.config().timeout);
        self.read_with_deadline(size, &mut deadline).await
    }

    /// Write the given bytes, returning the number of payload bytes
    /// written.
    async fn write(&self, data: &[u8]) -> SerialResult<usize>;

    /// Number of bytes buffered locally and available without blocking.
    async fn in_waiting(&self) -> SerialResult<usize>;

    /// Discard everything in the input buffer.
    async fn reset_input_buffer(&self) -> SerialResult<()>;

    /// Abort any pending output and discard the output buffer.
    async fn reset_output_buffer(&self) -> SerialResult<()>;

    /// Set the Request To Send line.
    async fn set_rts(&mut self, level: bool) -> SerialResult<()>;

    /// Set the Data Terminal Ready line.
    async fn set_dtr(&mut self, level: bool) -> SerialResult<()>;

    /// Set the break condition on the transmit line.
    async fn set_break_condition(&mut self, level: bool) -> SerialResult<()>;

    /// Read the Clear To Send line.
    async fn cts(&self) -> SerialResult<bool>;

    /// Read the Data Set Ready line.
    async fn dsr(&self) -> SerialResult<bool>;

    /// Read the Ring Indicator line.
    async fn ri(&self) -> SerialResult<bool>;

    /// Read the Carrier Detect line.
    async fn cd(&self) -> SerialResult<bool>;

    // ------------------------------------------------------------------
    // Configuration setters
    // ------------------------------------------------------------------

    /// Change the baud rate, reconfiguring a live port.
    async fn set_baudrate(&mut self, baudrate: u32) -> SerialResult<()> {
        if baudrate == 0 {
            return Err(SerialError::Config(format!(
                "not a valid baudrate: {baudrate}"
            )));
        }
        self.config_mut().baudrate = baudrate;
        self.reconfigure_if_open().await
    }

    /// Change the number of data bits, reconfiguring a live port.
    async fn set_data_bits(&mut self, data_bits: DataBits) -> SerialResult<()> {
        self.config_mut().data_bits = data_bits;
        self.reconfigure_if_open().await
    }

    /// Change the parity mode, reconfiguring a live port.
    async fn set_parity(&mut self, parity: Parity) -> SerialResult<()> {
        self.config_mut().parity = parity;
        self.reconfigure_if_open().await
    }

    /// Change the number of stop bits, reconfiguring a live port.
    async fn set_stop_bits(&mut self, stop_bits: StopBits) -> SerialResult<()> {
        self.config_mut().stop_bits = stop_bits;
        self.reconfigure_if_open().await
    }

    /// Change the read timeout.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> SerialResult<()> {
        self.config_mut().timeout = timeout;
        Ok(())
    }

    /// Change the inter-byte timeout.
    async fn set_inter_byte_timeout(&mut self, timeout: Option<Duration>) -> SerialResult<()> {
        self.config_mut().inter_byte_timeout = timeout;
        Ok(())
    }

    /// Change the software flow control setting, reconfiguring a live port.
    async fn set_xonxoff(&mut self, enabled: bool) -> SerialResult<()> {
        self.config_mut().xonxoff = enabled;
        self.reconfigure_if_open().await
    }

    /// Change the RTS/CTS flow control setting, reconfiguring a live port.
    async fn set_rtscts(&mut self, enabled: bool) -> SerialResult<()> {
        self.config_mut().rtscts = enabled;
        self.reconfigure_if_open().await
    }

    /// Change the DSR/DTR flow control setting, reconfiguring a live port.
    ///
    /// `None` follows the RTS/CTS setting, mirroring the historical
    /// behavior of serial libraries where `dsrdtr` defaulted to `rtscts`.
    async fn set_dsrdtr(&mut self, enabled: Option<bool>) -> SerialResult<()> {
        let value = enabled.unwrap_or(self.config().rtscts);
        self.config_mut().dsrdtr = value;
        self.reconfigure_if_open().await
    }

    /// Change the RS-485 settings, reconfiguring a live port.
    async fn set_rs485(&mut self, rs485: Option<Rs485Config>) -> SerialResult<()> {
        self.config_mut().rs485 = rs485;
        self.reconfigure_if_open().await
    }

    /// Reconfigure only when the port is open.
    async fn reconfigure_if_open(&mut self) -> SerialResult<()> {
        if self.is_open() {
            self.reconfigure().await
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Framed operations
    // ------------------------------------------------------------------

    /// Read until `separator` is found, the optional `size` cap is reached
    /// or the stream ends. The separator is included in the returned
    /// bytes.
    ///
    /// One deadline built from the configured read timeout covers the
    /// whole operation, not each byte: the remaining budget is threaded
    /// through every single-byte read, and expiry surfaces as a typed
    /// connection-timeout error.
    async fn read_until(&self, separator: &[u8], size: Option<usize>) -> SerialResult<Bytes> {
        let mut line = BytesMut::new();
        let mut deadline = Timeout::new(self.config().timeout);
        loop {
            let chunk = self.read_with_deadline(1, &mut deadline).await?;
            if chunk.is_empty() {
                break;
            }
            line.extend_from_slice(&chunk);
            if line.len() >= separator.len() && line[line.len() - separator.len()..] == *separator
            {
                break;
            }
            if let Some(size) = size {
                if line.len() >= size {
                    break;
                }
            }
        }
        Ok(line.freeze())
    }

    /// Read one line, terminated by `eol` or the configured line
    /// terminator.
    async fn read_line(&self, eol: Option<u8>) -> SerialResult<Bytes> {
        let eol = eol.unwrap_or(self.config().eol);
        self.read_until(&[eol], None).await
    }

    /// Read `n` lines.
    async fn read_lines(&self, n: usize, eol: Option<u8>) -> SerialResult<Vec<Bytes>> {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(self.read_line(eol).await?);
        }
        Ok(lines)
    }

    /// Write several chunks as one payload.
    async fn write_lines(&self, lines: &[&[u8]]) -> SerialResult<usize> {
        let mut joined = BytesMut::new();
        for line in lines {
            joined.extend_from_slice(line);
        }
        self.write(&joined).await
    }

    /// Write `data`, then read one line.
    async fn write_read_line(&self, data: &[u8], eol: Option<u8>) -> SerialResult<Bytes> {
        self.write(data).await?;
        self.read_line(eol).await
    }

    /// Write `data`, then read `n` lines.
    async fn write_read_lines(
        &self,
        data: &[u8],
        n: usize,
        eol: Option<u8>,
    ) -> SerialResult<Vec<Bytes>> {
        self.write(data).await?;
        self.read_lines(n, eol).await
    }

    /// Write several chunks, then read `n` lines (one per chunk when `n` is
    /// not given).
    async fn write_lines_read_lines(
        &self,
        lines: &[&[u8]],
        n: Option<usize>,
        eol: Option<u8>,
    ) -> SerialResult<Vec<Bytes>> {
        let n = n.unwrap_or(lines.len());
        self.write_lines(lines).await?;
        self.read_lines(n, eol).await
    }

    /// Read every byte currently buffered locally.
    async fn read_buffer(&self) -> SerialResult<Bytes> {
        let available = self.in_waiting().await?;
        if available == 0 {
            return Ok(Bytes::new());
        }
        self.read(available).await
    }

    /// Send a timed break condition, returning to idle afterwards.
    async fn send_break(&mut self, duration: Duration) -> SerialResult<()> {
        if !self.is_open() {
            return Err(SerialError::NotOpen(self.name().to_string()));
        }
        self.set_break_condition(true).await?;
        tokio::time::sleep(duration).await;
        self.set_break_condition(false).await
    }
}
