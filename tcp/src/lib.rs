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

//! # Serialix TCP Transport
//!
//! A raw TCP pass-through implementation of the
//! [`SerialPort`](serialix_core::SerialPort) contract, for devices that
//! expose their serial port as a plain socket without any control channel.
//!
//! Bytes travel unmodified in both directions. Communication parameters
//! cannot be changed over a raw socket, so reconfiguration and modem line
//! access fail with a configuration error; everything line-oriented
//! (`read_until`, `write_read_line`, …) works as on any other port.
//!
//! ```rust,no_run
//! use serialix_core::SerialPort;
//! use serialix_tcp::TcpPort;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut port = TcpPort::new("tcp://192.168.0.100:4001")?;
//! port.open().await?;
//! let answer = port.write_read_line(b"*IDN?\n", None).await?;
//! # Ok(())
//! # }
//! ```

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

use bytes::{Bytes, BytesMut};
use serialix_core::{SerialConfig, SerialError, SerialPort, SerialResult, Timeout};
use std::mem;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Deadline for establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Socket read size of one turn.
const READ_CHUNK: usize = 1024;

struct ReadState {
    half: OwnedReadHalf,
    pending: BytesMut,
    eof: bool,
}

struct Connection {
    read: Mutex<ReadState>,
    write: Mutex<OwnedWriteHalf>,
}

/// A serial port that is really a raw TCP socket.
///
/// Addressed as `tcp://host:port` or plain `host:port`. `read` and `write`
/// take `&self` and never block each other.
pub struct TcpPort {
    name: String,
    host: String,
    port: u16,
    config: SerialConfig,
    conn: RwLock<Option<Arc<Connection>>>,
}

impl TcpPort {
    /// Create a port for the given address with default parameters.
    pub fn new(url: &str) -> SerialResult<Self> {
        Self::with_config(url, SerialConfig::default())
    }

    /// Create a port for the given address.
    pub fn with_config(url: &str, config: SerialConfig) -> SerialResult<Self> {
        let (host, port) = parse_address(url)?;
        Ok(Self {
            name: url.to_string(),
            host,
            port,
            config,
            conn: RwLock::new(None),
        })
    }

    fn connection(&self) -> SerialResult<Arc<Connection>> {
        self.conn
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| SerialError::NotOpen(self.name.clone()))
    }

    fn unsupported(&self, what: &str) -> SerialError {
        SerialError::Config(format!("{what} is not supported on a raw TCP connection"))
    }
}

fn parse_address(url: &str) -> SerialResult<(String, u16)> {
    let rest = url.strip_prefix("tcp://").unwrap_or(url);
    let error = || {
        SerialError::Config(format!(
            "expected a string in the form \"[tcp://]<host>:<port>\": {url}"
        ))
    };
    let (host, port) = rest.rsplit_once(':').ok_or_else(error)?;
    if host.is_empty() || host.contains('?') || port.contains('?') {
        return Err(error());
    }
    let port = port.parse::<u16>().map_err(|_| error())?;
    Ok((host.to_string(), port))
}

#[async_trait::async_trait]
impl SerialPort for TcpPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut SerialConfig {
        &mut self.config
    }

    fn is_open(&self) -> bool {
        self.conn.read().unwrap().is_some()
    }

    async fn open(&mut self) -> SerialResult<()> {
        if self.is_open() {
            return Err(SerialError::AlreadyOpen(self.name.clone()));
        }
        debug!("connecting to {}:{}", self.host, self.port);
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Err(_) => {
                return Err(SerialError::ConnectionTimeout {
                    operation: "connect",
                    host: self.host.clone(),
                    port: self.port,
                });
            }
            Ok(Err(err)) => {
                return Err(SerialError::ConnectFailed {
                    host: self.host.clone(),
                    port: self.port,
                    reason: err.to_string(),
                });
            }
            Ok(Ok(stream)) => stream,
        };
        if let Err(err) = stream.set_nodelay(true) {
            debug!("could not set TCP_NODELAY: {err}");
        }
        let (read_half, write_half) = stream.into_split();
        *self.conn.write().unwrap() = Some(Arc::new(Connection {
            read: Mutex::new(ReadState {
                half: read_half,
                pending: BytesMut::new(),
                eof: false,
            }),
            write: Mutex::new(write_half),
        }));
        info!("port {} open", self.name);
        Ok(())
    }

    async fn close(&mut self) -> SerialResult<()> {
        let conn = self.conn.write().unwrap().take();
        if let Some(conn) = conn {
            let mut writer = conn.write.lock().await;
            let _ = writer.shutdown().await;
            info!("port {} closed", self.name);
        }
        Ok(())
    }

    async fn reconfigure(&mut self) -> SerialResult<()> {
        Err(SerialError::Config(
            "cannot reconfigure a raw TCP serial connection".to_string(),
        ))
    }

    async fn read_with_deadline(
        &self,
        size: usize,
        deadline: &mut Timeout,
    ) -> SerialResult<Bytes> {
        let conn = self.connection()?;
        let mut state = conn.read.lock().await;
        let mut data = BytesMut::with_capacity(size);
        let mut scratch = [0u8; READ_CHUNK];
        loop {
            if !state.pending.is_empty() {
                let take = state.pending.len().min(size - data.len());
                data.unsplit(state.pending.split_to(take));
            }
            if data.len() >= size || state.eof {
                break;
            }
            let count = match deadline.time_left() {
                Some(left) => {
                    match tokio::time::timeout(left, state.half.read(&mut scratch)).await {
                        Err(_) => {
                            let consumed = data.len();
                            if consumed > 0 {
                                data.unsplit(mem::take(&mut state.pending));
                                state.pending = data;
                            }
                            return Err(SerialError::ConnectionTimeout {
                                operation: "read",
                                host: self.host.clone(),
                                port: self.port,
                            });
                        }
                        Ok(result) => result?,
                    }
                }
                None => state.half.read(&mut scratch).await?,
            };
            if count == 0 {
                state.eof = true;
            } else {
                state.pending.extend_from_slice(&scratch[..count]);
            }
        }
        if state.eof && data.is_empty() && size > 0 {
            return Err(SerialError::ConnectionClosed(
                "connection closed by peer".to_string(),
            ));
        }
        Ok(data.freeze())
    }

    async fn write(&self, data: &[u8]) -> SerialResult<usize> {
        let conn = self.connection()?;
        let mut writer = conn.write.lock().await;
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(data.len())
    }

    async fn in_waiting(&self) -> SerialResult<usize> {
        let conn = self.connection()?;
        let state = conn.read.lock().await;
        Ok(state.pending.len())
    }

    async fn reset_input_buffer(&self) -> SerialResult<()> {
        let conn = self.connection()?;
        let mut state = conn.read.lock().await;
        state.pending.clear();
        let mut scratch = [0u8; READ_CHUNK];
        loop {
            match state.half.try_read(&mut scratch) {
                Ok(0) => {
                    state.eof = true;
                    break;
                }
                Ok(_) => {}
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    async fn reset_output_buffer(&self) -> SerialResult<()> {
        self.connection()?;
        Ok(())
    }

    async fn set_rts(&mut self, _level: bool) -> SerialResult<()> {
        Err(self.unsupported("RTS"))
    }

    async fn set_dtr(&mut self, _level: bool) -> SerialResult<()> {
        Err(self.unsupported("DTR"))
    }

    async fn set_break_condition(&mut self, _level: bool) -> SerialResult<()> {
        Err(self.unsupported("break"))
    }

    async fn cts(&self) -> SerialResult<bool> {
        Err(self.unsupported("CTS"))
    }

    async fn dsr(&self) -> SerialResult<bool> {
        Err(self.unsupported("DSR"))
    }

    async fn ri(&self) -> SerialResult<bool> {
        Err(self.unsupported("RI"))
    }

    async fn cd(&self) -> SerialResult<bool> {
        Err(self.unsupported("CD"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn echo_server() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = [0u8; 1024];
            loop {
                match socket.read(&mut buffer).await {
                    Ok(0) | Err(_) => break,
                    Ok(count) => {
                        if socket.write_all(&buffer[..count]).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        addr
    }

    #[test]
    fn parse_addresses() {
        assert_eq!(
            parse_address("tcp://device:4001").unwrap(),
            ("device".to_string(), 4001)
        );
        assert_eq!(
            parse_address("device:4001").unwrap(),
            ("device".to_string(), 4001)
        );
        assert!(parse_address("device").is_err());
        assert!(parse_address("device:99999").is_err());
        assert!(parse_address("tcp://device:4001?opt").is_err());
    }

    #[tokio::test]
    async fn not_open_errors() {
        let port = TcpPort::new("tcp://127.0.0.1:1").unwrap();
        assert!(matches!(port.read(1).await, Err(SerialError::NotOpen(_))));
        assert!(matches!(
            port.write(b"x").await,
            Err(SerialError::NotOpen(_))
        ));
    }

    #[tokio::test]
    async fn echo_round_trip() {
        let addr = echo_server().await;
        let mut port = TcpPort::new(&format!("tcp://{addr}")).unwrap();
        port.open().await.unwrap();

        assert_eq!(port.write(b"hello\n").await.unwrap(), 6);
        assert_eq!(&port.read(5).await.unwrap()[..], b"hello");
        assert_eq!(&port.read(1).await.unwrap()[..], b"\n");

        let line = port.write_read_line(b"ping\n", None).await.unwrap();
        assert_eq!(&line[..], b"ping\n");

        port.close().await.unwrap();
        assert!(!port.is_open());
    }

    #[tokio::test]
    async fn bytes_pass_through_unmodified() {
        let addr = echo_server().await;
        let mut port = TcpPort::new(&format!("tcp://{addr}")).unwrap();
        port.open().await.unwrap();

        // 0xFF must not be doubled on a raw socket
        port.write(&[0x01, 0xFF, 0x02]).await.unwrap();
        assert_eq!(&port.read(3).await.unwrap()[..], &[0x01, 0xFF, 0x02]);

        port.close().await.unwrap();
    }

    #[tokio::test]
    async fn read_timeout_surfaces() {
        let addr = echo_server().await;
        let config = SerialConfig::new().with_timeout(Some(Duration::from_millis(50)));
        let mut port = TcpPort::with_config(&format!("tcp://{addr}"), config).unwrap();
        port.open().await.unwrap();

        let err = port.read(1).await.unwrap_err();
        assert!(err.is_timeout());

        port.close().await.unwrap();
    }

    #[tokio::test]
    async fn reconfigure_rejected() {
        let addr = echo_server().await;
        let mut port = TcpPort::new(&format!("tcp://{addr}")).unwrap();
        port.open().await.unwrap();
        assert!(matches!(
            port.set_baudrate(115_200).await,
            Err(SerialError::Config(_))
        ));
        port.close().await.unwrap();
    }
}
