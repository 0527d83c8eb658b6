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

//! RFC 2217 serial port facade

use crate::codec::{Rfc2217Codec, TelnetFrame, escape_iac};
use crate::consts::{self, comport};
use crate::options::{OptionState, OptionTable};
use crate::reader;
use crate::suboption::{ComPortParameter, ParamTable, encode_baudrate};
use crate::url::{PortUrl, UrlOptions, parse_url};
use bytes::{BufMut, Bytes, BytesMut};
use futures::future::try_join_all;
use serialix_core::{SerialConfig, SerialError, SerialPort, SerialResult, Timeout};
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Encoder;
use tracing::{debug, info, warn};

/// Grace period the server gets after a close before a quick reconnect.
const CLOSE_TURNAROUND: Duration = Duration::from_millis(300);
/// Minimum time the reader task gets to drain and terminate on close.
const READER_JOIN_GRACE: Duration = Duration::from_secs(7);
/// How long a server-pushed modem state is considered fresh.
const MODEMSTATE_FRESHNESS: Duration = Duration::from_millis(300);
/// Poll interval while waiting for a modem state refresh.
const MODEM_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Last modem state pushed by the server, with a freshness deadline that
/// tells the facade when a proactive poll is warranted.
#[derive(Debug)]
pub(crate) struct ModemCache {
    value: Option<u8>,
    fresh: Timeout,
}

impl ModemCache {
    fn new() -> Self {
        Self {
            value: None,
            fresh: Timeout::expired_now(),
        }
    }

    pub(crate) fn update(&mut self, value: u8) {
        self.value = Some(value);
        self.fresh.restart(MODEMSTATE_FRESHNESS);
    }

    fn stale(&mut self) -> bool {
        self.fresh.expired()
    }

    fn value(&self) -> Option<u8> {
        self.value
    }
}

/// Connection state shared between the reader task and user operations.
///
/// The reader has exclusive write access to the option and parameter
/// tables; user operations observe through the watch channels, the atomics,
/// and the data queue. Outbound traffic of any kind serializes on the
/// write-half mutex.
pub(crate) struct Shared {
    host: String,
    port: u16,
    write_half: Mutex<OwnedWriteHalf>,
    pub(crate) options: StdMutex<OptionTable>,
    pub(crate) params: StdMutex<ParamTable>,
    pub(crate) data_tx: mpsc::UnboundedSender<Option<Bytes>>,
    pub(crate) in_waiting: AtomicUsize,
    pub(crate) linestate: AtomicU8,
    pub(crate) modem: StdMutex<ModemCache>,
    pub(crate) remote_suspend_flow: AtomicBool,
    poisoned: AtomicBool,
    pub(crate) log_payloads: bool,
}

impl Shared {
    pub(crate) fn timeout_error(&self, operation: &'static str) -> SerialError {
        SerialError::ConnectionTimeout {
            operation,
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Write raw bytes to the socket under the write mutex.
    ///
    /// If the caller is cancelled after part of a frame may have reached
    /// the wire, the connection is poisoned: the protocol stream can no
    /// longer be trusted, so every later operation fails until the port is
    /// closed and reopened.
    pub(crate) async fn raw_write(&self, data: &[u8]) -> SerialResult<()> {
        if self.poisoned.load(Ordering::Acquire) {
            return Err(SerialError::ConnectionClosed(
                "a write was cancelled mid-frame".to_string(),
            ));
        }
        let mut writer = self.write_half.lock().await;
        if self.log_payloads {
            debug!("SEND {:02X?}", data);
        }
        let mut guard = PoisonGuard {
            shared: self,
            armed: true,
        };
        writer.write_all(data).await?;
        writer.flush().await?;
        guard.armed = false;
        drop(guard);
        Ok(())
    }

    /// Send a batch of DO/DONT/WILL/WONT triples as one write.
    pub(crate) async fn send_negotiations(&self, frames: &[(u8, u8)]) -> SerialResult<()> {
        if frames.is_empty() {
            return Ok(());
        }
        let mut data = BytesMut::with_capacity(frames.len() * 3);
        for &(command, option) in frames {
            debug!("send {} {option}", consts::command_name(command));
            data.put_u8(consts::IAC);
            data.put_u8(command);
            data.put_u8(option);
        }
        self.raw_write(&data).await
    }

    /// Send a Com Port subnegotiation frame. IAC bytes inside `value` are
    /// doubled; the frame structure is not.
    pub(crate) async fn send_suboption(&self, suboption: u8, value: &[u8]) -> SerialResult<()> {
        let mut codec = Rfc2217Codec::new();
        let mut frame = BytesMut::new();
        codec.encode(
            TelnetFrame::Suboption(suboption, Bytes::copy_from_slice(value)),
            &mut frame,
        )?;
        self.raw_write(&frame).await
    }
}

struct PoisonGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for PoisonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.poisoned.store(true, Ordering::Release);
            let _ = self.shared.data_tx.send(None);
        }
    }
}

struct ReadState {
    rx: mpsc::UnboundedReceiver<Option<Bytes>>,
    pending: BytesMut,
    eof: bool,
}

pub(crate) struct Connection {
    pub(crate) shared: Arc<Shared>,
    reader: StdMutex<Option<JoinHandle<()>>>,
    read_state: Mutex<ReadState>,
}

/// Request a parameter change: record the pending value and transmit the
/// subnegotiation. Returns the completion signal to await.
async fn request_setting(
    shared: &Shared,
    select: fn(&mut ParamTable) -> &mut ComPortParameter,
    value: Bytes,
) -> SerialResult<(&'static str, watch::Receiver<OptionState>)> {
    let (name, suboption, payload, signal) = {
        let mut params = shared.params.lock().unwrap();
        let parameter = select(&mut params);
        let name = parameter.name();
        let signal = parameter.subscribe();
        let (suboption, payload) = parameter.prepare(value);
        (name, suboption, payload, signal)
    };
    debug!("SB requesting {} -> {:02X?}", name, payload.as_ref());
    shared.send_suboption(suboption, &payload).await?;
    Ok((name, signal))
}

/// Wait until the server answers a parameter request, the answer mismatches
/// or the deadline expires.
async fn await_setting(
    shared: &Shared,
    operation: &'static str,
    name: &'static str,
    mut signal: watch::Receiver<OptionState>,
    network_timeout: Duration,
) -> SerialResult<()> {
    let wait = signal.wait_for(|state| {
        matches!(*state, OptionState::Active | OptionState::ReallyInactive)
    });
    match tokio::time::timeout(network_timeout, wait).await {
        Err(_) => Err(shared.timeout_error(operation)),
        Ok(Err(_)) => Err(SerialError::ConnectionClosed(
            "connection lost while waiting for an answer".to_string(),
        )),
        Ok(Ok(state)) => {
            if *state == OptionState::Active {
                Ok(())
            } else {
                Err(SerialError::NegotiationFailed(format!(
                    "remote rejected value for {name}"
                )))
            }
        }
    }
}

/// A serial port on a remote host, driven over the RFC 2217 Telnet Com
/// Port Control protocol.
///
/// The port is addressed by URL: `rfc2217://host:port` with optional query
/// options (`logging`, `ign_set_control`, `poll_modem`, `timeout`). A
/// background reader task classifies the incoming telnet stream; user data
/// lands in a queue consumed by [`SerialPort::read`], negotiations and
/// Com Port acknowledgments are handled in place.
///
/// `read` and `write` take `&self` and never block each other; the
/// configuration setters reconfigure the remote side while the port is
/// open.
pub struct Rfc2217Port {
    name: String,
    host: String,
    port: u16,
    config: SerialConfig,
    opts: UrlOptions,
    conn: RwLock<Option<Arc<Connection>>>,
    rts_state: bool,
    dtr_state: bool,
    break_state: bool,
}

impl Rfc2217Port {
    /// Create a port for the given URL with default communication
    /// parameters.
    pub fn new(url: &str) -> SerialResult<Self> {
        Self::with_config(url, SerialConfig::default())
    }

    /// Create a port for the given URL.
    pub fn with_config(url: &str, config: SerialConfig) -> SerialResult<Self> {
        let PortUrl {
            host,
            port,
            options,
        } = parse_url(url)?;
        Ok(Self {
            name: url.to_string(),
            host,
            port,
            config,
            opts: options,
            conn: RwLock::new(None),
            rts_state: true,
            dtr_state: true,
            break_state: false,
        })
    }

    /// The deadline applied to connect, negotiation and parameter
    /// acknowledgments.
    pub fn network_timeout(&self) -> Duration {
        self.opts.network_timeout
    }

    /// Last line state pushed by the server.
    pub fn line_state(&self) -> SerialResult<u8> {
        let conn = self.connection()?;
        Ok(conn.shared.linestate.load(Ordering::Acquire))
    }

    /// Whether the server asked us to suspend transmission.
    pub fn remote_flow_suspended(&self) -> SerialResult<bool> {
        let conn = self.connection()?;
        Ok(conn.shared.remote_suspend_flow.load(Ordering::Acquire))
    }

    /// Cached modem state, refreshed by a proactive poll when `poll_modem`
    /// is enabled and the cache went stale.
    ///
    /// A poll that goes unanswered falls back to the last known value;
    /// only a server that never reported any modem state is an error.
    pub async fn modem_state(&self) -> SerialResult<u8> {
        let conn = self.connection()?;
        let shared = &conn.shared;
        if self.opts.poll_modem && shared.modem.lock().unwrap().stale() {
            debug!("polling modem state");
            shared
                .send_suboption(comport::NOTIFY_MODEMSTATE, &[])
                .await?;
            let mut deadline = Timeout::new(Some(self.opts.network_timeout));
            loop {
                tokio::time::sleep(MODEM_POLL_INTERVAL).await;
                if !shared.modem.lock().unwrap().stale() {
                    break;
                }
                if deadline.expired() {
                    warn!("poll for modem state failed");
                    break;
                }
            }
        }
        match shared.modem.lock().unwrap().value() {
            Some(value) => Ok(value),
            None => Err(SerialError::NegotiationFailed(
                "remote sends no NOTIFY_MODEMSTATE".to_string(),
            )),
        }
    }

    fn connection(&self) -> SerialResult<Arc<Connection>> {
        self.conn
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| SerialError::NotOpen(self.name.clone()))
    }

    async fn connect(&self) -> SerialResult<Arc<Connection>> {
        debug!("connecting to {}:{}", self.host, self.port);
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match tokio::time::timeout(self.opts.network_timeout, connect).await {
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
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            host: self.host.clone(),
            port: self.port,
            write_half: Mutex::new(write_half),
            options: StdMutex::new(OptionTable::new()),
            params: StdMutex::new(ParamTable::new()),
            data_tx,
            in_waiting: AtomicUsize::new(0),
            linestate: AtomicU8::new(0),
            modem: StdMutex::new(ModemCache::new()),
            remote_suspend_flow: AtomicBool::new(false),
            poisoned: AtomicBool::new(false),
            log_payloads: self.opts.log_payloads(),
        });
        let reader = tokio::spawn(reader::run(shared.clone(), read_half));
        Ok(Arc::new(Connection {
            shared,
            reader: StdMutex::new(Some(reader)),
            read_state: Mutex::new(ReadState {
                rx: data_rx,
                pending: BytesMut::new(),
                eof: false,
            }),
        }))
    }

    /// Drive the freshly connected stream to a usable state: request our
    /// options, wait for the mandatory ones, apply the port settings and
    /// start from clean buffers.
    async fn negotiate(&self, conn: &Connection) -> SerialResult<()> {
        let shared = &conn.shared;
        let requests = shared.options.lock().unwrap().initial_requests();
        shared.send_negotiations(&requests).await?;

        let mut progress = shared.options.lock().unwrap().subscribe_mandatory();
        let wait = progress.wait_for(|done| *done);
        match tokio::time::timeout(self.opts.network_timeout, wait).await {
            Err(_) => {
                return Err(SerialError::NegotiationFailed(
                    "remote does not seem to support RFC 2217 or binary mode".to_string(),
                ));
            }
            Ok(Err(_)) => {
                return Err(SerialError::ConnectionClosed(
                    "connection lost during negotiation".to_string(),
                ));
            }
            Ok(Ok(_)) => {}
        }
        info!("negotiated telnet options");

        self.reconfigure_port(shared).await?;
        if !self.config.dsrdtr {
            self.update_dtr(shared).await?;
        }
        if !self.config.rtscts {
            self.update_rts(shared).await?;
        }
        self.drain_input(conn).await?;
        self.purge(shared, comport::PURGE_TRANSMIT_BUFFER).await?;
        Ok(())
    }

    /// Apply the configured communication parameters to the remote port.
    ///
    /// All four parameter changes are sent first, then their
    /// acknowledgments are awaited together under one deadline.
    async fn reconfigure_port(&self, shared: &Shared) -> SerialResult<()> {
        self.config.validate()?;
        let mut pending = Vec::with_capacity(4);
        pending.push(
            request_setting(
                shared,
                |params| &mut params.baudrate,
                encode_baudrate(self.config.baudrate),
            )
            .await?,
        );
        pending.push(
            request_setting(
                shared,
                |params| &mut params.datasize,
                Bytes::copy_from_slice(&[consts::data_bits_code(self.config.data_bits)]),
            )
            .await?,
        );
        pending.push(
            request_setting(
                shared,
                |params| &mut params.parity,
                Bytes::copy_from_slice(&[consts::parity_code(self.config.parity)]),
            )
            .await?,
        );
        pending.push(
            request_setting(
                shared,
                |params| &mut params.stopsize,
                Bytes::copy_from_slice(&[consts::stop_bits_code(self.config.stop_bits)]),
            )
            .await?,
        );

        let wait_all = try_join_all(pending.into_iter().map(|(name, mut signal)| async move {
            let state = signal
                .wait_for(|state| {
                    matches!(*state, OptionState::Active | OptionState::ReallyInactive)
                })
                .await
                .map_err(|_| {
                    SerialError::ConnectionClosed(
                        "connection lost during reconfiguration".to_string(),
                    )
                })?;
            if *state == OptionState::Active {
                Ok(())
            } else {
                Err(SerialError::NegotiationFailed(format!(
                    "remote rejected value for {name}"
                )))
            }
        }));
        match tokio::time::timeout(self.opts.network_timeout, wait_all).await {
            Err(_) => {
                return Err(SerialError::NegotiationFailed(
                    "remote does not accept parameter change".to_string(),
                ));
            }
            Ok(result) => {
                result?;
            }
        }
        info!("negotiated port settings");

        let control = if self.config.rtscts {
            comport::SET_CONTROL_USE_HW_FLOW_CONTROL
        } else if self.config.xonxoff {
            comport::SET_CONTROL_USE_SW_FLOW_CONTROL
        } else {
            comport::SET_CONTROL_USE_NO_FLOW_CONTROL
        };
        self.set_control(shared, control).await
    }

    /// Transmit a SET_CONTROL value and wait for the acknowledgment, or
    /// fire and forget with a short pause when `ign_set_control` is set.
    async fn set_control(&self, shared: &Shared, value: u8) -> SerialResult<()> {
        let (name, signal) = request_setting(
            shared,
            |params| &mut params.control,
            Bytes::copy_from_slice(&[value]),
        )
        .await?;
        if self.opts.ignore_set_control_answer {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        } else {
            await_setting(shared, "set-control", name, signal, self.opts.network_timeout).await
        }
    }

    /// Transmit a purge request and wait for the acknowledgment.
    async fn purge(&self, shared: &Shared, value: u8) -> SerialResult<()> {
        let (name, signal) = request_setting(
            shared,
            |params| &mut params.purge,
            Bytes::copy_from_slice(&[value]),
        )
        .await?;
        await_setting(shared, "purge", name, signal, self.opts.network_timeout).await
    }

    async fn update_rts(&self, shared: &Shared) -> SerialResult<()> {
        info!(
            "set RTS to {}",
            if self.rts_state { "active" } else { "inactive" }
        );
        let value = if self.rts_state {
            comport::SET_CONTROL_RTS_ON
        } else {
            comport::SET_CONTROL_RTS_OFF
        };
        self.set_control(shared, value).await
    }

    async fn update_dtr(&self, shared: &Shared) -> SerialResult<()> {
        info!(
            "set DTR to {}",
            if self.dtr_state { "active" } else { "inactive" }
        );
        let value = if self.dtr_state {
            comport::SET_CONTROL_DTR_ON
        } else {
            comport::SET_CONTROL_DTR_OFF
        };
        self.set_control(shared, value).await
    }

    async fn update_break(&self, shared: &Shared) -> SerialResult<()> {
        info!(
            "set BREAK to {}",
            if self.break_state { "active" } else { "inactive" }
        );
        let value = if self.break_state {
            comport::SET_CONTROL_BREAK_ON
        } else {
            comport::SET_CONTROL_BREAK_OFF
        };
        self.set_control(shared, value).await
    }

    /// Purge the server receive buffer, then discard everything queued
    /// locally. The drain happens after a yield so the reader can finish
    /// posting chunks it already classified.
    async fn drain_input(&self, conn: &Connection) -> SerialResult<()> {
        self.purge(&conn.shared, comport::PURGE_RECEIVE_BUFFER)
            .await?;
        tokio::task::yield_now().await;
        let mut state = conn.read_state.lock().await;
        let mut drained = state.pending.len();
        state.pending.clear();
        loop {
            match state.rx.try_recv() {
                Ok(Some(chunk)) => drained += chunk.len(),
                Ok(None) => {
                    state.eof = true;
                    break;
                }
                Err(_) => break,
            }
        }
        if drained > 0 {
            conn.shared.in_waiting.fetch_sub(drained, Ordering::AcqRel);
            debug!("discarded {drained} buffered bytes");
        }
        Ok(())
    }

    async fn close_connection(&self) -> SerialResult<()> {
        let conn = self.conn.write().unwrap().take();
        let Some(conn) = conn else {
            return Ok(());
        };
        {
            let mut writer = conn.shared.write_half.lock().await;
            let _ = writer.shutdown().await;
        }
        let handle = conn.reader.lock().unwrap().take();
        if let Some(handle) = handle {
            let grace = self.opts.network_timeout.max(READER_JOIN_GRACE);
            let abort = handle.abort_handle();
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("reader task did not terminate within {grace:?}, aborting");
                abort.abort();
            }
        }
        // in case of quick reconnects, give the server some time
        tokio::time::sleep(CLOSE_TURNAROUND).await;
        info!("port {} closed", self.name);
        Ok(())
    }

    /// One close/connect/negotiate cycle, used by the auto-reconnect
    /// wrapper.
    async fn reopen(&self) -> SerialResult<()> {
        self.close_connection().await?;
        let conn = self.connect().await?;
        *self.conn.write().unwrap() = Some(conn.clone());
        match self.negotiate(&conn).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let _ = self.close_connection().await;
                Err(err)
            }
        }
    }

    async fn read_inner(&self, size: usize, deadline: &mut Timeout) -> SerialResult<Bytes> {
        let conn = self.connection()?;
        let mut state = conn.read_state.lock().await;
        let mut data = BytesMut::with_capacity(size);
        loop {
            if !state.pending.is_empty() {
                let take = state.pending.len().min(size - data.len());
                data.unsplit(state.pending.split_to(take));
                conn.shared.in_waiting.fetch_sub(take, Ordering::AcqRel);
            }
            if data.len() >= size || state.eof {
                break;
            }
            let item = match deadline.time_left() {
                Some(left) => match tokio::time::timeout(left, state.rx.recv()).await {
                    Err(_) => {
                        // nothing is lost on expiry: consumed bytes go back
                        // in front of the pending buffer
                        let consumed = data.len();
                        if consumed > 0 {
                            data.unsplit(mem::take(&mut state.pending));
                            state.pending = data;
                            conn.shared.in_waiting.fetch_add(consumed, Ordering::AcqRel);
                        }
                        return Err(conn.shared.timeout_error("read"));
                    }
                    Ok(item) => item,
                },
                None => state.rx.recv().await,
            };
            match item {
                Some(Some(chunk)) => state.pending.extend_from_slice(&chunk),
                Some(None) | None => state.eof = true,
            }
        }
        if state.eof && data.is_empty() && size > 0 {
            return Err(SerialError::ConnectionClosed(
                "connection failed (reader task terminated)".to_string(),
            ));
        }
        Ok(data.freeze())
    }

    async fn write_inner(&self, data: &[u8]) -> SerialResult<usize> {
        let conn = self.connection()?;
        let mut escaped = BytesMut::with_capacity(data.len() + 8);
        escape_iac(data, &mut escaped);
        conn.shared.raw_write(&escaped).await?;
        Ok(data.len())
    }
}

#[async_trait::async_trait]
impl SerialPort for Rfc2217Port {
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
        self.config.validate()?;
        let conn = self.connect().await?;
        *self.conn.write().unwrap() = Some(conn.clone());
        match self.negotiate(&conn).await {
            Ok(()) => {
                info!("port {} open", self.name);
                Ok(())
            }
            Err(err) => {
                // must clean up the half-open connection before surfacing
                let _ = self.close_connection().await;
                Err(err)
            }
        }
    }

    async fn close(&mut self) -> SerialResult<()> {
        self.close_connection().await
    }

    async fn reconfigure(&mut self) -> SerialResult<()> {
        let conn = self.connection()?;
        self.reconfigure_port(&conn.shared).await
    }

    async fn read_with_deadline(
        &self,
        size: usize,
        deadline: &mut Timeout,
    ) -> SerialResult<Bytes> {
        match self.read_inner(size, deadline).await {
            Err(err) if self.config.auto_reconnect && err.is_transport() => {
                warn!("transport error ({err}), reconnecting once");
                self.reopen().await?;
                self.read_inner(size, deadline).await
            }
            result => result,
        }
    }

    async fn write(&self, data: &[u8]) -> SerialResult<usize> {
        match self.write_inner(data).await {
            Err(err) if self.config.auto_reconnect && err.is_transport() => {
                warn!("transport error ({err}), reconnecting once");
                self.reopen().await?;
                self.write_inner(data).await
            }
            result => result,
        }
    }

    async fn in_waiting(&self) -> SerialResult<usize> {
        let conn = self.connection()?;
        Ok(conn.shared.in_waiting.load(Ordering::Acquire))
    }

    async fn reset_input_buffer(&self) -> SerialResult<()> {
        let conn = self.connection()?;
        self.drain_input(&conn).await
    }

    async fn reset_output_buffer(&self) -> SerialResult<()> {
        let conn = self.connection()?;
        self.purge(&conn.shared, comport::PURGE_TRANSMIT_BUFFER)
            .await
    }

    async fn set_rts(&mut self, level: bool) -> SerialResult<()> {
        self.rts_state = level;
        match self.connection() {
            Ok(conn) => self.update_rts(&conn.shared).await,
            Err(_) => Ok(()),
        }
    }

    async fn set_dtr(&mut self, level: bool) -> SerialResult<()> {
        self.dtr_state = level;
        match self.connection() {
            Ok(conn) => self.update_dtr(&conn.shared).await,
            Err(_) => Ok(()),
        }
    }

    async fn set_break_condition(&mut self, level: bool) -> SerialResult<()> {
        self.break_state = level;
        let conn = self.connection()?;
        self.update_break(&conn.shared).await
    }

    async fn cts(&self) -> SerialResult<bool> {
        Ok(self.modem_state().await? & comport::MODEMSTATE_MASK_CTS != 0)
    }

    async fn dsr(&self) -> SerialResult<bool> {
        Ok(self.modem_state().await? & comport::MODEMSTATE_MASK_DSR != 0)
    }

    async fn ri(&self) -> SerialResult<bool> {
        Ok(self.modem_state().await? & comport::MODEMSTATE_MASK_RI != 0)
    }

    async fn cd(&self) -> SerialResult<bool> {
        Ok(self.modem_state().await? & comport::MODEMSTATE_MASK_CD != 0)
    }
}

impl std::fmt::Debug for Rfc2217Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rfc2217Port")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .field("baudrate", &self.config.baudrate)
            .field("data_bits", &self.config.data_bits)
            .field("parity", &self.config.parity)
            .field("stop_bits", &self.config.stop_bits)
            .finish_non_exhaustive()
    }
}
