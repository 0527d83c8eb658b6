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

//! Background read loop for the RFC 2217 stream

use crate::codec::Rfc2217Codec;
use crate::consts::{self, comport, option};
use crate::event::TelnetEvent;
use crate::port::Shared;
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::codec::Decoder;
use tracing::{debug, info, warn};

/// Socket read size of one loop turn.
const READ_CHUNK: usize = 1024;

/// The read loop of one connection.
///
/// Classifies everything the server sends: data bytes are batched into
/// chunks on the queue, negotiations are answered through the option table,
/// Com Port sub-options update the caches and parameter states. An empty
/// read or a socket error terminates the loop; the end-of-stream sentinel
/// tells the consumer.
pub(crate) async fn run(shared: Arc<Shared>, mut read_half: OwnedReadHalf) {
    let mut codec = Rfc2217Codec::new();
    let mut scratch = [0u8; READ_CHUNK];
    let mut src = BytesMut::with_capacity(READ_CHUNK);
    'outer: loop {
        let count = match read_half.read(&mut scratch).await {
            Ok(0) => {
                debug!("connection closed by peer");
                break;
            }
            Ok(count) => count,
            Err(err) => {
                debug!("socket error in reader task: {err}");
                break;
            }
        };
        if shared.log_payloads {
            debug!("RECV {:02X?}", &scratch[..count]);
        }
        src.extend_from_slice(&scratch[..count]);
        let mut chunk = BytesMut::new();
        loop {
            match codec.decode(&mut src) {
                Ok(Some(TelnetEvent::Data(byte))) => chunk.put_u8(byte),
                Ok(Some(event)) => {
                    flush(&shared, &mut chunk);
                    if !handle_event(&shared, event).await {
                        break 'outer;
                    }
                }
                Ok(None) => break,
                Err(err) => warn!("skipping undecodable input: {err}"),
            }
        }
        flush(&shared, &mut chunk);
    }
    let _ = shared.data_tx.send(None);
    debug!("reader task terminated");
}

/// Post a batch of contiguous data bytes to the consumer.
fn flush(shared: &Shared, chunk: &mut BytesMut) {
    if chunk.is_empty() {
        return;
    }
    let data = chunk.split().freeze();
    shared.in_waiting.fetch_add(data.len(), Ordering::AcqRel);
    let _ = shared.data_tx.send(Some(data));
}

/// Dispatch one protocol event. Returns false when the connection is no
/// longer usable and the loop should stop.
async fn handle_event(shared: &Shared, event: TelnetEvent) -> bool {
    match event {
        TelnetEvent::Negotiation(command, opt) => {
            debug!("received {} {opt}", consts::command_name(command));
            let answers = shared
                .options
                .lock()
                .unwrap()
                .process_negotiation(command, opt);
            if let Err(err) = shared.send_negotiations(&answers).await {
                debug!("failed to answer negotiation: {err}");
                return false;
            }
            true
        }
        TelnetEvent::Command(command) => {
            // RFC 2217 only uses negotiation and subnegotiation
            warn!("ignoring telnet command: 0x{command:02X}");
            true
        }
        TelnetEvent::Suboption(payload) => {
            process_suboption(shared, &payload);
            true
        }
        TelnetEvent::Data(_) => true,
    }
}

/// Process the bytes between `IAC SB` and `IAC SE`.
fn process_suboption(shared: &Shared, suboption: &[u8]) {
    if suboption.first() != Some(&option::COM_PORT_OPTION) {
        warn!("ignoring subnegotiation: {suboption:02X?}");
        return;
    }
    match suboption.get(1) {
        Some(&comport::SERVER_NOTIFY_LINESTATE) if suboption.len() >= 3 => {
            shared.linestate.store(suboption[2], Ordering::Release);
            info!("NOTIFY_LINESTATE: 0x{:02X}", suboption[2]);
        }
        Some(&comport::SERVER_NOTIFY_MODEMSTATE) if suboption.len() >= 3 => {
            shared.modem.lock().unwrap().update(suboption[2]);
            info!("NOTIFY_MODEMSTATE: 0x{:02X}", suboption[2]);
        }
        Some(&comport::FLOWCONTROL_SUSPEND) => {
            shared.remote_suspend_flow.store(true, Ordering::Release);
            info!("server suspended flow");
        }
        Some(&comport::FLOWCONTROL_RESUME) => {
            shared.remote_suspend_flow.store(false, Ordering::Release);
            info!("server resumed flow");
        }
        Some(&ack_option) => {
            let mut params = shared.params.lock().unwrap();
            match params.by_ack_option(ack_option) {
                Some(parameter) => parameter.check_answer(&suboption[2..]),
                None => warn!("ignoring COM-PORT sub-option: {suboption:02X?}"),
            }
        }
        None => warn!("ignoring empty COM-PORT subnegotiation"),
    }
}
