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

use crate::consts;
use tokio::sync::watch;
use tracing::{debug, warn};

///
/// Negotiation state of a telnet option or a Com Port parameter.
///
/// `ReallyInactive` is a terminal refusal: the remote rejected the option or
/// echoed a different parameter value, and further positive requests are
/// answered negatively.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionState {
    /// Not negotiated
    Inactive,
    /// We asked for it, waiting for the answer
    Requested,
    /// Both sides agreed
    Active,
    /// The remote refused or the answer did not match
    ReallyInactive,
}

/// A single telnet option, tracking DO/DONT and WILL/WONT.
///
/// Some options appear twice, once for each direction of the stream: a
/// "we-" entry sends WILL/WONT and expects DO/DONT, a "they-" entry sends
/// DO/DONT and expects WILL/WONT.
#[derive(Debug)]
pub struct TelnetOption {
    name: &'static str,
    option: u8,
    send_yes: u8,
    send_no: u8,
    ack_yes: u8,
    ack_no: u8,
    state: OptionState,
    mandatory: bool,
}

impl TelnetOption {
    /// Create an option entry. Options starting in `Requested` are asked
    /// for at open; `Inactive` entries wait for the remote to move first.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &'static str,
        option: u8,
        send_yes: u8,
        send_no: u8,
        ack_yes: u8,
        ack_no: u8,
        initial_state: OptionState,
        mandatory: bool,
    ) -> Self {
        Self {
            name,
            option,
            send_yes,
            send_no,
            ack_yes,
            ack_no,
            state: initial_state,
            mandatory,
        }
    }

    /// The option code.
    pub fn option(&self) -> u8 {
        self.option
    }

    /// The current negotiation state.
    pub fn state(&self) -> OptionState {
        self.state
    }

    /// Whether the option is in force.
    pub fn active(&self) -> bool {
        self.state == OptionState::Active
    }

    /// A DO/DONT/WILL/WONT was received for this option. Updates the state
    /// and returns the `(command, option)` answer to transmit, if one is
    /// needed.
    fn process_incoming(&mut self, command: u8) -> Option<(u8, u8)> {
        let answer = if command == self.ack_yes {
            match self.state {
                OptionState::Requested => {
                    self.state = OptionState::Active;
                    None
                }
                OptionState::Active => None,
                OptionState::Inactive => {
                    self.state = OptionState::Active;
                    Some((self.send_yes, self.option))
                }
                OptionState::ReallyInactive => Some((self.send_no, self.option)),
            }
        } else if command == self.ack_no {
            match self.state {
                OptionState::Requested => {
                    self.state = OptionState::Inactive;
                    None
                }
                OptionState::Active => {
                    self.state = OptionState::Inactive;
                    Some((self.send_no, self.option))
                }
                OptionState::Inactive | OptionState::ReallyInactive => None,
            }
        } else {
            None
        };
        debug!(
            "{} {} -> {:?}",
            consts::command_name(command),
            self.name,
            self.state
        );
        answer
    }
}

/// The set of telnet options this client negotiates, plus the
/// mandatory-progress signal `open` waits on.
pub struct OptionTable {
    options: Vec<TelnetOption>,
    mandatory_tx: watch::Sender<bool>,
}

impl OptionTable {
    /// Build the option set for one connection.
    ///
    /// ECHO, both SGA directions and both Com Port directions are requested
    /// at open; both BINARY directions are passive and answered when the
    /// server moves first. `we-BINARY` and `we-COM-PORT` must become active
    /// before `open` may complete.
    pub fn new() -> Self {
        use crate::consts::{DO, DONT, WILL, WONT, option};
        let options = vec![
            TelnetOption::new(
                "ECHO",
                option::ECHO,
                DO,
                DONT,
                WILL,
                WONT,
                OptionState::Requested,
                false,
            ),
            TelnetOption::new(
                "we-SGA",
                option::SGA,
                WILL,
                WONT,
                DO,
                DONT,
                OptionState::Requested,
                false,
            ),
            TelnetOption::new(
                "they-SGA",
                option::SGA,
                DO,
                DONT,
                WILL,
                WONT,
                OptionState::Requested,
                false,
            ),
            TelnetOption::new(
                "they-BINARY",
                option::BINARY,
                DO,
                DONT,
                WILL,
                WONT,
                OptionState::Inactive,
                false,
            ),
            TelnetOption::new(
                "they-COM-PORT",
                option::COM_PORT_OPTION,
                DO,
                DONT,
                WILL,
                WONT,
                OptionState::Requested,
                false,
            ),
            TelnetOption::new(
                "we-BINARY",
                option::BINARY,
                WILL,
                WONT,
                DO,
                DONT,
                OptionState::Inactive,
                true,
            ),
            TelnetOption::new(
                "we-COM-PORT",
                option::COM_PORT_OPTION,
                WILL,
                WONT,
                DO,
                DONT,
                OptionState::Requested,
                true,
            ),
        ];
        let (mandatory_tx, _) = watch::channel(false);
        Self {
            options,
            mandatory_tx,
        }
    }

    /// Subscribe to the mandatory-progress signal.
    pub fn subscribe_mandatory(&self) -> watch::Receiver<bool> {
        self.mandatory_tx.subscribe()
    }

    /// The `(command, option)` requests to transmit when the connection
    /// opens: one per option in the `Requested` state.
    pub fn initial_requests(&self) -> Vec<(u8, u8)> {
        self.options
            .iter()
            .filter(|option| option.state == OptionState::Requested)
            .map(|option| (option.send_yes, option.option))
            .collect()
    }

    /// Process an incoming DO/DONT/WILL/WONT and return the answers to
    /// transmit.
    ///
    /// Every registered entry with a matching code sees the command (the
    /// we/they pairs share one code). Positive requests for unknown options
    /// are refused with the complementary negative; negative requests for
    /// unknown options are ignored.
    pub fn process_negotiation(&mut self, command: u8, option: u8) -> Vec<(u8, u8)> {
        let mut answers = Vec::new();
        let mut known = false;
        for item in &mut self.options {
            if item.option == option {
                known = true;
                if let Some(answer) = item.process_incoming(command) {
                    answers.push(answer);
                }
            }
        }
        if known {
            self.mandatory_tx.send_replace(self.mandatory_done());
        } else if command == consts::WILL || command == consts::DO {
            warn!("rejecting unknown telnet option: {option}");
            let refusal = if command == consts::WILL {
                consts::DONT
            } else {
                consts::WONT
            };
            answers.push((refusal, option));
        }
        answers
    }

    /// Whether every mandatory option has been negotiated active.
    pub fn mandatory_done(&self) -> bool {
        self.options
            .iter()
            .filter(|option| option.mandatory)
            .all(TelnetOption::active)
    }

    /// Look up an option entry by name, for diagnostics.
    #[cfg(test)]
    fn by_name(&self, name: &str) -> Option<&TelnetOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

impl Default for OptionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DO, DONT, WILL, WONT, option};

    #[test]
    fn initial_requests_cover_requested_options() {
        let table = OptionTable::new();
        let requests = table.initial_requests();
        assert_eq!(
            requests,
            vec![
                (DO, option::ECHO),
                (WILL, option::SGA),
                (DO, option::SGA),
                (DO, option::COM_PORT_OPTION),
                (WILL, option::COM_PORT_OPTION),
            ]
        );
    }

    #[test]
    fn passive_binary_answers_will_with_do() {
        // Server: IAC WILL BINARY. they-BINARY is passive-inactive, so the
        // client answers DO BINARY and the option becomes active.
        let mut table = OptionTable::new();
        let answers = table.process_negotiation(WILL, option::BINARY);
        assert_eq!(answers, vec![(DO, option::BINARY)]);
        assert!(table.by_name("they-BINARY").unwrap().active());
        assert!(!table.by_name("we-BINARY").unwrap().active());
    }

    #[test]
    fn requested_option_activates_without_answer() {
        // we-COM-PORT was requested at open; the DO ack activates it
        // silently.
        let mut table = OptionTable::new();
        let answers = table.process_negotiation(DO, option::COM_PORT_OPTION);
        assert_eq!(answers, vec![]);
        assert!(table.by_name("we-COM-PORT").unwrap().active());
    }

    #[test]
    fn refused_request_goes_inactive() {
        let mut table = OptionTable::new();
        let answers = table.process_negotiation(WONT, option::ECHO);
        assert_eq!(answers, vec![]);
        assert_eq!(
            table.by_name("ECHO").unwrap().state(),
            OptionState::Inactive
        );
    }

    #[test]
    fn active_option_denied_sends_negative() {
        let mut table = OptionTable::new();
        table.process_negotiation(WILL, option::ECHO);
        assert!(table.by_name("ECHO").unwrap().active());
        let answers = table.process_negotiation(WONT, option::ECHO);
        assert_eq!(answers, vec![(DONT, option::ECHO)]);
        assert!(!table.by_name("ECHO").unwrap().active());
    }

    #[test]
    fn really_inactive_refuses_positive_ack() {
        let mut option_entry = TelnetOption::new(
            "we-BINARY",
            option::BINARY,
            WILL,
            WONT,
            DO,
            DONT,
            OptionState::ReallyInactive,
            false,
        );
        assert_eq!(
            option_entry.process_incoming(DO),
            Some((WONT, option::BINARY))
        );
        assert_eq!(option_entry.state(), OptionState::ReallyInactive);
    }

    #[tracing_test::traced_test]
    #[test]
    fn unknown_positive_request_is_refused() {
        let mut table = OptionTable::new();
        // NAWS (31) is not registered
        assert_eq!(table.process_negotiation(WILL, 31), vec![(DONT, 31)]);
        assert_eq!(table.process_negotiation(DO, 31), vec![(WONT, 31)]);
        assert!(logs_contain("rejecting unknown telnet option"));
    }

    #[test]
    fn unknown_negative_request_is_ignored() {
        let mut table = OptionTable::new();
        assert_eq!(table.process_negotiation(WONT, 31), vec![]);
        assert_eq!(table.process_negotiation(DONT, 31), vec![]);
    }

    #[test]
    fn mandatory_done_requires_both_mandatory_options() {
        let mut table = OptionTable::new();
        let mut progress = table.subscribe_mandatory();
        assert!(!table.mandatory_done());

        table.process_negotiation(DO, option::COM_PORT_OPTION);
        assert!(!table.mandatory_done());

        table.process_negotiation(DO, option::BINARY);
        assert!(table.mandatory_done());
        assert!(*progress.borrow_and_update());
    }
}
