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

//! Port URL parsing

use serialix_core::{SerialError, SerialResult};
use std::time::Duration;
use tracing::Level;

/// Deadline for connect, negotiation and parameter acknowledgments unless
/// the URL overrides it.
pub(crate) const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(3);

/// Options carried in the query string of a port URL.
#[derive(Clone, Debug)]
pub struct UrlOptions {
    /// Per-port protocol logging verbosity (`logging=<level>`)
    pub logging: Option<Level>,
    /// Treat SET_CONTROL as fire-and-forget, for servers that never answer
    /// it (`ign_set_control`)
    pub ignore_set_control_answer: bool,
    /// Proactively poll the modem state when the cache goes stale
    /// (`poll_modem`)
    pub poll_modem: bool,
    /// Network timeout override in seconds (`timeout=<seconds>`)
    pub network_timeout: Duration,
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            logging: None,
            ignore_set_control_answer: false,
            poll_modem: false,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
        }
    }
}

impl UrlOptions {
    /// Whether wire payload dumps are enabled for this port.
    pub fn log_payloads(&self) -> bool {
        self.logging.is_some_and(|level| level >= Level::DEBUG)
    }
}

/// A parsed port URL.
#[derive(Clone, Debug)]
pub struct PortUrl {
    /// Remote host
    pub host: String,
    /// Remote TCP port
    pub port: u16,
    /// Query options
    pub options: UrlOptions,
}

/// Parse a port URL of the form
/// `[serial+rfc2217://|rfc2217://]<host>:<port>[?option[&option...]]`.
///
/// Recognized options are `logging=<level>`, `ign_set_control`,
/// `poll_modem` and `timeout=<seconds>`. Anything else is a configuration
/// error.
pub fn parse_url(url: &str) -> SerialResult<PortUrl> {
    let rest = url
        .strip_prefix("serial+rfc2217://")
        .or_else(|| url.strip_prefix("rfc2217://"))
        .unwrap_or(url);
    let (address, query) = match rest.split_once('?') {
        Some((address, query)) => (address, Some(query)),
        None => (rest, None),
    };
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| config_error(url, "expected <host>:<port>"))?;
    if host.is_empty() {
        return Err(config_error(url, "expected <host>:<port>"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| config_error(url, "port not in range 0...65535"))?;

    let mut options = UrlOptions::default();
    if let Some(query) = query {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (pair, None),
            };
            match key {
                "logging" => {
                    let value =
                        value.ok_or_else(|| config_error(url, "logging requires a level"))?;
                    options.logging = Some(parse_level(url, value)?);
                }
                "ign_set_control" => options.ignore_set_control_answer = true,
                "poll_modem" => options.poll_modem = true,
                "timeout" => {
                    let value =
                        value.ok_or_else(|| config_error(url, "timeout requires a value"))?;
                    let seconds = value
                        .parse::<f64>()
                        .map_err(|_| config_error(url, "invalid timeout"))?;
                    if seconds <= 0.0 || !seconds.is_finite() {
                        return Err(config_error(url, "invalid timeout"));
                    }
                    options.network_timeout = Duration::from_secs_f64(seconds);
                }
                unknown => {
                    return Err(config_error(url, &format!("unknown option: {unknown}")));
                }
            }
        }
    }
    Ok(PortUrl {
        host: host.to_string(),
        port,
        options,
    })
}

fn parse_level(url: &str, value: &str) -> SerialResult<Level> {
    match value {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        unknown => Err(config_error(url, &format!("unknown log level: {unknown}"))),
    }
}

fn config_error(url: &str, reason: &str) -> SerialError {
    SerialError::Config(format!(
        "expected a string in the form \
         \"[rfc2217://]<host>:<port>[?option[&option...]]\": {reason} ({url})"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_port() {
        let parsed = parse_url("localhost:2217").unwrap();
        assert_eq!(parsed.host, "localhost");
        assert_eq!(parsed.port, 2217);
        assert_eq!(parsed.options.network_timeout, DEFAULT_NETWORK_TIMEOUT);
        assert!(!parsed.options.poll_modem);
        assert!(!parsed.options.ignore_set_control_answer);
    }

    #[test]
    fn scheme_prefixes() {
        assert_eq!(parse_url("rfc2217://moxa.lab:6610").unwrap().port, 6610);
        assert_eq!(
            parse_url("serial+rfc2217://moxa.lab:6610").unwrap().host,
            "moxa.lab"
        );
    }

    #[test]
    fn query_options() {
        let parsed =
            parse_url("rfc2217://device:7000?ign_set_control&poll_modem&timeout=2.5").unwrap();
        assert!(parsed.options.ignore_set_control_answer);
        assert!(parsed.options.poll_modem);
        assert_eq!(parsed.options.network_timeout, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn logging_levels() {
        let parsed = parse_url("rfc2217://device:7000?logging=debug").unwrap();
        assert_eq!(parsed.options.logging, Some(Level::DEBUG));
        assert!(parsed.options.log_payloads());

        let parsed = parse_url("rfc2217://device:7000?logging=info").unwrap();
        assert_eq!(parsed.options.logging, Some(Level::INFO));
        assert!(!parsed.options.log_payloads());

        assert!(parse_url("rfc2217://device:7000?logging=verbose").is_err());
        assert!(parse_url("rfc2217://device:7000?logging").is_err());
    }

    #[test]
    fn unknown_option_rejected() {
        assert!(matches!(
            parse_url("rfc2217://device:7000?no_such_option"),
            Err(SerialError::Config(_))
        ));
    }

    #[test]
    fn invalid_port_rejected() {
        assert!(parse_url("device:65536").is_err());
        assert!(parse_url("device:-1").is_err());
        assert!(parse_url("device:abc").is_err());
        assert!(parse_url("device").is_err());
        assert!(parse_url(":7000").is_err());
    }

    #[test]
    fn invalid_timeout_rejected() {
        assert!(parse_url("device:7000?timeout=0").is_err());
        assert!(parse_url("device:7000?timeout=-1").is_err());
        assert!(parse_url("device:7000?timeout=soon").is_err());
    }
}
