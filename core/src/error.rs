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

//! Error types for serial port operations

use thiserror::Error;

/// Result type for serial port operations
pub type SerialResult<T> = std::result::Result<T, SerialError>;

/// Serial port error types
#[derive(Debug, Error)]
pub enum SerialError {
    /// Operation attempted on a port that is not open
    #[error("port {0} is not open")]
    NotOpen(String),

    /// `open` called on a port that is already open
    #[error("port {0} is already open")]
    AlreadyOpen(String),

    /// Invalid parameter value, unknown URL option, or a parameter
    /// combination no backend can honor
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Transport-level connect failure
    #[error("could not connect to {host}:{port}: {reason}")]
    ConnectFailed {
        /// Remote host
        host: String,
        /// Remote TCP port
        port: u16,
        /// Underlying connect error
        reason: String,
    },

    /// A mandatory option was not negotiated or a parameter was rejected
    /// by the remote side
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    /// An operation exceeded its deadline
    #[error("{operation} timed out on {host}:{port}")]
    ConnectionTimeout {
        /// Name of the operation that expired
        operation: &'static str,
        /// Remote host
        host: String,
        /// Remote TCP port
        port: u16,
    },

    /// The peer closed the connection mid-operation, or the background
    /// reader terminated
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// An I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Check if the error is a transport failure.
    ///
    /// Transport failures are the errors the auto-reconnect wrapper absorbs:
    /// retrying the operation over a fresh connection may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SerialError::Io(_) | SerialError::ConnectionClosed(_)
        )
    }

    /// Check if the error is an expired operation deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, SerialError::ConnectionTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_transport() {
        assert!(SerialError::ConnectionClosed("reader died".into()).is_transport());
        assert!(SerialError::Io(std::io::Error::other("boom")).is_transport());
        assert!(!SerialError::Config("bad baudrate".into()).is_transport());
        assert!(!SerialError::NotOpen("rfc2217://localhost:2217".into()).is_transport());
    }

    #[test]
    fn test_error_is_timeout() {
        let err = SerialError::ConnectionTimeout {
            operation: "read",
            host: "localhost".into(),
            port: 2217,
        };
        assert!(err.is_timeout());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_error_display() {
        let err = SerialError::ConnectionTimeout {
            operation: "read",
            host: "moxa.lab".into(),
            port: 6610,
        };
        assert_eq!(err.to_string(), "read timed out on moxa.lab:6610");

        let err = SerialError::NotOpen("tcp://device:9000".into());
        assert_eq!(err.to_string(), "port tcp://device:9000 is not open");
    }
}
