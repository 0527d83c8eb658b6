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

//! Monotonic deadline helper

use std::time::{Duration, Instant};

/// Abstraction for deadline bookkeeping across an operation.
///
/// A `Timeout` can be built from `None` (fully blocking, never expires), a
/// zero duration (non-blocking, expired from the start) or a positive
/// duration (expires once the monotonic clock passes `now + duration`).
///
/// The deadline applies to a whole operation, not to each byte of it: build
/// one `Timeout`, then consult [`Timeout::time_left`] before every
/// suspension point.
#[derive(Clone, Debug)]
pub struct Timeout {
    duration: Option<Duration>,
    target: Option<Instant>,
}

impl Timeout {
    /// Initialize a timeout with the given duration.
    ///
    /// `None` never expires; `Some(Duration::ZERO)` is non-blocking.
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            duration,
            target: duration.map(|d| Instant::now() + d),
        }
    }

    /// A timeout that is already expired, useful as the initial state of a
    /// freshness deadline.
    pub fn expired_now() -> Self {
        Self::new(Some(Duration::ZERO))
    }

    /// True when built without a duration; such a timeout never expires.
    pub fn is_infinite(&self) -> bool {
        self.duration.is_none()
    }

    /// True when built with a zero duration.
    pub fn is_non_blocking(&self) -> bool {
        self.duration == Some(Duration::ZERO)
    }

    /// Whether the deadline has passed. Always false for an infinite
    /// timeout.
    pub fn expired(&mut self) -> bool {
        self.target.is_some() && self.time_left() == Some(Duration::ZERO)
    }

    /// Time remaining until expiry, `None` when infinite.
    ///
    /// If the observed remaining time ever exceeds the initial duration the
    /// clock has jumped; the target is rebased from now so the operation
    /// waits at most one full duration more.
    pub fn time_left(&mut self) -> Option<Duration> {
        let duration = self.duration?;
        let target = self.target?;
        let now = Instant::now();
        let left = target.saturating_duration_since(now);
        if left > duration {
            self.target = Some(now + duration);
            Some(duration)
        } else {
            Some(left)
        }
    }

    /// Rebase the deadline to `now + duration`.
    pub fn restart(&mut self, duration: Duration) {
        self.duration = Some(duration);
        self.target = Some(Instant::now() + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_never_expires() {
        let mut timeout = Timeout::new(None);
        assert!(timeout.is_infinite());
        assert!(!timeout.is_non_blocking());
        assert!(!timeout.expired());
        assert_eq!(timeout.time_left(), None);
    }

    #[test]
    fn non_blocking_expires_immediately() {
        let mut timeout = Timeout::new(Some(Duration::ZERO));
        assert!(timeout.is_non_blocking());
        assert!(timeout.expired());
        assert_eq!(timeout.time_left(), Some(Duration::ZERO));
    }

    #[test]
    fn expired_now_is_expired() {
        let mut timeout = Timeout::expired_now();
        assert!(timeout.expired());
    }

    #[test]
    fn finite_counts_down() {
        let mut timeout = Timeout::new(Some(Duration::from_secs(60)));
        assert!(!timeout.expired());
        let left = timeout.time_left().unwrap();
        assert!(left <= Duration::from_secs(60));
        assert!(left > Duration::from_secs(59));
    }

    #[test]
    fn restart_rebases() {
        let mut timeout = Timeout::expired_now();
        assert!(timeout.expired());
        timeout.restart(Duration::from_secs(60));
        assert!(!timeout.expired());
        assert!(timeout.time_left().unwrap() > Duration::from_secs(59));
    }

    #[test]
    fn clock_jump_rebases_target() {
        let mut timeout = Timeout::new(Some(Duration::from_millis(100)));
        // Simulate a clock jump by pushing the target into the far future.
        timeout.target = Some(Instant::now() + Duration::from_secs(3600));
        assert_eq!(timeout.time_left(), Some(Duration::from_millis(100)));
        assert!(!timeout.expired());
    }
}
