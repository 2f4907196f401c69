use std::time::Duration;

/// Timing defaults for the protocol, grouped so an embedder can override any
/// of them at construction time instead of the engine hard-coding them.
///
/// Values below are the spec's defaults (all milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Reauth read/send cadence while the session is in `Continue`.
    pub active: Duration,
    /// Reauth read/send cadence while the session is in `Pause`.
    pub paused: Duration,
    /// Extra slack added on top of the peer's advertised timeout before a
    /// read is considered overdue.
    pub leeway: Duration,
    /// How long the verifier waits for the Pico to reconnect after the
    /// handshake before giving up on the continuous session.
    pub reconnect_delay: Duration,
    /// How long either FSM waits for the handshake to complete before
    /// aborting.
    pub auth_time_limit: Duration,
    /// Leeway applied specifically by the prover FSM's continuous-auth
    /// timer (distinct constant from `leeway` in the reference source).
    pub contauth_leeway: Duration,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            active: Duration::from_millis(10_000),
            paused: Duration::from_millis(50_000),
            leeway: Duration::from_millis(5_000),
            reconnect_delay: Duration::from_millis(10_000),
            auth_time_limit: Duration::from_millis(5_000),
            contauth_leeway: Duration::from_millis(1_000),
        }
    }
}

impl ProtocolConfig {
    pub fn active_ms(&self) -> u64 {
        self.active.as_millis() as u64
    }

    pub fn paused_ms(&self) -> u64 {
        self.paused.as_millis() as u64
    }

    pub fn leeway_ms(&self) -> u64 {
        self.leeway.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ProtocolConfig::default();
        assert_eq!(cfg.active, Duration::from_millis(10_000));
        assert_eq!(cfg.paused, Duration::from_millis(50_000));
        assert_eq!(cfg.leeway, Duration::from_millis(5_000));
        assert_eq!(cfg.reconnect_delay, Duration::from_millis(10_000));
        assert_eq!(cfg.auth_time_limit, Duration::from_millis(5_000));
        assert_eq!(cfg.contauth_leeway, Duration::from_millis(1_000));
    }
}
