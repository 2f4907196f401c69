use std::time::Duration;

use pico_types::AuthStatus;

use crate::events::TimerToken;
use crate::states::{FsmProverState, FsmVerifierState};

/// The embedder hooks a verifier FSM drives (spec.md section 4.7). Every
/// method has a default that logs and no-ops, the Rust counterpart of the
/// reference source's "callback table with null-stub defaults" — an
/// embedder overrides only the hooks it cares about.
pub trait VerifierCallbacks {
    /// Send `bytes` over the rendezvous channel. Returning `false` is
    /// treated the same as a transport error.
    fn write(&mut self, bytes: &[u8]) -> bool {
        let _ = bytes;
        tracing::debug!("VerifierCallbacks::write: no-op stub");
        true
    }

    /// Arm a timer. Any previously armed timer is logically cancelled;
    /// only the most recently returned token is live.
    fn set_timeout(&mut self, after: Duration) -> TimerToken {
        let _ = after;
        tracing::debug!("VerifierCallbacks::set_timeout: no-op stub");
        TimerToken(0)
    }

    /// Begin listening for the Pico's reconnection after the handshake
    /// disconnects, ahead of the continuous-auth loop.
    fn listen(&mut self) {
        tracing::debug!("VerifierCallbacks::listen: no-op stub");
    }

    fn disconnect(&mut self) {
        tracing::debug!("VerifierCallbacks::disconnect: no-op stub");
    }

    fn error(&mut self) {
        tracing::warn!("VerifierCallbacks::error: no-op stub");
    }

    fn authenticated(&mut self, status: AuthStatus) {
        let _ = status;
        tracing::debug!(?status, "VerifierCallbacks::authenticated: no-op stub");
    }

    fn session_ended(&mut self) {
        tracing::debug!("VerifierCallbacks::session_ended: no-op stub");
    }

    fn status_update(&mut self, state: FsmVerifierState) {
        tracing::trace!(?state, "verifier FSM state");
    }
}

/// The embedder hooks a prover FSM drives (spec.md section 4.8). Mirrors
/// [`VerifierCallbacks`] except `listen` is replaced by `reconnect`.
pub trait ProverCallbacks {
    fn write(&mut self, bytes: &[u8]) -> bool {
        let _ = bytes;
        tracing::debug!("ProverCallbacks::write: no-op stub");
        true
    }

    fn set_timeout(&mut self, after: Duration) -> TimerToken {
        let _ = after;
        tracing::debug!("ProverCallbacks::set_timeout: no-op stub");
        TimerToken(0)
    }

    /// Reconnect to the rendezvous channel to resume continuous auth.
    fn reconnect(&mut self) {
        tracing::debug!("ProverCallbacks::reconnect: no-op stub");
    }

    fn disconnect(&mut self) {
        tracing::debug!("ProverCallbacks::disconnect: no-op stub");
    }

    fn error(&mut self) {
        tracing::warn!("ProverCallbacks::error: no-op stub");
    }

    fn authenticated(&mut self, status: AuthStatus) {
        let _ = status;
        tracing::debug!(?status, "ProverCallbacks::authenticated: no-op stub");
    }

    fn session_ended(&mut self) {
        tracing::debug!("ProverCallbacks::session_ended: no-op stub");
    }

    fn status_update(&mut self, state: FsmProverState) {
        tracing::trace!(?state, "prover FSM state");
    }
}
