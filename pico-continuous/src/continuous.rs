use pico_handshake::SharedContext;
use pico_types::{ProtocolConfig, ReauthState, SequenceNumber};

/// The state a completed handshake hands off to the continuous-auth loop:
/// the shared session key (carried inside `ctx`'s derived keys), the two
/// per-direction sequence numbers, the current [`ReauthState`], and the
/// three timeouts (spec.md section 3, "Continuous session").
///
/// Not internally synchronized. The reference source warns "be careful in
/// multi-threaded environments" about `update_state` specifically, because
/// it is meant to be called from a thread other than the one driving
/// `reauth()`'s read/write loop; callers doing that must serialize
/// externally (spec.md section 5).
pub struct ContinuousSession {
    pub(crate) ctx: SharedContext,
    pub(crate) session_id: i64,
    pub(crate) pico_seq: SequenceNumber,
    pub(crate) service_seq: SequenceNumber,
    pub(crate) state: ReauthState,
    pub(crate) config: ProtocolConfig,
}

impl ContinuousSession {
    /// Builds the session handed off from a just-completed handshake.
    /// `ctx` must already hold derived keys. Both sequence numbers start
    /// at zero; the driver seeds its own outgoing one from the CSPRNG
    /// before the first `cycle_start()` (spec.md section 4.5: "initializes
    /// its own outgoing seq from CSPRNG to avoid cross-session replay") and
    /// seeds the peer's from the first message it receives.
    pub fn new(ctx: SharedContext, session_id: i64, config: ProtocolConfig) -> Self {
        ContinuousSession {
            ctx,
            session_id,
            pico_seq: SequenceNumber::zero(),
            service_seq: SequenceNumber::zero(),
            state: ReauthState::Continue,
            config,
        }
    }

    pub fn state(&self) -> ReauthState {
        self.state
    }

    pub fn current_timeout_ms(&self) -> u64 {
        self.state.timeout_ms(self.config.active_ms(), self.config.paused_ms())
    }

    pub fn pico_seq(&self) -> SequenceNumber {
        self.pico_seq
    }

    pub fn service_seq(&self) -> SequenceNumber {
        self.service_seq
    }

    /// Applies the reauth-state transition lattice (spec.md section 4.6)
    /// without doing any I/O. The normal ping-pong calls this as part of
    /// `reauth()`; an embedder wanting the out-of-band race described in
    /// spec.md section 9's open question can call it directly, but per the
    /// source's own warning must not do so concurrently with a live
    /// `reauth()` call on the same session without external locking.
    pub fn update_state(&mut self, requested: ReauthState) -> ReauthState {
        self.state = self.state.transition(requested);
        self.state
    }
}
