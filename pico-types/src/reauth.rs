/// Lifecycle state carried in every continuous-authentication message.
///
/// `Invalid` is local-only bookkeeping (never placed on the wire); the wire
/// encoding of the other four variants is `Continue=0, Pause=1, Stop=2,
/// Error=3`, matching spec.md section 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReauthState {
    Invalid,
    Continue,
    Pause,
    Stop,
    Error,
}

impl ReauthState {
    pub fn to_wire_byte(self) -> Option<i8> {
        match self {
            ReauthState::Continue => Some(0),
            ReauthState::Pause => Some(1),
            ReauthState::Stop => Some(2),
            ReauthState::Error => Some(3),
            ReauthState::Invalid => None,
        }
    }

    pub fn from_wire_byte(byte: i8) -> Option<Self> {
        match byte {
            0 => Some(ReauthState::Continue),
            1 => Some(ReauthState::Pause),
            2 => Some(ReauthState::Stop),
            3 => Some(ReauthState::Error),
            _ => None,
        }
    }

    /// Applies the legal-transition lattice from spec.md section 4.6. Any
    /// transition not explicitly allowed collapses to `Error`; `Error` is
    /// absorbing.
    pub fn transition(self, requested: ReauthState) -> ReauthState {
        use ReauthState::*;
        match (self, requested) {
            (Error, _) => Error,
            (Stop, Stop) => Stop,
            (Stop, _) => Error,
            (Continue, Continue) | (Continue, Pause) | (Continue, Stop) => requested,
            (Continue, _) => Error,
            (Pause, Continue) | (Pause, Pause) | (Pause, Stop) => requested,
            (Pause, _) => Error,
            (Invalid, _) => Error,
        }
    }

    /// Read timeout in milliseconds associated with this state, per a given
    /// protocol configuration. `Continue` uses the active timeout, `Pause`
    /// the paused timeout, anything else has no timer.
    pub fn timeout_ms(self, active_ms: u64, paused_ms: u64) -> u64 {
        match self {
            ReauthState::Continue => active_ms,
            ReauthState::Pause => paused_ms,
            _ => 0,
        }
    }
}
