use std::sync::Arc;
use std::time::Duration;

use pico_crypto::{KeyPair, PicoCrypto};
use pico_handshake::{self as hs, SharedContext, UserDirectory};
use pico_types::{AuthStatus, ProtocolConfig, ReauthState, SequenceNumber};
use pico_wire::{PicoAuth, PicoReauth, Start};

use crate::channel::Channel;
use crate::continuous::ContinuousSession;
use crate::error::ContinuousError;

/// The linear, thread-per-session verifier driver (C5): runs the same
/// SIGMA-I handshake and reauth ping-pong as [`pico_fsm::VerifierFsm`], but
/// as straight-line blocking calls over a [`Channel`] instead of an
/// event-driven callback surface. Intended for an embedder that dedicates
/// one OS thread per session rather than cooperatively multiplexing many.
pub struct ContinuousVerifier<C: Channel> {
    channel: C,
    crypto: Box<dyn PicoCrypto>,
    config: ProtocolConfig,
    session: Option<ContinuousSession>,
}

impl<C: Channel> ContinuousVerifier<C> {
    pub fn new(channel: C, crypto: Box<dyn PicoCrypto>, config: ProtocolConfig) -> Self {
        ContinuousVerifier { channel, crypto, config, session: None }
    }

    fn read_message(&mut self) -> Result<Vec<u8>, ContinuousError> {
        self.channel.read_message()?.ok_or(ContinuousError::TimedOut)
    }

    /// Runs the four-message SIGMA-I handshake over the blocking channel
    /// and returns the status the verifier decided on. On `OK_CONTINUE`
    /// the session is left ready for [`Self::cycle_start`]; any other
    /// status means the caller should call [`Self::finish`].
    pub fn start(
        &mut self,
        service_identity: Arc<KeyPair>,
        users: Arc<dyn UserDirectory>,
        continuous: bool,
        extra_data: Vec<u8>,
        session_id: i64,
    ) -> Result<AuthStatus, ContinuousError> {
        self.channel.open()?;
        self.channel.set_timeout(self.config.auth_time_limit);

        let mut ctx = SharedContext::new();
        ctx.set_local_identity(service_identity);

        let start_bytes = self.read_message()?;
        let start_msg = Start::from_bytes(&start_bytes)?;
        hs::verifier_process_start(&mut ctx, self.crypto.as_ref(), &start_msg)?;

        let service_auth = hs::verifier_build_service_auth(&mut ctx, self.crypto.as_ref(), session_id)?;
        self.channel.write_message(&service_auth.to_bytes())?;

        let pico_auth_bytes = self.read_message()?;
        let pico_auth_msg = PicoAuth::from_bytes(&pico_auth_bytes)?;
        let outcome = hs::verifier_process_pico_auth(&mut ctx, self.crypto.as_ref(), &pico_auth_msg)?;

        let authorized = users.search_by_key(&outcome.pico_id_pub).is_some();
        let status = if !authorized {
            AuthStatus::Rejected
        } else if continuous {
            AuthStatus::OkContinue
        } else {
            AuthStatus::OkDone
        };

        let status_msg = hs::verifier_build_status(&ctx, self.crypto.as_ref(), session_id, status, &extra_data)?;
        self.channel.write_message(&status_msg.to_bytes())?;

        if status == AuthStatus::OkContinue {
            self.session = Some(ContinuousSession::new(ctx, session_id, self.config));
        }
        if !authorized {
            return Err(ContinuousError::Unauthorized);
        }
        Ok(status)
    }

    /// The first reauth exchange after the Pico reconnects: seeds
    /// `service_seq` from the CSPRNG and accepts whatever `pico_seq` the
    /// Pico's first `PicoReauth` carries rather than comparing it against a
    /// prior value (spec.md section 4.5).
    pub fn cycle_start(&mut self) -> bool {
        if let Some(session) = &mut self.session {
            session.service_seq = SequenceNumber::random();
        }
        self.run_cycle(true)
    }

    /// One full reauth round-trip: read `PicoReauth`, apply the
    /// [`ReauthState`] transition lattice, write `ServiceReauth` echoing
    /// the resulting state and timeout, and advance both sequence numbers.
    /// Returns `false` uniformly on any failure or on the Pico requesting
    /// `STOP`/`ERROR` — the finer cause is only observable via logging
    /// (spec.md section 7).
    pub fn reauth(&mut self) -> bool {
        self.run_cycle(false)
    }

    fn run_cycle(&mut self, seeding: bool) -> bool {
        let timeout_ms = match &self.session {
            Some(s) => s.current_timeout_ms(),
            None => {
                tracing::error!("reauth called with no active continuous session");
                return false;
            }
        };
        self.channel.set_timeout(Duration::from_millis(timeout_ms) + self.config.leeway);

        let bytes = match self.read_message() {
            Ok(b) => b,
            Err(err) => {
                tracing::warn!(error = %err, "verifier continuous read failed");
                return false;
            }
        };

        let outcome = self.process_pico_reauth(&bytes, seeding);
        match outcome {
            Ok(should_continue) => should_continue,
            Err(err) => {
                tracing::warn!(error = %err, "verifier continuous cycle failed");
                false
            }
        }
    }

    fn process_pico_reauth(&mut self, bytes: &[u8], seeding: bool) -> Result<bool, ContinuousError> {
        let session = self.session.as_mut().ok_or(ContinuousError::Closed)?;

        let msg = PicoReauth::from_bytes(bytes)?;
        let inner = hs::parse_pico_reauth(&session.ctx, self.crypto.as_ref(), &msg)?;
        let requested = inner.reauth_state().ok_or(ContinuousError::IllegalTransition)?;

        if seeding {
            session.pico_seq = inner.sequence_number;
        } else if inner.sequence_number != session.pico_seq {
            return Err(ContinuousError::SequenceMismatch {
                expected: session.pico_seq.as_u64(),
                actual: inner.sequence_number.as_u64(),
            });
        } else {
            session.pico_seq.increment();
        }

        session.state = session.state.transition(requested);
        if session.state == ReauthState::Error {
            return Err(ContinuousError::IllegalTransition);
        }

        let timeout_ms = session.current_timeout_ms();
        let service_reauth = hs::build_service_reauth(
            &session.ctx,
            self.crypto.as_ref(),
            session.session_id,
            session.state,
            timeout_ms as i32,
            session.service_seq,
            &[],
        )?;
        self.channel.write_message(&service_reauth.to_bytes())?;
        if !seeding {
            session.service_seq.increment();
        }

        Ok(!matches!(session.state, ReauthState::Stop | ReauthState::Error))
    }

    pub fn finish(&mut self) -> std::io::Result<()> {
        self.session = None;
        self.channel.close()
    }

    pub fn session(&self) -> Option<&ContinuousSession> {
        self.session.as_ref()
    }
}
