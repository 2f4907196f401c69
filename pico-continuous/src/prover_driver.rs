use std::sync::Arc;
use std::time::Duration;

use pico_crypto::{EcPublicKey, KeyPair, PicoCrypto};
use pico_handshake::{self as hs, SharedContext};
use pico_types::{AuthStatus, ProtocolConfig, ReauthState, SequenceNumber};
use pico_wire::{ServiceAuth, ServiceReauth, Status};

use crate::channel::Channel;
use crate::continuous::ContinuousSession;
use crate::error::ContinuousError;

/// The linear, thread-per-session prover driver (C5's other half): the
/// same SIGMA-I handshake and reauth ping-pong as [`pico_fsm::ProverFsm`],
/// driven by straight-line blocking calls instead of callbacks.
pub struct ContinuousProver<C: Channel> {
    channel: C,
    crypto: Box<dyn PicoCrypto>,
    config: ProtocolConfig,
    session: Option<ContinuousSession>,
}

impl<C: Channel> ContinuousProver<C> {
    pub fn new(channel: C, crypto: Box<dyn PicoCrypto>, config: ProtocolConfig) -> Self {
        ContinuousProver { channel, crypto, config, session: None }
    }

    fn read_message(&mut self) -> Result<Vec<u8>, ContinuousError> {
        self.channel.read_message()?.ok_or(ContinuousError::TimedOut)
    }

    /// Runs the handshake to completion and returns the status the
    /// verifier reported. `OK_CONTINUE` leaves the session ready for
    /// [`Self::reauth`]; anything else means the caller should call
    /// [`Self::finish`].
    pub fn start(
        &mut self,
        pico_identity: Arc<KeyPair>,
        service_id_pub: EcPublicKey,
        extra_data: Vec<u8>,
        session_id: i64,
    ) -> Result<(AuthStatus, Vec<u8>), ContinuousError> {
        self.channel.open()?;
        self.channel.set_timeout(self.config.auth_time_limit);

        let mut ctx = SharedContext::new();
        ctx.set_local_identity(pico_identity);
        ctx.set_remote_identity_pub(service_id_pub);

        let start_msg = hs::prover_build_start(&mut ctx, self.crypto.as_ref())?;
        self.channel.write_message(&start_msg.to_bytes())?;

        let service_auth_bytes = self.read_message()?;
        let service_auth_msg = ServiceAuth::from_bytes(&service_auth_bytes)?;
        hs::prover_process_service_auth(&mut ctx, self.crypto.as_ref(), &service_auth_msg)?;

        let pico_auth = hs::prover_build_pico_auth(&mut ctx, self.crypto.as_ref(), session_id, &extra_data)?;
        self.channel.write_message(&pico_auth.to_bytes())?;

        let status_bytes = self.read_message()?;
        let status_msg = Status::from_bytes(&status_bytes)?;
        let (status, returned_extra) = hs::prover_process_status(&ctx, self.crypto.as_ref(), &status_msg)?;

        if status == AuthStatus::OkContinue {
            self.session = Some(ContinuousSession::new(ctx, session_id, self.config));
        }
        Ok((status, returned_extra))
    }

    /// The first reauth exchange: seeds `pico_seq` from the CSPRNG, the way
    /// a prover initializing its own outgoing sequence after reconnect is
    /// described in spec.md section 4.5, and accepts whatever
    /// `service_seq` comes back on the first `ServiceReauth` rather than
    /// comparing it.
    pub fn cycle_start(&mut self) -> bool {
        if let Some(session) = &mut self.session {
            session.pico_seq = SequenceNumber::random();
        }
        self.run_cycle(true)
    }

    /// One full reauth round-trip: write `PicoReauth` with the locally
    /// requested state, read back `ServiceReauth`, verify its sequence
    /// number, and adopt the verifier's state and timeout. Returns `false`
    /// uniformly on any mismatch, I/O failure, or the verifier moving the
    /// session to `STOP`/`ERROR` (spec.md section 4.5).
    pub fn reauth(&mut self, requested: ReauthState) -> bool {
        self.run_cycle_with_state(false, requested)
    }

    fn run_cycle(&mut self, seeding: bool) -> bool {
        self.run_cycle_with_state(seeding, ReauthState::Continue)
    }

    fn run_cycle_with_state(&mut self, seeding: bool, requested: ReauthState) -> bool {
        match self.exchange(seeding, requested) {
            Ok(should_continue) => should_continue,
            Err(err) => {
                tracing::warn!(error = %err, "prover continuous cycle failed");
                false
            }
        }
    }

    fn exchange(&mut self, seeding: bool, requested: ReauthState) -> Result<bool, ContinuousError> {
        let (session_id, pico_seq) = {
            let session = self.session.as_ref().ok_or(ContinuousError::Closed)?;
            (session.session_id, session.pico_seq())
        };

        let pico_reauth = {
            let session = self.session.as_ref().ok_or(ContinuousError::Closed)?;
            hs::build_pico_reauth(&session.ctx, self.crypto.as_ref(), session_id, requested, pico_seq, &[])?
        };
        self.channel.write_message(&pico_reauth.to_bytes())?;
        if let Some(session) = &mut self.session {
            if !seeding {
                session.pico_seq.increment();
            }
        }

        let read_timeout_ms = {
            let session = self.session.as_ref().ok_or(ContinuousError::Closed)?;
            session.current_timeout_ms()
        };
        self.channel.set_timeout(Duration::from_millis(read_timeout_ms) + self.config.leeway);

        let bytes = self.read_message()?;
        let msg = pico_wire::ServiceReauth::from_bytes(&bytes)?;

        let session = self.session.as_mut().ok_or(ContinuousError::Closed)?;
        let inner = hs::parse_service_reauth(&session.ctx, self.crypto.as_ref(), &msg)?;
        let returned_state = inner.reauth_state().ok_or(ContinuousError::IllegalTransition)?;

        if seeding {
            session.service_seq = inner.sequence_number;
        } else if inner.sequence_number != session.service_seq {
            return Err(ContinuousError::SequenceMismatch {
                expected: session.service_seq.as_u64(),
                actual: inner.sequence_number.as_u64(),
            });
        } else {
            session.service_seq.increment();
        }

        session.state = returned_state;
        Ok(!matches!(session.state, ReauthState::Stop | ReauthState::Error))
    }

    pub fn finish(&mut self) -> std::io::Result<()> {
        self.session = None;
        self.channel.close()
    }

    pub fn session(&self) -> Option<&ContinuousSession> {
        self.session.as_ref()
    }

    /// Direct access to the underlying channel, for a test harness that
    /// needs to arm a fault (see `pico_testenv::FaultInjectingChannel`)
    /// between two otherwise-identical `reauth()` calls.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}
