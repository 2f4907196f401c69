use std::sync::Arc;

use pico_crypto::{KeyPair, PicoCrypto};
use pico_handshake::{self as hs, SharedContext, UserDirectory};
use pico_types::{AuthStatus, ProtocolConfig, ReauthState, SequenceNumber};
use pico_wire::{PicoAuth, PicoReauth, Start};

use crate::callbacks::VerifierCallbacks;
use crate::error::FsmError;
use crate::events::{Event, TimerToken};
use crate::states::FsmVerifierState;

/// The verifier-side state machine (C7): event-driven, never blocks. All
/// I/O happens through [`VerifierCallbacks`]; the embedder drives the
/// machine by calling [`VerifierFsm::start`] once and [`VerifierFsm::handle_event`]
/// for every `connected`/`read`/`disconnected`/`timeout` the rendezvous
/// channel produces.
pub struct VerifierFsm {
    state: FsmVerifierState,
    config: ProtocolConfig,
    crypto: Box<dyn PicoCrypto>,
    callbacks: Box<dyn VerifierCallbacks>,

    ctx: SharedContext,
    users: Arc<dyn UserDirectory>,
    session_id: i64,
    continuous: bool,
    extra_data: Vec<u8>,

    reauth_state: ReauthState,
    pico_seq: SequenceNumber,
    service_seq: SequenceNumber,
    timer: Option<TimerToken>,
    seeding_round: bool,
}

impl VerifierFsm {
    pub fn new(crypto: Box<dyn PicoCrypto>, callbacks: Box<dyn VerifierCallbacks>, config: ProtocolConfig) -> Self {
        VerifierFsm {
            state: FsmVerifierState::Invalid,
            config,
            crypto,
            callbacks,
            ctx: SharedContext::new(),
            users: Arc::new(pico_handshake::NoUserDirectory),
            session_id: 0,
            continuous: false,
            extra_data: Vec::new(),
            reauth_state: ReauthState::Invalid,
            pico_seq: SequenceNumber::zero(),
            service_seq: SequenceNumber::zero(),
            timer: None,
            seeding_round: false,
        }
    }

    pub fn state(&self) -> FsmVerifierState {
        self.state
    }

    fn set_state(&mut self, state: FsmVerifierState) {
        self.state = state;
        self.callbacks.status_update(state);
    }

    fn arm(&mut self, ms: u64) {
        self.timer = Some(self.callbacks.set_timeout(std::time::Duration::from_millis(ms)));
    }

    /// `start()` (spec.md section 4.7): INVALID → CONNECT. `service_identity`
    /// is the service's long-term identity key pair (`sIdPriv`/`sIdPub`);
    /// `users` is the authorization directory consulted after `PicoAuth`.
    pub fn start(
        &mut self,
        service_identity: Arc<KeyPair>,
        users: Arc<dyn UserDirectory>,
        continuous: bool,
        extra_data: Vec<u8>,
        session_id: i64,
    ) {
        self.ctx = SharedContext::new();
        self.ctx.set_local_identity(service_identity);
        self.users = users;
        self.continuous = continuous;
        self.extra_data = extra_data;
        self.session_id = session_id;
        self.reauth_state = ReauthState::Invalid;
        self.set_state(FsmVerifierState::Connect);
    }

    fn fail(&mut self, err: impl Into<FsmError>) {
        let err = err.into();
        tracing::error!(error = %err, state = ?self.state, "verifier FSM error");
        self.set_state(FsmVerifierState::Error);
        self.callbacks.error();
    }

    fn unexpected(&mut self, event: &'static str) {
        self.fail(FsmError::UnexpectedEvent { state: "verifier", event });
    }

    fn write_frame(&mut self, bytes: &[u8]) -> bool {
        self.callbacks.write(bytes)
    }

    fn send_service_reauth(&mut self, timeout_ms: i32) -> Result<(), FsmError> {
        let msg = hs::build_service_reauth(
            &self.ctx,
            self.crypto.as_ref(),
            self.session_id,
            self.reauth_state,
            timeout_ms,
            self.service_seq,
            &[],
        )?;
        if !self.write_frame(&msg.to_bytes()) {
            return Err(FsmError::UnexpectedEvent { state: "verifier", event: "write-failed" });
        }
        if !self.seeding_round {
            self.service_seq.increment();
        }
        Ok(())
    }

    /// Writes a `ServiceReauth` outside the normal ping-pong cadence,
    /// racing whatever `PicoReauth` the Pico is about to send. Per
    /// spec.md's open question this is intentionally unsynchronized —
    /// callers driving this concurrently with the FSM's own event loop
    /// must serialize externally.
    pub fn update_state(&mut self, requested: ReauthState) -> bool {
        let next = self.reauth_state.transition(requested);
        self.reauth_state = next;
        if next == ReauthState::Error {
            self.set_state(FsmVerifierState::Error);
            self.callbacks.error();
            return false;
        }
        let timeout_ms = next.timeout_ms(self.config.active_ms(), self.config.paused_ms());
        match self.send_service_reauth(timeout_ms as i32) {
            Ok(()) => true,
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    /// `stop()` (spec.md section 4.7): mid-handshake ends in `AuthFailed`
    /// with a rejected callback, mid-reauth ends in `Fin` with
    /// `session_ended`; either way the machine resets to `Invalid`.
    pub fn stop(&mut self) {
        use FsmVerifierState::*;
        match self.state {
            Connect | Start | PicoAuth => {
                self.callbacks.authenticated(AuthStatus::Rejected);
                self.set_state(AuthFailed);
            }
            ContStartService | ContStartPico | PicoReauth | ServiceReauth => {
                self.callbacks.session_ended();
                self.set_state(Fin);
            }
            _ => {}
        }
        self.ctx.clear();
        self.set_state(Invalid);
    }

    /// Feeds one embedder-delivered event into the machine.
    pub fn handle_event(&mut self, event: Event) {
        use FsmVerifierState::*;
        match (self.state, event) {
            (Connect, Event::Connected) => {
                self.set_state(Start);
                self.arm(self.config.auth_time_limit.as_millis() as u64);
            }

            (Start, Event::Read(bytes)) => {
                let msg = match Start::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if let Err(e) = hs::verifier_process_start(&mut self.ctx, self.crypto.as_ref(), &msg) {
                    return self.fail(e);
                }
                let service_auth = match hs::verifier_build_service_auth(&mut self.ctx, self.crypto.as_ref(), self.session_id) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&service_auth.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.set_state(PicoAuth);
            }

            (PicoAuth, Event::Read(bytes)) => {
                let msg = match PicoAuth::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                let outcome = match hs::verifier_process_pico_auth(&mut self.ctx, self.crypto.as_ref(), &msg) {
                    Ok(o) => o,
                    Err(e) => return self.fail(e),
                };
                let authorized = self.users.search_by_key(&outcome.pico_id_pub).is_some();
                let status = if !authorized {
                    AuthStatus::Rejected
                } else if self.continuous {
                    AuthStatus::OkContinue
                } else {
                    AuthStatus::OkDone
                };
                let status_msg = match hs::verifier_build_status(&self.ctx, self.crypto.as_ref(), self.session_id, status, &self.extra_data) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&status_msg.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.set_state(if authorized { Authenticated } else { AuthFailed });
                self.callbacks.disconnect();
            }

            (Authenticated, Event::Disconnected) => {
                if self.continuous {
                    self.callbacks.authenticated(AuthStatus::OkContinue);
                    self.reauth_state = ReauthState::Continue;
                    self.set_state(ContStartService);
                    self.callbacks.listen();
                    let reconnect_wait = self.config.reconnect_delay.as_millis() as u64
                        + self.reauth_state.timeout_ms(self.config.active_ms(), self.config.paused_ms());
                    self.arm(reconnect_wait);
                } else {
                    self.callbacks.authenticated(AuthStatus::OkDone);
                    self.callbacks.session_ended();
                    self.set_state(Fin);
                }
            }

            (AuthFailed, Event::Disconnected) => {
                self.callbacks.authenticated(AuthStatus::Rejected);
                self.callbacks.session_ended();
                self.set_state(Fin);
            }

            (ContStartService, Event::Connected) => {
                self.service_seq = SequenceNumber::random();
                self.set_state(ContStartPico);
                let timeout_ms = self.reauth_state.timeout_ms(self.config.active_ms(), self.config.paused_ms());
                self.arm(timeout_ms + self.config.leeway_ms());
            }

            (ContStartPico, Event::Read(bytes)) | (PicoReauth, Event::Read(bytes)) => {
                let msg = match PicoReauth::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                let inner = match hs::parse_pico_reauth(&self.ctx, self.crypto.as_ref(), &msg) {
                    Ok(i) => i,
                    Err(e) => return self.fail(e),
                };
                let requested = match inner.reauth_state() {
                    Some(s) => s,
                    None => return self.fail(FsmError::UnexpectedEvent { state: "verifier", event: "bad-reauth-byte" }),
                };

                let seeding = self.state == ContStartPico;
                self.seeding_round = seeding;
                if seeding {
                    self.pico_seq = inner.sequence_number;
                } else if inner.sequence_number != self.pico_seq {
                    return self.fail(FsmError::SequenceMismatch {
                        expected: self.pico_seq.as_u64(),
                        actual: inner.sequence_number.as_u64(),
                    });
                } else {
                    self.pico_seq.increment();
                }

                self.reauth_state = self.reauth_state.transition(requested);
                self.set_state(ServiceReauth);
            }

            (ServiceReauth, Event::Timeout) => {
                let timeout_ms = self.reauth_state.timeout_ms(self.config.active_ms(), self.config.paused_ms());
                if let Err(e) = self.send_service_reauth(timeout_ms as i32) {
                    return self.fail(e);
                }
                if self.reauth_state == ReauthState::Stop || self.reauth_state == ReauthState::Error {
                    self.callbacks.session_ended();
                    return self.set_state(Fin);
                }
                self.set_state(PicoReauth);
                self.arm(timeout_ms);
            }

            (ContStartPico, Event::Timeout) | (ContStartService, Event::Timeout) => {
                self.callbacks.session_ended();
                self.set_state(Fin);
            }

            (_, event) => {
                let name = match event {
                    Event::Connected => "connected",
                    Event::Read(_) => "read",
                    Event::Disconnected => "disconnected",
                    Event::Timeout => "timeout",
                };
                self.unexpected(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pico_crypto::DefaultCrypto;
    use std::sync::{Arc as StdArc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingCallbacks {
        written: StdArc<Mutex<Vec<Vec<u8>>>>,
        last_status: StdArc<Mutex<Option<AuthStatus>>>,
        disconnects: StdArc<Mutex<u32>>,
        errors: StdArc<Mutex<u32>>,
    }

    impl VerifierCallbacks for RecordingCallbacks {
        fn write(&mut self, bytes: &[u8]) -> bool {
            self.written.lock().unwrap().push(bytes.to_vec());
            true
        }

        fn set_timeout(&mut self, _after: std::time::Duration) -> TimerToken {
            TimerToken(1)
        }

        fn disconnect(&mut self) {
            *self.disconnects.lock().unwrap() += 1;
        }

        fn error(&mut self) {
            *self.errors.lock().unwrap() += 1;
        }

        fn authenticated(&mut self, status: AuthStatus) {
            *self.last_status.lock().unwrap() = Some(status);
        }
    }

    struct AcceptAll;
    impl UserDirectory for AcceptAll {
        fn search_by_key(&self, _pico_id_pub: &pico_crypto::EcPublicKey) -> Option<String> {
            Some("pico".to_string())
        }
    }

    /// Drives the verifier FSM through Start/ServiceAuth/PicoAuth by
    /// running a real prover-side context in lockstep, confirming the one-
    /// shot handshake (spec.md section 8 scenario 1) reaches `Authenticated`
    /// and emits `OK_DONE`.
    #[test]
    fn one_shot_handshake_reaches_authenticated_and_emits_ok_done() {
        let callbacks = RecordingCallbacks::default();
        let mut fsm = VerifierFsm::new(Box::new(DefaultCrypto), Box::new(callbacks.clone()), ProtocolConfig::default());
        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());

        fsm.start(service_identity.clone(), Arc::new(AcceptAll), false, vec![], 7);
        fsm.handle_event(Event::Connected);
        assert_eq!(fsm.state(), FsmVerifierState::Start);

        let crypto = DefaultCrypto;
        let mut prover_ctx = SharedContext::new();
        prover_ctx.set_local_identity(pico_identity);
        prover_ctx.set_remote_identity_pub(service_identity.public());

        let start = hs::prover_build_start(&mut prover_ctx, &crypto).unwrap();
        fsm.handle_event(Event::Read(start.to_bytes()));
        assert_eq!(fsm.state(), FsmVerifierState::PicoAuth);

        let service_auth_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let service_auth = pico_wire::ServiceAuth::from_bytes(&service_auth_bytes).unwrap();
        hs::prover_process_service_auth(&mut prover_ctx, &crypto, &service_auth).unwrap();

        let pico_auth = hs::prover_build_pico_auth(&mut prover_ctx, &crypto, 7, b"").unwrap();
        fsm.handle_event(Event::Read(pico_auth.to_bytes()));
        assert_eq!(fsm.state(), FsmVerifierState::Authenticated);
        assert_eq!(*callbacks.disconnects.lock().unwrap(), 1);

        fsm.handle_event(Event::Disconnected);
        assert_eq!(fsm.state(), FsmVerifierState::Fin);
        assert_eq!(*callbacks.last_status.lock().unwrap(), Some(AuthStatus::OkDone));
    }

    #[test]
    fn unexpected_event_moves_to_error() {
        let mut fsm = VerifierFsm::new(Box::new(DefaultCrypto), Box::new(RecordingCallbacks::default()), ProtocolConfig::default());
        fsm.start(Arc::new(KeyPair::generate()), Arc::new(AcceptAll), false, vec![], 1);
        fsm.handle_event(Event::Disconnected);
        assert_eq!(fsm.state(), FsmVerifierState::Error);
    }

    #[test]
    fn rejected_prover_moves_to_authfailed() {
        struct RejectAll;
        impl UserDirectory for RejectAll {
            fn search_by_key(&self, _pico_id_pub: &pico_crypto::EcPublicKey) -> Option<String> {
                None
            }
        }

        let callbacks = RecordingCallbacks::default();
        let mut fsm = VerifierFsm::new(Box::new(DefaultCrypto), Box::new(callbacks.clone()), ProtocolConfig::default());
        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());

        fsm.start(service_identity.clone(), Arc::new(RejectAll), false, vec![], 3);
        fsm.handle_event(Event::Connected);

        let crypto = DefaultCrypto;
        let mut prover_ctx = SharedContext::new();
        prover_ctx.set_local_identity(pico_identity);
        prover_ctx.set_remote_identity_pub(service_identity.public());

        let start = hs::prover_build_start(&mut prover_ctx, &crypto).unwrap();
        fsm.handle_event(Event::Read(start.to_bytes()));

        let service_auth_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let service_auth = pico_wire::ServiceAuth::from_bytes(&service_auth_bytes).unwrap();
        hs::prover_process_service_auth(&mut prover_ctx, &crypto, &service_auth).unwrap();

        let pico_auth = hs::prover_build_pico_auth(&mut prover_ctx, &crypto, 3, b"").unwrap();
        fsm.handle_event(Event::Read(pico_auth.to_bytes()));
        assert_eq!(fsm.state(), FsmVerifierState::AuthFailed);

        fsm.handle_event(Event::Disconnected);
        assert_eq!(*callbacks.last_status.lock().unwrap(), Some(AuthStatus::Rejected));
    }
}
