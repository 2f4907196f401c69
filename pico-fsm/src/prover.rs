use std::sync::Arc;

use pico_crypto::{EcPublicKey, KeyPair, PicoCrypto};
use pico_handshake::{self as hs, SharedContext};
use pico_types::{AuthStatus, ProtocolConfig, ReauthState, SequenceNumber};
use pico_wire::{ServiceAuth, ServiceReauth, Status};

use crate::callbacks::ProverCallbacks;
use crate::error::FsmError;
use crate::events::{Event, TimerToken};
use crate::states::FsmProverState;

/// The prover-side state machine (C6): symmetric to [`crate::VerifierFsm`]
/// except `listen()` is replaced by `reconnect()` (spec.md section 4.8).
pub struct ProverFsm {
    state: FsmProverState,
    config: ProtocolConfig,
    crypto: Box<dyn PicoCrypto>,
    callbacks: Box<dyn ProverCallbacks>,

    ctx: SharedContext,
    session_id: i64,
    extra_data: Vec<u8>,

    reauth_state: ReauthState,
    reauth_timeout_ms: u64,
    pico_seq: SequenceNumber,
    service_seq: SequenceNumber,
    timer: Option<TimerToken>,
}

impl ProverFsm {
    pub fn new(crypto: Box<dyn PicoCrypto>, callbacks: Box<dyn ProverCallbacks>, config: ProtocolConfig) -> Self {
        ProverFsm {
            state: FsmProverState::Invalid,
            config,
            crypto,
            callbacks,
            ctx: SharedContext::new(),
            session_id: 0,
            extra_data: Vec::new(),
            reauth_state: ReauthState::Invalid,
            reauth_timeout_ms: 0,
            pico_seq: SequenceNumber::zero(),
            service_seq: SequenceNumber::zero(),
            timer: None,
        }
    }

    pub fn state(&self) -> FsmProverState {
        self.state
    }

    fn set_state(&mut self, state: FsmProverState) {
        self.state = state;
        self.callbacks.status_update(state);
    }

    fn arm(&mut self, ms: u64) {
        self.timer = Some(self.callbacks.set_timeout(std::time::Duration::from_millis(ms)));
    }

    fn fail(&mut self, err: impl Into<FsmError>) {
        let err = err.into();
        tracing::error!(error = %err, state = ?self.state, "prover FSM error");
        self.set_state(FsmProverState::Error);
        self.callbacks.error();
    }

    fn unexpected(&mut self, event: &'static str) {
        self.fail(FsmError::UnexpectedEvent { state: "prover", event });
    }

    fn write_frame(&mut self, bytes: &[u8]) -> bool {
        self.callbacks.write(bytes)
    }

    /// `start(extraData, sIdPub, pIdPub, pIdPriv)` (spec.md section 4.8):
    /// INVALID → START. `service_id_pub` is the service identity embedded
    /// in the pairing QR; `pico_identity` is the Pico's own long-term key
    /// pair.
    pub fn start(&mut self, extra_data: Vec<u8>, service_id_pub: EcPublicKey, pico_identity: Arc<KeyPair>, session_id: i64) {
        self.ctx = SharedContext::new();
        self.ctx.set_local_identity(pico_identity);
        self.ctx.set_remote_identity_pub(service_id_pub);
        self.extra_data = extra_data;
        self.session_id = session_id;
        self.reauth_state = ReauthState::Invalid;
        self.set_state(FsmProverState::Start);
    }

    /// `stop()` (spec.md section 4.8): unconditionally resets to `Invalid`.
    pub fn stop(&mut self) {
        self.ctx.clear();
        self.set_state(FsmProverState::Invalid);
    }

    pub fn handle_event(&mut self, event: Event) {
        use FsmProverState::*;
        match (self.state, event) {
            (Start, Event::Connected) => {
                let start = match hs::prover_build_start(&mut self.ctx, self.crypto.as_ref()) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&start.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.set_state(ServiceAuth);
            }

            (ServiceAuth, Event::Read(bytes)) => {
                let msg = match ServiceAuth::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if let Err(e) = hs::prover_process_service_auth(&mut self.ctx, self.crypto.as_ref(), &msg) {
                    return self.fail(e);
                }
                let pico_auth = match hs::prover_build_pico_auth(&mut self.ctx, self.crypto.as_ref(), self.session_id, &self.extra_data) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&pico_auth.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.set_state(Status);
            }

            (Status, Event::Read(bytes)) => {
                let msg = match Status::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                let (status, _extra) = match hs::prover_process_status(&self.ctx, self.crypto.as_ref(), &msg) {
                    Ok(r) => r,
                    Err(e) => return self.fail(e),
                };
                self.callbacks.authenticated(status);
                self.callbacks.disconnect();
                match status {
                    AuthStatus::OkDone => {
                        self.callbacks.session_ended();
                        self.set_state(Fin);
                    }
                    AuthStatus::OkContinue => {
                        self.reauth_state = ReauthState::Continue;
                        self.set_state(Authenticated);
                    }
                    AuthStatus::Rejected | AuthStatus::Error => {
                        self.set_state(Error);
                    }
                }
            }

            (Authenticated, Event::Disconnected) => {
                self.set_state(ContStartPico);
                self.arm(self.config.reconnect_delay.as_millis() as u64);
            }

            (ContStartPico, Event::Timeout) => {
                self.callbacks.reconnect();
            }

            (ContStartPico, Event::Connected) => {
                self.pico_seq = SequenceNumber::random();
                let msg = match hs::build_pico_reauth(&self.ctx, self.crypto.as_ref(), self.session_id, self.reauth_state, self.pico_seq, &[]) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&msg.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.set_state(ContStartService);
            }

            (ContStartService, Event::Read(bytes)) | (ServiceReauth, Event::Read(bytes)) => {
                let msg = match ServiceReauth::from_bytes(&bytes) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                let inner = match hs::parse_service_reauth(&self.ctx, self.crypto.as_ref(), &msg) {
                    Ok(i) => i,
                    Err(e) => return self.fail(e),
                };
                let adopted = match inner.reauth_state() {
                    Some(s) => s,
                    None => return self.fail(FsmError::UnexpectedEvent { state: "prover", event: "bad-reauth-byte" }),
                };

                let seeding = self.state == ContStartService;
                if seeding {
                    self.service_seq = inner.sequence_number;
                } else if inner.sequence_number != self.service_seq {
                    return self.fail(FsmError::SequenceMismatch {
                        expected: self.service_seq.as_u64(),
                        actual: inner.sequence_number.as_u64(),
                    });
                } else {
                    self.service_seq.increment();
                }

                self.reauth_state = adopted;
                self.reauth_timeout_ms = inner.timeout_ms.max(0) as u64;
                self.set_state(PicoReauth);
                let leeway = self.config.contauth_leeway.as_millis() as u64;
                self.arm(self.reauth_timeout_ms.saturating_sub(leeway));
            }

            (PicoReauth, Event::Timeout) => {
                let msg = match hs::build_pico_reauth(&self.ctx, self.crypto.as_ref(), self.session_id, self.reauth_state, self.pico_seq, &[]) {
                    Ok(m) => m,
                    Err(e) => return self.fail(e),
                };
                if !self.write_frame(&msg.to_bytes()) {
                    return self.unexpected("write-failed");
                }
                self.pico_seq.increment();
                self.set_state(ServiceReauth);
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
    }

    impl ProverCallbacks for RecordingCallbacks {
        fn write(&mut self, bytes: &[u8]) -> bool {
            self.written.lock().unwrap().push(bytes.to_vec());
            true
        }

        fn set_timeout(&mut self, _after: std::time::Duration) -> TimerToken {
            TimerToken(1)
        }

        fn authenticated(&mut self, status: AuthStatus) {
            *self.last_status.lock().unwrap() = Some(status);
        }
    }

    #[test]
    fn one_shot_handshake_reaches_fin_with_ok_done() {
        let callbacks = RecordingCallbacks::default();
        let mut fsm = ProverFsm::new(Box::new(DefaultCrypto), Box::new(callbacks.clone()), ProtocolConfig::default());
        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());

        fsm.start(vec![], service_identity.public(), pico_identity.clone(), 9);
        fsm.handle_event(Event::Connected);
        assert_eq!(fsm.state(), FsmProverState::ServiceAuth);

        let start_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let start = pico_wire::Start::from_bytes(&start_bytes).unwrap();

        let crypto = DefaultCrypto;
        let mut verifier_ctx = SharedContext::new();
        verifier_ctx.set_local_identity(service_identity);
        hs::verifier_process_start(&mut verifier_ctx, &crypto, &start).unwrap();
        let service_auth = hs::verifier_build_service_auth(&mut verifier_ctx, &crypto, 9).unwrap();

        fsm.handle_event(Event::Read(service_auth.to_bytes()));
        assert_eq!(fsm.state(), FsmProverState::Status);

        let pico_auth_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let pico_auth = pico_wire::PicoAuth::from_bytes(&pico_auth_bytes).unwrap();
        hs::verifier_process_pico_auth(&mut verifier_ctx, &crypto, &pico_auth).unwrap();
        let status_msg = hs::verifier_build_status(&verifier_ctx, &crypto, 9, AuthStatus::OkDone, &[]).unwrap();

        fsm.handle_event(Event::Read(status_msg.to_bytes()));
        assert_eq!(fsm.state(), FsmProverState::Fin);
        assert_eq!(*callbacks.last_status.lock().unwrap(), Some(AuthStatus::OkDone));
    }

    #[test]
    fn tampered_status_ciphertext_moves_to_error() {
        let callbacks = RecordingCallbacks::default();
        let mut fsm = ProverFsm::new(Box::new(DefaultCrypto), Box::new(callbacks.clone()), ProtocolConfig::default());
        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());

        fsm.start(vec![], service_identity.public(), pico_identity, 1);
        fsm.handle_event(Event::Connected);

        let start_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let start = pico_wire::Start::from_bytes(&start_bytes).unwrap();

        let crypto = DefaultCrypto;
        let mut verifier_ctx = SharedContext::new();
        verifier_ctx.set_local_identity(service_identity);
        hs::verifier_process_start(&mut verifier_ctx, &crypto, &start).unwrap();
        let service_auth = hs::verifier_build_service_auth(&mut verifier_ctx, &crypto, 1).unwrap();
        fsm.handle_event(Event::Read(service_auth.to_bytes()));

        let pico_auth_bytes = callbacks.written.lock().unwrap().last().cloned().unwrap();
        let pico_auth = pico_wire::PicoAuth::from_bytes(&pico_auth_bytes).unwrap();
        hs::verifier_process_pico_auth(&mut verifier_ctx, &crypto, &pico_auth).unwrap();
        let mut status_msg = hs::verifier_build_status(&verifier_ctx, &crypto, 1, AuthStatus::OkDone, &[]).unwrap();
        let mut tampered = status_msg.encrypted_data.as_slice().to_vec();
        tampered[0] ^= 0xff;
        status_msg.encrypted_data = pico_wire::B64::new(tampered);

        fsm.handle_event(Event::Read(status_msg.to_bytes()));
        assert_eq!(fsm.state(), FsmProverState::Error);
    }
}
