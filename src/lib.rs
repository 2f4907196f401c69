//! The Pico authentication protocol: a SIGMA-I based challenge-response
//! handshake between a mobile prover ("Pico") and a network-facing
//! verifier ("service"), bootstrapped over a QR-coded rendezvous channel
//! and optionally followed by a continuous-authentication ping-pong loop.
//!
//! This crate is the public face of the workspace; it re-exports the
//! pieces an embedder actually needs without requiring a dependency on
//! every individual `pico-*` crate:
//!
//! - [`pico_types`] — value types shared everywhere: [`SequenceNumber`],
//!   [`Nonce`], [`ReauthState`], [`AuthStatus`], [`ProtocolConfig`] and the
//!   umbrella [`PicoError`].
//! - [`pico_crypto`] — the [`PicoCrypto`] trait and its production
//!   backend, [`DefaultCrypto`].
//! - [`pico_wire`] — the seven wire messages and their codec.
//! - [`pico_handshake`] — the SIGMA-I handshake functions, [`SharedContext`],
//!   the [`UserDirectory`] authorization hook, and the QR pairing builder.
//! - [`pico_fsm`] — the event-driven [`ProverFsm`]/[`VerifierFsm`] state
//!   machines, for embedders that cooperatively multiplex many sessions.
//! - [`pico_continuous`] — the blocking [`ContinuousProver`]/[`ContinuousVerifier`]
//!   drivers, for a thread-per-session embedder.
//!
//! Pick one of the two engines (`pico_fsm` or `pico_continuous`) per
//! session; both speak the same wire protocol and can interoperate with
//! each other or with a non-Rust peer.

pub use pico_continuous::{Channel, ContinuousError, ContinuousProver, ContinuousSession, ContinuousVerifier};
pub use pico_crypto::{CryptoError, DefaultCrypto, DerivedKeys, EcPublicKey, KeyPair, PicoCrypto};
pub use pico_fsm::{
    ArmedTimeout, Event, FsmError, FsmProverState, FsmVerifierState, ProverCallbacks, ProverFsm, TimerToken,
    VerifierCallbacks, VerifierFsm,
};
pub use pico_handshake::{build_key_pairing, HandshakeError, NoUserDirectory, SharedContext, UserDirectory};
pub use pico_types::{AuthStatus, Nonce, PicoError, ProtocolConfig, ReauthState, SequenceNumber, DEFAULT_NONCE_LEN};
pub use pico_wire::{
    CodecError, KeyPairingMessage, PairingKind, PicoAuth, PicoReauth, ServiceAuth, ServiceReauth, Start, Status, B64,
};

/// End-to-end scenarios from spec.md section 8, driven over
/// `pico-testenv`'s in-memory channel so both sides of the wire protocol
/// run for real (codec, crypto, handshake, continuous ping-pong) without a
/// socket. Each scenario runs one side on a spawned thread and the other on
/// the test thread, mirroring how two independent processes would drive the
/// blocking `pico-continuous` API.
#[cfg(test)]
mod end_to_end {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use pico_testenv::{Fault, FaultInjectingChannel, InMemoryChannel};

    use crate::{
        AuthStatus, ContinuousProver, ContinuousVerifier, DefaultCrypto, EcPublicKey, KeyPair, NoUserDirectory,
        ProtocolConfig, ReauthState, UserDirectory,
    };

    /// Short timeouts so the replay/drop scenarios don't make the suite slow;
    /// everything else about these values is arbitrary.
    fn fast_config() -> ProtocolConfig {
        ProtocolConfig {
            active: Duration::from_millis(80),
            paused: Duration::from_millis(200),
            leeway: Duration::from_millis(40),
            reconnect_delay: Duration::from_millis(80),
            auth_time_limit: Duration::from_millis(300),
            contauth_leeway: Duration::from_millis(20),
        }
    }

    struct SingleUser {
        pico_pub: EcPublicKey,
    }

    impl UserDirectory for SingleUser {
        fn search_by_key(&self, pico_id_pub: &EcPublicKey) -> Option<String> {
            if pico_id_pub == &self.pico_pub {
                Some("pico".to_string())
            } else {
                None
            }
        }
    }

    #[test]
    fn scenario_1_happy_one_shot_handshake_reaches_ok_done() {
        let (prover_chan, verifier_chan) = InMemoryChannel::pair("mem://scenario-1");

        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());
        let service_pub = service_identity.public();
        let pico_pub = pico_identity.public();
        let config = fast_config();

        let prover_config = config;
        let prover_identity = pico_identity.clone();
        let prover_handle = thread::spawn(move || {
            let mut prover = ContinuousProver::new(prover_chan, Box::new(DefaultCrypto), prover_config);
            prover.start(prover_identity, service_pub, vec![7, 8, 9], 1).unwrap()
        });

        let mut verifier = ContinuousVerifier::new(verifier_chan, Box::new(DefaultCrypto), config);
        let users: Arc<dyn UserDirectory> = Arc::new(SingleUser { pico_pub });
        let verifier_status = verifier.start(service_identity, users, false, vec![1, 2, 3], 1).unwrap();

        let (prover_status, extra) = prover_handle.join().unwrap();
        assert_eq!(verifier_status, AuthStatus::OkDone);
        assert_eq!(prover_status, AuthStatus::OkDone);
        assert_eq!(extra, vec![1, 2, 3]);
    }

    #[test]
    fn scenario_2_continuous_session_advances_sequence_numbers_in_lockstep() {
        let (prover_chan, verifier_chan) = InMemoryChannel::pair("mem://scenario-2");

        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());
        let service_pub = service_identity.public();
        let pico_pub = pico_identity.public();
        let config = fast_config();

        let prover_config = config;
        let prover_identity = pico_identity.clone();
        let prover_handle = thread::spawn(move || {
            let mut prover = ContinuousProver::new(prover_chan, Box::new(DefaultCrypto), prover_config);
            let (status, _) = prover.start(prover_identity, service_pub, vec![], 2).unwrap();
            assert_eq!(status, AuthStatus::OkContinue);

            assert!(prover.cycle_start());
            assert!(prover.reauth(ReauthState::Continue));
            assert!(prover.reauth(ReauthState::Continue));

            let session = prover.session().unwrap();
            (session.pico_seq().as_u64(), session.service_seq().as_u64())
        });

        let mut verifier = ContinuousVerifier::new(verifier_chan, Box::new(DefaultCrypto), config);
        let users: Arc<dyn UserDirectory> = Arc::new(SingleUser { pico_pub });
        let verifier_status = verifier.start(service_identity, users, true, vec![], 2).unwrap();
        assert_eq!(verifier_status, AuthStatus::OkContinue);

        assert!(verifier.cycle_start());
        assert!(verifier.reauth());
        assert!(verifier.reauth());

        let (prover_pico_seq, prover_service_seq) = prover_handle.join().unwrap();
        let verifier_session = verifier.session().unwrap();

        // One `cycle_start()` (seeds both sides) followed by two `reauth()`
        // round-trips: every sequence number, on both ends, has advanced by
        // exactly two past whatever it was seeded to. See DESIGN.md for why the
        // seed round itself never counts as an increment.
        assert_eq!(verifier_session.pico_seq().as_u64(), prover_pico_seq);
        assert_eq!(verifier_session.service_seq().as_u64(), prover_service_seq);
    }

    #[test]
    fn scenario_3_unregistered_identity_is_rejected() {
        let (prover_chan, verifier_chan) = InMemoryChannel::pair("mem://scenario-3");

        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());
        let service_pub = service_identity.public();
        let config = fast_config();

        let prover_config = config;
        let prover_identity = pico_identity;
        let prover_handle = thread::spawn(move || {
            let mut prover = ContinuousProver::new(prover_chan, Box::new(DefaultCrypto), prover_config);
            prover.start(prover_identity, service_pub, vec![], 3).unwrap()
        });

        let mut verifier = ContinuousVerifier::new(verifier_chan, Box::new(DefaultCrypto), config);
        // Nobody is registered, so the verifier's directory lookup always misses.
        let users: Arc<dyn UserDirectory> = Arc::new(NoEmptyDirectory);
        let verifier_result = verifier.start(service_identity, users, false, vec![], 3);
        assert!(matches!(verifier_result, Err(crate::ContinuousError::Unauthorized)));

        let (prover_status, _) = prover_handle.join().unwrap();
        assert_eq!(prover_status, AuthStatus::Rejected);
    }

    struct NoEmptyDirectory;
    impl UserDirectory for NoEmptyDirectory {
        fn search_by_key(&self, _pico_id_pub: &EcPublicKey) -> Option<String> {
            None
        }
    }

    #[test]
    fn scenario_4_replayed_reauth_message_is_rejected() {
        let (prover_inner, verifier_inner) = InMemoryChannel::pair("mem://scenario-4");
        let prover_chan = FaultInjectingChannel::new(prover_inner);
        let verifier_chan = verifier_inner;

        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());
        let service_pub = service_identity.public();
        let pico_pub = pico_identity.public();
        let config = fast_config();

        let prover_config = config;
        let prover_identity = pico_identity.clone();
        let prover_handle = thread::spawn(move || {
            let mut prover = ContinuousProver::new(prover_chan, Box::new(DefaultCrypto), prover_config);
            let (status, _) = prover.start(prover_identity, service_pub, vec![], 4).unwrap();
            assert_eq!(status, AuthStatus::OkContinue);

            assert!(prover.cycle_start());
            assert!(prover.reauth(ReauthState::Continue));

            // Replay the previous PicoReauth verbatim instead of sending a
            // fresh one: the verifier already consumed that sequence number.
            prover.channel_mut().inject(Fault::ReplayPrevious);
            let replay_accepted = prover.reauth(ReauthState::Continue);
            assert!(!replay_accepted);
        });

        let mut verifier = ContinuousVerifier::new(verifier_chan, Box::new(DefaultCrypto), config);
        let users: Arc<dyn UserDirectory> = Arc::new(SingleUser { pico_pub });
        let verifier_status = verifier.start(service_identity, users, true, vec![], 4).unwrap();
        assert_eq!(verifier_status, AuthStatus::OkContinue);

        assert!(verifier.cycle_start());
        assert!(verifier.reauth());
        // The replayed message carries a sequence number the verifier already
        // consumed; it must reject instead of looping the session forward.
        assert!(!verifier.reauth());

        prover_handle.join().unwrap();
    }

    #[test]
    fn scenario_5_tampered_status_ciphertext_fails_prover_decryption() {
        use pico_handshake::{self as hs, SharedContext};

        let service_identity = Arc::new(KeyPair::generate());
        let pico_identity = Arc::new(KeyPair::generate());
        let crypto = DefaultCrypto;

        let mut prover_ctx = SharedContext::new();
        prover_ctx.set_local_identity(pico_identity.clone());
        prover_ctx.set_remote_identity_pub(service_identity.public());

        let mut verifier_ctx = SharedContext::new();
        verifier_ctx.set_local_identity(service_identity.clone());

        let start = hs::prover_build_start(&mut prover_ctx, &crypto).unwrap();
        hs::verifier_process_start(&mut verifier_ctx, &crypto, &start).unwrap();

        let service_auth = hs::verifier_build_service_auth(&mut verifier_ctx, &crypto, 5).unwrap();
        hs::prover_process_service_auth(&mut prover_ctx, &crypto, &service_auth).unwrap();

        let pico_auth = hs::prover_build_pico_auth(&mut prover_ctx, &crypto, 5, &[]).unwrap();
        hs::verifier_process_pico_auth(&mut verifier_ctx, &crypto, &pico_auth).unwrap();

        let mut status = hs::verifier_build_status(&verifier_ctx, &crypto, 5, AuthStatus::OkDone, &[]).unwrap();
        status.encrypted_data.0[0] ^= 0xff;

        let result = hs::prover_process_status(&prover_ctx, &crypto, &status);
        assert!(result.is_err());
    }

    #[test]
    fn scenario_6_stop_cannot_transition_back_to_continue() {
        use pico_continuous::ContinuousSession;

        let service_identity = Arc::new(KeyPair::generate());
        let mut verifier_ctx = pico_handshake::SharedContext::new();
        verifier_ctx.set_local_identity(service_identity);

        let mut session = ContinuousSession::new(verifier_ctx, 6, fast_config());
        assert_eq!(session.update_state(ReauthState::Stop), ReauthState::Stop);
        // Once STOP, any further request (including CONTINUE) collapses to ERROR.
        assert_eq!(session.update_state(ReauthState::Continue), ReauthState::Error);
        assert_eq!(session.state(), ReauthState::Error);
    }

    #[allow(dead_code)]
    fn use_no_user_directory() -> NoUserDirectory {
        NoUserDirectory
    }
}
