//! Event-driven finite state machines for the Pico protocol (C6 prover, C7
//! verifier): cooperative, single-threaded, never blocking. All I/O is
//! delegated to the embedder through [`ProverCallbacks`]/[`VerifierCallbacks`];
//! the embedder feeds connection lifecycle and rendezvous-channel bytes in
//! through [`Event`].

mod callbacks;
mod error;
mod events;
mod prover;
mod states;
mod verifier;

pub use callbacks::{ProverCallbacks, VerifierCallbacks};
pub use error::FsmError;
pub use events::{ArmedTimeout, Event, TimerToken};
pub use prover::ProverFsm;
pub use states::{FsmProverState, FsmVerifierState};
pub use verifier::VerifierFsm;
