//! Blocking, thread-per-session drivers for the Pico protocol (C5): linear
//! prover and verifier APIs — `start()`, `cycle_start()`, `reauth()`,
//! `finish()` — built on top of a blocking [`Channel`] rather than the
//! event-driven callback surface `pico-fsm` exposes. Both drivers run the
//! exact same wire protocol as their FSM counterparts; an embedder picks
//! whichever concurrency model fits (one thread per session here, versus
//! cooperative multiplexing there).

mod channel;
mod continuous;
mod error;
mod prover_driver;
mod verifier_driver;

pub use channel::Channel;
pub use continuous::ContinuousSession;
pub use error::ContinuousError;
pub use prover_driver::ContinuousProver;
pub use verifier_driver::ContinuousVerifier;
