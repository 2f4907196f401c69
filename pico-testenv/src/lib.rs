//! Test-only scaffolding for exercising the Pico protocol end to end
//! without a real rendezvous transport: an in-memory [`Channel`] pair for
//! the blocking driver, a fault-injecting variant for reproducing the
//! tamper/replay scenarios, and a fixed-seed [`PicoCrypto`] backend for
//! deterministic fixtures.
//!
//! [`Channel`]: pico_continuous::Channel
//! [`PicoCrypto`]: pico_crypto::PicoCrypto

mod channel;
#[cfg(feature = "testing")]
mod crypto;

pub use channel::InMemoryChannel;
#[cfg(feature = "testing")]
pub use channel::{Fault, FaultInjectingChannel};
#[cfg(feature = "testing")]
pub use crypto::DeterministicCrypto;
