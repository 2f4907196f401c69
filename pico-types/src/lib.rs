//! Value types shared across the Pico protocol workspace: the sequence
//! number, nonce, reauth-state lattice, status codes and protocol-wide
//! configuration, plus the umbrella error type every crate's narrower error
//! converts into.

mod config;
mod error;
mod nonce;
mod reauth;
mod sequence;
mod status;

pub use config::ProtocolConfig;
pub use error::PicoError;
pub use nonce::{Nonce, DEFAULT_NONCE_LEN};
pub use reauth::ReauthState;
pub use sequence::SequenceNumber;
pub use status::AuthStatus;
