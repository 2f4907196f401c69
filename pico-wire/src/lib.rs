//! Message codec for the Pico protocol (C2): the seven JSON wire messages
//! and the length-prefixed binary framing their encrypted inner payloads
//! use.

mod b64;
mod error;
mod framing;
mod inner;
mod messages;

pub use b64::B64;
pub use error::CodecError;
pub use framing::{FrameReader, FrameWriter};
pub use inner::{PicoAuthInner, PicoReauthInner, ServiceAuthInner, ServiceReauthInner, StatusInner};
pub use messages::{
    KeyPairingMessage, PairingKind, PicoAuth, PicoReauth, ServiceAuth, ServiceReauth, Start, Status,
};
