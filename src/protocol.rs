//! Block wire protocol split into types, codec and builders

pub mod builder;
pub mod codec;
pub mod types;

pub use builder::*;
pub use codec::{BlockDecoder, EnvelopeDecoder, EnvelopeInfo, WireCodec};
pub use types::*;
