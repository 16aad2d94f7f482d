//! Protocol module containing message types, the binary codec, and stream framing.

pub mod animation;
pub mod codec;
pub mod messages;
pub mod sequence;
pub mod stream;
pub mod wire;

pub use animation::AnimationTargets;
pub use codec::{
    decode_frame, decode_payload, encode_frame, encode_payload, parse_header, write_header,
    ProtocolError,
};
pub use messages::*;
pub use sequence::SequenceCounter;
pub use stream::FrameDecoder;
pub use wire::{read_fixed_str, write_fixed_str};
