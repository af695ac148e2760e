//! Length-delimited JSON framing over any async byte stream.
mod codec;

pub use codec::{Error, MAX_FRAME_LEN, decode, encode, framed, recv, send};
