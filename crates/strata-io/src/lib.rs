//! Terrain persistence: row span packing and the compressed region stream.
#![forbid(unsafe_code)]

mod error;
mod span;
mod stream;

pub use error::{CodecError, Result};
pub use span::{MAX_DIR, MAX_RUN, MAX_STYLE, Span, decode_row, encode_row};
pub use stream::{
    DecodedRegion, SERIALIZATION_VERSION, SliceSpans, deserialize, encode_region, encode_slice,
    paste_into, serialize, serialize_region, write_stream,
};
