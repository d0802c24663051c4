//! Length-prefixed framing
//!
//! Every frame on the wire is a little-endian `u32` payload length followed
//! by exactly that many payload bytes:
//!
//! ```text
//! [4 bytes: payload length, u32 LE][payload bytes: UTF-8 text]
//! ```

pub mod codec;

pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE, HEADER_LEN};

/// Literal appended to every echoed message
pub const SUFFIX: &str = " from echo server";

/// Builds the response text for a request message.
///
/// ```
/// assert_eq!(framecho::frame::respond("hi"), "hi from echo server");
/// assert_eq!(framecho::frame::respond(""), " from echo server");
/// ```
pub fn respond(message: &str) -> String {
    let mut response = String::with_capacity(message.len() + SUFFIX.len());
    response.push_str(message);
    response.push_str(SUFFIX);
    response
}
