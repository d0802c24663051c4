use crate::EchoError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Size of the length prefix in bytes
pub const HEADER_LEN: usize = 4;

/// Default upper bound for a decoded payload (16 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Largest payload the length field can describe
const WIRE_MAX: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for the 4-byte length prefix
    Head,
    /// Prefix consumed, waiting for this many payload bytes
    Data(usize),
}

/// Codec for `[u32 LE length][payload]` frames
///
/// The maximum frame size only bounds what the decoder accepts from a peer.
/// Encoding is limited by the width of the length field, so a response that
/// grows past the decode limit (the suffix is appended) can still be sent.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use framecho::FrameCodec;
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut codec = FrameCodec::default();
/// let mut buf = BytesMut::new();
/// codec.encode(&b"hello"[..], &mut buf).unwrap();
/// assert_eq!(&buf[..4], &5u32.to_le_bytes());
///
/// let frame = codec.decode(&mut buf).unwrap().unwrap();
/// assert_eq!(&frame[..], b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
    state: DecodeState,
}

impl FrameCodec {
    /// Creates a codec rejecting payloads longer than `max_frame_size`.
    ///
    /// Values above `u32::MAX` are clamped, the length field cannot express more.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.min(WIRE_MAX),
            state: DecodeState::Head,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = EchoError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, EchoError> {
        let length = match self.state {
            DecodeState::Head => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let length = src.get_u32_le() as usize;
                if length > self.max_frame_size {
                    return Err(EchoError::FrameTooLarge {
                        length,
                        max: self.max_frame_size,
                    });
                }

                // Bounded by max_frame_size above
                src.reserve(length.saturating_sub(src.len()));
                self.state = DecodeState::Data(length);
                length
            }
            DecodeState::Data(length) => length,
        };

        if src.len() < length {
            return Ok(None);
        }

        self.state = DecodeState::Head;
        Ok(Some(src.split_to(length)))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<BytesMut>, EchoError> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }

        match self.state {
            DecodeState::Head if buf.is_empty() => Ok(None),
            DecodeState::Head => Err(EchoError::TruncatedFrame {
                expected: HEADER_LEN,
                received: buf.len(),
            }),
            DecodeState::Data(length) => Err(EchoError::TruncatedFrame {
                expected: length,
                received: buf.len(),
            }),
        }
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = EchoError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), EchoError> {
        if item.len() > WIRE_MAX {
            return Err(EchoError::FrameTooLarge {
                length: item.len(),
                max: WIRE_MAX,
            });
        }

        dst.reserve(HEADER_LEN + item.len());
        dst.put_u32_le(item.len() as u32);
        dst.extend_from_slice(item);
        Ok(())
    }
}
