use crate::frame::FrameCodec;
use crate::{EchoError, Result};
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};

const INITIAL_BUFFER_SIZE: usize = 8 * 1024;

/// A byte stream carrying length-prefixed frames
///
/// Reads accumulate into an internal buffer until the codec yields a whole
/// frame. Every individual wait for bytes is bounded by the idle timeout, so a
/// peer that trickles data keeps the connection alive while a stalled one
/// does not. Responses are encoded into a single buffer and written with one
/// `write_all`.
#[derive(Debug)]
pub struct Connection<S> {
    stream: S,
    codec: FrameCodec,
    read_buf: BytesMut,
    write_buf: BytesMut,
    idle_timeout: Duration,
    write_timeout: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, codec: FrameCodec, idle_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            stream,
            codec,
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            write_buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            idle_timeout,
            write_timeout,
        }
    }

    /// Reads the next frame payload.
    ///
    /// Returns `Ok(None)` when the peer closed the stream on a frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<BytesMut>> {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(frame));
            }

            let n = timeout(self.idle_timeout, self.stream.read_buf(&mut self.read_buf))
                .await
                .map_err(|_| EchoError::IdleTimeout(self.idle_timeout))??;

            if n == 0 {
                return self.codec.decode_eof(&mut self.read_buf);
            }
        }
    }

    /// Writes one frame carrying `payload` and flushes it.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.write_buf.clear();
        self.codec.encode(payload, &mut self.write_buf)?;

        let stream = &mut self.stream;
        let buf = &self.write_buf;
        timeout(self.write_timeout, async move {
            stream.write_all(buf).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| EchoError::WriteTimeout(self.write_timeout))??;

        Ok(())
    }
}
