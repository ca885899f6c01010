use crate::{utils, Frame, TransportError};
use bytes::BytesMut;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Minimum amount of data we attempt to read from the socket at a time.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads and writes length-prefixed, MessagePack-encoded values over an
/// async byte stream. One value in flight at a time: a caller must finish a
/// `write_value` (or `read_value`) before starting the next, which is exactly
/// the "no pipelining, one call per connection" rule this protocol relies on.
pub struct FramedTransport<S> {
    stream: S,
    incoming: BytesMut,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            incoming: BytesMut::new(),
        }
    }

    pub async fn write_value<T: Serialize>(&mut self, value: &T) -> Result<(), TransportError> {
        let bytes = utils::serialize_to_vec(value).map_err(TransportError::Io)?;
        let frame = Frame::new(bytes);

        let mut out = BytesMut::new();
        frame.write(&mut out).map_err(TransportError::Io)?;

        self.stream
            .write_all(&out)
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    pub async fn read_value<T: DeserializeOwned>(&mut self) -> Result<T, TransportError> {
        loop {
            if let Some(frame) =
                Frame::read(&mut self.incoming).map_err(|e| {
                    TransportError::Protocol(format!("malformed frame: {e}"))
                })?
            {
                return utils::deserialize_from_slice(frame.as_item())
                    .map_err(TransportError::Io);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = self
                .stream
                .read(&mut chunk)
                .await
                .map_err(TransportError::Io)?;

            if n == 0 {
                return Err(TransportError::ConnectionClosed);
            }

            self.incoming.extend_from_slice(&chunk[..n]);
        }
    }
}
