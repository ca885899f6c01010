use bytes::{Buf, BufMut, BytesMut};
use std::io;

/// A frame wraps an item to be shipped across the network. The wire format is
/// simply `{len}{item}` where `len` is the length of `item` as a big-endian
/// `u64`. This mirrors the framing distant-net uses for its own call/reply
/// traffic, minus the codec chaining (compression/encryption) this system has
/// no need for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    item: Vec<u8>,
}

impl Frame {
    /// Number of bytes used for the length header.
    pub const HEADER_SIZE: usize = 8;

    pub fn new(item: Vec<u8>) -> Self {
        Self { item }
    }

    pub fn into_item(self) -> Vec<u8> {
        self.item
    }

    pub fn as_item(&self) -> &[u8] {
        &self.item
    }

    /// Writes the frame (header + item) to the end of `dst`.
    pub fn write(&self, dst: &mut BytesMut) -> io::Result<()> {
        if self.item.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "frame item cannot be empty",
            ));
        }

        dst.reserve(Self::HEADER_SIZE + self.item.len());
        dst.put_u64(self.item.len() as u64);
        dst.put_slice(&self.item);
        Ok(())
    }

    /// Attempts to read one frame out of `src`, returning `Ok(None)` if `src`
    /// does not yet contain a complete frame.
    pub fn read(src: &mut BytesMut) -> io::Result<Option<Frame>> {
        if src.len() <= Self::HEADER_SIZE {
            return Ok(None);
        }

        let item_len = u64::from_be_bytes(src[..Self::HEADER_SIZE].try_into().unwrap()) as usize;

        if item_len == 0 {
            src.advance(Self::HEADER_SIZE);
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame cannot have a zero-length item",
            ));
        }

        if src.len() < Self::HEADER_SIZE + item_len {
            return Ok(None);
        }

        let item = src[Self::HEADER_SIZE..Self::HEADER_SIZE + item_len].to_vec();
        src.advance(Self::HEADER_SIZE + item_len);
        Ok(Some(Frame { item }))
    }
}

impl From<Vec<u8>> for Frame {
    fn from(item: Vec<u8>) -> Self {
        Self { item }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_rejects_empty_item() {
        let frame = Frame::new(Vec::new());
        let mut buf = BytesMut::new();
        assert!(frame.write(&mut buf).is_err());
    }

    #[test]
    fn write_then_read_round_trips() {
        let frame = Frame::new(b"hello, world".to_vec());
        let mut buf = BytesMut::new();
        frame.write(&mut buf).unwrap();

        let read_back = Frame::read(&mut buf).unwrap().unwrap();
        assert_eq!(read_back.as_item(), b"hello, world");
        assert!(buf.is_empty());
    }

    #[test]
    fn read_returns_none_on_partial_header() {
        let mut buf = BytesMut::new();
        buf.put_bytes(0, Frame::HEADER_SIZE);
        assert!(matches!(Frame::read(&mut buf), Ok(None)));
    }

    #[test]
    fn read_returns_none_on_partial_item() {
        let mut buf = BytesMut::new();
        buf.put_u64(10);
        buf.put_slice(b"abc");
        assert!(matches!(Frame::read(&mut buf), Ok(None)));
    }

    #[test]
    fn read_rejects_zero_length_item_and_advances_past_header() {
        let mut buf = BytesMut::new();
        buf.put_u64(0);
        buf.put_bytes(0, 3);
        assert!(Frame::read(&mut buf).is_err());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn read_leaves_trailing_bytes_untouched() {
        let mut buf = BytesMut::new();
        Frame::new(b"hi".to_vec()).write(&mut buf).unwrap();
        buf.put_bytes(7, 4);

        let frame = Frame::read(&mut buf).unwrap().unwrap();
        assert_eq!(frame.as_item(), b"hi");
        assert_eq!(buf.len(), 4);
    }
}
