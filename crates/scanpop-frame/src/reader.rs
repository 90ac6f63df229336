use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_header, HEADER_SIZE};
use crate::dims::Dimensions;
use crate::error::{FrameError, Result};
use crate::traits::FrameSource;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Reads complete raw frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct RawFrameReader<T> {
    inner: T,
    buf: BytesMut,
    dims: Dimensions,
    frames_read: u64,
}

impl<T: Read> RawFrameReader<T> {
    /// Create a reader for a headerless stream of known geometry.
    pub fn new(inner: T, dims: Dimensions) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(dims.frame_len().max(READ_CHUNK_SIZE)),
            dims,
            frames_read: 0,
        }
    }

    /// Create a reader for a stream that opens with the 4-byte dimension header.
    pub fn with_header(mut inner: T) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        read_exact_or_missing(&mut inner, &mut header)?;
        let dims = decode_header(&header)?.ok_or(FrameError::MissingHeader)?;
        tracing::debug!(dims = %dims, "raw stream header read");
        Ok(Self::new(inner, dims))
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` on a clean end of stream and
    /// `Err(FrameError::TruncatedFrame)` if the stream stops mid-frame.
    pub fn read_frame(&mut self) -> Result<Option<Bytes>> {
        let frame_len = self.dims.frame_len();
        loop {
            if self.buf.len() >= frame_len {
                self.frames_read += 1;
                return Ok(Some(self.buf.split_to(frame_len).freeze()));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                tracing::warn!(
                    frames_read = self.frames_read,
                    leftover = self.buf.len(),
                    "raw stream ended mid-frame"
                );
                return Err(FrameError::TruncatedFrame {
                    expected: frame_len,
                    actual: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Geometry of the frames in this stream.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Number of complete frames returned so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> FrameSource for RawFrameReader<T> {
    type Error = FrameError;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn next_frame(&mut self) -> Result<Option<Bytes>> {
        self.read_frame()
    }
}

fn read_exact_or_missing<T: Read>(inner: &mut T, buf: &mut [u8]) -> Result<()> {
    match inner.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(FrameError::MissingHeader),
        Err(err) => Err(FrameError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn dims(width: u16, height: u16) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    #[test]
    fn read_frames_in_order() {
        let mut reader = RawFrameReader::new(Cursor::new(vec![1, 2, 3, 4, 5, 6, 7, 8]), dims(2, 2));

        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), &[1, 2, 3, 4]);
        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), &[5, 6, 7, 8]);
        assert!(reader.read_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 2);
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = RawFrameReader::new(Cursor::new(Vec::<u8>::new()), dims(4, 4));
        assert!(reader.read_frame().unwrap().is_none());
    }

    #[test]
    fn trailing_partial_frame_is_reported() {
        let mut reader = RawFrameReader::new(Cursor::new(vec![0u8; 7]), dims(2, 2));
        reader.read_frame().unwrap().unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::TruncatedFrame {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn header_sets_dimensions() {
        let wire = vec![2, 0, 1, 0, 9, 8];
        let mut reader = RawFrameReader::with_header(Cursor::new(wire)).unwrap();
        assert_eq!(reader.dimensions(), dims(2, 1));
        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), &[9, 8]);
    }

    #[test]
    fn short_header_is_missing() {
        let err = RawFrameReader::with_header(Cursor::new(vec![2, 0, 1])).err().unwrap();
        assert!(matches!(err, FrameError::MissingHeader));
    }

    #[test]
    fn frame_larger_than_read_chunk() {
        let d = dims(512, 256);
        let data: Vec<u8> = (0..d.frame_len()).map(|i| (i % 251) as u8).collect();
        let mut reader = RawFrameReader::new(Cursor::new(data.clone()), d);
        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), data.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: vec![7, 7, 7],
            pos: 0,
        };
        let mut reader = RawFrameReader::new(byte_reader, dims(3, 1));
        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), &[7, 7, 7]);
    }

    #[test]
    fn interrupted_read_is_retried() {
        let inner = InterruptedOnce {
            interrupted: false,
            inner: Cursor::new(vec![1, 2]),
        };
        let mut reader = RawFrameReader::new(inner, dims(2, 1));
        assert_eq!(reader.read_frame().unwrap().unwrap().as_ref(), &[1, 2]);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
