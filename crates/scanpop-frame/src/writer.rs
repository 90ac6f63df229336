use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_header, HEADER_SIZE};
use crate::dims::Dimensions;
use crate::error::{FrameError, Result};
use crate::traits::FrameSink;

/// Writes complete raw frames to any `Write` stream.
pub struct RawFrameWriter<T> {
    inner: T,
    dims: Dimensions,
    frames_written: u64,
}

impl<T: Write> RawFrameWriter<T> {
    /// Create a writer for a headerless raw stream.
    pub fn new(inner: T, dims: Dimensions) -> Self {
        Self {
            inner,
            dims,
            frames_written: 0,
        }
    }

    /// Create a writer that first emits the 4-byte dimension header.
    pub fn with_header(inner: T, dims: Dimensions) -> Result<Self> {
        let mut writer = Self::new(inner, dims);
        let mut header = BytesMut::with_capacity(HEADER_SIZE);
        encode_header(dims, &mut header);
        writer.write_all(&header)?;
        Ok(writer)
    }

    /// Write one complete frame.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.dims.check_frame(frame)?;
        self.write_all(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::StreamClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Geometry of the frames this writer accepts.
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Write> FrameSink for RawFrameWriter<T> {
    type Error = FrameError;

    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn accept_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.write_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::reader::RawFrameReader;

    fn dims(width: u16, height: u16) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    #[test]
    fn writes_frames_back_to_back() {
        let mut writer = RawFrameWriter::new(Vec::new(), dims(2, 1));
        writer.write_frame(&[1, 2]).unwrap();
        writer.write_frame(&[3, 4]).unwrap();
        assert_eq!(writer.frames_written(), 2);
        assert_eq!(writer.into_inner(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn header_precedes_frames() {
        let mut writer = RawFrameWriter::with_header(Vec::new(), dims(2, 1)).unwrap();
        writer.write_frame(&[5, 6]).unwrap();
        assert_eq!(writer.into_inner(), vec![2, 0, 1, 0, 5, 6]);
    }

    #[test]
    fn wrong_sized_frame_rejected() {
        let mut writer = RawFrameWriter::new(Vec::new(), dims(2, 2));
        let err = writer.write_frame(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::FrameSize { .. }));
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn stream_closed_when_write_returns_zero() {
        let mut writer = RawFrameWriter::new(ZeroWriter, dims(1, 1));
        let err = writer.write_frame(&[1]).unwrap_err();
        assert!(matches!(err, FrameError::StreamClosed));
    }

    #[test]
    fn headered_output_reads_back() {
        let mut writer = RawFrameWriter::with_header(Vec::new(), dims(3, 2)).unwrap();
        writer.write_frame(&[1, 1, 1, 2, 2, 2]).unwrap();
        writer.flush().unwrap();

        let mut reader = RawFrameReader::with_header(Cursor::new(writer.into_inner())).unwrap();
        assert_eq!(reader.dimensions(), dims(3, 2));
        assert_eq!(
            reader.read_frame().unwrap().unwrap().as_ref(),
            &[1, 1, 1, 2, 2, 2]
        );
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
