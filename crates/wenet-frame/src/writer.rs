use std::io::{ErrorKind, Write};

use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` sink (serial device, file, pipe).
pub struct FrameWriter<T> {
    inner: T,
    frames_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            frames_written: 0,
        }
    }

    /// Write one framed packet in full (blocking), then flush.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        write_all_retrying(&mut self.inner, frame)?;
        self.flush()?;
        self.frames_written = self.frames_written.wrapping_add(1);
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        flush_retrying(&mut self.inner)
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Debug sink writing one byte per bit (0x00 / 0x01), for feeding a software
/// FSK modulator.
///
/// With RS-232 framing each byte becomes a start bit (0), eight data bits
/// LSB first, and a stop bit (1), matching what a UART puts on the air.
/// Without it, bits are written MSB first.
pub struct BitDumpWriter<T> {
    inner: T,
    rs232: bool,
    scratch: Vec<u8>,
}

impl<T: Write> BitDumpWriter<T> {
    /// Create a bit-dump writer.
    pub fn new(inner: T, rs232: bool) -> Self {
        Self {
            inner,
            rs232,
            scratch: Vec::new(),
        }
    }

    /// Expand a frame to bits and write it.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.scratch.clear();
        for &byte in frame {
            if self.rs232 {
                self.scratch.push(0);
                self.scratch.extend((0..8).map(|bit| (byte >> bit) & 1));
                self.scratch.push(1);
            } else {
                self.scratch.extend((0..8).rev().map(|bit| (byte >> bit) & 1));
            }
        }
        write_all_retrying(&mut self.inner, &self.scratch)?;
        flush_retrying(&mut self.inner)
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_all_retrying<T: Write>(inner: &mut T, data: &[u8]) -> Result<()> {
    // `write_all` already retries `Interrupted`.
    inner.write_all(data).map_err(|err| match err.kind() {
        ErrorKind::WriteZero => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    })
}

fn flush_retrying<T: Write>(inner: &mut T) -> Result<()> {
    loop {
        match inner.flush() {
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            other => return other.map_err(FrameError::Io),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::{decode_frame, frame_packet, FRAME_SIZE};

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = frame_packet(b"hello", None);

        writer.write_frame(&frame).unwrap();
        assert_eq!(writer.frames_written(), 1);

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), FRAME_SIZE);
        let deframed = decode_frame(&wire).unwrap();
        assert_eq!(&deframed.payload[..5], b"hello");
    }

    #[test]
    fn frames_are_written_back_to_back() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&frame_packet(b"one", None)).unwrap();
        writer.write_frame(&frame_packet(b"two", None)).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 2 * FRAME_SIZE);
        assert_eq!(&decode_frame(&wire[FRAME_SIZE..]).unwrap().payload[..3], b"two");
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.write_frame(b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
        assert_eq!(writer.get_ref().data, b"x");
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let mut writer = FrameWriter::new(InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        });
        writer.write_frame(b"retry").unwrap();
        assert_eq!(writer.into_inner().data, b"retry");
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.write_frame(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn bit_dump_with_rs232_framing() {
        let mut writer = BitDumpWriter::new(Vec::new(), true);
        writer.write_frame(&[0b1000_0001]).unwrap();
        assert_eq!(writer.into_inner(), vec![0, 1, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn bit_dump_without_framing_is_msb_first() {
        let mut writer = BitDumpWriter::new(Vec::new(), false);
        writer.write_frame(&[0b1100_0000, 0x01]).unwrap();
        let bits = writer.into_inner();
        assert_eq!(bits.len(), 16);
        assert_eq!(&bits[..8], &[1, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bits[8..], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
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
