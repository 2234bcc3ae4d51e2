use std::io::Write;

use wenet_frame::{BitDumpWriter, FrameWriter};

use crate::error::Result;

/// Something that puts frames on the air.
///
/// Implementations are owned by the scheduler thread. `transmit` is expected
/// to block for roughly the frame's airtime; that is what paces the link.
pub trait Radio: Send {
    /// Send one complete frame.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Release the radio. Called once when the scheduler exits.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Radio + ?Sized> Radio for Box<R> {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }
}

/// Radio backed by a byte sink: a UART feeding the modulator, a file, or a pipe.
pub struct WriterRadio<W: Write> {
    writer: FrameWriter<W>,
}

impl<W: Write + Send> WriterRadio<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: FrameWriter::new(sink),
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.writer.frames_written()
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Radio for WriterRadio<W> {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.write_frame(frame)?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        tracing::debug!(frames = self.writer.frames_written(), "radio sink closed");
        self.writer.flush()?;
        Ok(())
    }
}

/// Debug radio writing one byte per transmitted bit.
pub struct BitDumpRadio<W: Write> {
    writer: BitDumpWriter<W>,
}

impl<W: Write + Send> BitDumpRadio<W> {
    /// `rs232` adds a start and stop bit around each byte, LSB first.
    pub fn new(sink: W, rs232: bool) -> Self {
        Self {
            writer: BitDumpWriter::new(sink, rs232),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Radio for BitDumpRadio<W> {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.write_frame(frame)?;
        Ok(())
    }
}
