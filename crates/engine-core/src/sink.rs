use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Sink closed")]
    Closed,
}

/// Receives every formatted line, in row order.
///
/// Lines carry no trailing newline; a sink adds its own framing.
pub trait OutputSink: Send {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError>;
}

impl<F> OutputSink for F
where
    F: FnMut(&str) + Send,
{
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        self(line);
        Ok(())
    }
}

/// Writes one line per row to any `io::Write`, flushing after each line.
pub struct WriterSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        match writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Err(SinkError::Closed),
            Err(err) => Err(SinkError::Io(err)),
        }
    }
}
