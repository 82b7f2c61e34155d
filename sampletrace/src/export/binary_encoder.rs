use log::debug;
use prost::Message;
use sampletrace_common::{MAGIC, VERSION};
use std::io::Write;

use super::StreamRecord;
use crate::domain::StreamError;

/// Writes a binary report stream
///
/// ```text
/// "SIMPLEPERF" | u16 LE version | { u32 LE len | Record } ... | u32 0
/// ```
///
/// The caller decides the record order; the encoder only frames records.
pub struct BinaryStreamEncoder<W: Write> {
    writer: W,
    finished: bool,
    records_written: usize,
}

impl<W: Write> BinaryStreamEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, finished: false, records_written: 0 }
    }

    /// Write the magic token and format version
    ///
    /// # Errors
    /// Returns an error if writing to the sink fails
    pub fn write_header(&mut self) -> Result<(), StreamError> {
        self.writer.write_all(MAGIC)?;
        self.writer.write_all(&VERSION.to_le_bytes())?;
        Ok(())
    }

    /// Write one length-prefixed record
    ///
    /// # Errors
    /// Returns an error if the stream was already finished, the record is too
    /// large to frame, or writing to the sink fails
    pub fn write_record(&mut self, record: &StreamRecord) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::EncoderFinished);
        }
        let body = record.to_proto().encode_to_vec();
        let len = u32::try_from(body.len())
            .map_err(|_| StreamError::Encoding(format!("record of {} bytes", body.len())))?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&body)?;
        self.records_written += 1;
        Ok(())
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Write the zero-length terminator and flush
    ///
    /// Returns the sink; the encoder refuses further records.
    ///
    /// # Errors
    /// Returns an error if the stream was already finished or writing fails
    pub fn finish(&mut self) -> Result<&mut W, StreamError> {
        if self.finished {
            return Err(StreamError::EncoderFinished);
        }
        self.writer.write_all(&0u32.to_le_bytes())?;
        self.writer.flush()?;
        self.finished = true;
        debug!("Report stream finished after {} records", self.records_written);
        Ok(&mut self.writer)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
