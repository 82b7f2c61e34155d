use log::{debug, warn};
use prost::Message;
use sampletrace_common::{self as proto, MAGIC, VERSION};
use std::io::{self, Read};

use crate::domain::{FormatError, StreamError};
use crate::export::StreamRecord;

/// Record size accepted without adjustment (64 MiB)
pub const INITIAL_RECORD_SIZE_LIMIT: u32 = 64 << 20;

/// Records above this size (512 MiB) are accepted with a warning
pub const RECORD_SIZE_WARNING: u32 = 512 << 20;

/// Largest record size seen so far in a stream
///
/// Starts at [`INITIAL_RECORD_SIZE_LIMIT`] and only grows: file records of
/// modules with large symbol tables can exceed the initial limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSizeLimit {
    current: u32,
}

impl Default for RecordSizeLimit {
    fn default() -> Self {
        Self { current: INITIAL_RECORD_SIZE_LIMIT }
    }
}

impl RecordSizeLimit {
    #[must_use]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Accept a record of `len` bytes, raising the limit if needed
    pub fn admit(&mut self, len: u32) {
        if len <= self.current {
            return;
        }
        debug!("Raising record size limit from {} to {len} bytes", self.current);
        self.current = len;
        if len > RECORD_SIZE_WARNING {
            warn!("Record of {len} bytes exceeds {RECORD_SIZE_WARNING} bytes");
        }
    }
}

/// Reads a binary report stream record by record
pub struct BinaryStreamDecoder<R: Read> {
    reader: R,
    size_limit: RecordSizeLimit,
    ended: bool,
}

impl<R: Read> BinaryStreamDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, size_limit: RecordSizeLimit::default(), ended: false }
    }

    /// Check the magic token and the format version
    ///
    /// Returns the version.
    ///
    /// # Errors
    /// Returns [`FormatError::BadMagic`] or [`FormatError::UnsupportedVersion`]
    /// for foreign or newer streams
    pub fn read_header(&mut self) -> Result<u16, StreamError> {
        let mut magic = [0u8; MAGIC.len()];
        read_or(&mut self.reader, &mut magic, FormatError::BadMagic)?;
        if &magic != MAGIC {
            return Err(FormatError::BadMagic.into());
        }

        let mut version = [0u8; 2];
        read_or(
            &mut self.reader,
            &mut version,
            FormatError::UnsupportedVersion { found: 0, expected: VERSION },
        )?;
        let version = u16::from_le_bytes(version);
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion { found: version, expected: VERSION }.into());
        }
        Ok(version)
    }

    /// Read the next record, or `None` once the terminator was read
    ///
    /// # Errors
    /// Returns an error if the stream ends without a terminator, a record is
    /// truncated or can't be decoded, or reading fails
    pub fn read_next(&mut self) -> Result<Option<StreamRecord>, StreamError> {
        if self.ended {
            return Ok(None);
        }

        let mut len = [0u8; 4];
        read_or(&mut self.reader, &mut len, FormatError::MissingTerminator)?;
        let len = u32::from_le_bytes(len);
        if len == 0 {
            self.ended = true;
            return Ok(None);
        }
        self.size_limit.admit(len);

        let capacity = len.min(INITIAL_RECORD_SIZE_LIMIT) as usize;
        let mut body = Vec::with_capacity(capacity);
        (&mut self.reader).take(u64::from(len)).read_to_end(&mut body)?;
        if body.len() < len as usize {
            return Err(FormatError::TruncatedRecord { expected: len, actual: body.len() }.into());
        }

        let record = proto::Record::decode(body.as_slice()).map_err(FormatError::from)?;
        Ok(Some(StreamRecord::try_from(record)?))
    }

    #[must_use]
    pub fn size_limit(&self) -> RecordSizeLimit {
        self.size_limit
    }
}

/// `read_exact`, reporting a short read as `eof_error`
fn read_or<R: Read>(reader: &mut R, buf: &mut [u8], eof_error: FormatError) -> Result<(), StreamError> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(eof_error.into()),
        Err(e) => Err(e.into()),
    }
}
