use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{RawRecord, RecordFileHeader};
use crate::domain::ReportError;

/// Reader for JSON-lines record files
///
/// The header line is parsed eagerly; records are decoded lazily, one per
/// call to [`Records::next`], so memory use doesn't grow with the file.
pub struct RecordFileReader<R: BufRead> {
    header: RecordFileHeader,
    reader: R,
}

impl RecordFileReader<BufReader<File>> {
    /// Open a record file on disk
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its header line is invalid
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Reading records from {}", path.display());
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: BufRead> RecordFileReader<R> {
    /// Read the header line from `reader`
    ///
    /// # Errors
    /// Returns an error if reading fails or the first line isn't a valid header
    pub fn from_reader(mut reader: R) -> Result<Self, ReportError> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let header: RecordFileHeader = serde_json::from_str(&line)?;
        debug!(
            "Record file header: {} event types, {} declared dsos",
            header.event_types.len(),
            header.dsos.len()
        );
        Ok(Self { header, reader })
    }

    #[must_use]
    pub fn header(&self) -> &RecordFileHeader {
        &self.header
    }

    /// Split into the header and the stream of remaining records
    pub fn into_parts(self) -> (RecordFileHeader, Records<R>) {
        let records = Records {
            inner: serde_json::Deserializer::from_reader(self.reader).into_iter(),
        };
        (self.header, records)
    }
}

/// Lazily decoded records following the header
pub struct Records<R: Read> {
    inner: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, RawRecord>,
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<RawRecord, ReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|record| record.map_err(ReportError::from))
    }
}
