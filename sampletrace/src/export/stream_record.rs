//! Records of a report stream
//!
//! [`StreamRecord`] is the unit of binary framing. It mirrors the wire
//! messages of `sampletrace_common` with typed ids, and converts to and from
//! them at the encoder/decoder boundary.

use sampletrace_common::{self as proto, record::RecordData};

use crate::domain::{FileId, FormatError, SymbolId};

/// One frame of a reported call chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallChainEntry {
    pub vaddr_in_file: u64,
    pub file_id: FileId,
    pub symbol_id: SymbolId,
}

/// One reported sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSample {
    pub time: u64,
    pub thread_id: i32,
    /// Sampling period of the event
    pub event_count: u64,
    /// Index into [`MetaInfo::event_types`]
    pub event_type_id: u32,
    /// Innermost frame first
    pub callchain: Vec<CallChainEntry>,
}

/// Totals of reported and dropped samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LostCounters {
    pub sample_count: u64,
    pub lost_count: u64,
}

/// A file and the symbols referenced in it, indexed by symbol id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTableEntry {
    pub id: FileId,
    pub path: String,
    pub symbols: Vec<String>,
    pub mangled_symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfoEntry {
    pub thread_id: u32,
    pub process_id: u32,
    pub thread_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaInfo {
    pub event_types: Vec<String>,
    pub app_package_name: Option<String>,
}

/// Exactly one record of a report stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    Sample(ReportSample),
    Lost(LostCounters),
    File(FileTableEntry),
    Thread(ThreadInfoEntry),
    MetaInfo(MetaInfo),
}

impl StreamRecord {
    /// Wire message for this record
    #[must_use]
    pub fn to_proto(&self) -> proto::Record {
        let data = match self {
            StreamRecord::Sample(sample) => RecordData::Sample(proto::Sample {
                time: sample.time,
                thread_id: sample.thread_id,
                callchain: sample
                    .callchain
                    .iter()
                    .map(|entry| proto::sample::CallChainEntry {
                        vaddr_in_file: entry.vaddr_in_file,
                        file_id: entry.file_id.0,
                        symbol_id: entry.symbol_id.0,
                    })
                    .collect(),
                event_count: sample.event_count,
                event_type_id: sample.event_type_id,
            }),
            StreamRecord::Lost(lost) => RecordData::Lost(proto::LostSituation {
                sample_count: lost.sample_count,
                lost_count: lost.lost_count,
            }),
            StreamRecord::File(file) => RecordData::File(proto::File {
                id: file.id.0,
                path: file.path.clone(),
                symbol: file.symbols.clone(),
                mangled_symbol: file.mangled_symbols.clone(),
            }),
            StreamRecord::Thread(thread) => RecordData::Thread(proto::Thread {
                thread_id: thread.thread_id,
                process_id: thread.process_id,
                thread_name: thread.thread_name.clone(),
            }),
            StreamRecord::MetaInfo(meta) => RecordData::MetaInfo(proto::MetaInfo {
                event_type: meta.event_types.clone(),
                app_package_name: meta.app_package_name.clone(),
            }),
        };
        proto::Record { record_data: Some(data) }
    }
}

impl TryFrom<proto::Record> for StreamRecord {
    type Error = FormatError;

    fn try_from(record: proto::Record) -> Result<Self, Self::Error> {
        let data = record.record_data.ok_or(FormatError::UnknownRecordKind)?;
        Ok(match data {
            RecordData::Sample(sample) => StreamRecord::Sample(ReportSample {
                time: sample.time,
                thread_id: sample.thread_id,
                event_count: sample.event_count,
                event_type_id: sample.event_type_id,
                callchain: sample
                    .callchain
                    .into_iter()
                    .map(|entry| CallChainEntry {
                        vaddr_in_file: entry.vaddr_in_file,
                        file_id: FileId(entry.file_id),
                        symbol_id: SymbolId(entry.symbol_id),
                    })
                    .collect(),
            }),
            RecordData::Lost(lost) => StreamRecord::Lost(LostCounters {
                sample_count: lost.sample_count,
                lost_count: lost.lost_count,
            }),
            RecordData::File(file) => StreamRecord::File(FileTableEntry {
                id: FileId(file.id),
                path: file.path,
                symbols: file.symbol,
                mangled_symbols: file.mangled_symbol,
            }),
            RecordData::Thread(thread) => StreamRecord::Thread(ThreadInfoEntry {
                thread_id: thread.thread_id,
                process_id: thread.process_id,
                thread_name: thread.thread_name,
            }),
            RecordData::MetaInfo(meta) => StreamRecord::MetaInfo(MetaInfo {
                event_types: meta.event_type,
                app_package_name: meta.app_package_name,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_keeps_unresolved_symbol() {
        let record = StreamRecord::Sample(ReportSample {
            time: 10,
            thread_id: 7,
            event_count: 1000,
            event_type_id: 0,
            callchain: vec![CallChainEntry {
                vaddr_in_file: 0x40,
                file_id: FileId(0),
                symbol_id: SymbolId::UNRESOLVED,
            }],
        });
        let proto = record.to_proto();
        let Some(RecordData::Sample(sample)) = &proto.record_data else {
            panic!("expected a sample payload");
        };
        assert_eq!(sample.callchain[0].symbol_id, -1);
        assert_eq!(StreamRecord::try_from(proto).unwrap(), record);
    }

    #[test]
    fn test_missing_package_name_stays_absent() {
        let record = StreamRecord::MetaInfo(MetaInfo {
            event_types: vec!["cpu-cycles".to_string()],
            app_package_name: None,
        });
        let Some(RecordData::MetaInfo(meta)) = record.to_proto().record_data else {
            panic!("expected meta info payload");
        };
        assert_eq!(meta.app_package_name, None);
    }

    #[test]
    fn test_record_without_payload_is_rejected() {
        let result = StreamRecord::try_from(proto::Record { record_data: None });
        assert!(matches!(result, Err(FormatError::UnknownRecordKind)));
    }
}
