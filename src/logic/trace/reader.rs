//! Packet Trace Reader
//!
//! Parses one run's raw trace table into `PacketRecord`s.
//! Schema is validated once, on the header, before any row is read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Trim};

use super::record::{PacketRecord, PacketStatus, PacketType};
use crate::constants::{
    COL_PACKET_STATUS, COL_PACKET_TYPE, COL_RECEIVER_ID, COL_SOURCE_ID, COL_SUBTYPE,
    REQUIRED_TRACE_COLUMNS,
};
use crate::error::{PipelineError, PipelineResult};

/// Positions of the required columns inside a trace header
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    packet_type: usize,
    subtype: usize,
    source: usize,
    receiver: usize,
    status: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], context: &str) -> PipelineResult<Self> {
        let missing: Vec<&str> = REQUIRED_TRACE_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == col))
            .collect();

        if !missing.is_empty() {
            return Err(PipelineError::schema(
                context,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);

        Ok(Self {
            packet_type: position(COL_PACKET_TYPE),
            subtype: position(COL_SUBTYPE),
            source: position(COL_SOURCE_ID),
            receiver: position(COL_RECEIVER_ID),
            status: position(COL_PACKET_STATUS),
        })
    }
}

/// Lossy field decode; traces are not guaranteed to be UTF-8
fn field(record: &ByteRecord, index: usize) -> String {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

pub struct PacketTraceReader;

impl PacketTraceReader {
    /// Read a trace file from disk
    pub fn read_path(path: &Path) -> PipelineResult<Vec<PacketRecord>> {
        if !path.is_file() {
            return Err(PipelineError::missing(path));
        }
        let file = File::open(path)?;
        Self::read_from(file, &path.display().to_string())
    }

    /// Read a trace from any byte source; `context` names the source in errors
    pub fn read_from<R: Read>(source: R, context: &str) -> PipelineResult<Vec<PacketRecord>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        let index = ColumnIndex::resolve(&headers, context)?;

        let mut records = Vec::new();
        let mut raw = ByteRecord::new();
        while reader.read_byte_record(&mut raw)? {
            records.push(PacketRecord::new(
                PacketType::parse(&field(&raw, index.packet_type)),
                &field(&raw, index.subtype),
                &field(&raw, index.source),
                &field(&raw, index.receiver),
                PacketStatus::parse(&field(&raw, index.status)),
            ));
        }

        tracing::debug!(source = context, records = records.len(), "Trace parsed");
        Ok(records)
    }
}
