use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::record::Record;

/// Destination for finished records
pub trait RecordSink {
    fn write_record(&mut self, record: &Record) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Newline-delimited JSON, one object per record
pub struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl JsonLinesSink<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<Record>,
}

impl RecordSink for CollectingSink {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
