//! Runs and the run store interface.

use std::fmt;
use std::io;
use std::io::prelude::*;

/// A single line of text without its terminator. Records are compared byte-wise.
pub type Record = Vec<u8>;

/// Record terminator.
pub const TERMINATOR: u8 = b'\n';

/// Run address. Generation 0 index 0 is the subject file: both the sorting input and the final output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId {
    pub generation: usize,
    pub index: usize,
}

impl RunId {
    /// The subject file address.
    pub const SUBJECT: RunId = RunId {
        generation: 0,
        index: 0,
    };

    pub fn new(generation: usize, index: usize) -> Self {
        RunId { generation, index }
    }

    pub fn is_subject(&self) -> bool {
        *self == RunId::SUBJECT
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_subject() {
            write!(f, "subject")
        } else {
            write!(f, "run {}_{}", self.generation, self.index)
        }
    }
}

/// Run store interface. Persists and retrieves runs addressed by [`RunId`].
pub trait RunStore {
    /// Sequential record cursor. The run is released when the cursor is dropped.
    type Reader: Iterator<Item = io::Result<Record>>;
    /// Record sink of a run being written.
    type Writer: RunSink;

    /// Opens an existing run for reading.
    /// Fails with [`io::ErrorKind::NotFound`] if the run is absent.
    fn open_for_read(&self, run: RunId) -> io::Result<Self::Reader>;

    /// Opens a run for writing. An existing run with the same address is overwritten
    /// once the returned sink is finished.
    fn open_for_write(&self, run: RunId) -> io::Result<Self::Writer>;
}

/// Destination of a run being written.
///
/// Written records become visible to readers only after [`RunSink::finish`] succeeds,
/// a sink dropped without being finished discards everything written to it.
pub trait RunSink {
    /// Appends a record to the run.
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    /// Flushes written records and publishes the run.
    fn finish(self) -> io::Result<()>;
}

/// Writes a record followed by the terminator.
pub fn write_record<W: Write>(writer: &mut W, record: &[u8]) -> io::Result<()> {
    writer.write_all(record)?;
    writer.write_all(&[TERMINATOR])
}

/// Reads newline terminated records from a buffered reader.
/// The last record may lack the terminator.
pub struct RecordReader<R> {
    reader: R,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        RecordReader { reader }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = Vec::new();
        match self.reader.read_until(TERMINATOR, &mut record) {
            Ok(0) => None,
            Ok(_) => {
                if record.last() == Some(&TERMINATOR) {
                    record.pop();
                }
                Some(Ok(record))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
