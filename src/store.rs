//! Run store implementations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;
use tempfile;

use crate::run::{self, RecordReader, RunId, RunSink, RunStore};

/// File backed run store.
///
/// The subject run is the file being sorted, all other runs are stored in a private temporary directory
/// as `<generation>_<index>` files. Every run is written into an anonymous temporary file first and then
/// moved onto its final path, so the subject is replaced atomically.
pub struct FileRunStore {
    /// File to be sorted in place.
    subject: PathBuf,
    /// Directory holding intermediate runs.
    tmp_dir: tempfile::TempDir,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl FileRunStore {
    /// Creates a new file run store.
    ///
    /// # Arguments
    /// * `subject` - File to be sorted. It is the input of the sorting and is overwritten by its result.
    /// * `tmp_path` - Directory to create the temporary run directory in. It is created if missing.
    ///   If the parameter is [`None`] default OS temporary directory will be used.
    /// * `rw_buf_size` - Run files read/write buffer size. Should be positive.
    pub fn new(subject: &Path, tmp_path: Option<&Path>, rw_buf_size: Option<usize>) -> io::Result<Self> {
        if rw_buf_size == Some(0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "read/write buffer size should be positive",
            ));
        }

        let tmp_dir = if let Some(tmp_path) = tmp_path {
            fs::create_dir_all(tmp_path)?;
            tempfile::Builder::new().prefix("ext-line-sort").tempdir_in(tmp_path)
        } else {
            tempfile::Builder::new().prefix("ext-line-sort").tempdir()
        }?;

        log::info!("using {} as a temporary directory", tmp_dir.path().display());

        return Ok(FileRunStore {
            subject: subject.into(),
            tmp_dir,
            rw_buf_size,
        });
    }

    /// Returns the temporary run directory path.
    pub fn tmp_dir(&self) -> &Path {
        self.tmp_dir.path()
    }

    /// Removes the temporary run directory with all remaining runs.
    pub fn close(self) -> io::Result<()> {
        log::debug!("removing temporary directory {}", self.tmp_dir.path().display());
        self.tmp_dir.close()
    }

    fn run_path(&self, run: RunId) -> PathBuf {
        if run.is_subject() {
            self.subject.clone()
        } else {
            self.tmp_dir.path().join(format!("{}_{}", run.generation, run.index))
        }
    }

    fn run_dir(&self, run: RunId) -> &Path {
        if run.is_subject() {
            match self.subject.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            }
        } else {
            self.tmp_dir.path()
        }
    }
}

impl RunStore for FileRunStore {
    type Reader = RecordReader<io::BufReader<fs::File>>;
    type Writer = FileRunWriter;

    fn open_for_read(&self, run: RunId) -> io::Result<Self::Reader> {
        let file = fs::File::open(self.run_path(run))?;
        let reader = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(RecordReader::new(reader));
    }

    fn open_for_write(&self, run: RunId) -> io::Result<Self::Writer> {
        let path = self.run_path(run);
        let tmp_file = tempfile::NamedTempFile::new_in(self.run_dir(run))?;

        if run.is_subject() {
            match fs::metadata(&path) {
                Ok(metadata) => tmp_file.as_file().set_permissions(metadata.permissions())?,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }

        let writer = match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, tmp_file),
            None => io::BufWriter::new(tmp_file),
        };

        return Ok(FileRunWriter { writer, path });
    }
}

/// Run file being written. The run appears on its path when finished.
pub struct FileRunWriter {
    writer: io::BufWriter<tempfile::NamedTempFile>,
    path: PathBuf,
}

impl RunSink for FileRunWriter {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        run::write_record(&mut self.writer, record)
    }

    fn finish(self) -> io::Result<()> {
        let tmp_file = self.writer.into_inner().map_err(|err| err.into_error())?;
        tmp_file.as_file().sync_all()?;
        tmp_file.persist(&self.path).map_err(|err| err.error)?;

        return Ok(());
    }
}

/// In-memory run store.
pub mod mem {
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use crate::run::{self, RecordReader, RunId, RunSink, RunStore};

    type Runs = HashMap<RunId, Vec<u8>>;

    /// Run store keeping runs as newline terminated byte strings in memory.
    /// Clones share the same runs, so a clone can be used to inspect the store after sorting.
    #[derive(Clone, Default)]
    pub struct MemoryRunStore {
        runs: Arc<Mutex<Runs>>,
    }

    impl MemoryRunStore {
        /// Creates an empty store. The subject is absent until inserted.
        pub fn new() -> Self {
            MemoryRunStore::default()
        }

        /// Creates a store with the provided subject content.
        pub fn with_subject(content: impl Into<Vec<u8>>) -> Self {
            let store = MemoryRunStore::new();
            store.insert(RunId::SUBJECT, content);
            return store;
        }

        /// Returns the subject content.
        pub fn subject(&self) -> Option<Vec<u8>> {
            self.run(RunId::SUBJECT)
        }

        /// Returns a run content.
        pub fn run(&self, run: RunId) -> Option<Vec<u8>> {
            self.runs().get(&run).cloned()
        }

        /// Returns addresses of all stored runs in ascending order.
        pub fn run_ids(&self) -> Vec<RunId> {
            let mut ids = Vec::from_iter(self.runs().keys().copied());
            ids.sort();
            return ids;
        }

        /// Stores a run replacing the previous one.
        pub fn insert(&self, run: RunId, content: impl Into<Vec<u8>>) {
            self.runs().insert(run, content.into());
        }

        fn runs(&self) -> MutexGuard<'_, Runs> {
            self.runs.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl RunStore for MemoryRunStore {
        type Reader = RecordReader<io::Cursor<Vec<u8>>>;
        type Writer = MemoryRunWriter;

        fn open_for_read(&self, run: RunId) -> io::Result<Self::Reader> {
            match self.run(run) {
                Some(content) => Ok(RecordReader::new(io::Cursor::new(content))),
                None => Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", run))),
            }
        }

        fn open_for_write(&self, run: RunId) -> io::Result<Self::Writer> {
            Ok(MemoryRunWriter {
                run,
                buf: Vec::new(),
                store: self.clone(),
            })
        }
    }

    /// In-memory run being written. The run is stored when finished.
    pub struct MemoryRunWriter {
        run: RunId,
        buf: Vec<u8>,
        store: MemoryRunStore,
    }

    impl RunSink for MemoryRunWriter {
        fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
            run::write_record(&mut self.buf, record)
        }

        fn finish(self) -> io::Result<()> {
            self.store.insert(self.run, self.buf);
            Ok(())
        }
    }

}

#[cfg(test)]
mod test {
    use std::fs;
    use std::io;

    use rstest::*;

    use super::FileRunStore;
    use crate::run::{RunId, RunSink, RunStore};
    use crate::sort::ExternalSorter;

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    #[rstest]
    #[case(None)]
    #[case(Some(16))]
    fn test_file_store(tmp_dir: tempfile::TempDir, #[case] rw_buf_size: Option<usize>) {
        let subject = tmp_dir.path().join("subject.txt");
        let store = FileRunStore::new(&subject, Some(tmp_dir.path()), rw_buf_size).unwrap();

        let saved = Vec::from_iter((0..100).map(|i| format!("line {}", i).into_bytes()));
        let run = RunId::new(1, 4);

        let mut writer = store.open_for_write(run).unwrap();
        for record in &saved {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap();

        assert!(store.tmp_dir().join("1_4").is_file());

        let restored: io::Result<Vec<_>> = store.open_for_read(run).unwrap().collect();
        assert_eq!(restored.unwrap(), saved);
    }

    #[rstest]
    fn test_file_store_subject(tmp_dir: tempfile::TempDir) {
        let subject = tmp_dir.path().join("subject.txt");
        fs::write(&subject, "b\na").unwrap();
        let store = FileRunStore::new(&subject, Some(tmp_dir.path()), None).unwrap();

        let restored: io::Result<Vec<_>> = store.open_for_read(RunId::SUBJECT).unwrap().collect();
        assert_eq!(restored.unwrap(), vec![b"b".to_vec(), b"a".to_vec()]);

        let mut writer = store.open_for_write(RunId::SUBJECT).unwrap();
        writer.write_record(b"a").unwrap();
        writer.write_record(b"b").unwrap();
        assert_eq!(fs::read(&subject).unwrap(), b"b\na");
        writer.finish().unwrap();

        assert_eq!(fs::read(&subject).unwrap(), b"a\nb\n");
    }

    #[rstest]
    fn test_file_store_missing_run(tmp_dir: tempfile::TempDir) {
        let subject = tmp_dir.path().join("missing.txt");
        let store = FileRunStore::new(&subject, Some(tmp_dir.path()), None).unwrap();

        for run in [RunId::SUBJECT, RunId::new(2, 0)] {
            let err = store.open_for_read(run).err().unwrap();
            assert_eq!(err.kind(), io::ErrorKind::NotFound);
        }
    }

    #[rstest]
    fn test_file_store_zero_rw_buf_size(tmp_dir: tempfile::TempDir) {
        let subject = tmp_dir.path().join("subject.txt");
        fs::write(&subject, "c\nb\na\n").unwrap();
        let nested = tmp_dir.path().join("nested");

        let err = FileRunStore::new(&subject, Some(&nested), Some(0)).err().unwrap();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!nested.exists());
        assert_eq!(fs::read(&subject).unwrap(), b"c\nb\na\n");
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    fn test_file_store_tiny_rw_buf_size(tmp_dir: tempfile::TempDir, #[case] rw_buf_size: usize) {
        let subject = tmp_dir.path().join("subject.txt");
        fs::write(&subject, "c\nb\na\n").unwrap();

        let store = FileRunStore::new(&subject, Some(tmp_dir.path()), Some(rw_buf_size)).unwrap();
        let sorter = ExternalSorter::new(2, store).unwrap();
        let summary = sorter.sort().unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(fs::read(&subject).unwrap(), b"a\nb\nc\n");
    }

    #[rstest]
    fn test_file_store_close(tmp_dir: tempfile::TempDir) {
        let nested = tmp_dir.path().join("nested");
        let store = FileRunStore::new(&tmp_dir.path().join("subject.txt"), Some(&nested), None).unwrap();
        let run_dir = store.tmp_dir().to_path_buf();

        let mut writer = store.open_for_write(RunId::new(1, 0)).unwrap();
        writer.write_record(b"x").unwrap();
        writer.finish().unwrap();

        assert!(run_dir.starts_with(&nested));
        store.close().unwrap();
        assert!(!run_dir.exists());
        assert!(nested.exists());
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(1000)]
    fn test_file_store_sort_in_place(tmp_dir: tempfile::TempDir, #[case] capacity: usize) {
        let subject = tmp_dir.path().join("subject.txt");
        let content = Vec::from_iter((0..50).map(|i| format!("{}\n", (i * 7919) % 50)));
        fs::write(&subject, content.concat()).unwrap();

        let mut expected = content.clone();
        expected.sort();

        let store = FileRunStore::new(&subject, Some(tmp_dir.path()), Some(64)).unwrap();
        let sorter = ExternalSorter::new(capacity, store).unwrap();
        sorter.sort().unwrap();

        let store = sorter.into_store();
        let run_dir = store.tmp_dir().to_path_buf();
        store.close().unwrap();

        assert_eq!(fs::read_to_string(&subject).unwrap(), expected.concat());
        assert!(!run_dir.exists());
    }
}
