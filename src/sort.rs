//! External sorter.

use log;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::ops::Range;

use crate::buffer::LimitedBuffer;
use crate::merger::BinaryHeapMerger;
use crate::run::{Record, RunId, RunSink, RunStore};

/// Default number of records held in memory simultaneously.
pub const DEFAULT_CAPACITY: usize = 100;

/// Sorter configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity is less than 2.
    InvalidCapacity(usize),
    /// Run store is not provided.
    MissingStore,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            ConfigError::InvalidCapacity(capacity) => {
                write!(f, "capacity should be at least 2, got {}", capacity)
            }
            ConfigError::MissingStore => write!(f, "run store is not provided"),
        }
    }
}

impl Error for ConfigError {}

/// Sorting stage an error occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Splitting the subject into sorted runs.
    Split,
    /// Merging runs of a generation into the next one.
    Merge { generation: usize },
    /// Merging the last generation into the subject.
    Finalize,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            Stage::Split => write!(f, "split"),
            Stage::Merge { generation } => write!(f, "merge of generation {}", generation),
            Stage::Finalize => write!(f, "finalize"),
        }
    }
}

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Sorter configuration error.
    Configuration(ConfigError),
    /// Expected run is missing.
    NotFound { stage: Stage, run: RunId },
    /// Run read or write error.
    IO { stage: Stage, run: RunId, source: io::Error },
}

impl SortError {
    fn io(stage: Stage, run: RunId, err: io::Error) -> Self {
        SortError::IO {
            stage,
            run,
            source: err,
        }
    }

    fn open(stage: Stage, run: RunId, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            SortError::NotFound { stage, run }
        } else {
            SortError::io(stage, run, err)
        }
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::Configuration(err) => Some(err),
            SortError::NotFound { .. } => None,
            SortError::IO { source, .. } => Some(source),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::Configuration(err) => write!(f, "sorter configuration error: {}", err),
            SortError::NotFound { stage, run } => write!(f, "{} not found during {}", run, stage),
            SortError::IO { stage, run, source } => {
                write!(f, "I/O operation on {} failed during {}: {}", run, stage, source)
            }
        }
    }
}

impl From<ConfigError> for SortError {
    fn from(err: ConfigError) -> Self {
        SortError::Configuration(err)
    }
}

/// Sorting outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSummary {
    /// Number of records sorted.
    pub records: u64,
    /// Number of sorted runs produced by the split stage.
    /// Zero means the whole input fitted in memory and was written back directly.
    pub initial_runs: usize,
    /// Number of merged generations including the final merge into the subject.
    pub merge_rounds: usize,
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder<S: RunStore> {
    /// Maximum number of records or runs held in memory simultaneously.
    capacity: usize,
    /// Run store.
    store: Option<S>,
}

impl<S: RunStore> ExternalSorterBuilder<S> {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter<S>, SortError> {
        let store = self.store.ok_or(ConfigError::MissingStore)?;
        ExternalSorter::new(self.capacity, store)
    }

    /// Sets maximum number of records (during split) or runs (during merge) held in memory simultaneously.
    pub fn with_capacity(mut self, capacity: usize) -> ExternalSorterBuilder<S> {
        self.capacity = capacity;
        return self;
    }

    /// Sets run store.
    pub fn with_store(mut self, store: S) -> ExternalSorterBuilder<S> {
        self.store = Some(store);
        return self;
    }
}

impl<S: RunStore> Default for ExternalSorterBuilder<S> {
    fn default() -> Self {
        ExternalSorterBuilder {
            capacity: DEFAULT_CAPACITY,
            store: None,
        }
    }
}

/// External sorter. Sorts the subject run of a run store in place.
///
/// The subject is split into sorted runs of `capacity` records which are then merged
/// `capacity` at a time, generation after generation, until a single run remains.
/// That run replaces the subject. The subject is written only once, by the last merge,
/// so a failure leaves it intact. Intermediate runs are left in the store.
pub struct ExternalSorter<S: RunStore> {
    /// Maximum number of records or runs held in memory simultaneously.
    capacity: usize,
    /// Run store.
    store: S,
}

impl<S: RunStore> ExternalSorter<S> {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of records or runs held in memory simultaneously. Should be at least 2.
    /// * `store` - Run store holding the subject and intermediate runs.
    pub fn new(capacity: usize, store: S) -> Result<Self, SortError> {
        if capacity < 2 {
            return Err(ConfigError::InvalidCapacity(capacity).into());
        }

        return Ok(ExternalSorter { capacity, store });
    }

    /// Consumes the sorter returning the run store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Sorts the subject in byte-wise ascending order.
    pub fn sort(&self) -> Result<SortSummary, SortError> {
        self.sort_by(Record::cmp)
    }

    /// Sorts the subject using a custom compare function.
    ///
    /// # Arguments
    /// * `compare` - Function be be used to compare records
    pub fn sort_by<F>(&self, compare: F) -> Result<SortSummary, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Copy,
    {
        log::info!("sorting started (capacity: {})", self.capacity);

        let mut summary = SortSummary::default();
        let mut runs = self.split(compare, &mut summary)?;
        summary.initial_runs = runs;
        log::info!("split done (records: {}, runs: {})", summary.records, runs);

        let mut generation = 1;
        while runs > 0 {
            summary.merge_rounds += 1;

            if runs <= self.capacity {
                log::info!("merging {} runs of generation {} into the subject", runs, generation);
                self.merge(Stage::Finalize, generation, 0..runs, RunId::SUBJECT, compare)?;
                break;
            }

            let groups = self.merge_round(generation, runs, compare)?;
            log::info!("generation {} merged ({} runs -> {} runs)", generation, runs, groups);

            generation += 1;
            runs = groups;
        }

        log::info!("sorting done");

        return Ok(summary);
    }

    /// Splits the subject into sorted runs of the first generation.
    /// Returns the number of created runs. If the subject fits in a single batch it is sorted
    /// and written back immediately and no runs are created.
    fn split<F>(&self, compare: F, summary: &mut SortSummary) -> Result<usize, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Copy,
    {
        let mut input = self
            .store
            .open_for_read(RunId::SUBJECT)
            .map_err(|err| SortError::open(Stage::Split, RunId::SUBJECT, err))?;

        let mut batch = LimitedBuffer::new(self.capacity);
        let mut runs = 0;

        for record in &mut input {
            let record = record.map_err(|err| SortError::io(Stage::Split, RunId::SUBJECT, err))?;
            batch.push(record);
            summary.records += 1;

            if batch.is_full() {
                self.flush(batch.take(), RunId::new(1, runs), compare)?;
                runs += 1;
            }
        }
        drop(input);

        if batch.is_empty() {
            return Ok(runs);
        }

        if runs == 0 {
            log::debug!("input fits in memory, writing it back");
            self.flush(batch, RunId::SUBJECT, compare)?;
            return Ok(0);
        }

        self.flush(batch, RunId::new(1, runs), compare)?;

        return Ok(runs + 1);
    }

    fn flush<F>(&self, mut batch: LimitedBuffer<Record>, run: RunId, compare: F) -> Result<(), SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Copy,
    {
        log::debug!("sorting batch data ...");
        batch.sort_by(compare);

        log::debug!("saving batch data ({}, records: {})", run, batch.len());
        let mut writer = self
            .store
            .open_for_write(run)
            .map_err(|err| SortError::io(Stage::Split, run, err))?;

        for record in batch {
            writer
                .write_record(&record)
                .map_err(|err| SortError::io(Stage::Split, run, err))?;
        }
        writer.finish().map_err(|err| SortError::io(Stage::Split, run, err))?;

        return Ok(());
    }

    /// Merges `runs` runs of a generation in groups of `capacity` runs into the next generation.
    /// Returns the number of runs in the next generation.
    fn merge_round<F>(&self, generation: usize, runs: usize, compare: F) -> Result<usize, SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Copy,
    {
        let stage = Stage::Merge { generation };
        let mut groups = 0;

        for start in (0..runs).step_by(self.capacity) {
            let end = usize::min(start + self.capacity, runs);
            self.merge(stage, generation, start..end, RunId::new(generation + 1, groups), compare)?;
            groups += 1;
        }

        return Ok(groups);
    }

    /// Merges runs with the provided indices of a generation into the destination run.
    fn merge<F>(
        &self,
        stage: Stage,
        generation: usize,
        indices: Range<usize>,
        dst: RunId,
        compare: F,
    ) -> Result<(), SortError>
    where
        F: Fn(&Record, &Record) -> Ordering + Copy,
    {
        log::debug!("merging runs {:?} of generation {} into {}", indices, generation, dst);

        let mut inputs = Vec::with_capacity(indices.len());
        for index in indices {
            let run = RunId::new(generation, index);
            let reader = self
                .store
                .open_for_read(run)
                .map_err(|err| SortError::open(stage, run, err))?;
            inputs.push(reader.map(move |record| record.map_err(|err| SortError::io(stage, run, err))));
        }

        let mut writer = self
            .store
            .open_for_write(dst)
            .map_err(|err| SortError::io(stage, dst, err))?;

        for record in BinaryHeapMerger::new(inputs, compare) {
            writer
                .write_record(&record?)
                .map_err(|err| SortError::io(stage, dst, err))?;
        }
        writer.finish().map_err(|err| SortError::io(stage, dst, err))?;

        return Ok(());
    }
}
