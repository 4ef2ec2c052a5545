//! `ext-line-sort` sorts line-oriented text files that do not fit into memory.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. For more information see
//! [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! The file (the *subject*) is sorted in place in three steps:
//!
//! * **Split:**
//!   the subject is read once, records (lines) are collected into batches of at most `capacity` records,
//!   each batch is sorted in memory and saved as a run of the first generation.
//! * **Merge:**
//!   runs of a generation are merged `capacity` at a time using a binary heap, producing the next generation.
//! * **Finalize:**
//!   when at most `capacity` runs remain they are merged straight into the subject.
//!
//! No more than `capacity` records (or open runs) are held in memory at once. The subject is overwritten only
//! by the final merge, so a failed sort leaves it intact. Records are compared byte-wise unless a custom compare
//! function is provided.
//!
//! Runs are kept in a [`RunStore`]: [`FileRunStore`] stores them on disk, [`store::mem::MemoryRunStore`]
//! keeps them in memory.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ext_line_sort::{ExternalSorter, ExternalSorterBuilder, FileRunStore};
//!
//! fn main() {
//!     let store = FileRunStore::new(Path::new("input.txt"), Some(Path::new("./")), None).unwrap();
//!
//!     let sorter: ExternalSorter<FileRunStore> = ExternalSorterBuilder::new()
//!         .with_capacity(100_000)
//!         .with_store(store)
//!         .build()
//!         .unwrap();
//!
//!     sorter.sort().unwrap();
//!     sorter.into_store().close().unwrap();
//! }
//! ```

pub mod buffer;
#[cfg(all(feature = "clap", feature = "env_logger"))]
pub mod cli;
#[cfg(feature = "generator")]
pub mod generator;
pub mod merger;
pub mod run;
pub mod sort;
pub mod store;

pub use buffer::LimitedBuffer;
pub use merger::BinaryHeapMerger;
pub use run::{Record, RecordReader, RunId, RunSink, RunStore};
pub use sort::{ConfigError, ExternalSorter, ExternalSorterBuilder, SortError, SortSummary, Stage};
pub use store::FileRunStore;
