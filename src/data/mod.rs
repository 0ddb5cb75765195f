//! Activity Tables
//!
//! Typed rows, CSV table I/O and the merge step that produces the processed
//! tables consumed by the analyzers.

pub mod merger;
pub mod records;
pub mod tables;

pub use merger::{filter_by_date, AliasMap, CommitMerge, DataMerger, DateWindow, IdentitySources};
pub use records::{
    CommitRecord, CommitSource, DeveloperIdentity, Dimension, DimensionScore, FileChangeRecord,
    FinalScore, IdentitySource, ReviewCommentRecord, StatValue,
};
pub use tables::{read_table, write_records, write_table, LoadedTable, TableError, TableResult};
