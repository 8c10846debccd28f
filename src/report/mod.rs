//! Output file generation.
//!
//! CSV and JSON writers for the extraction results.

pub mod writer;

pub use writer::{
    write_accepted_csv, write_author_counts_json, write_decisions_csv, write_flagged_csv,
};
