//! Cache line usage analysis of memory-access traces.
//!
//! A trace of loads and stores is folded into per-byte usage of 64-byte (by
//! default) cache lines. The result is written as a byte-level report, which
//! is then rolled back up into a ranking of wasteful lines and a histogram of
//! unused-byte percentages.

pub mod cache_line;
pub mod chart;
pub mod config;
pub mod distribution;
pub mod error;
pub mod hotspots;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod simulator;
pub mod summary;
pub mod trace_record;
pub mod usage_report;
