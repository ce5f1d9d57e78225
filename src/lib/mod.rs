//! A library of functionality for trimming and filtering small RNA reads.
//!
//! # Overview
//!
//! The flow of data is as follows:
//!
//! - The [`format::Format`] of the input and output is decided once from the file names, or given
//!   explicitly.
//! - The [`reader::RecordReader`] frames lines of the input into [`record::Record`]s.
//! - The [`pipeline::Pipeline`] trims each record with a [`trim::TrimMode`], tests it against the
//!   [`filter::FilterParams`] and hands the records that pass to the [`writer::RecordWriter`].
//! - [`metrics::RunCounters`] are collected by the pipeline and reported once the run ends.
#![deny(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]
pub mod filter;
pub mod format;
pub mod metrics;
pub mod opts;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod run;
pub mod trim;
pub mod utils;
pub mod writer;
