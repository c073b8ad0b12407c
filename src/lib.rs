//! shiftx - versioned CSV exports of monthly shift availability
//!
//! This crate provides the core functionality for the `shiftx` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Employee, Submission, SyncRun)
//! - [`storage`] - SQLite data layer and job ledger
//! - [`sync`] - Diff-aware, versioned CSV export engine
//! - [`config`] - Configuration management
//! - [`validate`] - Input normalization for CLI arguments
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
