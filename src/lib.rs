// src/lib.rs

//! Code churn of recently added files, mined from git history.
//!
//! The pipeline runs in two stages:
//!
//! 1. [`origin::build_index`] dates every file tracked at a branch tip and
//!    produces a [`index::FileCreationIndex`] that is saved to disk once.
//! 2. [`extractor::extract_commit_stats`] walks a date window of commits,
//!    joins each touched file with the saved index and optional
//!    [`codeowners::OwnershipRules`], and [`churn`] sums the result per file
//!    or per owner.

pub mod churn;
pub mod codeowners;
pub mod error;
pub mod extractor;
pub mod history;
pub mod index;
pub mod model;
pub mod origin;
pub mod repo;
pub mod report;

pub use error::{ChurnError, Result};
