//! Spellcheck error rates for OpenITI texts.
//!
//! Every token of a book is run through a [`SpellChecker`]; unrecognized
//! tokens are counted per page and per book, with separate counts for
//! over-long tokens (a common OCR and encoding artifact). A corpus run
//! writes one JSON file per book plus corpus-wide TSV and JSON tables.
//!
//! ```no_run
//! use std::path::Path;
//! use openiti_error_rate::{CorpusConfig, MultiLangDict, collect_folder};
//!
//! let dict = MultiLangDict::load(Path::new("dictionaries"), &["ar".to_string()])?;
//! let config = CorpusConfig::default();
//! let report = collect_folder(
//!     Path::new("25Y_repos"),
//!     Path::new("25Y_repos_error_data.tsv"),
//!     Path::new("25Y_repos_error_data.json"),
//!     &dict,
//!     &config,
//! )?;
//! println!("{} books", report.errors.len());
//! # Ok::<(), openiti_error_rate::ErrorRateError>(())
//! ```

pub mod cache;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod rates;
pub mod tokenize;

#[cfg(feature = "python")]
mod python;

pub use cache::{BookSource, collect_file};
pub use config::{CorpusConfig, ErrorRateConfig};
pub use corpus::{CorpusErrors, CorpusReport, SkippedBook, collect_files, collect_folder};
pub use dictionary::{FallibleChecker, HunspellDict, MultiLangDict, SpellChecker, WordList};
pub use error::{ErrorRateError, Result};
pub use rates::{BookErrors, BookSummary, PageErrors, calculate_error_rate};
pub use tokenize::Tokenizer;
