//! Page- and book-level error counting.
//!
//! A book is split on its page markers. Each marker closes the page that
//! precedes it: the running page counts are stored under the marker's name
//! and reset. Tokens after the last marker only reach the book totals unless
//! `include_trailing_page` is set.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ErrorRateConfig;
use crate::dictionary::SpellChecker;
use crate::error::{ErrorRateError, Result};
use crate::tokenize::{Segment, Tokenizer, segments};

/// Running tallies for a page or a whole book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorCounts {
    pub all: u64,
    pub long: u64,
    pub tok_count: u64,
}

impl ErrorCounts {
    fn record(&mut self, known: bool, is_long: bool) {
        self.tok_count += 1;
        if !known {
            self.all += 1;
            if is_long {
                self.long += 1;
            }
        }
    }
}

/// Error counts of one page. Fields are kept in key order so the JSON
/// output is sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageErrors {
    pub all: u64,
    pub long: u64,
    pub page_no: String,
    pub tok_count: u64,
}

impl PageErrors {
    fn new(page_no: &str, counts: ErrorCounts) -> Self {
        Self {
            all: counts.all,
            long: counts.long,
            page_no: page_no.to_string(),
            tok_count: counts.tok_count,
        }
    }
}

/// Error data of one book, with page detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookErrors {
    pub all: u64,
    pub error_rate: f64,
    pub long: u64,
    pub long_tokens_error_rate: f64,
    #[serde(default)]
    pub page_errors: Vec<PageErrors>,
    pub tok_count: u64,
}

/// Error data of one book without page detail, as kept in corpus tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub all: u64,
    pub error_rate: f64,
    pub long: u64,
    pub long_tokens_error_rate: f64,
    pub tok_count: u64,
}

impl BookErrors {
    fn from_counts(counts: ErrorCounts, page_errors: Vec<PageErrors>) -> Result<Self> {
        if counts.tok_count == 0 {
            return Err(ErrorRateError::EmptyBook);
        }
        let tok_count = counts.tok_count as f64;
        Ok(Self {
            all: counts.all,
            error_rate: counts.all as f64 / tok_count,
            long: counts.long,
            long_tokens_error_rate: counts.long as f64 / tok_count,
            page_errors,
            tok_count: counts.tok_count,
        })
    }

    /// Drop the page detail.
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            all: self.all,
            error_rate: self.error_rate,
            long: self.long,
            long_tokens_error_rate: self.long_tokens_error_rate,
            tok_count: self.tok_count,
        }
    }
}

enum PageState {
    Accumulating(ErrorCounts),
    Flushed,
}

impl PageState {
    fn record(&mut self, known: bool, is_long: bool) {
        match self {
            PageState::Accumulating(counts) => counts.record(known, is_long),
            PageState::Flushed => {
                let mut counts = ErrorCounts::default();
                counts.record(known, is_long);
                *self = PageState::Accumulating(counts);
            }
        }
    }

    /// Hand out the page counts so far and start a new page.
    fn flush(&mut self) -> ErrorCounts {
        match std::mem::replace(self, PageState::Flushed) {
            PageState::Accumulating(counts) => counts,
            PageState::Flushed => ErrorCounts::default(),
        }
    }
}

/// Count unrecognized tokens on every page of `text` and in the book as a
/// whole.
///
/// Fails with [`ErrorRateError::EmptyBook`] when no token matches.
pub fn calculate_error_rate<C>(
    text: &str,
    checker: &C,
    tokenizer: &Tokenizer,
    config: &ErrorRateConfig,
) -> Result<BookErrors>
where
    C: SpellChecker + ?Sized,
{
    let mut book = ErrorCounts::default();
    let mut page = PageState::Flushed;
    let mut page_errors = Vec::new();

    for segment in segments(text) {
        match segment {
            Segment::Marker(marker) => {
                if config.verbose && marker.ends_with('0') {
                    debug!(page = marker, "page closed");
                }
                page_errors.push(PageErrors::new(marker, page.flush()));
            }
            Segment::Text(content) => {
                for tok in tokenizer.tokens(content) {
                    let known = checker.check(tok);
                    if config.verbose {
                        trace!(token = tok, known, "checked");
                    }
                    let is_long = tok.chars().count() > config.long_threshold;
                    book.record(known, is_long);
                    page.record(known, is_long);
                }
            }
        }
    }

    if config.include_trailing_page
        && let PageState::Accumulating(counts) = page
    {
        page_errors.push(PageErrors::new("", counts));
    }

    let errors = BookErrors::from_counts(book, page_errors)?;
    if config.verbose {
        debug!(error_rate = 100.0 * errors.error_rate, "book error rate (%)");
    }
    Ok(errors)
}
