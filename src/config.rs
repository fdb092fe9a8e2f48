//! Run configuration.
//!
//! Built by the caller once per run and passed down by reference. Every field
//! has a default so a TOML file only needs to name what it changes:
//!
//! ```toml
//! outfolder = "error_data"
//! lang_code = "ara"
//! overwrite = false
//!
//! [rates]
//! long_threshold = 8
//! include_trailing_page = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorRateError, Result};
use crate::tokenize::Tokenizer;

/// Runs of Arabic letters (hamza to ghayn, fa to ya, and the extended
/// Persian/Urdu letters), diacritics and digits excluded.
pub const DEFAULT_TOKEN_PATTERN: &str = r"[\x{0621}-\x{063A}\x{0641}-\x{064A}\x{0671}-\x{06D3}]+";

/// Tokens longer than this many characters count as long.
pub const DEFAULT_LONG_THRESHOLD: usize = 8;

pub const DEFAULT_OUTFOLDER: &str = "error_data";

pub const DEFAULT_LANG_CODE: &str = "ara";

/// Settings for measuring a single book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRateConfig {
    /// Regular expression describing the tokens that are spellchecked.
    pub token_pattern: String,
    /// A token strictly longer than this (in characters) is a long token.
    pub long_threshold: usize,
    /// Record the tokens after the last page marker as a page of their own.
    /// Off by default: such trailing content only counts towards the book
    /// totals.
    pub include_trailing_page: bool,
    /// Emit per-page and per-token trace events.
    pub verbose: bool,
}

impl Default for ErrorRateConfig {
    fn default() -> Self {
        Self {
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            long_threshold: DEFAULT_LONG_THRESHOLD,
            include_trailing_page: false,
            verbose: false,
        }
    }
}

impl ErrorRateConfig {
    /// Compile the token pattern.
    pub fn compile(&self) -> Result<Tokenizer> {
        Tokenizer::new(&self.token_pattern)
    }
}

/// Settings for a corpus run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Folder receiving one `<uri>_error_data.json` file per book.
    pub outfolder: PathBuf,
    /// Only books whose path contains `-<lang_code>` are checked;
    /// `None` checks every book.
    pub lang_code: Option<String>,
    /// Recompute books even when their per-book file already exists.
    pub overwrite: bool,
    /// Abort on the first book that fails instead of skipping it.
    pub fail_fast: bool,
    pub rates: ErrorRateConfig,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            outfolder: PathBuf::from(DEFAULT_OUTFOLDER),
            lang_code: Some(DEFAULT_LANG_CODE.to_string()),
            overwrite: false,
            fail_fast: false,
            rates: ErrorRateConfig::default(),
        }
    }
}

impl CorpusConfig {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ErrorRateError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ErrorRateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &content)
    }

    /// Path of the per-book error data file for `uri`.
    pub fn book_output_path(&self, uri: &str) -> PathBuf {
        self.outfolder.join(format!("{}_error_data.json", uri))
    }
}
