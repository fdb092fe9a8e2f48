//! Per-book error data files.
//!
//! Each measured book gets `<outfolder>/<uri>_error_data.json` with its page
//! detail. Unless overwriting, an existing file is read back instead of
//! measuring the book again, which also lets an interrupted corpus run resume.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::CorpusConfig;
use crate::corpus::CorpusErrors;
use crate::dictionary::SpellChecker;
use crate::error::{ErrorRateError, Result};
use crate::rates::{BookErrors, calculate_error_rate};
use crate::tokenize::{Tokenizer, strip_header};

/// Where a book's error data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSource {
    Computed,
    Cached,
}

/// Book identifier: the file name of its path.
pub fn book_uri(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Measure (or reload) the book at `path` and add its summary to `results`.
pub fn collect_file<C>(
    path: &Path,
    checker: &C,
    tokenizer: &Tokenizer,
    config: &CorpusConfig,
    results: &mut CorpusErrors,
) -> Result<BookSource>
where
    C: SpellChecker + ?Sized,
{
    let uri = book_uri(path);
    let out_path = config.book_output_path(&uri);

    let (errors, source) = if config.overwrite || !out_path.exists() {
        let errors = measure_file(path, checker, tokenizer, config)?;
        write_book_errors(&out_path, &errors)?;
        info!(book = %uri, error_rate = errors.error_rate, "measured");
        (errors, BookSource::Computed)
    } else {
        let errors = read_book_errors(&out_path)?;
        debug!(book = %uri, path = %out_path.display(), "reused cached error data");
        (errors, BookSource::Cached)
    };

    results.insert(uri, errors.summary());
    Ok(source)
}

fn measure_file<C>(
    path: &Path,
    checker: &C,
    tokenizer: &Tokenizer,
    config: &CorpusConfig,
) -> Result<BookErrors>
where
    C: SpellChecker + ?Sized,
{
    let content = fs::read_to_string(path).map_err(|source| ErrorRateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    calculate_error_rate(strip_header(&content), checker, tokenizer, &config.rates)
}

/// Write `errors` as pretty-printed JSON, creating the parent folder.
pub fn write_book_errors(path: &Path, errors: &BookErrors) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ErrorRateError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(errors)?;
    fs::write(path, json).map_err(|source| ErrorRateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_book_errors(path: &Path) -> Result<BookErrors> {
    let content = fs::read_to_string(path).map_err(|source| ErrorRateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ErrorRateError::MalformedCache {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const BOOK: &str = "######OpenITI#\n#META# 000.SortField :: x\n#META#Header#End#\n\
        كتاب foo PageV01P001 قال PageV01P002";

    fn setup() -> (tempfile::TempDir, PathBuf, CorpusConfig, Tokenizer) {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("0255Jahiz.Hayawan.Shamela0001-ara1");
        fs::write(&book, BOOK).unwrap();
        let config = CorpusConfig {
            outfolder: dir.path().join("error_data"),
            ..CorpusConfig::default()
        };
        let tokenizer = config.rates.compile().unwrap();
        (dir, book, config, tokenizer)
    }

    #[test]
    fn test_computes_and_writes_page_detail() {
        let (_dir, book, config, tokenizer) = setup();
        let checker = |tok: &str| tok != "قال";
        let mut results = CorpusErrors::default();

        let source = collect_file(&book, &checker, &tokenizer, &config, &mut results).unwrap();
        assert_eq!(source, BookSource::Computed);

        // "foo" and the header are not Arabic tokens
        let summary = results.get("0255Jahiz.Hayawan.Shamela0001-ara1").unwrap();
        assert_eq!(summary.tok_count, 2);
        assert_eq!(summary.all, 1);

        let out = config.book_output_path("0255Jahiz.Hayawan.Shamela0001-ara1");
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(written["page_errors"].as_array().unwrap().len(), 2);
        assert_eq!(written["page_errors"][1]["page_no"], "PageV01P002");
        assert_eq!(written["page_errors"][1]["all"], 1);
    }

    #[test]
    fn test_reuses_existing_file() {
        let (_dir, book, config, tokenizer) = setup();
        let mut results = CorpusErrors::default();
        collect_file(&book, &|_: &str| true, &tokenizer, &config, &mut results).unwrap();

        // A different checker would change the numbers if the book were re-read
        let mut again = CorpusErrors::default();
        let source =
            collect_file(&book, &|_: &str| false, &tokenizer, &config, &mut again).unwrap();
        assert_eq!(source, BookSource::Cached);
        assert_eq!(again.get("0255Jahiz.Hayawan.Shamela0001-ara1").unwrap().all, 0);
    }

    #[test]
    fn test_overwrite_recomputes() {
        let (_dir, book, mut config, tokenizer) = setup();
        let mut results = CorpusErrors::default();
        collect_file(&book, &|_: &str| true, &tokenizer, &config, &mut results).unwrap();

        config.overwrite = true;
        let source =
            collect_file(&book, &|_: &str| false, &tokenizer, &config, &mut results).unwrap();
        assert_eq!(source, BookSource::Computed);
        assert_eq!(results.get("0255Jahiz.Hayawan.Shamela0001-ara1").unwrap().all, 2);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_malformed_cache() {
        let (_dir, book, config, tokenizer) = setup();
        let out = config.book_output_path("0255Jahiz.Hayawan.Shamela0001-ara1");
        fs::create_dir_all(out.parent().unwrap()).unwrap();
        fs::write(&out, "{ not json").unwrap();

        let mut results = CorpusErrors::default();
        let err = collect_file(&book, &|_: &str| true, &tokenizer, &config, &mut results)
            .unwrap_err();
        assert!(matches!(err, ErrorRateError::MalformedCache { .. }));
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_book() {
        let (dir, _book, config, tokenizer) = setup();
        let mut results = CorpusErrors::default();
        let err = collect_file(
            &dir.path().join("0300Nobody.Nothing.X-ara1"),
            &|_: &str| true,
            &tokenizer,
            &config,
            &mut results,
        )
        .unwrap_err();
        assert!(matches!(err, ErrorRateError::Read { .. }));
    }

    #[test]
    fn test_book_uri() {
        assert_eq!(book_uri(Path::new("a/b/0255Jahiz.Hayawan.X-ara1")), "0255Jahiz.Hayawan.X-ara1");
    }
}
