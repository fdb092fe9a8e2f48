//! Corpus-wide error tables.
//!
//! Walks a folder of OpenITI texts, measures every book in the requested
//! language and writes two corpus files: a TSV with one row per book (in
//! processing order) and a JSON object mapping each book to its summary.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::cache::{BookSource, book_uri, collect_file};
use crate::config::CorpusConfig;
use crate::dictionary::SpellChecker;
use crate::error::{ErrorRateError, Result};
use crate::rates::BookSummary;
use crate::tokenize::Tokenizer;

/// Column order of the corpus TSV.
pub const TSV_HEADER: [&str; 6] = [
    "uri",
    "all",
    "long",
    "error_rate",
    "long_tokens_error_rate",
    "tok_count",
];

const EXCLUDED_FOLDERS: [&str; 4] = ["OpenITI.github", "Annotation", "_maintenance", "i.mech"];

const EXCLUDED_FILES: [&str; 4] = ["README.md", ".DS_Store", ".gitignore", "text_questionnaire.md"];

lazy_static! {
    // Version file: ends in -<lang><n>, optional status extension
    static ref TEXT_FILE: Regex = Regex::new(
        r"-[a-z]{3}\d+(\.(mARkdown|completed|inProgress))?$"
    )
    .unwrap();
}

/// Book summaries keyed by book id, in the order books were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusErrors {
    entries: Vec<(String, BookSummary)>,
    index: HashMap<String, usize>,
}

impl CorpusErrors {
    /// Add a book; a book id seen before keeps its position and gets the new
    /// summary.
    pub fn insert(&mut self, uri: String, summary: BookSummary) {
        match self.index.get(&uri) {
            Some(&pos) => self.entries[pos].1 = summary,
            None => {
                self.index.insert(uri.clone(), self.entries.len());
                self.entries.push((uri, summary));
            }
        }
    }

    pub fn get(&self, uri: &str) -> Option<&BookSummary> {
        self.index.get(uri).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BookSummary)> {
        self.entries.iter().map(|(uri, summary)| (uri.as_str(), summary))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Dumped with sorted keys
impl Serialize for CorpusErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let sorted: BTreeMap<&str, &BookSummary> = self.iter().collect();
        sorted.serialize(serializer)
    }
}

/// A book that could not be measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBook {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus run.
#[derive(Debug, Default)]
pub struct CorpusReport {
    pub errors: CorpusErrors,
    /// Books measured in this run.
    pub computed: usize,
    /// Books whose per-book file was reused.
    pub cached: usize,
    /// Files left out by the language filter.
    pub filtered_out: usize,
    pub skipped: Vec<SkippedBook>,
}

/// All OpenITI text files below `folder`, in a stable order.
pub fn discover_text_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(folder)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && e.depth() > 0
                && EXCLUDED_FOLDERS.iter().any(|f| e.file_name() == *f))
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if EXCLUDED_FILES.iter().any(|f| *f == name) || !TEXT_FILE.is_match(&name) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Whether `path` belongs to the language `lang_code`, i.e. contains
/// `-<lang_code>`. An absent or empty code accepts everything.
pub fn language_matches(path: &Path, lang_code: Option<&str>) -> bool {
    match lang_code {
        Some(code) if !code.is_empty() => path.to_string_lossy().contains(&format!("-{}", code)),
        _ => true,
    }
}

/// Floats the way the corpus tables have always printed them: shortest
/// round-trip digits, `0.0` rather than `0`, and exponent form (`2.5e-05`)
/// below 1e-4 or from 1e16 up.
fn format_rate(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sci = format!("{:e}", value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if value != 0.0 && !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }
    let s = value.to_string();
    if s.contains('.') { s } else { format!("{}.0", s) }
}

fn tsv_row(uri: &str, summary: &BookSummary) -> [String; 6] {
    [
        uri.to_string(),
        summary.all.to_string(),
        summary.long.to_string(),
        format_rate(summary.error_rate),
        format_rate(summary.long_tokens_error_rate),
        summary.tok_count.to_string(),
    ]
}

/// Measure every matching book below `folder` and write the corpus TSV and
/// JSON files.
pub fn collect_folder<C>(
    folder: &Path,
    tsv_path: &Path,
    json_path: &Path,
    checker: &C,
    config: &CorpusConfig,
) -> Result<CorpusReport>
where
    C: SpellChecker + ?Sized,
{
    let tokenizer = config.rates.compile()?;
    let files = discover_text_files(folder)?;
    info!(folder = %folder.display(), files = files.len(), "discovered text files");
    collect_files(&files, tsv_path, json_path, checker, &tokenizer, config)
}

/// Like [`collect_folder`], over an explicit list of book files.
pub fn collect_files<C>(
    files: &[PathBuf],
    tsv_path: &Path,
    json_path: &Path,
    checker: &C,
    tokenizer: &Tokenizer,
    config: &CorpusConfig,
) -> Result<CorpusReport>
where
    C: SpellChecker + ?Sized,
{
    let mut report = CorpusReport::default();

    info!(path = %tsv_path.display(), "writing corpus-wide data");
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(tsv_path)?;
    tsv.write_record(TSV_HEADER)?;
    flush_tsv(&mut tsv, tsv_path)?;

    for path in files {
        if !language_matches(path, config.lang_code.as_deref()) {
            report.filtered_out += 1;
            continue;
        }
        let uri = book_uri(path);
        info!(book = %uri, "checking");

        match collect_file(path, checker, tokenizer, config, &mut report.errors) {
            Ok(source) => {
                match source {
                    BookSource::Computed => report.computed += 1,
                    BookSource::Cached => report.cached += 1,
                }
                if let Some(summary) = report.errors.get(&uri) {
                    tsv.write_record(tsv_row(&uri, summary))?;
                    flush_tsv(&mut tsv, tsv_path)?;
                }
            }
            Err(e) if !config.fail_fast => {
                warn!(book = %uri, error = %e, "skipping book");
                report.skipped.push(SkippedBook {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let json = serde_json::to_string_pretty(&report.errors)?;
    fs::write(json_path, json).map_err(|source| ErrorRateError::Write {
        path: json_path.to_path_buf(),
        source,
    })?;
    info!(
        path = %json_path.display(),
        books = report.errors.len(),
        skipped = report.skipped.len(),
        "wrote corpus error data"
    );
    Ok(report)
}

fn flush_tsv(tsv: &mut csv::Writer<fs::File>, path: &Path) -> Result<()> {
    tsv.flush().map_err(|source| ErrorRateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(all: u64, tok_count: u64) -> BookSummary {
        BookSummary {
            all,
            error_rate: all as f64 / tok_count as f64,
            long: 0,
            long_tokens_error_rate: 0.0,
            tok_count,
        }
    }

    #[test]
    fn test_language_filter() {
        let ara = Path::new("data/0255Jahiz/0255Jahiz.Hayawan.Shamela0001-ara1");
        let per = Path::new("data/0255Jahiz/0255Jahiz.Hayawan.Shamela0001-per1");
        assert!(language_matches(ara, Some("ara")));
        assert!(!language_matches(per, Some("ara")));
        assert!(language_matches(per, None));
        assert!(language_matches(per, Some("")));
    }

    #[test]
    fn test_insert_keeps_first_position() {
        let mut table = CorpusErrors::default();
        table.insert("b".to_string(), summary(1, 2));
        table.insert("a".to_string(), summary(1, 4));
        table.insert("b".to_string(), summary(2, 2));
        let order: Vec<&str> = table.iter().map(|(uri, _)| uri).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(table.get("b").unwrap().all, 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_json_dump_is_sorted_and_flat() {
        let mut table = CorpusErrors::default();
        table.insert("b".to_string(), summary(1, 2));
        table.insert("a".to_string(), summary(1, 4));
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.find("\"a\"").unwrap() < json.find("\"b\"").unwrap());
        assert!(!json.contains("page_errors"));
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0.0");
        assert_eq!(format_rate(1.0), "1.0");
        assert_eq!(format_rate(0.25), "0.25");
        assert_eq!(format_rate(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_rate(0.0001), "0.0001");
    }

    #[test]
    fn test_format_rate_small_and_large() {
        assert_eq!(format_rate(5.0 / 200000.0), "2.5e-05");
        assert_eq!(format_rate(1e-5), "1e-05");
        assert_eq!(format_rate(1.5e-123), "1.5e-123");
        assert_eq!(format_rate(1e16), "1e+16");
        assert_eq!(format_rate(123456789012345.0), "123456789012345.0");
    }

    #[test]
    fn test_discovery_filters_names_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let author = root.join("data/0255Jahiz/0255Jahiz.Hayawan");
        fs::create_dir_all(&author).unwrap();
        fs::create_dir_all(root.join("Annotation")).unwrap();
        fs::write(author.join("0255Jahiz.Hayawan.Shamela0001-ara1"), "x").unwrap();
        fs::write(author.join("0255Jahiz.Hayawan.Shamela0002-ara1.mARkdown"), "x").unwrap();
        fs::write(author.join("0255Jahiz.Hayawan.yml"), "x").unwrap();
        fs::write(author.join("README.md"), "x").unwrap();
        fs::write(author.join("Hayawan-ara1"), "x").unwrap();
        fs::write(author.join("Hayawan-ara1.bak"), "x").unwrap();
        fs::write(root.join("Annotation/0300Foo.Bar.Baz0001-ara1"), "x").unwrap();

        let files = discover_text_files(root).unwrap();
        let names: Vec<String> = files.iter().map(|p| book_uri(p)).collect();
        assert_eq!(
            names,
            vec![
                "0255Jahiz.Hayawan.Shamela0001-ara1",
                "0255Jahiz.Hayawan.Shamela0002-ara1.mARkdown",
                "Hayawan-ara1",
            ]
        );
    }
}
