use std::path::{Path, PathBuf};

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::{CorpusConfig, DEFAULT_LONG_THRESHOLD, DEFAULT_OUTFOLDER, ErrorRateConfig};
use crate::dictionary::{FallibleChecker, MultiLangDict, SpellChecker};
use crate::error::ErrorRateError;
use crate::rates::{BookErrors, PageErrors};

impl From<ErrorRateError> for PyErr {
    fn from(err: ErrorRateError) -> PyErr {
        match err {
            ErrorRateError::Read { .. } | ErrorRateError::Write { .. } => {
                PyIOError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Dictionaries loaded once and passed to every call
#[pyclass(name = "Dictionary")]
struct PyDictionary {
    inner: MultiLangDict,
}

#[pymethods]
impl PyDictionary {
    #[new]
    #[pyo3(signature = (dict_dir, dicts = vec!["ar".to_string()]))]
    fn new(dict_dir: String, dicts: Vec<String>) -> PyResult<Self> {
        Ok(Self {
            inner: MultiLangDict::load(Path::new(&dict_dir), &dicts)?,
        })
    }

    fn check(&self, token: &str) -> bool {
        self.inner.check(token)
    }

    fn stats(&self) -> String {
        self.inner.stats()
    }
}

/// Error counts of one page
#[pyclass]
#[derive(Clone)]
struct PageErrorInfo {
    #[pyo3(get)]
    page_no: String,
    #[pyo3(get)]
    all: u64,
    #[pyo3(get)]
    long: u64,
    #[pyo3(get)]
    tok_count: u64,
}

impl From<PageErrors> for PageErrorInfo {
    fn from(page: PageErrors) -> Self {
        Self {
            page_no: page.page_no,
            all: page.all,
            long: page.long,
            tok_count: page.tok_count,
        }
    }
}

/// Error data of one book
#[pyclass]
#[derive(Clone)]
struct BookErrorInfo {
    #[pyo3(get)]
    all: u64,
    #[pyo3(get)]
    long: u64,
    #[pyo3(get)]
    tok_count: u64,
    #[pyo3(get)]
    error_rate: f64,
    #[pyo3(get)]
    long_tokens_error_rate: f64,
    #[pyo3(get)]
    page_errors: Vec<PageErrorInfo>,
}

impl From<BookErrors> for BookErrorInfo {
    fn from(book: BookErrors) -> Self {
        Self {
            all: book.all,
            long: book.long,
            tok_count: book.tok_count,
            error_rate: book.error_rate,
            long_tokens_error_rate: book.long_tokens_error_rate,
            page_errors: book.page_errors.into_iter().map(PageErrorInfo::from).collect(),
        }
    }
}

fn rates_config(
    long: usize,
    token_regex: Option<String>,
    include_trailing_page: bool,
    verbose: bool,
) -> ErrorRateConfig {
    let mut config = ErrorRateConfig {
        long_threshold: long,
        include_trailing_page,
        verbose,
        ..ErrorRateConfig::default()
    };
    if let Some(pattern) = token_regex {
        config.token_pattern = pattern;
    }
    config
}

/// Run `run` with the loaded dictionary or with the Python callable.
/// An exception raised by the callable is re-raised once `run` is done.
fn with_checker<T>(
    dictionary: Option<&PyDictionary>,
    spellcheck_func: Option<&Bound<'_, PyAny>>,
    run: impl FnOnce(&dyn SpellChecker) -> PyResult<T>,
) -> PyResult<T> {
    match (dictionary, spellcheck_func) {
        (Some(dict), None) => run(&dict.inner),
        (None, Some(func)) => {
            let checker = FallibleChecker::new(|tok: &str| func.call1((tok,))?.is_truthy());
            let result = run(&checker);
            if let Some(err) = checker.take_error() {
                return Err(err);
            }
            result
        }
        (Some(_), Some(_)) => Err(PyValueError::new_err(
            "pass either dictionary or spellcheck_func, not both",
        )),
        (None, None) => Err(PyValueError::new_err(
            "a dictionary or a spellcheck_func is required",
        )),
    }
}

/// Get the error rate of a book and of each of its pages
#[pyfunction]
#[pyo3(signature = (text, dictionary = None, spellcheck_func = None, long = DEFAULT_LONG_THRESHOLD, token_regex = None, include_trailing_page = false, verbose = false))]
fn calculate_error_rate(
    text: String,
    dictionary: Option<PyRef<'_, PyDictionary>>,
    spellcheck_func: Option<Bound<'_, PyAny>>,
    long: usize,
    token_regex: Option<String>,
    include_trailing_page: bool,
    verbose: bool,
) -> PyResult<BookErrorInfo> {
    let config = rates_config(long, token_regex, include_trailing_page, verbose);
    let tokenizer = config.compile()?;
    with_checker(dictionary.as_deref(), spellcheck_func.as_ref(), |checker| {
        let errors = crate::rates::calculate_error_rate(&text, checker, &tokenizer, &config)?;
        Ok(errors.into())
    })
}

/// Collect error data for all text files in a folder and its subfolders
/// Returns: (books_computed, books_cached, [(skipped_path, reason)])
#[pyfunction]
#[pyo3(signature = (folder, tsv_fp, json_fp, dictionary = None, spellcheck_func = None, outfolder = DEFAULT_OUTFOLDER.to_string(), lang_code = Some("ara".to_string()), overwrite = false, long = DEFAULT_LONG_THRESHOLD, token_regex = None, include_trailing_page = false, verbose = false, fail_fast = false))]
#[allow(clippy::too_many_arguments)]
fn collect_spellcheck_error_data_in_folder(
    folder: String,
    tsv_fp: String,
    json_fp: String,
    dictionary: Option<PyRef<'_, PyDictionary>>,
    spellcheck_func: Option<Bound<'_, PyAny>>,
    outfolder: String,
    lang_code: Option<String>,
    overwrite: bool,
    long: usize,
    token_regex: Option<String>,
    include_trailing_page: bool,
    verbose: bool,
    fail_fast: bool,
) -> PyResult<(usize, usize, Vec<(String, String)>)> {
    let config = CorpusConfig {
        outfolder: PathBuf::from(outfolder),
        lang_code,
        overwrite,
        fail_fast,
        rates: rates_config(long, token_regex, include_trailing_page, verbose),
    };
    let report = with_checker(dictionary.as_deref(), spellcheck_func.as_ref(), |checker| {
        Ok(crate::corpus::collect_folder(
            Path::new(&folder),
            Path::new(&tsv_fp),
            Path::new(&json_fp),
            checker,
            &config,
        )?)
    })?;
    let skipped = report
        .skipped
        .into_iter()
        .map(|s| (s.path.to_string_lossy().into_owned(), s.reason))
        .collect();
    Ok((report.computed, report.cached, skipped))
}

#[pymodule]
fn openiti_error_rate(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calculate_error_rate, m)?)?;
    m.add_function(wrap_pyfunction!(collect_spellcheck_error_data_in_folder, m)?)?;
    m.add_class::<PyDictionary>()?;
    m.add_class::<BookErrorInfo>()?;
    m.add_class::<PageErrorInfo>()?;
    Ok(())
}
