use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use openiti_error_rate::{CorpusConfig, MultiLangDict, collect_folder};

/// Calculate spellcheck error rates for a folder of OpenITI texts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder containing OpenITI text files (searched recursively)
    folder: PathBuf,

    /// Corpus-wide TSV output [default: <folder name>_error_data.tsv]
    #[arg(long)]
    tsv: Option<PathBuf>,

    /// Corpus-wide JSON output [default: <folder name>_error_data.json]
    #[arg(long)]
    json: Option<PathBuf>,

    /// TOML file with run settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder for the per-book error data files
    #[arg(long)]
    outfolder: Option<PathBuf>,

    /// Only check books whose path contains -<LANG>
    #[arg(long, conflicts_with = "all_languages")]
    lang: Option<String>,

    /// Check every book regardless of its language
    #[arg(long)]
    all_languages: bool,

    /// Folder with Hunspell (.aff/.dic) files or <name>_words.txt lists
    #[arg(long, default_value = "dictionaries")]
    dict_dir: PathBuf,

    /// Dictionary to load (repeatable); a word known to any of them is correct
    #[arg(long = "dict", default_value = "ar")]
    dicts: Vec<String>,

    /// Recompute books that already have a per-book error data file
    #[arg(long)]
    overwrite: bool,

    /// Tokens longer than this many characters count as long
    #[arg(long)]
    long: Option<usize>,

    /// Regular expression describing the tokens to check
    #[arg(long)]
    token_pattern: Option<String>,

    /// Record tokens after the last page marker as an extra page
    #[arg(long)]
    include_trailing_page: bool,

    /// Abort on the first book that fails instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Log every page marker and checked token
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn corpus_config(&self) -> anyhow::Result<CorpusConfig> {
        let mut config = match &self.config {
            Some(path) => CorpusConfig::from_toml_file(path)?,
            None => CorpusConfig::default(),
        };
        if let Some(outfolder) = &self.outfolder {
            config.outfolder = outfolder.clone();
        }
        if self.all_languages {
            config.lang_code = None;
        } else if let Some(lang) = &self.lang {
            config.lang_code = Some(lang.clone());
        }
        if let Some(long) = self.long {
            config.rates.long_threshold = long;
        }
        if let Some(pattern) = &self.token_pattern {
            config.rates.token_pattern = pattern.clone();
        }
        config.overwrite |= self.overwrite;
        config.fail_fast |= self.fail_fast;
        config.rates.include_trailing_page |= self.include_trailing_page;
        config.rates.verbose |= self.verbose;
        Ok(config)
    }
}

/// `<folder name>_error_data.<ext>` in the working directory.
fn default_output(folder: &Path, ext: &str) -> PathBuf {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus".to_string());
    PathBuf::from(format!("{}_error_data.{}", name, ext))
}

/// Filter used when `RUST_LOG` is unset; token verdicts are TRACE events.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "trace" } else { "info" }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.corpus_config()?;
    init_tracing(config.rates.verbose);

    if !args.folder.is_dir() {
        anyhow::bail!("Corpus folder not found: {}", args.folder.display());
    }

    let tsv_path = args
        .tsv
        .clone()
        .unwrap_or_else(|| default_output(&args.folder, "tsv"));
    let json_path = args
        .json
        .clone()
        .unwrap_or_else(|| default_output(&args.folder, "json"));

    let dict = MultiLangDict::load(&args.dict_dir, &args.dicts)?;
    let report = collect_folder(&args.folder, &tsv_path, &json_path, &dict, &config)?;

    println!(
        "{} books: {} measured, {} reused, {} other-language files ignored, {} skipped",
        report.errors.len(),
        report.computed,
        report.cached,
        report.filtered_out,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    println!("TSV:  {}", tsv_path.display());
    println!("JSON: {}", json_path.display());
    Ok(())
}
