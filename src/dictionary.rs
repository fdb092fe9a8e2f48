//! Spellcheck predicates.
//!
//! A token is "known" when the configured [`SpellChecker`] accepts it. The
//! dictionary-backed checker loads Hunspell dictionaries (through zspell) or
//! plain word lists, and accepts a word if ANY loaded dictionary knows it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};
use unicode_normalization::{UnicodeNormalization, is_nfc};
use zspell::Dictionary;

use crate::error::{ErrorRateError, Result};

/// Decides whether a token is recognized.
pub trait SpellChecker {
    fn check(&self, token: &str) -> bool;
}

impl<F> SpellChecker for F
where
    F: Fn(&str) -> bool,
{
    fn check(&self, token: &str) -> bool {
        self(token)
    }
}

// A generic `Box<T>` impl would overlap with the closure impl above
impl SpellChecker for Box<dyn SpellChecker + '_> {
    fn check(&self, token: &str) -> bool {
        self.as_ref().check(token)
    }
}

/// Checker backed by a lookup that can fail, such as a callback into
/// another runtime. The first failure is kept and every token after it
/// counts as unknown; take it with [`FallibleChecker::take_error`] once
/// the book is done.
pub struct FallibleChecker<F, E> {
    lookup: F,
    error: RefCell<Option<E>>,
}

impl<F, E> FallibleChecker<F, E>
where
    F: Fn(&str) -> std::result::Result<bool, E>,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            error: RefCell::new(None),
        }
    }

    pub fn take_error(&self) -> Option<E> {
        self.error.borrow_mut().take()
    }
}

impl<F, E> SpellChecker for FallibleChecker<F, E>
where
    F: Fn(&str) -> std::result::Result<bool, E>,
{
    fn check(&self, token: &str) -> bool {
        if self.error.borrow().is_some() {
            return false;
        }
        match (self.lookup)(token) {
            Ok(known) => known,
            Err(e) => {
                *self.error.borrow_mut() = Some(e);
                false
            }
        }
    }
}

/// One Hunspell `.aff`/`.dic` pair.
pub struct HunspellDict {
    name: String,
    dict: Dictionary,
}

impl HunspellDict {
    /// Load `<name>.aff` and `<name>.dic` from `dict_dir`.
    pub fn load(dict_dir: &Path, name: &str) -> Result<Self> {
        let aff_content = read_dict_file(&dict_dir.join(format!("{}.aff", name)))?;
        let dic_content = read_dict_file(&dict_dir.join(format!("{}.dic", name)))?;

        let dict = zspell::builder()
            .config_str(&aff_content)
            .dict_str(&dic_content)
            .build()
            .map_err(|e| ErrorRateError::Dictionary {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(name, "loaded hunspell dictionary");
        Ok(Self {
            name: name.to_string(),
            dict,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SpellChecker for HunspellDict {
    fn check(&self, token: &str) -> bool {
        self.dict.check_word(token)
    }
}

/// Newline-separated word list; blank lines and `#` comments are skipped.
pub struct WordList {
    name: String,
    words: HashSet<String>,
}

impl WordList {
    pub fn parse(name: &str, content: &str) -> Self {
        let words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.to_string())
            .collect();
        Self {
            name: name.to_string(),
            words,
        }
    }

    /// Load `<name>_words.txt` from `dict_dir`.
    pub fn load(dict_dir: &Path, name: &str) -> Result<Self> {
        let content = read_dict_file(&dict_dir.join(format!("{}_words.txt", name)))?;
        let list = Self::parse(name, &content);
        debug!(name, words = list.len(), "loaded word list");
        Ok(list)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl SpellChecker for WordList {
    fn check(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

/// Every dictionary loaded for a run.
#[derive(Default)]
pub struct MultiLangDict {
    hunspell: Vec<HunspellDict>,
    word_lists: Vec<WordList>,
}

impl MultiLangDict {
    /// Load one dictionary per name from `dict_dir`: the Hunspell pair when
    /// both files exist, otherwise `<name>_words.txt`.
    pub fn load(dict_dir: &Path, names: &[String]) -> Result<Self> {
        if !dict_dir.is_dir() {
            return Err(ErrorRateError::Dictionary {
                name: names.join(","),
                reason: format!("dictionary directory not found: {}", dict_dir.display()),
            });
        }

        let mut multi = Self::default();
        for name in names {
            let aff_path = dict_dir.join(format!("{}.aff", name));
            let dic_path = dict_dir.join(format!("{}.dic", name));
            if aff_path.exists() && dic_path.exists() {
                multi.hunspell.push(HunspellDict::load(dict_dir, name)?);
                continue;
            }
            let list_path = dict_dir.join(format!("{}_words.txt", name));
            if list_path.exists() {
                multi.word_lists.push(WordList::load(dict_dir, name)?);
                continue;
            }
            return Err(ErrorRateError::Dictionary {
                name: name.clone(),
                reason: format!(
                    "neither {0}.aff/{0}.dic nor {0}_words.txt found in {1}",
                    name,
                    dict_dir.display()
                ),
            });
        }
        info!("{}", multi.stats());
        Ok(multi)
    }

    pub fn with_word_list(mut self, list: WordList) -> Self {
        self.word_lists.push(list);
        self
    }

    fn check_exact(&self, word: &str) -> bool {
        self.hunspell.iter().any(|d| d.check(word)) || self.word_lists.iter().any(|l| l.check(word))
    }

    /// Get stats about loaded dictionaries
    pub fn stats(&self) -> String {
        let hunspell: Vec<&str> = self.hunspell.iter().map(|d| d.name()).collect();
        let lists: Vec<String> = self
            .word_lists
            .iter()
            .map(|l| format!("{} ({} words)", l.name(), l.len()))
            .collect();
        format!(
            "Dictionaries loaded: hunspell=[{}], word lists=[{}]",
            hunspell.join(", "),
            lists.join(", ")
        )
    }
}

impl SpellChecker for MultiLangDict {
    fn check(&self, word: &str) -> bool {
        if self.check_exact(word) {
            return true;
        }
        let lower = word.to_lowercase();
        if lower != word && self.check_exact(&lower) {
            return true;
        }
        if !is_nfc(word) {
            let composed: String = word.nfc().collect();
            return self.check_exact(&composed);
        }
        false
    }
}

fn read_dict_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ErrorRateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_checker() {
        let checker = |tok: &str| tok != "foo";
        assert!(checker.check("bar"));
        assert!(!checker.check("foo"));
    }

    #[test]
    fn test_boxed_checker() {
        let list = WordList::parse("ar", "كتاب");
        let boxed: Box<dyn SpellChecker> = Box::new(list);
        assert!(boxed.check("كتاب"));

        let tokenizer = crate::config::ErrorRateConfig::default().compile().unwrap();
        let errors = crate::rates::calculate_error_rate(
            "كتاب قلم PageV01P001",
            &boxed,
            &tokenizer,
            &crate::config::ErrorRateConfig::default(),
        )
        .unwrap();
        assert_eq!(errors.tok_count, 2);
        assert_eq!(errors.all, 1);
    }

    #[test]
    fn test_fallible_checker_keeps_first_error() {
        let checker = FallibleChecker::new(|tok: &str| match tok {
            "bad" => Err(format!("cannot check {}", tok)),
            "worse" => Err("second failure".to_string()),
            _ => Ok(tok != "foo"),
        });
        assert!(checker.check("bar"));
        assert!(!checker.check("foo"));
        assert!(checker.take_error().is_none());

        assert!(!checker.check("bad"));
        // Known words count as unknown once the lookup has failed
        assert!(!checker.check("bar"));
        assert!(!checker.check("worse"));
        assert_eq!(checker.take_error().as_deref(), Some("cannot check bad"));
        assert!(checker.check("bar"));
    }

    #[test]
    fn test_word_list_skips_comments() {
        let list = WordList::parse("ar", "# header\nكتاب\n\n  قال  \n");
        assert_eq!(list.len(), 2);
        assert!(list.check("كتاب"));
        assert!(list.check("قال"));
        assert!(!list.check("# header"));
    }

    #[test]
    fn test_multi_dict_any_list_matches() {
        let dict = MultiLangDict::default()
            .with_word_list(WordList::parse("ar", "كتاب"))
            .with_word_list(WordList::parse("en", "book"));
        assert!(dict.check("كتاب"));
        assert!(dict.check("Book"));
        assert!(!dict.check("xyzqwerty"));
    }

    #[test]
    fn test_multi_dict_composes_decomposed_input() {
        // "é" stored composed, queried decomposed
        let dict = MultiLangDict::default().with_word_list(WordList::parse("fr", "\u{e9}t\u{e9}"));
        assert!(dict.check("e\u{301}te\u{301}"));
    }

    #[test]
    fn test_load_word_list_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ar_words.txt"), "كتاب\nقال\n").unwrap();
        let dict = MultiLangDict::load(dir.path(), &["ar".to_string()]).unwrap();
        assert!(dict.check("قال"));
        assert!(dict.stats().contains("ar (2 words)"));
    }

    #[test]
    fn test_load_missing_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let err = MultiLangDict::load(dir.path(), &["ar".to_string()]).err().unwrap();
        assert!(matches!(err, ErrorRateError::Dictionary { ref name, .. } if name == "ar"));
    }

    #[test]
    fn test_arabic_hunspell() {
        // Needs the ayaspell files (ar.aff / ar.dic) in dictionaries/
        let dict_dir = Path::new("dictionaries");
        if dict_dir.join("ar.aff").exists() && dict_dir.join("ar.dic").exists() {
            let dict = MultiLangDict::load(dict_dir, &["ar".to_string()]).unwrap();
            assert!(dict.check("كتاب"));
            assert!(!dict.check("كككتتتاااب"));
        }
    }
}
