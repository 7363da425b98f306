//! Word-addressed backing storage shared between a memory unit and the
//! outside world (loaders, editors, dumps).

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use regex::Regex;

/// A line of program text that is not a binary word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: `{}` is not a binary word of at most 32 digits",
            self.line, self.content
        )
    }
}

impl std::error::Error for LoadError {}

fn word_pattern() -> &'static Regex {
    static PAT: OnceLock<Regex> = OnceLock::new();
    PAT.get_or_init(|| Regex::new(r"^[01]{1,32}$").expect("valid regex"))
}

/// Parse program text: one word per line, binary digits with the most
/// significant bit first. Blank lines are skipped.
pub fn parse_words(text: &str) -> Result<Vec<u32>, LoadError> {
    let mut words = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !word_pattern().is_match(line) {
            return Err(LoadError {
                line: i + 1,
                content: line.to_string(),
            });
        }
        let word = u32::from_str_radix(line, 2).map_err(|_| LoadError {
            line: i + 1,
            content: line.to_string(),
        })?;
        words.push(word);
    }
    Ok(words)
}

/// Render words in the format [`parse_words`] reads.
pub fn format_words(words: &[u32]) -> String {
    words.iter().map(|w| format!("{w:032b}\n")).collect()
}

/// Shared handle to a vector of 32-bit words.
///
/// Clones share the storage. The owning unit mutates it only on clock
/// edges; external handles should be used between ticks.
#[derive(Clone, Default)]
pub struct WordStore(Arc<RwLock<Vec<u32>>>);

impl WordStore {
    pub fn new(size: usize) -> Self {
        Self::from_words(vec![0; size])
    }

    pub fn from_words(words: Vec<u32>) -> Self {
        Self(Arc::new(RwLock::new(words)))
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `None` when `index` is outside the store.
    pub fn read(&self, index: usize) -> Option<u32> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .copied()
    }

    /// Returns whether the write landed.
    pub fn write(&self, index: usize, word: u32) -> bool {
        let mut words = self.0.write().unwrap_or_else(PoisonError::into_inner);
        match words.get_mut(index) {
            Some(slot) => {
                *slot = word;
                true
            }
            None => false,
        }
    }

    /// Replace the whole content, changing the size of the store.
    pub fn replace(&self, words: Vec<u32>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = words;
    }

    pub fn words(&self) -> Vec<u32> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Load program text. On failure the store holds one zero word per input
    /// line, never a partial program.
    pub fn load_text(&self, text: &str) -> Result<usize, LoadError> {
        match parse_words(text) {
            Ok(words) => {
                let n = words.len();
                self.replace(words);
                tracing::info!(words = n, "store loaded");
                Ok(n)
            }
            Err(err) => {
                self.replace(vec![0; text.lines().count()]);
                Err(err)
            }
        }
    }
}

impl fmt::Debug for WordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WordStore").field(&self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let text = "00000000000000000000000000000101\n\n  11\n";
        assert_eq!(parse_words(text).unwrap(), vec![5, 3]);
        let text = format_words(&[0x8c0a_0004, 1]);
        assert_eq!(parse_words(&text).unwrap(), vec![0x8c0a_0004, 1]);
    }

    #[test]
    fn test_bad_line() {
        let err = parse_words("101\n10201\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.content, "10201");
        // 33 digits
        assert!(parse_words(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_failed_load_leaves_empty_state() {
        let store = WordStore::from_words(vec![7, 7, 7, 7, 7]);
        assert!(store.load_text("1\nxyz\n1\n").is_err());
        assert_eq!(store.words(), vec![0, 0, 0]);
    }

    #[test]
    fn test_shared_access() {
        let store = WordStore::new(4);
        let other = store.clone();
        assert!(store.write(3, 42));
        assert!(!store.write(4, 1));
        assert_eq!(other.read(3), Some(42));
        assert_eq!(other.read(4), None);
    }
}
