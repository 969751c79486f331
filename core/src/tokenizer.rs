use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for",
    "if", "in", "into", "is", "it", "no", "not", "of", "on", "or",
    "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// A deterministic stemming function. `None` means the stemmer produced nothing for the
/// token, in which case the analyzer keeps the token unchanged.
pub trait Stem: Send + Sync {
    fn stem(&self, token: &str) -> Option<String>;
}

impl Stem for Stemmer {
    fn stem(&self, token: &str) -> Option<String> {
        let stemmed = Stemmer::stem(self, token);
        if stemmed.is_empty() { None } else { Some(stemmed.into_owned()) }
    }
}

/// Leaves every token as-is.
pub struct NoStem;

impl Stem for NoStem {
    fn stem(&self, _token: &str) -> Option<String> { None }
}

/// Text analysis pipeline shared by indexing and query-term resolution.
#[derive(Clone)]
pub struct Analyzer {
    stemmer: Arc<dyn Stem>,
    stopwords: HashSet<String>,
    nfkc: bool,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("stopwords", &self.stopwords.len())
            .field("nfkc", &self.nfkc)
            .finish()
    }
}

impl Default for Analyzer {
    fn default() -> Self { Self::new(Arc::new(Stemmer::create(Algorithm::English))) }
}

impl Analyzer {
    pub fn new(stemmer: Arc<dyn Stem>) -> Self {
        Self { stemmer, stopwords: STOPWORDS.iter().map(|w| w.to_string()).collect(), nfkc: false }
    }

    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    /// Apply NFKC compatibility normalization before lowercasing.
    pub fn with_nfkc(mut self, enabled: bool) -> Self {
        self.nfkc = enabled;
        self
    }

    pub fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    /// Lowercase, strip punctuation, collapse whitespace, drop stopwords, stem.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lowered = if self.nfkc {
            text.nfkc().collect::<String>().to_lowercase()
        } else {
            text.to_lowercase()
        };
        let stripped = NON_WORD.replace_all(&lowered, " ");
        let collapsed = WHITESPACE.replace_all(&stripped, " ");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed
            .split(' ')
            .filter(|token| !self.is_stopword(token))
            .map(|token| self.stem_token(token))
            .collect()
    }

    /// Full-pipeline resolution of a single query term. A term may yield zero tokens
    /// (stopwords only) or several (e.g. `tf-idf`).
    pub fn normalize_term(&self, term: &str) -> Vec<String> { self.normalize(term) }

    /// Lowercase, trim and stem the whole string as one token. Punctuation and stopwords
    /// are left alone.
    pub fn stem_only(&self, term: &str) -> String { self.stem_token(&term.trim().to_lowercase()) }

    pub fn term_frequencies(&self, text: &str) -> HashMap<String, u32> {
        let mut tf = HashMap::new();
        for term in self.normalize(text) {
            *tf.entry(term).or_insert(0) += 1;
        }
        tf
    }

    /// Normalized terms joined by single spaces.
    pub fn preprocess(&self, text: &str) -> String { self.normalize(text).join(" ") }

    fn stem_token(&self, token: &str) -> String {
        self.stemmer.stem(token).unwrap_or_else(|| token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Analyzer { Analyzer::new(Arc::new(NoStem)) }

    #[test]
    fn strips_punctuation_into_spaces() {
        assert_eq!(plain().normalize("TF-IDF weights, terms!"), vec!["tf", "idf", "weights", "terms"]);
    }

    #[test]
    fn drops_stopwords_after_lowercasing() {
        assert_eq!(plain().normalize("The Dog AND the Cat"), vec!["dog", "cat"]);
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(plain().normalize("  cat \t\n  mouse  "), vec!["cat", "mouse"]);
        assert!(plain().normalize("   ").is_empty());
        assert!(plain().normalize("?!...").is_empty());
    }

    #[test]
    fn keeps_digits_and_underscores() {
        assert_eq!(plain().normalize("BM25 snake_case"), vec!["bm25", "snake_case"]);
    }

    #[test]
    fn stems_inflected_forms_together() {
        let a = Analyzer::default();
        assert_eq!(a.normalize("Dogs"), a.normalize("dog"));
        assert_eq!(a.normalize("DOG"), vec!["dog"]);
    }

    #[test]
    fn empty_stem_falls_back_to_token() {
        struct Empty;
        impl Stem for Empty {
            fn stem(&self, _token: &str) -> Option<String> { None }
        }
        assert_eq!(Analyzer::new(Arc::new(Empty)).normalize("garden"), vec!["garden"]);
    }

    #[test]
    fn stem_only_keeps_punctuation() {
        assert_eq!(plain().stem_only("  (BM25 "), "(bm25");
    }

    #[test]
    fn nfkc_is_opt_in() {
        let text = "ﬁsh";
        assert_eq!(plain().normalize(text), vec!["ﬁsh"]);
        assert_eq!(plain().with_nfkc(true).normalize(text), vec!["fish"]);
    }

    #[test]
    fn counts_term_frequencies() {
        let tf = plain().term_frequencies("cat cat dog");
        assert_eq!(tf.get("cat"), Some(&2));
        assert_eq!(tf.get("dog"), Some(&1));
    }
}
