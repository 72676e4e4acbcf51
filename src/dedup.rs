//! Title-level duplicate detection.
//!
//! Each title is reduced to a keyword set made of core topic words,
//! uppercased Latin tokens, numeral+unit tokens and every Chinese bigram
//! outside the stopword list. Two titles are compared with Jaccard
//! similarity, boosted when the overlap contains "core" keywords.

use crate::rules::DedupRules;
use crate::utils::char_len;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static LATIN_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{2,}").expect("static regex"));
static NUMERAL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?[亿万兆元%股点个家条项]?").expect("static regex"));

static DEFAULT_DETECTOR: Lazy<DuplicateDetector> = Lazy::new(DuplicateDetector::default);

/// A title in a comparison pool that another title duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub matched: String,
    pub similarity: f64,
}

#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    threshold: f64,
    stopwords: HashSet<String>,
    core_topics: Vec<String>,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(&DedupRules::default())
    }
}

impl DuplicateDetector {
    pub fn new(rules: &DedupRules) -> Self {
        Self {
            threshold: rules.threshold,
            stopwords: rules.stopwords.iter().cloned().collect(),
            core_topics: rules.core_topics.clone(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Keyword set of one title. Every member is at least two characters long.
    pub fn keywords(&self, title: &str) -> HashSet<String> {
        let mut words = HashSet::new();
        if title.is_empty() {
            return words;
        }

        for topic in &self.core_topics {
            if title.contains(topic.as_str()) {
                words.insert(topic.clone());
            }
        }

        words.extend(LATIN_TOKEN.find_iter(title).map(|m| m.as_str().to_uppercase()));

        words.extend(
            NUMERAL_TOKEN
                .find_iter(title)
                .map(|m| m.as_str())
                .filter(|t| char_len(t) >= 2)
                .map(str::to_string),
        );

        let han: Vec<char> = title.chars().filter(|c| is_cjk(*c)).collect();
        words.extend(han.windows(2).map(|pair| pair.iter().collect::<String>()));

        words.retain(|w| char_len(w) >= 2 && !self.stopwords.contains(w));
        words
    }

    /// Weighted Jaccard similarity in `0.0..=1.0`. Symmetric in its arguments.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let ka = self.keywords(a);
        let kb = self.keywords(b);
        if ka.is_empty() || kb.is_empty() {
            return 0.0;
        }

        let shared: Vec<&String> = ka.intersection(&kb).collect();
        let union = ka.union(&kb).count();
        let base = shared.len() as f64 / union as f64;

        // Tokens of three or more characters count as core alongside the topic list.
        let core = shared
            .iter()
            .filter(|w| char_len(w) >= 3 || self.core_topics.contains(w))
            .count();

        match core {
            0 => base,
            1 => (base * 1.2).min(1.0),
            _ => (base * 1.5).min(1.0),
        }
    }

    /// First title in `pool` whose similarity to `title` reaches the threshold.
    pub fn find_duplicate<S: AsRef<str>>(&self, title: &str, pool: &[S]) -> Option<DuplicateMatch> {
        pool.iter().find_map(|existing| {
            let existing = existing.as_ref();
            let similarity = self.similarity(title, existing);
            (similarity >= self.threshold).then(|| DuplicateMatch {
                matched: existing.to_string(),
                similarity,
            })
        })
    }

    /// `(is_duplicate, matched_title, similarity)` against `history`.
    ///
    /// A miss reports `(false, None, 0.0)`.
    pub fn is_duplicate<S: AsRef<str>>(&self, title: &str, history: &[S]) -> (bool, Option<String>, f64) {
        match self.find_duplicate(title, history) {
            Some(m) => (true, Some(m.matched), m.similarity),
            None => (false, None, 0.0),
        }
    }
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Keyword set of `title` under the built-in vocabulary.
pub fn extract_title_keywords(title: &str) -> HashSet<String> {
    DEFAULT_DETECTOR.keywords(title)
}

/// Similarity of two titles under the built-in vocabulary.
pub fn similarity(a: &str, b: &str) -> f64 {
    DEFAULT_DETECTOR.similarity(a, b)
}

/// Duplicate check of `title` against `history` under the built-in vocabulary.
pub fn is_duplicate<S: AsRef<str>>(title: &str, history: &[S]) -> (bool, Option<String>, f64) {
    DEFAULT_DETECTOR.is_duplicate(title, history)
}
