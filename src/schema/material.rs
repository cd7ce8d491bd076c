//! Illustrated learning material for a single subtopic.

use super::{check_image_url, null_as_empty};
use crate::error::{LearnieError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;
use tracing::warn;

pub const MIN_BLOCKS: usize = 3;
pub const MAX_BLOCKS: usize = 7;

/// Word counts outside this range are logged but accepted.
const EXPECTED_WORDS: std::ops::RangeInclusive<usize> = 150..=800;

/// Number of terms that make up a block's dominant keyword set.
const DOMINANT_KEYWORDS: usize = 5;

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "because", "been", "before", "being", "between", "both", "could",
    "does", "during", "each", "even", "first", "from", "have", "here", "into", "just", "like",
    "made", "make", "many", "more", "most", "much", "only", "other", "over", "same", "should",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "used", "using", "very", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your",
];

/// An article made of illustrated blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialArticle {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub material: Vec<MaterialBlock>,
    /// Citation strings, not validated.
    #[serde(default)]
    pub references: Vec<String>,
}

/// One self-contained illustrated paragraph unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialBlock {
    /// Markdown text, roughly 300-500 words.
    pub text: String,
    /// Empty when the image lookup found nothing or failed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_description: String,
}

impl MaterialBlock {
    /// The illustration, if one was found.
    pub fn image(&self) -> Option<&str> {
        if self.image_url.is_empty() {
            None
        } else {
            Some(&self.image_url)
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl MaterialArticle {
    /// Drop repeated references, keeping the first occurrence.
    pub fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.references
            .retain(|r| !r.trim().is_empty() && seen.insert(r.trim().to_string()));
    }

    /// Check block count, required fields and cross-block duplication.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LearnieError::violation("article title is empty"));
        }

        let count = self.material.len();
        if !(MIN_BLOCKS..=MAX_BLOCKS).contains(&count) {
            return Err(LearnieError::violation(format!(
                "article must have {}-{} blocks, got {}",
                MIN_BLOCKS, MAX_BLOCKS, count
            )));
        }

        let mut keyword_sets: Vec<BTreeSet<String>> = Vec::with_capacity(count);

        for (i, block) in self.material.iter().enumerate() {
            let location = format!("block {}", i + 1);
            if block.text.trim().is_empty() {
                return Err(LearnieError::violation(format!("{}: text is empty", location)));
            }
            if block.image_description.trim().is_empty() {
                return Err(LearnieError::violation(format!(
                    "{}: imageDescription is required",
                    location
                )));
            }
            check_image_url(&block.image_url, &location)?;

            let words = block.word_count();
            if !EXPECTED_WORDS.contains(&words) {
                warn!(
                    "{} has {} words (expected {}-{})",
                    location,
                    words,
                    EXPECTED_WORDS.start(),
                    EXPECTED_WORDS.end()
                );
            }

            let keywords = dominant_keywords(&block.text);
            if !keywords.is_empty() {
                if let Some(j) = keyword_sets.iter().position(|k| *k == keywords) {
                    return Err(LearnieError::violation(format!(
                        "blocks {} and {} repeat the same content ({})",
                        j + 1,
                        i + 1,
                        keywords.into_iter().collect::<Vec<_>>().join(", ")
                    )));
                }
            }
            keyword_sets.push(keywords);
        }

        Ok(())
    }

    /// Reject block images that were not returned by an image lookup.
    pub fn ensure_images_from(&self, looked_up: &HashSet<String>) -> Result<()> {
        for (i, block) in self.material.iter().enumerate() {
            if let Some(url) = block.image() {
                if !looked_up.contains(url) {
                    return Err(LearnieError::violation(format!(
                        "block {} uses image URL '{}' that was not returned by search_images",
                        i + 1,
                        url
                    )));
                }
            }
        }
        Ok(())
    }

    /// All block texts joined, for use as practice input.
    pub fn full_text(&self) -> String {
        self.material
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\p{L}+").expect("word pattern is valid"))
}

/// The most frequent meaningful terms of a text.
///
/// Terms are lowercase words of at least four letters that are not stopwords,
/// ranked by frequency then alphabetically.
pub fn dominant_keywords(text: &str) -> BTreeSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in word_regex().find_iter(text) {
        let word = m.as_str().to_lowercase();
        if word.chars().count() < 4 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(DOMINANT_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}
