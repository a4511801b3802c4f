//! Extractive summarization used when the remote model is unavailable.
//!
//! Sentences are ranked with TextRank over shared content words and the
//! best ones are returned in their original order. If ranking produces
//! nothing, the first three `.`-separated fragments are used instead, so
//! [`ExtractiveSummarizer::summarize`] never fails.

mod stopwords;
mod textrank;

use tracing::{debug, info, warn};

use crate::types::{Generation, Language, Usage};

/// Model id reported for TextRank output.
pub const TEXTRANK_MODEL: &str = "TextRank-extractive";
/// Model id reported for the leading-fragments fallback.
pub const SIMPLE_MODEL: &str = "fallback-simple";

const SIMPLE_FRAGMENTS: usize = 3;

/// Language resources available to the sentence ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLanguage {
    Spanish,
    English,
    French,
    German,
    Italian,
    Portuguese,
}

impl ResourceLanguage {
    /// Resolve a request language tag. `Auto` maps to `default`.
    pub fn from_tag(tag: Language, default: ResourceLanguage) -> Self {
        match tag {
            Language::Es => ResourceLanguage::Spanish,
            Language::En => ResourceLanguage::English,
            Language::Fr => ResourceLanguage::French,
            Language::De => ResourceLanguage::German,
            Language::It => ResourceLanguage::Italian,
            Language::Pt => ResourceLanguage::Portuguese,
            Language::Auto => default,
        }
    }

    /// Full lowercase language name.
    pub fn name(self) -> &'static str {
        match self {
            ResourceLanguage::Spanish => "spanish",
            ResourceLanguage::English => "english",
            ResourceLanguage::French => "french",
            ResourceLanguage::German => "german",
            ResourceLanguage::Italian => "italian",
            ResourceLanguage::Portuguese => "portuguese",
        }
    }
}

/// Result of an extractive pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractiveSummary {
    pub summary: String,
    /// [`TEXTRANK_MODEL`] or [`SIMPLE_MODEL`].
    pub model: &'static str,
    pub sentences_used: usize,
}

impl From<ExtractiveSummary> for Generation {
    fn from(s: ExtractiveSummary) -> Self {
        Generation {
            summary: s.summary,
            usage: Usage::default(),
            model: s.model.to_string(),
        }
    }
}

/// Local TextRank summarizer. Infallible and free of network access.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    default_language: ResourceLanguage,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self {
            default_language: ResourceLanguage::Spanish,
        }
    }
}

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Language used for `auto` requests (default Spanish).
    pub fn default_language(mut self, language: ResourceLanguage) -> Self {
        self.default_language = language;
        self
    }

    /// Summarize with a sentence count derived from the text.
    pub fn summarize(&self, text: &str, language: Language) -> ExtractiveSummary {
        self.summarize_sentences(text, language, target_sentence_count(text))
    }

    /// Summarize keeping at most `count` sentences.
    pub fn summarize_sentences(
        &self,
        text: &str,
        language: Language,
        count: usize,
    ) -> ExtractiveSummary {
        let resources = ResourceLanguage::from_tag(language, self.default_language);
        debug!(
            language = resources.name(),
            sentences = count,
            text_length = text.chars().count(),
            "running extractive summarization"
        );

        match rank_sentences(text, resources, count) {
            Some(result) => {
                info!(
                    sentences_used = result.sentences_used,
                    summary_length = result.summary.chars().count(),
                    "extractive summary generated"
                );
                result
            }
            None => {
                warn!(
                    language = resources.name(),
                    "TextRank produced no output, using leading sentences"
                );
                simple_extract(text)
            }
        }
    }
}

fn rank_sentences(
    text: &str,
    language: ResourceLanguage,
    count: usize,
) -> Option<ExtractiveSummary> {
    let sentences = textrank::split_sentences(text);
    if sentences.is_empty() || count == 0 {
        return None;
    }
    let stop_words = stopwords::for_language(language);
    let words: Vec<Vec<String>> = sentences
        .iter()
        .map(|s| textrank::content_words(s, stop_words))
        .collect();
    let scores = textrank::rank(&words)?;
    let picked = textrank::best_indices(&scores, count);
    let summary = picked
        .iter()
        .map(|&i| sentences[i])
        .collect::<Vec<_>>()
        .join(" ");
    if summary.is_empty() {
        return None;
    }
    Some(ExtractiveSummary {
        summary,
        model: TEXTRANK_MODEL,
        sentences_used: picked.len(),
    })
}

/// First three `.`-separated fragments, rejoined with `". "` and closed
/// with a period. Blank input yields an empty summary.
fn simple_extract(text: &str) -> ExtractiveSummary {
    let fragments: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(SIMPLE_FRAGMENTS)
        .collect();
    let summary = if fragments.is_empty() {
        String::new()
    } else {
        format!("{}.", fragments.join(". "))
    };
    ExtractiveSummary {
        summary,
        model: SIMPLE_MODEL,
        sentences_used: fragments.len(),
    }
}

/// Number of sentences to keep, from the count of `.`, `!` and `?` in
/// the text.
///
/// | terminators | sentences        |
/// |-------------|------------------|
/// | 0..=5       | `max(1, s / 2)`  |
/// | 6..=20      | `max(2, s / 3)`  |
/// | 21..        | `max(3, s / 4)`  |
pub fn target_sentence_count(text: &str) -> usize {
    let s = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
    if s <= 5 {
        (s / 2).max(1)
    } else if s <= 20 {
        (s / 3).max(2)
    } else {
        (s / 4).max(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_count_policy() {
        assert_eq!(target_sentence_count(""), 1);
        assert_eq!(target_sentence_count("a. b."), 1);
        assert_eq!(target_sentence_count("a. b. c. d. e."), 2);
        assert_eq!(target_sentence_count(&"x. ".repeat(6)), 2);
        assert_eq!(target_sentence_count(&"x. ".repeat(12)), 4);
        assert_eq!(target_sentence_count(&"x. ".repeat(20)), 6);
        assert_eq!(target_sentence_count(&"x. ".repeat(21)), 5);
        assert_eq!(target_sentence_count(&"x! ".repeat(40)), 10);
    }

    #[test]
    fn language_mapping() {
        let d = ResourceLanguage::Spanish;
        assert_eq!(ResourceLanguage::from_tag(Language::Es, d).name(), "spanish");
        assert_eq!(ResourceLanguage::from_tag(Language::En, d).name(), "english");
        assert_eq!(ResourceLanguage::from_tag(Language::Fr, d).name(), "french");
        assert_eq!(ResourceLanguage::from_tag(Language::De, d).name(), "german");
        assert_eq!(ResourceLanguage::from_tag(Language::It, d).name(), "italian");
        assert_eq!(ResourceLanguage::from_tag(Language::Pt, d).name(), "portuguese");
        assert_eq!(ResourceLanguage::from_tag(Language::Auto, d).name(), "spanish");
        assert_eq!(
            ResourceLanguage::from_tag(Language::Auto, ResourceLanguage::English),
            ResourceLanguage::English
        );
    }

    #[test]
    fn simple_extract_takes_three_fragments() {
        let out = simple_extract("One. Two.  . Three. Four.");
        assert_eq!(out.summary, "One. Two. Three.");
        assert_eq!(out.model, SIMPLE_MODEL);
        assert_eq!(out.sentences_used, 3);
    }

    #[test]
    fn simple_extract_blank() {
        let out = simple_extract("  ");
        assert_eq!(out.summary, "");
        assert_eq!(out.sentences_used, 0);
    }

    #[test]
    fn empty_text_falls_through_to_empty_summary() {
        let out = ExtractiveSummarizer::new().summarize("", Language::Es);
        assert_eq!(out.summary, "");
        assert_eq!(out.model, SIMPLE_MODEL);
    }

    #[test]
    fn single_sentence_is_returned() {
        let out = ExtractiveSummarizer::new().summarize("Just one sentence here.", Language::En);
        assert_eq!(out.summary, "Just one sentence here.");
        assert_eq!(out.model, TEXTRANK_MODEL);
        assert_eq!(out.sentences_used, 1);
    }

    #[test]
    fn generation_has_zero_usage() {
        let generation: Generation = ExtractiveSummarizer::new()
            .summarize("Alpha beta. Gamma delta.", Language::En)
            .into();
        assert_eq!(generation.usage, Usage::default());
        assert_eq!(generation.model, TEXTRANK_MODEL);
    }
}
