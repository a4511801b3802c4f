//! Summarization request types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PrecisError, Result};

/// Smallest accepted `max_output_tokens`.
pub const MIN_OUTPUT_TOKENS: u32 = 10;
/// Largest accepted `max_output_tokens`.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
/// `max_output_tokens` used when the caller omits it.
pub const DEFAULT_OUTPUT_TOKENS: u32 = 100;
/// Default ceiling on input length, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 50_000;

/// Language tag of the text to summarize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Let the model detect the language.
    #[default]
    Auto,
    Es,
    En,
    Fr,
    De,
    It,
    Pt,
}

impl Language {
    /// Every supported tag, in the order they are documented.
    pub const ALL: [Language; 7] = [
        Language::Auto,
        Language::Es,
        Language::En,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
    ];

    /// Short tag as used on the wire and in cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::Es => "es",
            Language::En => "en",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = PrecisError;

    /// Case-insensitive parse of a short tag.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| {
                PrecisError::InvalidInput(format!(
                    "unsupported language '{s}', expected one of: auto, es, en, fr, de, it, pt"
                ))
            })
    }
}

/// Style of the produced summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Concise,
    Bullet,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Neutral, Tone::Concise, Tone::Bullet];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Concise => "concise",
            Tone::Bullet => "bullet",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = PrecisError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == lower)
            .ok_or_else(|| {
                PrecisError::InvalidInput(format!(
                    "unsupported tone '{s}', expected one of: neutral, concise, bullet"
                ))
            })
    }
}

/// Input to the summarization pipeline.
///
/// Built once at the boundary and only ever read afterwards. Use
/// [`validate`](Self::validate) before handing it to the pipeline.
///
/// ```rust
/// # use precis::{Language, SummaryRequest, Tone};
/// let request = SummaryRequest::new("Some long text. With sentences.")
///     .language(Language::En)
///     .max_output_tokens(150)
///     .tone(Tone::Concise);
/// assert!(request.validate(50_000).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub tone: Tone,
}

fn default_output_tokens() -> u32 {
    DEFAULT_OUTPUT_TOKENS
}

impl SummaryRequest {
    /// Create a request with default language, token budget and tone.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: Language::default(),
            max_output_tokens: DEFAULT_OUTPUT_TOKENS,
            tone: Tone::default(),
        }
    }

    /// Set the language tag.
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the output token budget.
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Set the tone.
    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Check the boundary invariants: non-blank text no longer than
    /// `max_text_length` characters and a token budget within
    /// [`MIN_OUTPUT_TOKENS`]..=[`MAX_OUTPUT_TOKENS`].
    pub fn validate(&self, max_text_length: usize) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(PrecisError::InvalidInput("text must not be empty".into()));
        }
        let chars = self.text.chars().count();
        if chars > max_text_length {
            return Err(PrecisError::InvalidInput(format!(
                "text is {chars} characters long, maximum is {max_text_length}"
            )));
        }
        if !(MIN_OUTPUT_TOKENS..=MAX_OUTPUT_TOKENS).contains(&self.max_output_tokens) {
            return Err(PrecisError::InvalidInput(format!(
                "max_output_tokens must be between {MIN_OUTPUT_TOKENS} and {MAX_OUTPUT_TOKENS}, got {}",
                self.max_output_tokens
            )));
        }
        Ok(())
    }
}
