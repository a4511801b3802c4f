//! Stop-word tables for the supported languages.
//!
//! Built once on first use and read-only afterwards.

use std::collections::HashSet;
use std::sync::LazyLock;

use super::ResourceLanguage;

const SPANISH: &[&str] = &[
    "a", "al", "algo", "ante", "antes", "como", "con", "contra", "cual", "cuando", "de", "del",
    "desde", "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en", "entre", "era",
    "es", "esa", "ese", "eso", "esta", "este", "esto", "están", "fue", "ha", "han", "hasta",
    "hay", "la", "las", "le", "les", "lo", "los", "más", "me", "mi", "muy", "nada", "ni", "no",
    "nos", "o", "otra", "otro", "para", "pero", "por", "porque", "que", "qué", "se", "ser",
    "si", "sin", "sobre", "son", "su", "sus", "también", "te", "tiene", "todo", "tu", "un",
    "una", "uno", "unos", "y", "ya", "yo",
];

const ENGLISH: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does",
    "for", "from", "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "more", "most", "no", "not", "of", "on", "or", "other", "our", "out",
    "she", "so", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "to", "up", "was", "we", "were", "what", "when",
    "which", "while", "who", "will", "with", "would", "you", "your",
];

const FRENCH: &[&str] = &[
    "à", "au", "aux", "avec", "ce", "ces", "cette", "dans", "de", "des", "du", "elle", "en",
    "est", "et", "eux", "il", "ils", "je", "la", "le", "les", "leur", "lui", "mais", "me",
    "même", "mes", "moi", "mon", "ne", "nos", "notre", "nous", "on", "ou", "par", "pas",
    "pour", "qu", "que", "qui", "sa", "se", "ses", "son", "sont", "sur", "ta", "te", "tes",
    "toi", "ton", "tu", "un", "une", "vos", "votre", "vous", "y", "été", "être",
];

const GERMAN: &[&str] = &[
    "aber", "als", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis", "das", "dass",
    "dem", "den", "der", "des", "die", "doch", "du", "ein", "eine", "einem", "einen", "einer",
    "er", "es", "für", "hat", "hatte", "ich", "ihr", "im", "in", "ist", "ja", "kann", "mit",
    "nach", "nicht", "noch", "nur", "oder", "sich", "sie", "sind", "so", "um", "und", "uns",
    "von", "vor", "war", "was", "wie", "wir", "wird", "zu", "zum", "zur", "über",
];

const ITALIAN: &[&str] = &[
    "a", "ad", "al", "alla", "alle", "anche", "che", "chi", "ci", "come", "con", "da", "dal",
    "dalla", "de", "del", "della", "delle", "di", "e", "è", "gli", "ha", "hanno", "i", "il",
    "in", "io", "la", "le", "lei", "lo", "loro", "lui", "ma", "mi", "ne", "nel", "nella",
    "non", "o", "per", "più", "se", "si", "sono", "su", "sua", "suo", "tra", "un", "una",
    "uno",
];

const PORTUGUESE: &[&str] = &[
    "a", "ao", "aos", "as", "com", "como", "da", "das", "de", "do", "dos", "e", "é", "ela",
    "ele", "eles", "em", "entre", "era", "essa", "esse", "esta", "este", "eu", "foi", "há",
    "isso", "já", "lhe", "mais", "mas", "me", "muito", "na", "nas", "no", "nos", "não", "o",
    "os", "ou", "para", "pela", "pelo", "por", "que", "se", "sem", "seu", "sua", "são",
    "também", "um", "uma", "à",
];

static TABLES: LazyLock<[HashSet<&'static str>; 6]> = LazyLock::new(|| {
    [SPANISH, ENGLISH, FRENCH, GERMAN, ITALIAN, PORTUGUESE]
        .map(|words| words.iter().copied().collect())
});

/// Stop words for a language.
pub(crate) fn for_language(language: ResourceLanguage) -> &'static HashSet<&'static str> {
    let idx = match language {
        ResourceLanguage::Spanish => 0,
        ResourceLanguage::English => 1,
        ResourceLanguage::French => 2,
        ResourceLanguage::German => 3,
        ResourceLanguage::Italian => 4,
        ResourceLanguage::Portuguese => 5,
    };
    &TABLES[idx]
}
