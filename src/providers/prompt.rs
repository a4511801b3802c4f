//! System prompt templates.

use crate::types::{Language, Tone};

/// Instruction text used by connectivity probes.
pub const PROBE_INSTRUCTIONS: &str = "You are a helpful assistant.";
/// Input text used by connectivity probes.
pub const PROBE_INPUT: &str = "test";

fn language_name(language: Language) -> &'static str {
    match language {
        Language::Es => "español",
        Language::En => "inglés",
        Language::Fr => "francés",
        Language::De => "alemán",
        Language::It => "italiano",
        Language::Pt => "portugués",
        Language::Auto => "el idioma detectado",
    }
}

fn tone_description(tone: Tone) -> &'static str {
    match tone {
        Tone::Neutral => "un tono neutral y objetivo",
        Tone::Concise => "un tono conciso y directo",
        Tone::Bullet => "un formato de viñetas (bullet points)",
    }
}

/// Build the summarization instructions for a language and tone.
pub fn system_prompt(language: Language, tone: Tone) -> String {
    let language = language_name(language);
    let tone = tone_description(tone);
    format!(
        "Eres un asistente especializado en crear resúmenes de texto en {language}.\n\
         \n\
         Instrucciones:\n\
         - Crea un resumen claro y preciso del texto proporcionado\n\
         - Mantén {tone}\n\
         - Conserva la información más importante y relevante\n\
         - El resumen debe ser coherente y bien estructurado\n\
         - Si el texto está en {language}, responde en {language}\n\
         \n\
         Responde únicamente con el resumen, sin explicaciones adicionales."
    )
}
