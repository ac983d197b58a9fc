/*!
 * Language utilities for prompt labels.
 *
 * The configuration accepts either an ISO 639 code (`en`, `rus`, `ger`) or a
 * free-text label (`Japanese (kana)`). Codes are turned into English language
 * names before they reach the prompt; anything else is passed through as-is.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Look up a language from an ISO 639-1, 639-2/T or 639-2/B code
pub fn language_from_code(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();

    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let part2t = PART2B_TO_PART2T
                .iter()
                .find(|(b, _)| *b == normalized)
                .map(|(_, t)| *t)
                .unwrap_or(normalized.as_str());
            Language::from_639_3(part2t)
        }
        _ => None,
    }
}

/// Resolve a configured language to the label used in the prompt
pub fn language_label(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Language label must not be empty"));
    }

    Ok(match language_from_code(trimmed) {
        Some(lang) => lang.to_name().to_string(),
        None => trimmed.to_string(),
    })
}
