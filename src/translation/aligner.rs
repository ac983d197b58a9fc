/*!
 * Response alignment.
 *
 * Maps the lines of a numbered-list reply back to the row ids that produced
 * the prompt. Matching is purely positional: the n-th line belongs to the
 * n-th id. There is no content check, so a reply that reorders or merges
 * lines maps every later line to the wrong row.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::database::{RowId, TranslatedRow};

static NUMBER_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.(\s+|$)").expect("number marker regex is valid"));

/// Number of trailing reply lines kept for diagnostics on a partial reply
pub const DIAGNOSTIC_TAIL_LEN: usize = 3;

/// What can be salvaged from one reply
#[derive(Debug, Clone, PartialEq)]
pub enum AlignedResult {
    /// One line per id; every pair is trusted
    Full { pairs: Vec<TranslatedRow> },
    /// Line count differs; the last line is dropped and the prefix trusted
    Partial {
        pairs: Vec<TranslatedRow>,
        diagnostic_tail: Vec<String>,
    },
    /// Nothing usable
    Discarded,
}

impl AlignedResult {
    /// Pairs to persist, if any
    pub fn pairs(&self) -> &[TranslatedRow] {
        match self {
            Self::Full { pairs } | Self::Partial { pairs, .. } => pairs,
            Self::Discarded => &[],
        }
    }

    pub fn into_pairs(self) -> Vec<TranslatedRow> {
        match self {
            Self::Full { pairs } | Self::Partial { pairs, .. } => pairs,
            Self::Discarded => Vec::new(),
        }
    }
}

/// Split a reply into candidate translations
///
/// Blank lines are skipped; a leading `<digits>.` marker followed by
/// whitespace is removed from each remaining line, so `2.5 kg` stays
/// intact. A bare marker yields an empty translation. Order is preserved.
pub fn parse_numbered_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| NUMBER_MARKER_RE.replace(line, "").trim().to_string())
        .collect()
}

/// Align a raw reply with the ids of the batch, in prompt order
///
/// With `M` parsed lines and `N` ids:
/// - `M == N`: every line is paired with its id.
/// - `M != N`, `M > 1`: the first `M - 1` lines are paired (as far as there
///   are ids), the final line is presumed corrupt and dropped.
/// - `M <= 1` without an exact match: nothing is kept.
pub fn align(raw: &str, expected_ids: &[RowId]) -> AlignedResult {
    let translations = parse_numbered_lines(raw);
    let m = translations.len();

    if m == expected_ids.len() && m > 0 {
        return AlignedResult::Full {
            pairs: zip_pairs(expected_ids, &translations),
        };
    }

    if m <= 1 {
        return AlignedResult::Discarded;
    }

    let diagnostic_tail = translations[m.saturating_sub(DIAGNOSTIC_TAIL_LEN)..].to_vec();
    AlignedResult::Partial {
        pairs: zip_pairs(expected_ids, &translations[..m - 1]),
        diagnostic_tail,
    }
}

fn zip_pairs(ids: &[RowId], translations: &[String]) -> Vec<TranslatedRow> {
    ids.iter()
        .zip(translations)
        .map(|(id, text)| TranslatedRow {
            id: id.clone(),
            target_text: text.clone(),
        })
        .collect()
}
