//! Label verification
//!
//! Cross-checks a detected label against the text printed on the bottle.
//! A fuzzy partial match tolerates OCR noise and surrounding text.

use serde::Serialize;

/// Minimum partial-match score (0-100) for a label to count as verified
pub const VERIFICATION_THRESHOLD: u8 = 90;

/// Characters the detection model uses between words in a label
const LABEL_SEPARATORS: &[char] = &['-', '_'];

/// Result of comparing a label with recognized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    /// Whether the label was found on the bottle
    pub is_verified: bool,
    /// Normalized label that was compared
    pub label: String,
    /// Normalized text that was compared
    pub text: String,
    /// Partial-match score, `None` when scoring was skipped
    pub score: Option<u8>,
}

/// Normalize a detection label for comparison: separators become spaces, lower-cased
pub fn normalize_label(label: &str) -> String {
    label.replace(LABEL_SEPARATORS, " ").to_lowercase()
}

/// Verify that `label` appears in `recognized_text`.
///
/// Empty text (or an empty label) is never verified and is not scored.
pub fn verify(label: &str, recognized_text: &str) -> VerificationOutcome {
    let label = normalize_label(label);
    let text = recognized_text.to_lowercase();

    if text.trim().is_empty() || label.trim().is_empty() {
        return VerificationOutcome {
            is_verified: false,
            label,
            text,
            score: None,
        };
    }

    let score = partial_ratio(&label, &text);

    VerificationOutcome {
        is_verified: score >= VERIFICATION_THRESHOLD,
        label,
        text,
        score: Some(score),
    }
}

/// Best similarity (0-100) between the shorter string and any equally long
/// window of the longer one, using normalized Levenshtein distance.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return 0;
    }

    let needle: String = short.iter().collect();
    let best = long
        .windows(short.len())
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(&needle, &window)
        })
        .fold(0.0f64, f64::max);

    (best * 100.0).round() as u8
}
