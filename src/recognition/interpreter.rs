use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keywords are matched after normalisation (katakana folded to hiragana,
/// full-width ASCII folded to ASCII, lowercased).
const AFFIRMATIVE: &[&str] = &["まる", "丸", "○", "〇", "maru"];
const NEGATIVE: &[&str] = &["ばつ", "ぺけ", "×", "✕", "batsu"];

/// Resolved answer carried by an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Affirmative,
    Negative,
    Unrecognized,
}

impl Intent {
    /// The quiz answer this intent stands for, if any
    pub fn answer(self) -> Option<bool> {
        match self {
            Intent::Affirmative => Some(true),
            Intent::Negative => Some(false),
            Intent::Unrecognized => None,
        }
    }
}

/// A single final recognition result
#[derive(Debug, Clone)]
pub struct Utterance {
    pub raw_text: String,
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn intent(&self) -> Intent {
        classify(&self.raw_text)
    }
}

/// Classify recognized text. Affirmative keywords are checked first.
pub fn classify(text: &str) -> Intent {
    let normalized = normalize(text);

    if AFFIRMATIVE.iter().any(|k| normalized.contains(k)) {
        Intent::Affirmative
    } else if NEGATIVE.iter().any(|k| normalized.contains(k)) {
        Intent::Negative
    } else {
        Intent::Unrecognized
    }
}

fn normalize(text: &str) -> String {
    text.chars().map(fold_char).collect::<String>().to_lowercase()
}

fn fold_char(c: char) -> char {
    match c {
        // Katakana ァ..ヶ -> hiragana ぁ..ゖ
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        // Full-width ASCII ！..～ -> ASCII
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        _ => c,
    }
}
