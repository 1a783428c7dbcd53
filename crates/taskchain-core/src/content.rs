//! Content limits and the truncation policy applied before ledger writes.
//!
//! String storage on the ledger is priced per byte, so results above the
//! configured byte limit are truncated deterministically and a marker noting
//! the original size is appended. The marker carries a short summary of the
//! original content so readers of the stored record know what was cut.

use serde::{Deserialize, Serialize};

/// Default maximum character count stored on the ledger.
pub const DEFAULT_MAX_CHARACTERS: usize = 5000;

/// Default maximum byte size stored on the ledger (~10 KB).
pub const DEFAULT_MAX_BYTES: usize = 10240;

/// Characters of the original content quoted in the truncation marker.
const SUMMARY_LENGTH: usize = 100;

/// Configured size bounds for on-ledger content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLimits {
    /// Maximum character count kept when truncating.
    pub max_characters: usize,

    /// Maximum byte size of the stored string.
    pub max_bytes: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_characters: DEFAULT_MAX_CHARACTERS,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Content after the truncation policy has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedContent {
    /// The string to store on the ledger.
    pub content: String,

    /// Whether truncation was applied.
    pub truncated: bool,

    /// Character count of the original content.
    pub original_chars: usize,

    /// Byte size of the original content.
    pub original_bytes: usize,
}

impl PreparedContent {
    /// Byte size of the content as it will be stored.
    pub fn stored_bytes(&self) -> usize {
        self.content.len()
    }

    /// Character count of the content as it will be stored.
    pub fn stored_chars(&self) -> usize {
        self.content.chars().count()
    }
}

impl ContentLimits {
    /// Apply the truncation policy to `content`.
    ///
    /// Content within the byte limit passes through unchanged. Oversized
    /// content is cut at a character boundary within both bounds, preferring
    /// a paragraph or sentence break when one falls late enough in the kept
    /// text, and the truncation marker is appended. The output never exceeds
    /// `max_bytes` and is a pure function of the input.
    pub fn prepare(&self, content: &str) -> PreparedContent {
        let original_bytes = content.len();
        let original_chars = content.chars().count();

        if original_bytes <= self.max_bytes {
            return PreparedContent {
                content: content.to_string(),
                truncated: false,
                original_chars,
                original_bytes,
            };
        }

        let summary: String = content.chars().take(SUMMARY_LENGTH).collect();
        let marker = format!(
            "\n\n[Content truncated to fit ledger storage limits. \
             Original length: {original_chars} characters / {original_bytes} bytes. \
             Summary: {summary}...]"
        );

        // Budget for the kept content once the marker is accounted for.
        let budget = self.max_bytes.saturating_sub(marker.len());

        let mut kept = String::with_capacity(budget);
        for ch in content.chars().take(self.max_characters) {
            if kept.len() + ch.len_utf8() > budget {
                break;
            }
            kept.push(ch);
        }

        // Prefer a natural breakpoint if one lands past 80% of the cut.
        let floor = kept.len() * 4 / 5;
        let breakpoint = [kept.rfind("\n\n"), kept.rfind(". ")]
            .into_iter()
            .flatten()
            .max();
        if let Some(cut) = breakpoint {
            if cut > floor {
                kept.truncate(cut + 1);
            }
        }

        kept.push_str(&marker);
        truncate_to_boundary(&mut kept, self.max_bytes);

        PreparedContent {
            content: kept,
            truncated: true,
            original_chars,
            original_bytes,
        }
    }
}

/// Truncate `s` to at most `max_bytes`, never splitting a character.
fn truncate_to_boundary(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ContentLimits {
        ContentLimits::default()
    }

    #[test]
    fn test_small_content_passes_through() {
        let prepared = limits().prepare("short result");
        assert!(!prepared.truncated);
        assert_eq!(prepared.content, "short result");
        assert_eq!(prepared.original_bytes, 12);
    }

    #[test]
    fn test_oversized_content_fits_byte_limit() {
        let input = "x".repeat(20_000);
        let prepared = limits().prepare(&input);
        assert!(prepared.truncated);
        assert!(prepared.stored_bytes() <= limits().max_bytes);
        assert!(prepared.content.contains("[Content truncated"));
        assert_eq!(prepared.original_chars, 20_000);
        assert_eq!(prepared.original_bytes, 20_000);
    }

    #[test]
    fn test_truncation_is_deterministic() {
        let input = "paragraph one.\n\nparagraph two. ".repeat(800);
        let a = limits().prepare(&input);
        let b = limits().prepare(&input);
        assert_eq!(a, b);
    }

    #[test]
    fn test_character_limit_respected() {
        // All-ASCII input well under the byte budget per character, so the
        // character cap is the binding constraint on the kept text.
        let input = "y".repeat(30_000);
        let prepared = limits().prepare(&input);
        let kept_chars = prepared
            .content
            .split("\n\n[Content truncated")
            .next()
            .unwrap()
            .chars()
            .count();
        assert!(kept_chars <= limits().max_characters);
    }

    #[test]
    fn test_breaks_at_sentence_boundary() {
        let sentence = "This is a complete sentence about ledgers. ";
        let input = sentence.repeat(400);
        let prepared = limits().prepare(&input);
        let kept = prepared.content.split("\n\n[Content truncated").next().unwrap();
        assert!(kept.ends_with('.'), "kept text should end on a sentence");
    }

    #[test]
    fn test_multibyte_content_never_split() {
        let input = "héllo wörld — ünïcode. ".repeat(1000);
        let prepared = limits().prepare(&input);
        assert!(prepared.stored_bytes() <= limits().max_bytes);
        // Would panic on an invalid boundary; also re-check validity.
        assert!(prepared.content.is_char_boundary(prepared.content.len()));
    }
}
