//! Death message detection.
//!
//! Takes OCR candidates and decides whether a FromSoftware death message
//! is on screen. Candidates are filtered by confidence, normalized (accents
//! stripped, uppercased, whitespace collapsed), then checked exactly against
//! the full catalog and fuzzily against the primary messages.

use strsim::normalized_levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::ocr::DetectionCandidate;

/// Language a death message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    French,
    English,
}

/// One known death message.
#[derive(Clone, Copy, Debug)]
pub struct DeathMessage {
    pub text: &'static str,
    pub language: Language,
    /// Primary messages are also checked with fuzzy matching; the rest are
    /// known OCR misreads only checked for exact containment.
    pub primary: bool,
}

/// Known death messages across FromSoftware games, in catalog order.
/// Accented French entries are listed alongside their stripped forms so the
/// catalog reads the way the messages actually appear in game.
pub const DEATH_MESSAGES: &[DeathMessage] = &[
    // French - Dark Souls series
    DeathMessage { text: "VOUS ETES MORT", language: Language::French, primary: true },
    DeathMessage { text: "VOUS ÊTES MORT", language: Language::French, primary: false },
    // French - Elden Ring
    DeathMessage { text: "VOUS AVEZ PERI", language: Language::French, primary: true },
    DeathMessage { text: "VOUS AVEZ PÉRI", language: Language::French, primary: false },
    // English - all games
    DeathMessage { text: "YOU DIED", language: Language::English, primary: true },
    // Known OCR misreads (dropped letters, spacing, glyph confusion)
    DeathMessage { text: "VOUS ETE MORT", language: Language::French, primary: false },
    DeathMessage { text: "VOUSAVEZPERI", language: Language::French, primary: false },
    DeathMessage { text: "YOUDIED", language: Language::English, primary: false },
    DeathMessage { text: "YOU DIEU", language: Language::English, primary: false },
];

/// A positive detection, for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathMatch {
    /// Catalog entry that matched
    pub message: String,
    pub language: Language,
    /// Normalized candidate text that triggered the match
    pub candidate: String,
    /// Similarity ratio; 1.0 for exact containment
    pub similarity: f64,
}

/// A catalog entry normalized for comparison.
#[derive(Debug, Clone)]
struct CatalogEntry {
    text: String,
    language: Language,
}

/// Detects death messages in OCR output. No side effects; the catalog is
/// normalized once at construction and immutable for the run.
pub struct DeathDetector {
    /// Normalized full catalog, deduplicated, in catalog order
    catalog: Vec<CatalogEntry>,
    /// Normalized primary messages for the fuzzy pass
    primary: Vec<CatalogEntry>,
    /// Candidates below this OCR confidence are ignored
    min_confidence: f32,
    /// Similarity ratio at or above which a fuzzy comparison matches
    match_threshold: f64,
}

impl DeathDetector {
    pub fn new(min_confidence: f32, match_threshold: f64) -> Self {
        let mut catalog: Vec<CatalogEntry> = Vec::new();
        let mut primary: Vec<CatalogEntry> = Vec::new();

        for msg in DEATH_MESSAGES {
            let normalized = normalize_text(msg.text);
            let entry = CatalogEntry {
                text: normalized,
                language: msg.language,
            };
            if msg.primary && !primary.iter().any(|e| e.text == entry.text) {
                primary.push(entry.clone());
            }
            if !catalog.iter().any(|e| e.text == entry.text) {
                catalog.push(entry);
            }
        }

        Self {
            catalog,
            primary,
            min_confidence,
            match_threshold,
        }
    }

    /// Returns true if any candidate matches a death message.
    pub fn detect(&self, candidates: &[DetectionCandidate]) -> bool {
        self.find_match(candidates).is_some()
    }

    /// Returns the first qualifying match, if any.
    ///
    /// Candidates below the confidence floor are skipped. Each surviving
    /// candidate is first checked for exact containment of a catalog entry,
    /// then compared fuzzily against the primary messages.
    pub fn find_match(&self, candidates: &[DetectionCandidate]) -> Option<DeathMatch> {
        for candidate in candidates {
            if candidate.confidence < self.min_confidence {
                continue;
            }

            let text = normalize_text(&candidate.text);
            if text.is_empty() {
                continue;
            }

            for entry in &self.catalog {
                if text.contains(entry.text.as_str()) {
                    return Some(DeathMatch {
                        message: entry.text.clone(),
                        language: entry.language,
                        candidate: text,
                        similarity: 1.0,
                    });
                }
            }

            for entry in &self.primary {
                let similarity = normalized_levenshtein(&text, &entry.text);
                if similarity >= self.match_threshold {
                    return Some(DeathMatch {
                        message: entry.text.clone(),
                        language: entry.language,
                        candidate: text,
                        similarity,
                    });
                }
            }
        }

        None
    }
}

/// Normalizes text for comparison: NFD decomposition with combining marks
/// stripped (so "PÉRI" matches "PERI"), uppercased, whitespace collapsed.
pub fn normalize_text(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> DeathDetector {
        DeathDetector::new(0.4, 0.85)
    }

    fn candidate(text: &str, confidence: f32) -> DetectionCandidate {
        DetectionCandidate::new(text, confidence)
    }

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize_text("VOUS ÊTES MORT"), "VOUS ETES MORT");
        assert_eq!(normalize_text("Vous avez péri"), "VOUS AVEZ PERI");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  YOU   DIED \t"), "YOU DIED");
    }

    #[test]
    fn test_empty_candidates_no_match() {
        assert!(!detector().detect(&[]));
    }

    #[test]
    fn test_exact_match() {
        assert!(detector().detect(&[candidate("YOU DIED", 0.9)]));
    }

    #[test]
    fn test_accented_french_matches() {
        assert!(detector().detect(&[candidate("VOUS ÊTES MORT", 0.9)]));
        assert!(detector().detect(&[candidate("VOUS AVEZ PÉRI", 0.9)]));
    }

    #[test]
    fn test_containment_within_longer_text() {
        assert!(detector().detect(&[candidate("some noise YOU DIED more noise", 0.9)]));
    }

    #[test]
    fn test_low_confidence_is_ignored() {
        let d = detector();
        for conf in [0.0, 0.1, 0.39] {
            assert!(!d.detect(&[candidate("YOU DIED", conf)]), "conf {}", conf);
        }
        // Boundary: exactly at the floor still counts
        assert!(d.detect(&[candidate("YOU DIED", 0.4)]));
    }

    #[test]
    fn test_ocr_noise_fuzzy_match() {
        // One substitution in 8 chars: ratio 1 - 1/8 = 0.875
        let ratio = strsim::normalized_levenshtein("Y0U DIED", "YOU DIED");
        assert!((ratio - 0.875).abs() < 1e-9);

        assert!(DeathDetector::new(0.4, 0.85).detect(&[candidate("Y0U DIED", 0.9)]));
        assert!(!DeathDetector::new(0.4, 0.9).detect(&[candidate("Y0U DIED", 0.9)]));
    }

    #[test]
    fn test_known_misreads_match_exactly() {
        let d = detector();
        assert!(d.detect(&[candidate("YOUDIED", 0.9)]));
        assert!(d.detect(&[candidate("YOU DIEU", 0.9)]));
        assert!(d.detect(&[candidate("VOUSAVEZPERI", 0.9)]));
    }

    #[test]
    fn test_unrelated_text_no_match() {
        let d = detector();
        assert!(!d.detect(&[candidate("BONFIRE LIT", 0.95)]));
        assert!(!d.detect(&[candidate("ENEMY FELLED", 0.95)]));
    }

    #[test]
    fn test_first_qualifying_candidate_wins() {
        let matched = detector()
            .find_match(&[
                candidate("garbage", 0.9),
                candidate("YOU DIED", 0.9),
                candidate("VOUS ETES MORT", 0.9),
            ])
            .unwrap();
        assert_eq!(matched.message, "YOU DIED");
        assert_eq!(matched.similarity, 1.0);
    }

    #[test]
    fn test_catalog_has_no_normalized_duplicates() {
        let d = detector();
        let mut seen: Vec<&str> = d.catalog.iter().map(|e| e.text.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), d.catalog.len());
    }

    #[test]
    fn test_match_carries_language() {
        let d = detector();
        let en = d.find_match(&[candidate("YOU DIED", 0.9)]).unwrap();
        assert_eq!(en.language, Language::English);
        let fr = d.find_match(&[candidate("VOUS AVEZ PÉRI", 0.9)]).unwrap();
        assert_eq!(fr.language, Language::French);
    }
}
