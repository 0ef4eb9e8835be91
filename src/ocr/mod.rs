//! Text recognition.
//!
//! This module provides:
//! - `DetectionCandidate`, the typed OCR result the detector consumes
//! - The `TextRecognizer` trait the monitor loop recognizes through
//! - A Tesseract CLI implementation (`TesseractEngine`)
//! - Image preprocessing to improve recognition of the large death text

pub mod engine;
pub mod preprocess;

pub use engine::TesseractEngine;
pub use preprocess::enhance_for_ocr;

use anyhow::Result;

use crate::capture::Frame;

/// One piece of text the OCR engine found, with its self-reported
/// confidence in [0, 1]. Produced fresh per scan, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    pub text: String,
    pub confidence: f32,
}

impl DetectionCandidate {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Turns a captured frame into text candidates.
///
/// The monitor loop only talks to this trait, so tests can script
/// recognition results without an OCR binary installed.
pub trait TextRecognizer {
    fn recognize(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>>;
}
