//! Tesseract CLI wrapper.
//!
//! Runs the `tesseract` executable with TSV output and groups word rows
//! into line-level candidates with averaged confidence. English and French
//! models are loaded together since the death messages span both.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Luma};
use std::process::Command;
use tempfile::NamedTempFile;

use super::preprocess::enhance_for_ocr;
use super::{DetectionCandidate, TextRecognizer};
use crate::capture::Frame;

/// Languages passed to tesseract. Both must be installed (`eng`, `fra`).
const OCR_LANGUAGES: &str = "eng+fra";

/// OCR engine backed by the Tesseract command-line tool.
pub struct TesseractEngine {
    executable: String,
}

impl TesseractEngine {
    /// Creates an engine using `tesseract` from PATH, or the path in the
    /// `TESSERACT_CMD` environment variable if set.
    pub fn new() -> Self {
        let executable =
            std::env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string());
        Self { executable }
    }

    /// Verifies that the tesseract executable can be invoked.
    pub fn check_available(&self) -> Result<()> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .output()
            .map_err(|e| anyhow!("failed to run {}: {}", self.executable, e))?;
        if !output.status.success() {
            return Err(anyhow!("{} --version exited with {}", self.executable, output.status));
        }
        Ok(())
    }

    /// Runs tesseract on a grayscale image and parses the TSV output.
    fn recognize_gray(&self, img: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Result<Vec<DetectionCandidate>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Tesseract appends .tsv to the output base path
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("-l")
            .arg(OCR_LANGUAGES)
            .arg("--psm")
            .arg("6") // Assume single uniform block of text
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;

        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_output(&tsv_content))
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractEngine {
    /// Recognizes text in a captured frame.
    ///
    /// The frame is preprocessed first; if that yields nothing, the raw
    /// frame is tried as a fallback since aggressive preprocessing can
    /// occasionally erase thin glyphs.
    fn recognize(&self, frame: &Frame) -> Result<Vec<DetectionCandidate>> {
        let enhanced = enhance_for_ocr(frame);
        let candidates = self.recognize_gray(&enhanced)?;
        if !candidates.is_empty() {
            return Ok(candidates);
        }

        let gray = image::imageops::grayscale(frame);
        self.recognize_gray(&gray)
    }
}

/// Parses Tesseract TSV output into line-level candidates.
///
/// TSV fields: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Level 5 rows are words; words
/// sharing (block, par, line) are joined with spaces and their confidences
/// (0-100) averaged and scaled to [0, 1].
fn parse_tsv_output(tsv: &str) -> Vec<DetectionCandidate> {
    let mut candidates: Vec<DetectionCandidate> = Vec::new();
    let mut current_key: Option<(i32, i32, i32)> = None;
    let mut current_words: Vec<String> = Vec::new();
    let mut current_conf_sum: f32 = 0.0;

    let mut flush = |words: &mut Vec<String>, conf_sum: &mut f32, out: &mut Vec<DetectionCandidate>| {
        if !words.is_empty() {
            let confidence = (*conf_sum / words.len() as f32 / 100.0).clamp(0.0, 1.0);
            out.push(DetectionCandidate::new(words.join(" "), confidence));
            words.clear();
            *conf_sum = 0.0;
        }
    };

    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let block: i32 = fields[2].parse().unwrap_or(-1);
        let par: i32 = fields[3].parse().unwrap_or(-1);
        let line_num: i32 = fields[4].parse().unwrap_or(-1);
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (block, par, line_num);
        if current_key != Some(key) {
            flush(&mut current_words, &mut current_conf_sum, &mut candidates);
            current_key = Some(key);
        }

        current_words.push(text.to_string());
        current_conf_sum += conf;
    }

    flush(&mut current_words, &mut current_conf_sum, &mut candidates);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV_HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn word_row(block: i32, par: i32, line: i32, word: i32, conf: f32, text: &str) -> String {
        format!("5\t1\t{}\t{}\t{}\t{}\t0\t0\t10\t10\t{}\t{}", block, par, line, word, conf, text)
    }

    #[test]
    fn test_parse_joins_words_on_one_line() {
        let tsv = format!(
            "{}\n{}\n{}",
            TSV_HEADER,
            word_row(1, 1, 1, 1, 90.0, "YOU"),
            word_row(1, 1, 1, 2, 80.0, "DIED"),
        );
        let candidates = parse_tsv_output(&tsv);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "YOU DIED");
        assert!((candidates[0].confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_parse_splits_lines() {
        let tsv = format!(
            "{}\n{}\n{}",
            TSV_HEADER,
            word_row(1, 1, 1, 1, 90.0, "YOU"),
            word_row(1, 1, 2, 1, 50.0, "DIED"),
        );
        let candidates = parse_tsv_output(&tsv);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "YOU");
        assert_eq!(candidates[1].text, "DIED");
    }

    #[test]
    fn test_parse_skips_non_word_rows_and_negative_conf() {
        let tsv = format!(
            "{}\n4\t1\t1\t1\t1\t0\t0\t0\t10\t10\t-1\t\n{}",
            TSV_HEADER,
            word_row(1, 1, 1, 1, -1.0, "noise"),
        );
        assert!(parse_tsv_output(&tsv).is_empty());
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_tsv_output(TSV_HEADER).is_empty());
        assert!(parse_tsv_output("").is_empty());
    }
}
