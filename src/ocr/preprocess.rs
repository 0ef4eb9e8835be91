//! Image preprocessing for OCR.
//!
//! Death messages are large light-on-dark text, but compression artifacts
//! and background detail confuse the recognizer. Grayscale conversion plus
//! a contrast boost and a light sharpen make the glyph edges much cleaner.

use image::imageops;
use image::{ImageBuffer, Luma};

use crate::capture::Frame;

/// Enhances a captured frame for text recognition.
///
/// Grayscale, then contrast boost, then unsharp mask.
pub fn enhance_for_ocr(frame: &Frame) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let gray = imageops::grayscale(frame);
    let boosted = imageops::contrast(&gray, 30.0);
    imageops::unsharpen(&boosted, 1.2, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_enhance_preserves_dimensions() {
        let frame: Frame = ImageBuffer::from_pixel(64, 16, Rgba([120, 120, 120, 255]));
        let enhanced = enhance_for_ocr(&frame);
        assert_eq!(enhanced.dimensions(), (64, 16));
    }

    #[test]
    fn test_enhance_spreads_contrast() {
        // Dark background with a bright band, like a death message
        let frame: Frame = ImageBuffer::from_fn(32, 8, |x, _| {
            if (8..24).contains(&x) {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([60, 60, 60, 255])
            }
        });

        let enhanced = enhance_for_ocr(&frame);
        let bright = enhanced.get_pixel(16, 4)[0];
        let dark = enhanced.get_pixel(0, 4)[0];
        assert!(
            bright as i32 - dark as i32 > 140,
            "contrast boost should widen the gap (bright={}, dark={})",
            bright,
            dark
        );
    }
}
