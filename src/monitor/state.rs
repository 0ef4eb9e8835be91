//! Scan state machine with detection debounce.
//!
//! A death message stays on screen for several seconds, so consecutive
//! scans would keep re-counting it. After a counted detection the loop
//! enters a cooldown that suppresses further positives; the cooldown clears
//! only after two consecutive negative scans, so a single OCR flicker
//! cannot re-arm the counter while the message is still up.

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

use crate::capture::{Frame, FrameSource};
use crate::counter::CounterStore;
use crate::detector::{DeathDetector, DeathMatch};
use crate::monitor::runner::MonitorShared;
use crate::monitor::ScanError;
use crate::ocr::TextRecognizer;
use crate::screen::CaptureZone;

/// Negative scans required before the cooldown clears.
const COOLDOWN_CLEAR_SCANS: u8 = 2;

/// Debounce sub-state while running.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cooldown {
    /// No recent detection; a positive scan will count.
    Idle,
    /// A death was counted and the message may still be on screen.
    Active { consecutive_negatives: u8 },
}

/// State owned exclusively by the monitor loop. The presentation layer
/// only ever sees snapshots published through `MonitorShared`.
#[derive(Debug)]
pub struct MonitorState {
    pub death_count: u64,
    pub last_detection: Option<Instant>,
    cooldown: Cooldown,
    /// Set when a counter write failed; retried at the start of each scan.
    write_pending: bool,
}

/// Result of one scan step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanOutcome {
    /// New death counted; holds the updated total.
    Counted(u64),
    /// Death message still on screen, already counted.
    Suppressed,
    /// Nothing detected.
    Quiet,
    /// Stop was requested while the scan was in flight; result thrown away.
    Discarded,
}

/// Everything one scan needs: capture source, recognizer, detector,
/// counter store, and the debounce state.
pub struct MonitorContext<C: FrameSource, R: TextRecognizer> {
    frames: C,
    recognizer: R,
    detector: DeathDetector,
    counter: CounterStore,
    zone: CaptureZone,
    shared: Arc<MonitorShared>,
    verbose: bool,
    debug: bool,
    state: MonitorState,
}

impl<C: FrameSource, R: TextRecognizer> MonitorContext<C, R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frames: C,
        recognizer: R,
        detector: DeathDetector,
        counter: CounterStore,
        zone: CaptureZone,
        shared: Arc<MonitorShared>,
        verbose: bool,
        debug: bool,
    ) -> Self {
        let death_count = counter.load();
        shared.set_death_count(death_count);

        Self {
            frames,
            recognizer,
            detector,
            counter,
            zone,
            shared,
            verbose,
            debug,
            state: MonitorState {
                death_count,
                last_detection: None,
                cooldown: Cooldown::Idle,
                write_pending: false,
            },
        }
    }

    pub fn death_count(&self) -> u64 {
        self.state.death_count
    }

    /// Runs one scan: capture, recognize, detect, update the debounce
    /// state, and persist on a counted death.
    ///
    /// Capture and recognition errors abort the scan without touching the
    /// state. A persistence error is returned after the in-memory count has
    /// already been updated; the write is retried on later scans.
    pub fn step(&mut self) -> Result<ScanOutcome, ScanError> {
        self.retry_pending_write();

        let frame = self
            .frames
            .capture(&self.zone)
            .map_err(ScanError::Capture)?;
        let candidates = self
            .recognizer
            .recognize(&frame)
            .map_err(ScanError::Recognition)?;

        // stop() may have been requested while capture/recognition was in
        // flight. The scan is allowed to finish but must not mutate state.
        if !self.shared.is_running() {
            return Ok(ScanOutcome::Discarded);
        }

        if self.verbose {
            for c in &candidates {
                crate::log(&format!(
                    "Recognized text: '{}' (confidence {:.2})",
                    c.text, c.confidence
                ));
            }
        }

        match self.detector.find_match(&candidates) {
            Some(matched) => self.handle_detection(matched, &frame),
            None => Ok(self.handle_negative()),
        }
    }

    fn handle_detection(
        &mut self,
        matched: DeathMatch,
        frame: &Frame,
    ) -> Result<ScanOutcome, ScanError> {
        if let Cooldown::Active { .. } = self.state.cooldown {
            // Same on-screen message; reset the clearing count so a flicker
            // followed by the still-visible message keeps the cooldown armed.
            self.state.cooldown = Cooldown::Active {
                consecutive_negatives: 0,
            };
            return Ok(ScanOutcome::Suppressed);
        }

        self.state.death_count += 1;
        if let Some(previous) = self.state.last_detection {
            crate::log(&format!(
                "Time since previous death: {}s",
                previous.elapsed().as_secs()
            ));
        }
        self.state.last_detection = Some(Instant::now());
        self.state.cooldown = Cooldown::Active {
            consecutive_negatives: 0,
        };
        self.shared.set_death_count(self.state.death_count);

        self.shared.event(&format!(
            "Death detected ('{}' ~ '{}', {:?}, similarity {:.2})! Counter: {}",
            matched.candidate,
            matched.message,
            matched.language,
            matched.similarity,
            self.state.death_count
        ));

        if self.debug {
            self.save_debug_screenshot(frame);
        }

        if let Err(e) = self.counter.save(self.state.death_count) {
            self.state.write_pending = true;
            return Err(ScanError::Persistence(e));
        }

        Ok(ScanOutcome::Counted(self.state.death_count))
    }

    fn handle_negative(&mut self) -> ScanOutcome {
        if let Cooldown::Active {
            consecutive_negatives,
        } = self.state.cooldown
        {
            let negatives = consecutive_negatives + 1;
            if negatives >= COOLDOWN_CLEAR_SCANS {
                self.state.cooldown = Cooldown::Idle;
                crate::log("Death message cleared; ready for next detection");
            } else {
                self.state.cooldown = Cooldown::Active {
                    consecutive_negatives: negatives,
                };
            }
        }
        ScanOutcome::Quiet
    }

    /// Retries a failed counter write. In-memory count stays authoritative
    /// until a write succeeds.
    fn retry_pending_write(&mut self) {
        if !self.state.write_pending {
            return;
        }
        match self.counter.save(self.state.death_count) {
            Ok(()) => {
                self.state.write_pending = false;
                crate::log(&format!(
                    "Pending counter write flushed (count {})",
                    self.state.death_count
                ));
            }
            Err(e) => crate::log(&format!("Counter write retry failed: {}", e)),
        }
    }

    fn save_debug_screenshot(&self, frame: &Frame) {
        let timestamp = Local::now().timestamp();
        let path = crate::paths::get_screenshots_dir()
            .join(format!("death_screenshot_{}.png", timestamp));
        match frame.save(&path) {
            Ok(()) => crate::log(&format!("Debug screenshot saved: {}", path.display())),
            Err(e) => crate::log(&format!("Failed to save debug screenshot: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::ImageBuffer;
    use std::cell::RefCell;
    use tempfile::{tempdir, TempDir};

    use crate::ocr::DetectionCandidate;

    /// Frame source that always returns a blank frame, or fails on chosen scans.
    struct FakeFrames {
        calls: usize,
        fail_on: Vec<usize>,
    }

    impl FakeFrames {
        fn new() -> Self {
            Self { calls: 0, fail_on: Vec::new() }
        }

        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self { calls: 0, fail_on }
        }
    }

    impl FrameSource for FakeFrames {
        fn capture(&mut self, _zone: &CaptureZone) -> anyhow::Result<Frame> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&call) {
                return Err(anyhow!("backend gone"));
            }
            Ok(ImageBuffer::new(4, 4))
        }
    }

    /// Recognizer that replays a scripted sequence of candidate lists.
    struct ScriptedRecognizer {
        script: RefCell<Vec<Vec<DetectionCandidate>>>,
    }

    impl ScriptedRecognizer {
        /// `+` means a confident "YOU DIED", `-` means nothing recognized.
        fn from_pattern(pattern: &str) -> Self {
            let script = pattern
                .chars()
                .map(|c| match c {
                    '+' => vec![DetectionCandidate::new("YOU DIED", 0.9)],
                    _ => vec![],
                })
                .rev()
                .collect();
            Self {
                script: RefCell::new(script),
            }
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn recognize(&self, _frame: &Frame) -> anyhow::Result<Vec<DetectionCandidate>> {
            Ok(self.script.borrow_mut().pop().unwrap_or_default())
        }
    }

    fn context(
        pattern: &str,
    ) -> (MonitorContext<FakeFrames, ScriptedRecognizer>, TempDir) {
        let dir = tempdir().unwrap();
        let shared = MonitorShared::new();
        shared.set_running(true);
        let ctx = MonitorContext::new(
            FakeFrames::new(),
            ScriptedRecognizer::from_pattern(pattern),
            DeathDetector::new(0.4, 0.85),
            CounterStore::new(dir.path().join("death_counter.json")),
            CaptureZone { x: 0, y: 0, width: 4, height: 4 },
            shared,
            false,
            false,
        );
        (ctx, dir)
    }

    fn run_steps<C: FrameSource, R: TextRecognizer>(
        ctx: &mut MonitorContext<C, R>,
        n: usize,
    ) -> Vec<ScanOutcome> {
        (0..n).map(|_| ctx.step().unwrap()).collect()
    }

    #[test]
    fn test_single_death_counted_once_while_on_screen() {
        // Message stays on screen for four scans: only the first counts
        let (mut ctx, _dir) = context("++++");
        let outcomes = run_steps(&mut ctx, 4);
        assert_eq!(outcomes[0], ScanOutcome::Counted(1));
        assert_eq!(&outcomes[1..], &[ScanOutcome::Suppressed; 3]);
        assert_eq!(ctx.death_count(), 1);
    }

    #[test]
    fn test_deaths_separated_by_clear_are_each_counted() {
        let (mut ctx, dir) = context("+--+--+");
        let outcomes = run_steps(&mut ctx, 7);
        assert_eq!(outcomes[0], ScanOutcome::Counted(1));
        assert_eq!(outcomes[3], ScanOutcome::Counted(2));
        assert_eq!(outcomes[6], ScanOutcome::Counted(3));
        assert_eq!(ctx.death_count(), 3);

        // Persisted counter converged with memory
        let store = CounterStore::new(dir.path().join("death_counter.json"));
        assert_eq!(store.load(), 3);
    }

    #[test]
    fn test_single_negative_flicker_does_not_rearm() {
        // One negative scan between positives is OCR flicker, not a new death
        let (mut ctx, _dir) = context("+-+");
        let outcomes = run_steps(&mut ctx, 3);
        assert_eq!(
            outcomes,
            vec![
                ScanOutcome::Counted(1),
                ScanOutcome::Quiet,
                ScanOutcome::Suppressed,
            ]
        );
        assert_eq!(ctx.death_count(), 1);
    }

    #[test]
    fn test_two_negatives_clear_cooldown() {
        let (mut ctx, _dir) = context("+--+");
        let outcomes = run_steps(&mut ctx, 4);
        assert_eq!(outcomes[3], ScanOutcome::Counted(2));
    }

    #[test]
    fn test_counter_resumes_from_persisted_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("death_counter.json");
        CounterStore::new(path.clone()).save(5).unwrap();

        let shared = MonitorShared::new();
        shared.set_running(true);
        let mut ctx = MonitorContext::new(
            FakeFrames::new(),
            ScriptedRecognizer::from_pattern("+"),
            DeathDetector::new(0.4, 0.85),
            CounterStore::new(path),
            CaptureZone { x: 0, y: 0, width: 4, height: 4 },
            shared,
            false,
            false,
        );

        assert_eq!(ctx.step().unwrap(), ScanOutcome::Counted(6));
    }

    #[test]
    fn test_capture_failure_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let shared = MonitorShared::new();
        shared.set_running(true);
        let mut ctx = MonitorContext::new(
            FakeFrames::failing_on(vec![0]),
            ScriptedRecognizer::from_pattern("++"),
            DeathDetector::new(0.4, 0.85),
            CounterStore::new(dir.path().join("death_counter.json")),
            CaptureZone { x: 0, y: 0, width: 4, height: 4 },
            shared,
            false,
            false,
        );

        let err = ctx.step().unwrap_err();
        assert!(matches!(err, ScanError::Capture(_)));
        assert_eq!(ctx.death_count(), 0);

        // Loop continues: next scan counts normally
        assert_eq!(ctx.step().unwrap(), ScanOutcome::Counted(1));
    }

    #[test]
    fn test_stop_during_scan_discards_result() {
        let (mut ctx, _dir) = context("+");
        ctx.shared.set_running(false);
        assert_eq!(ctx.step().unwrap(), ScanOutcome::Discarded);
        assert_eq!(ctx.death_count(), 0);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        let dir = tempdir().unwrap();
        // Point the store at a directory so the write fails
        let bad_path = dir.path().join("subdir");
        std::fs::create_dir(&bad_path).unwrap();

        let shared = MonitorShared::new();
        shared.set_running(true);
        let mut ctx = MonitorContext::new(
            FakeFrames::new(),
            ScriptedRecognizer::from_pattern("+"),
            DeathDetector::new(0.4, 0.85),
            CounterStore::new(bad_path),
            CaptureZone { x: 0, y: 0, width: 4, height: 4 },
            shared,
            false,
            false,
        );

        let err = ctx.step().unwrap_err();
        assert!(matches!(err, ScanError::Persistence(_)));
        // Count incremented despite the failed write
        assert_eq!(ctx.death_count(), 1);
    }
}
