use std::time::Duration;

use super::diagnostics::{DiagnosticsSink, FrameDiagnostics};
use super::rendering::{GridRenderer, RenderError};

pub const DEFAULT_RESIZE_SAMPLE_INTERVAL: u64 = 10;
pub const DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL: u64 = 20;

/// "Every Nth frame" cadence keyed on the loop's frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInterval {
    every: u64,
}

impl SampleInterval {
    /// Zero is treated as one (sample every frame).
    pub fn every(frames: u64) -> Self {
        Self {
            every: frames.max(1),
        }
    }

    pub fn frames(&self) -> u64 {
        self.every
    }

    pub fn is_due(&self, frame_count: u64) -> bool {
        frame_count % self.every == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResizeSampler {
    interval: SampleInterval,
}

impl Default for ResizeSampler {
    fn default() -> Self {
        Self::new(SampleInterval::every(DEFAULT_RESIZE_SAMPLE_INTERVAL))
    }
}

impl ResizeSampler {
    pub fn new(interval: SampleInterval) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    /// Queries the display surface on due frames only; other frames report no
    /// resize without touching the renderer.
    pub fn sample<R: GridRenderer + ?Sized>(
        &self,
        frame_count: u64,
        renderer: &mut R,
    ) -> Result<bool, RenderError> {
        if !self.interval.is_due(frame_count) {
            return Ok(false);
        }
        renderer.resize_to_display_size()
    }
}

pub struct DiagnosticsSampler {
    interval: SampleInterval,
    sink: Box<dyn DiagnosticsSink>,
}

impl DiagnosticsSampler {
    pub fn new(interval: SampleInterval, sink: Box<dyn DiagnosticsSink>) -> Self {
        Self { interval, sink }
    }

    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    pub fn is_due(&self, frame_count: u64) -> bool {
        self.interval.is_due(frame_count)
    }

    pub fn into_sink(self) -> Box<dyn DiagnosticsSink> {
        self.sink
    }

    /// Publishes `elapsed` if `frame_count` is due. Returns whether it did.
    pub fn maybe_publish(&mut self, frame_count: u64, elapsed: Duration) -> bool {
        if !self.is_due(frame_count) {
            return false;
        }
        self.sink.publish(&FrameDiagnostics::from_elapsed(elapsed));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::super::rendering::{ColorTable, VirtualScreenSize};
    use super::*;

    #[test]
    fn resize_and_diagnostics_moduli_are_independent() {
        let resize = SampleInterval::every(DEFAULT_RESIZE_SAMPLE_INTERVAL);
        let diagnostics = SampleInterval::every(DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL);

        assert!(resize.is_due(0) && diagnostics.is_due(0));
        assert!(resize.is_due(10) && !diagnostics.is_due(10));
        assert!(resize.is_due(20) && diagnostics.is_due(20));
        assert!(!resize.is_due(15) && !diagnostics.is_due(15));
    }

    #[test]
    fn zero_interval_samples_every_frame() {
        let interval = SampleInterval::every(0);
        assert_eq!(interval.frames(), 1);
        assert!((0..5).all(|frame| interval.is_due(frame)));
    }

    #[derive(Default)]
    struct SurfaceCounter {
        queries: u32,
    }

    impl GridRenderer for SurfaceCounter {
        fn update_with_color_data(
            &mut self,
            _table: ColorTable,
            _cols: u32,
            _rows: u32,
            _cells: &[u8],
        ) -> Result<(), RenderError> {
            Ok(())
        }

        fn update_with_char_data(
            &mut self,
            _cols: u32,
            _rows: u32,
            _cells: &[u8],
        ) -> Result<(), RenderError> {
            Ok(())
        }

        fn render(
            &mut self,
            _size: VirtualScreenSize,
            _rows: u32,
            _cols: u32,
        ) -> Result<(), RenderError> {
            Ok(())
        }

        fn finish(&mut self) -> Result<(), RenderError> {
            Ok(())
        }

        fn resize_to_display_size(&mut self) -> Result<bool, RenderError> {
            self.queries += 1;
            Ok(true)
        }
    }

    #[test]
    fn resize_sampler_only_queries_surface_on_due_frames() {
        let sampler = ResizeSampler::default();
        let mut surface = SurfaceCounter::default();

        let resized = (0..25)
            .map(|frame| sampler.sample(frame, &mut surface).expect("sample"))
            .collect::<Vec<_>>();

        assert_eq!(surface.queries, 3);
        assert!(resized[0] && resized[10] && resized[20]);
        assert!(!resized[1] && !resized[19]);
    }

    struct SharedSink(Rc<RefCell<Vec<FrameDiagnostics>>>);

    impl DiagnosticsSink for SharedSink {
        fn publish(&mut self, record: &FrameDiagnostics) {
            self.0.borrow_mut().push(record.clone());
        }
    }

    #[test]
    fn diagnostics_sampler_publishes_on_due_frames_only() {
        let published = Rc::new(RefCell::new(Vec::new()));
        let mut sampler = DiagnosticsSampler::new(
            SampleInterval::every(DEFAULT_DIAGNOSTICS_SAMPLE_INTERVAL),
            Box::new(SharedSink(Rc::clone(&published))),
        );

        assert!(sampler.maybe_publish(0, Duration::from_millis(3)));
        assert!(!sampler.maybe_publish(10, Duration::from_millis(4)));
        assert!(sampler.maybe_publish(40, Duration::from_micros(5_600)));

        let records = published.borrow();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time, "3ms");
        assert_eq!(records[1].time, "6ms");
    }
}
