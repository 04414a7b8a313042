//! Live telemetry shared between the acquisition path and the plot.
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::protocol::acquisition::Sample;

pub const RPM_TITLE: &str = "RPM";
pub const MOMENT_TITLE: &str = "Moment";
pub const THRUST_TITLE: &str = "Thrust";

/// One completed run: three series that are always drawn together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetryFrame {
    pub rpm: Vec<f64>,
    pub moment: Vec<f64>,
    pub thrust: Vec<f64>,
}

impl TelemetryFrame {
    pub fn new(rpm: Vec<f64>, moment: Vec<f64>, thrust: Vec<f64>) -> Self {
        Self {
            rpm,
            moment,
            thrust,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.rpm.push(sample.rpm);
        self.moment.push(sample.moment);
        self.thrust.push(sample.thrust);
    }

    /// Number of samples pushed; series fed through `new` may differ in length.
    pub fn len(&self) -> usize {
        self.rpm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rpm.is_empty() && self.moment.is_empty() && self.thrust.is_empty()
    }

    pub fn panels(&self) -> [PlotPanel<'_>; 3] {
        [
            PlotPanel {
                title: RPM_TITLE,
                samples: &self.rpm,
            },
            PlotPanel {
                title: MOMENT_TITLE,
                samples: &self.moment,
            },
            PlotPanel {
                title: THRUST_TITLE,
                samples: &self.thrust,
            },
        ]
    }
}

/// What the charting backend receives for one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPanel<'a> {
    pub title: &'static str,
    pub samples: &'a [f64],
}

/// Charting backend hook. Called with all three panels of one frame.
pub trait Renderer {
    fn render(&mut self, panels: &[PlotPanel<'_>]) -> anyhow::Result<()>;
}

/// Holder of the latest frame.
///
/// Updates swap in a whole new frame, so a reader holding a snapshot never
/// sees series from two different updates.
#[derive(Debug, Default)]
pub struct TelemetryBuffer {
    current: RwLock<Arc<TelemetryFrame>>,
}

impl TelemetryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, rpm: Vec<f64>, moment: Vec<f64>, thrust: Vec<f64>) {
        self.replace(TelemetryFrame::new(rpm, moment, thrust));
    }

    pub fn replace(&self, frame: TelemetryFrame) {
        log::debug!("telemetry buffer replaced ({} samples)", frame.len());
        *self.current.write() = Arc::new(frame);
    }

    pub fn snapshot(&self) -> Arc<TelemetryFrame> {
        Arc::clone(&self.current.read())
    }

    pub fn render_to<R: Renderer + ?Sized>(&self, renderer: &mut R) -> anyhow::Result<()> {
        let frame = self.snapshot();
        renderer.render(&frame.panels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Default)]
    struct Recording {
        titles: Vec<&'static str>,
        lengths: Vec<usize>,
    }

    impl Renderer for Recording {
        fn render(&mut self, panels: &[PlotPanel<'_>]) -> anyhow::Result<()> {
            for panel in panels {
                self.titles.push(panel.title);
                self.lengths.push(panel.samples.len());
            }
            Ok(())
        }
    }

    #[test]
    fn empty_buffer_renders_three_empty_panels() {
        let buffer = TelemetryBuffer::new();
        let mut rec = Recording::default();
        buffer.render_to(&mut rec).unwrap();
        assert_eq!(rec.titles, vec!["RPM", "Moment", "Thrust"]);
        assert_eq!(rec.lengths, vec![0, 0, 0]);
    }

    #[test]
    fn update_replaces_instead_of_appending() {
        let buffer = TelemetryBuffer::new();
        buffer.update(vec![1.0, 2.0], vec![0.1, 0.2], vec![5.0, 6.0]);
        buffer.update(vec![3.0], vec![0.3], vec![7.0]);
        let frame = buffer.snapshot();
        assert_eq!(frame.rpm, vec![3.0]);
        assert_eq!(frame.moment, vec![0.3]);
        assert_eq!(frame.thrust, vec![7.0]);
    }

    #[test]
    fn snapshot_outlives_later_updates() {
        let buffer = TelemetryBuffer::new();
        buffer.update(vec![1.0], vec![1.0], vec![1.0]);
        let old = buffer.snapshot();
        buffer.update(vec![2.0], vec![2.0], vec![2.0]);
        assert_eq!(old.rpm, vec![1.0]);
        assert_eq!(buffer.snapshot().rpm, vec![2.0]);
    }

    #[test]
    fn concurrent_readers_never_see_mixed_frames() {
        let buffer = Arc::new(TelemetryBuffer::new());

        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for n in 0..2_000u32 {
                    let v = f64::from(n);
                    let len = (n % 7) as usize + 1;
                    buffer.update(vec![v; len], vec![v; len], vec![v; len]);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let frame = buffer.snapshot();
                        assert_eq!(frame.rpm, frame.moment);
                        assert_eq!(frame.moment, frame.thrust);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
