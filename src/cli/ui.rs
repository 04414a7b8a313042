use std::io::Write;

use crate::core::{
    history::TestRecord,
    session::{SessionOutcome, Severity},
    telemetry::{PlotPanel, Renderer},
};

pub const NO_TESTS_MESSAGE: &str = "No tests have been conducted yet.";

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 48;

/// Plain-text stand-in for the charting backend: per-panel summary plus a sparkline.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, panels: &[PlotPanel<'_>]) -> anyhow::Result<()> {
        for panel in panels {
            writeln!(self.out, "{}", panel_line(panel))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

pub fn panel_line(panel: &PlotPanel<'_>) -> String {
    let samples = panel.samples;
    let Some(&last) = samples.last() else {
        return format!("{:<7} (no samples)", panel.title);
    };
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!(
        "{:<7} n={} min={min:.2} max={max:.2} last={last:.2} {}",
        panel.title,
        samples.len(),
        sparkline(samples, min, max)
    )
}

fn sparkline(samples: &[f64], min: f64, max: f64) -> String {
    let step = samples.len().div_ceil(SPARK_WIDTH).max(1);
    let span = max - min;
    samples
        .chunks(step)
        .map(|chunk| {
            let mean = chunk.iter().sum::<f64>() / chunk.len() as f64;
            let level = if span > 0.0 {
                ((mean - min) / span * (SPARK.len() - 1) as f64).round() as usize
            } else {
                0
            };
            SPARK[level.min(SPARK.len() - 1)]
        })
        .collect()
}

/// Status line with its severity tag.
pub fn status_line(outcome: &SessionOutcome) -> String {
    let tag = match outcome.severity() {
        Severity::Info => "OK ",
        Severity::Error => "ERR",
    };
    format!("[{tag}] {}", outcome.message())
}

/// History view body; the empty list shows the no-tests message.
pub fn history_lines(records: &[TestRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec![NO_TESTS_MESSAGE.to_string()];
    }
    records.iter().map(TestRecord::to_string).collect()
}
