//! Autosize: derive column widths from headers, sampled content, or
//! explicit value lists, then reconcile against the viewport.
//!
//! Text measurement is injected so hosts can measure with whatever
//! they render with; the default approximates a monospace face.

use crate::options::ViewportFitPolicy;
use crate::types::{AutosizeMode, Column};

/// Host capability: pixel width of a rendered string.
pub trait TextMeasurer {
    fn measure(&self, text: &str) -> f32;
}

/// Fixed-advance approximation, the headless default.
#[derive(Debug, Clone, Copy)]
pub struct CharWidthMeasurer {
    pub char_width: f32,
}

impl Default for CharWidthMeasurer {
    fn default() -> Self {
        Self { char_width: 7.0 }
    }
}

impl TextMeasurer for CharWidthMeasurer {
    fn measure(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width
    }
}

/// Guide width for one column, clamped to its min/max.
///
/// `sample_values` is the content sample collected by the caller; it
/// is only consulted in [`AutosizeMode::Content`].
pub fn guide_width(column: &Column, sample_values: &[String], measurer: &dyn TextMeasurer) -> f32 {
    let padding = column.autosize.padding_px;
    let guide = match &column.autosize.mode {
        AutosizeMode::Ignore => return column.width,
        AutosizeMode::HeaderText => measurer.measure(&column.name) + padding,
        AutosizeMode::Content => {
            let content = sample_values
                .iter()
                .map(|v| measurer.measure(v))
                .fold(0.0f32, f32::max);
            content.max(measurer.measure(&column.name)) + padding
        }
        AutosizeMode::ValueList(values) => {
            values
                .iter()
                .map(|v| measurer.measure(v))
                .fold(0.0f32, f32::max)
                + padding
        }
    };
    guide.clamp(column.min_width, column.max_width)
}

/// Outcome of reconciling guide widths against the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// Widths used as-is; the viewport scrolls if they overflow.
    AsIs,
    /// The host should grow the container to the returned width.
    Container(f32),
    /// Non-locked widths were scaled to exactly fill the viewport.
    Scaled,
    /// Even minimum widths exceed the viewport; fell back to scroll.
    Scroll,
}

/// Reconcile guide widths in place per the container policy.
pub fn reconcile_widths(
    widths: &mut [f32],
    columns: &[Column],
    policy: ViewportFitPolicy,
    viewport_w: f32,
) -> FitOutcome {
    match policy {
        ViewportFitPolicy::None => FitOutcome::AsIs,
        ViewportFitPolicy::GrowContainer => FitOutcome::Container(widths.iter().sum()),
        ViewportFitPolicy::ScaleColumns => {
            let min_total: f32 = columns
                .iter()
                .zip(widths.iter())
                .map(|(c, &w)| if c.autosize.locked { w } else { c.min_width })
                .sum();
            if min_total > viewport_w {
                return FitOutcome::Scroll;
            }

            // Scale the non-locked columns; clamping can leave a
            // residual, so refine a few times.
            for _ in 0..4 {
                let locked_total: f32 = columns
                    .iter()
                    .zip(widths.iter())
                    .filter(|(c, _)| c.autosize.locked)
                    .map(|(_, &w)| w)
                    .sum();
                let free_total: f32 = columns
                    .iter()
                    .zip(widths.iter())
                    .filter(|(c, _)| !c.autosize.locked)
                    .map(|(_, &w)| w)
                    .sum();
                let target = viewport_w - locked_total;
                if free_total <= 0.0 {
                    break;
                }
                let factor = target / free_total;
                if (factor - 1.0).abs() < 1.0e-3 {
                    break;
                }
                for (col, w) in columns.iter().zip(widths.iter_mut()) {
                    if !col.autosize.locked {
                        *w = (*w * factor).clamp(col.min_width, col.max_width);
                    }
                }
            }
            FitOutcome::Scaled
        }
    }
}
