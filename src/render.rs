//! Glyph primitives for usage bars and sparklines

/// Glyph for a filled bar cell
pub const BAR_FILLED: char = '█';

/// Sparkline levels, lowest first
pub const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Clamp to `[0, 1]`, mapping NaN and infinities to zero
#[inline]
#[must_use]
pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Render `ratio` as a left-filled bar exactly `width` cells wide
///
/// Any ratio above zero fills at least one cell, so small usage never looks
/// like no usage.
#[must_use]
pub fn bar(ratio: f64, width: usize) -> String {
    let ratio = clamp_ratio(ratio);
    let mut filled = (ratio * width as f64).round() as usize;
    if ratio > 0.0 && filled == 0 {
        filled = 1;
    }
    let filled = filled.min(width);

    let mut out = String::with_capacity(width * BAR_FILLED.len_utf8());
    out.extend(std::iter::repeat_n(BAR_FILLED, filled));
    out.extend(std::iter::repeat_n(' ', width - filled));
    out
}

/// Render samples as exactly `width` glyphs
///
/// Long inputs are resampled by picking the nearest earlier sample for each
/// output cell. Returns an empty string when there is nothing to draw.
#[must_use]
pub fn sparkline(samples: &[f64], width: usize) -> String {
    if samples.is_empty() || width == 0 {
        return String::new();
    }

    let step = samples.len() as f64 / width as f64;
    let top = SPARK_LEVELS.len() - 1;
    (0..width)
        .map(|i| {
            let index = ((i as f64 * step).floor() as usize).min(samples.len() - 1);
            let level = (clamp_ratio(samples[index]) * top as f64).round() as usize;
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}
