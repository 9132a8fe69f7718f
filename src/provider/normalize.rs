//! Trend sample normalization shared by providers

use crate::render::clamp_ratio;

/// CPU usage that maps to a full sparkline cell
pub const CPU_TREND_CEILING_MILLICORES: f64 = 500.0;

/// Memory usage that maps to a full sparkline cell (1.2 GiB)
pub const MEMORY_TREND_CEILING: f64 = 1.2 * 1024.0 * 1024.0 * 1024.0;

#[must_use]
pub fn cpu_trend_sample(millicores: u64) -> f64 {
    clamp_ratio(millicores as f64 / CPU_TREND_CEILING_MILLICORES)
}

#[must_use]
pub fn memory_trend_sample(bytes: u64) -> f64 {
    clamp_ratio(bytes as f64 / MEMORY_TREND_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_sample() {
        assert_eq!(cpu_trend_sample(250), 0.5);
        assert_eq!(cpu_trend_sample(5000), 1.0);
        assert_eq!(cpu_trend_sample(0), 0.0);
    }

    #[test]
    fn test_memory_sample() {
        let gib = 1024 * 1024 * 1024;
        assert!((memory_trend_sample(gib) - 1.0 / 1.2).abs() < 1e-9);
        assert_eq!(memory_trend_sample(2 * gib), 1.0);
    }

    #[test]
    fn test_samples_and_bars_agree_on_degenerate_ratios() {
        for ratio in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.5] {
            assert_eq!(clamp_ratio(ratio), 0.0, "ratio {ratio}");
            assert_eq!(crate::render::bar(ratio, 4), "    ", "ratio {ratio}");
            assert_eq!(crate::render::sparkline(&[ratio], 1), "▁", "ratio {ratio}");
        }
        assert_eq!(cpu_trend_sample(u64::MAX), 1.0);
    }
}
