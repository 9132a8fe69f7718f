//! Number formatting for table cells and the info pane

const MIB: f64 = 1024.0 * 1024.0;

/// CPU usage as `"%4dm"`, e.g. `" 120m"`
#[inline]
pub fn format_millicores(millicores: u64) -> String {
    format!("{:4}m", millicores)
}

/// Memory in mebibytes with one decimal, e.g. `" 612.0Mi"`
#[inline]
pub fn format_mebibytes(bytes: u64) -> String {
    format!("{:6.1}Mi", bytes as f64 / MIB)
}

/// Ratio as a right-aligned whole percentage, e.g. `" 45%"`
#[inline]
pub fn format_percent(ratio: f64) -> String {
    format!("{:3.0}%", ratio * 100.0)
}

/// Ratio of `used` to `base`, treating a zero base as one
#[inline]
pub fn ratio_of(used: u64, base: u64) -> f64 {
    used as f64 / base.max(1) as f64
}

/// Format bytes in human-readable binary units
#[inline]
pub fn format_bytes(bytes: u64) -> String {
    const KI: u64 = 1024;
    const MI: u64 = KI * 1024;
    const GI: u64 = MI * 1024;

    if bytes >= GI {
        format!("{:.2}Gi", bytes as f64 / GI as f64)
    } else if bytes >= MI {
        format!("{:.0}Mi", bytes as f64 / MI as f64)
    } else if bytes >= KI {
        format!("{:.0}Ki", bytes as f64 / KI as f64)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_millicores() {
        assert_eq!(format_millicores(120), " 120m");
        assert_eq!(format_millicores(0), "   0m");
        assert_eq!(format_millicores(12345), "12345m");
    }

    #[test]
    fn test_format_mebibytes() {
        assert_eq!(format_mebibytes(612 * 1024 * 1024), " 612.0Mi");
        assert_eq!(format_mebibytes(1536 * 1024), "   1.5Mi");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.45), " 45%");
        assert_eq!(format_percent(1.0), "100%");
        assert_eq!(format_percent(0.0), "  0%");
    }

    #[test]
    fn test_ratio_of_zero_base() {
        assert_eq!(ratio_of(50, 0), 50.0);
        assert_eq!(ratio_of(50, 100), 0.5);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2Ki");
        assert_eq!(format_bytes(256 * 1024 * 1024), "256Mi");
        assert_eq!(format_bytes(1536 * 1024 * 1024), "1.50Gi");
    }
}
