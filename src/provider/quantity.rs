//! Kubernetes resource quantity parsing (`"250m"`, `"1.5"`, `"512Mi"`, ...)

/// Parse a CPU quantity into millicores
#[must_use]
pub fn parse_cpu_millicores(value: &str) -> Option<u64> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(number) = raw.strip_suffix('m') {
        (number, 1.0)
    } else if let Some(number) = raw.strip_suffix('u') {
        (number, 0.001)
    } else if let Some(number) = raw.strip_suffix('n') {
        (number, 0.000_001)
    } else {
        (raw, 1000.0)
    };

    scaled(number, multiplier)
}

/// Parse a memory quantity into bytes
#[must_use]
pub fn parse_memory_bytes(value: &str) -> Option<u64> {
    const UNITS: [(&str, f64); 12] = [
        ("Ei", 1_152_921_504_606_846_976.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
        ("E", 1e18),
        ("P", 1e15),
        ("T", 1e12),
        ("G", 1e9),
        ("M", 1e6),
        ("k", 1e3),
    ];

    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    UNITS
        .iter()
        .find_map(|(suffix, multiplier)| {
            raw.strip_suffix(*suffix)
                .map(|number| scaled(number, *multiplier))
        })
        .unwrap_or_else(|| scaled(raw, 1.0))
}

fn scaled(number: &str, multiplier: f64) -> Option<u64> {
    let value = (number.trim().parse::<f64>().ok()? * multiplier).round();
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_quantities() {
        assert_eq!(parse_cpu_millicores("250m"), Some(250));
        assert_eq!(parse_cpu_millicores("2"), Some(2000));
        assert_eq!(parse_cpu_millicores("0.5"), Some(500));
        assert_eq!(parse_cpu_millicores("123456789n"), Some(123));
        assert_eq!(parse_cpu_millicores(""), None);
        assert_eq!(parse_cpu_millicores("lots"), None);
    }

    #[test]
    fn test_memory_quantities() {
        assert_eq!(parse_memory_bytes("256Mi"), Some(256 * 1024 * 1024));
        assert_eq!(parse_memory_bytes("1Gi"), Some(1 << 30));
        assert_eq!(parse_memory_bytes("128974848"), Some(128_974_848));
        assert_eq!(parse_memory_bytes("129M"), Some(129_000_000));
        assert_eq!(parse_memory_bytes("4k"), Some(4000));
        assert_eq!(parse_memory_bytes("-1Mi"), None);
    }
}
