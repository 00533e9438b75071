//! Time units and human-readable formatting.
//!
//! Nanoseconds are the stored unit for every timing column.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Ns,
    Ms,
    S,
    Min,
    H,
}

impl TimeUnit {
    /// Nanoseconds per one of this unit.
    pub fn ns_factor(&self) -> f64 {
        match self {
            TimeUnit::Ns => 1.0,
            TimeUnit::Ms => 1e6,
            TimeUnit::S => 1e9,
            TimeUnit::Min => 6e10,
            TimeUnit::H => 3.6e12,
        }
    }
}

/// Convert a nanosecond value into `unit`.
pub fn convert(ns: f64, unit: TimeUnit) -> f64 {
    ns / unit.ns_factor()
}

/// Convert a value in `unit` back to nanoseconds.
pub fn to_ns(value: f64, unit: TimeUnit) -> f64 {
    value * unit.ns_factor()
}

pub fn ns_to_ms(ns: f64) -> f64 {
    convert(ns, TimeUnit::Ms)
}

pub fn ns_to_secs(ns: f64) -> f64 {
    convert(ns, TimeUnit::S)
}

/// `45s`, `2min 5s` or `1h 2min`.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{}s", seconds.round())
    } else if seconds < 3600.0 {
        format!("{}min {}s", (seconds / 60.0).floor(), (seconds % 60.0).round())
    } else {
        format!(
            "{}h {}min",
            (seconds / 3600.0).floor(),
            ((seconds % 3600.0) / 60.0).floor()
        )
    }
}

/// Percentage with one decimal; infinite ratios print as `∞`.
pub fn format_percent(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.1}%", value)
    }
}

/// Integer with thousands separators.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_tiers() {
        assert_eq!(format_duration(45.0), "45s");
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(125.0), "2min 5s");
        assert_eq!(format_duration(3725.0), "1h 2min");
        assert_eq!(format_duration(59.4), "59s");
    }

    #[test]
    fn conversion_table() {
        assert_eq!(convert(1.5e9, TimeUnit::S), 1.5);
        assert_eq!(convert(3e6, TimeUnit::Ms), 3.0);
        assert_eq!(convert(1.2e11, TimeUnit::Min), 2.0);
        assert_eq!(convert(7.2e12, TimeUnit::H), 2.0);
        assert_eq!(convert(42.0, TimeUnit::Ns), 42.0);
    }

    #[test]
    fn ns_ms_ns_recovers_value() {
        for ns in [0.0, 1.0, 123_456_789.0, 9.87e15] {
            let back = to_ns(convert(ns, TimeUnit::Ms), TimeUnit::Ms);
            assert!((back - ns).abs() <= ns.abs() * 1e-12, "{} -> {}", ns, back);
        }
    }

    #[test]
    fn count_and_percent_formatting() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_percent(12.345), "12.3%");
        assert_eq!(format_percent(f64::INFINITY), "∞");
    }
}
