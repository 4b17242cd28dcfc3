use serde::{Deserialize, Serialize};

use crate::consensus::utility::{mean, sample_stddev, spread};

/// Upper bounds (exclusive) on spread and sample stdev for [`Reliability::High`].
const HIGH: (f64, f64) = (1.0, 0.5);
/// Upper bounds (exclusive) on spread and sample stdev for [`Reliability::Medium`].
const MEDIUM: (f64, f64) = (3.0, 1.5);

/// Ordinal agreement label for a set of provider temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Classifies cross-provider temperature agreement.
///
/// | Condition                          | Label  |
/// |------------------------------------|--------|
/// | fewer than 2 values                | low    |
/// | spread < 1.0 and stdev < 0.5       | high   |
/// | spread < 3.0 and stdev < 1.5       | medium |
/// | otherwise                          | low    |
///
/// `stdev` is the sample standard deviation.
pub fn classify(temps: &[f64]) -> Reliability {
    if temps.len() < 2 {
        return Reliability::Low;
    }

    let spread = spread(temps);
    let stdev = sample_stddev(temps, mean(temps));

    match (spread, stdev) {
        (s, d) if s < HIGH.0 && d < HIGH.1 => Reliability::High,
        (s, d) if s < MEDIUM.0 && d < MEDIUM.1 => Reliability::Medium,
        _ => Reliability::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(&[]), Reliability::Low);
        assert_eq!(classify(&[20.0]), Reliability::Low);
        assert_eq!(classify(&[20.0, 20.0]), Reliability::High);
        assert_eq!(classify(&[19.8, 20.0, 20.2]), Reliability::High);
        assert_eq!(classify(&[20.0, 21.5]), Reliability::Medium);
        assert_eq!(classify(&[20.0, 25.0]), Reliability::Low);
    }

    #[test]
    fn test_spread_of_exactly_one_is_not_high() {
        assert_eq!(classify(&[20.0, 21.0]), Reliability::Medium);
    }

    #[test]
    fn test_spread_of_exactly_three_is_low() {
        assert_eq!(classify(&[20.0, 23.0]), Reliability::Low);
    }

    #[test]
    fn test_stdev_can_demote_small_spread() {
        // spread 2.9 but stdev ~2.05 over two values
        assert_eq!(classify(&[10.0, 12.9]), Reliability::Low);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Reliability::Medium).unwrap(), "\"medium\"");
        assert_eq!(Reliability::High.as_str(), "high");
    }
}
