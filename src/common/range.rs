use std::fmt;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("range bounds must be finite, got [{min}, {max}]")]
    NonFinite { min: f64, max: f64 },
    #[error("range minimum {min} is greater than maximum {max}")]
    Inverted { min: f64, max: f64 },
}

/// Closed interval `[min, max]` a delay is drawn from.
///
/// Both bounds are finite and `min <= max`; the only way to get one is
/// through [`DelayRange::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    min: f64,
    max: f64,
}

impl DelayRange {
    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(RangeError::NonFinite { min, max });
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

// Accepts `[min, max]` pairs in config files.
impl<'de> Deserialize<'de> for DelayRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (min, max) = <(f64, f64)>::deserialize(deserializer)?;
        DelayRange::new(min, max).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for DelayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordered_and_degenerate_bounds() {
        let range = DelayRange::new(0.5, 2.0).unwrap();
        assert_eq!(range.min(), 0.5);
        assert_eq!(range.max(), 2.0);
        assert!(!range.is_degenerate());

        let point = DelayRange::new(3.0, 3.0).unwrap();
        assert!(point.is_degenerate());
        assert!(point.contains(3.0));
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert_eq!(
            DelayRange::new(5.0, 1.0),
            Err(RangeError::Inverted { min: 5.0, max: 1.0 })
        );
    }

    #[test]
    fn rejects_non_finite_bounds() {
        assert!(matches!(
            DelayRange::new(f64::NAN, 1.0),
            Err(RangeError::NonFinite { .. })
        ));
        assert!(matches!(
            DelayRange::new(0.0, f64::INFINITY),
            Err(RangeError::NonFinite { .. })
        ));
    }

    #[test]
    fn displays_as_pair() {
        let range = DelayRange::new(1.0, 3.5).unwrap();
        assert_eq!(range.to_string(), "[1, 3.5]");
    }
}
