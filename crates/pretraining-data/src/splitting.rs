use serde::Serialize;

use crate::errors::{Error, Result};

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.9;

/// How the training and validation portions were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// One corpus cut by position at `floor(len * train_fraction)`.
    Ratio { train_fraction: f64 },
    /// Train and validation came from separate sources.
    PrePartitioned,
}

/// Two contiguous, disjoint views that together cover the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan<'a> {
    pub train: &'a str,
    pub validation: &'a str,
    /// Index of the first validation symbol, counted in chars.
    pub boundary: usize,
}

pub fn validate_fraction(fraction: f64) -> Result<()> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(Error::InvalidSplit(format!(
            "train fraction must be within [0, 1], got {fraction}"
        )));
    }
    Ok(())
}

pub fn split_boundary(len: usize, fraction: f64) -> Result<usize> {
    validate_fraction(fraction)?;
    let boundary = (len as f64 * fraction).floor() as usize;
    Ok(boundary.min(len))
}

/// Splits `text` by symbol position. The boundary always lands on a char
/// boundary, so no UTF-8 sequence is cut.
pub fn split_by_ratio(text: &str, fraction: f64) -> Result<SplitPlan<'_>> {
    let len = text.chars().count();
    let boundary = split_boundary(len, fraction)?;
    let byte_index = text
        .char_indices()
        .nth(boundary)
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let (train, validation) = text.split_at(byte_index);

    if train.is_empty() || validation.is_empty() {
        log::warn!(
            "ratio split of {len} symbols at fraction {fraction} leaves an empty segment"
        );
    }

    Ok(SplitPlan {
        train,
        validation,
        boundary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ten_symbols_at_ninety_percent() {
        let plan = split_by_ratio("0123456789", 0.9).unwrap();
        assert_eq!(plan.boundary, 9);
        assert_eq!(plan.train, "012345678");
        assert_eq!(plan.validation, "9");
    }

    #[test]
    fn boundary_counts_chars_not_bytes() {
        let plan = split_by_ratio("ééééé", 0.6).unwrap();
        assert_eq!(plan.train, "ééé");
        assert_eq!(plan.validation, "éé");
    }

    #[test]
    fn boundary_is_floored() {
        assert_eq!(split_boundary(7, 0.9).unwrap(), 6);
        assert_eq!(split_boundary(1, 0.9).unwrap(), 0);
    }

    #[test]
    fn extreme_fractions_are_allowed() {
        let all_train = split_by_ratio("abc", 1.0).unwrap();
        assert_eq!((all_train.train, all_train.validation), ("abc", ""));

        let all_val = split_by_ratio("abc", 0.0).unwrap();
        assert_eq!((all_val.train, all_val.validation), ("", "abc"));
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        for fraction in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                split_by_ratio("abc", fraction),
                Err(Error::InvalidSplit(_))
            ));
        }
    }

    proptest! {
        #[test]
        fn split_is_complete(text in "\\PC{0,200}", fraction in 0.0f64..=1.0) {
            let plan = split_by_ratio(&text, fraction).unwrap();
            let len = text.chars().count();
            let expected = (len as f64 * fraction).floor() as usize;

            prop_assert_eq!(plan.train.chars().count(), expected);
            prop_assert_eq!(plan.validation.chars().count(), len - expected);
            prop_assert_eq!(format!("{}{}", plan.train, plan.validation), text);
        }
    }
}
