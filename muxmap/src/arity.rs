// SPDX-License-Identifier: Apache-2.0

//! Mux arity: the number of data inputs, always `2^n` for a select width
//! `n >= 1`.

use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleResult};

/// Largest select width accepted (4096 data inputs). Validation of a rule
/// this wide is covered by the wide-mux scenario tests.
pub const MAX_SELECT_WIDTH: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Arity {
    select_width: u32,
}

impl Arity {
    pub fn from_select_width(select_width: u32) -> RuleResult<Self> {
        if select_width == 0 || select_width > MAX_SELECT_WIDTH {
            return Err(RuleError::InvalidArity(
                1usize.checked_shl(select_width).unwrap_or(0),
            ));
        }
        Ok(Arity { select_width })
    }

    pub fn from_data_inputs(count: usize) -> RuleResult<Self> {
        if count < 2 || !count.is_power_of_two() {
            return Err(RuleError::InvalidArity(count));
        }
        Self::from_select_width(count.trailing_zeros())
            .map_err(|_| RuleError::InvalidArity(count))
    }

    /// Number of select inputs, `n`.
    pub fn select_width(self) -> u32 {
        self.select_width
    }

    /// Number of data inputs, `2^n`.
    pub fn data_inputs(self) -> usize {
        1usize << self.select_width
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.data_inputs())
    }
}

impl TryFrom<usize> for Arity {
    type Error = RuleError;
    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Arity::from_data_inputs(count)
    }
}

impl From<Arity> for usize {
    fn from(arity: Arity) -> usize {
        arity.data_inputs()
    }
}

impl std::str::FromStr for Arity {
    type Err = RuleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count: usize = s
            .trim()
            .parse()
            .map_err(|_| RuleError::MalformedEntry(format!("invalid arity '{}'", s)))?;
        Arity::from_data_inputs(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(2, 1)]
    #[test_case(4, 2)]
    #[test_case(8, 3)]
    #[test_case(1024, 10)]
    fn test_from_data_inputs(count: usize, width: u32) {
        let arity = Arity::from_data_inputs(count).unwrap();
        assert_eq!(arity.select_width(), width);
        assert_eq!(arity.data_inputs(), count);
        assert_eq!(Arity::from_select_width(width).unwrap(), arity);
    }

    #[test_case(0)]
    #[test_case(1)]
    #[test_case(3)]
    #[test_case(6)]
    fn test_rejects_non_power_of_two(count: usize) {
        assert_eq!(
            Arity::from_data_inputs(count),
            Err(RuleError::InvalidArity(count))
        );
    }

    #[test]
    fn test_rejects_zero_select_width() {
        assert!(Arity::from_select_width(0).is_err());
        assert!(Arity::from_select_width(MAX_SELECT_WIDTH + 1).is_err());
        assert_eq!(
            Arity::from_data_inputs(8192),
            Err(RuleError::InvalidArity(8192))
        );
        assert_eq!(Arity::from_data_inputs(4096).unwrap().select_width(), 12);
    }

    #[test]
    fn test_parse_and_display() {
        let arity: Arity = "8".parse().unwrap();
        assert_eq!(arity.to_string(), "8");
        assert!("eight".parse::<Arity>().is_err());
    }
}
