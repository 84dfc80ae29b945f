//! Representation levels.

use crate::{ReprError, ReprResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named profile controlling which properties of a resource are rendered and how deeply
/// nested entities are inlined.
///
/// Levels are ordered by refinement: `Ref < Default < Full`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Identifier plus display label.
    Ref,
    #[default]
    Default,
    Full,
}

impl Representation {
    pub const ALL: [Representation; 3] = [
        Representation::Ref,
        Representation::Default,
        Representation::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Ref => "ref",
            Representation::Default => "default",
            Representation::Full => "full",
        }
    }

    /// Parses the value of a `v=` request parameter, case-insensitively.
    pub fn parse(input: &str) -> ReprResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ref" => Ok(Representation::Ref),
            "default" => Ok(Representation::Default),
            "full" => Ok(Representation::Full),
            other => Err(ReprError::InvalidInput(format!(
                "unknown representation '{other}' (expected ref, default or full)"
            ))),
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Representation {
    type Err = ReprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Representation::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Representation::parse("FULL").unwrap(), Representation::Full);
        assert_eq!(Representation::parse(" ref ").unwrap(), Representation::Ref);
        assert_eq!(
            "Default".parse::<Representation>().unwrap(),
            Representation::Default
        );
    }

    #[test]
    fn parse_rejects_unknown_levels() {
        let err = Representation::parse("custom:(uuid)").unwrap_err();
        assert!(matches!(err, ReprError::InvalidInput(_)));
    }

    #[test]
    fn levels_are_ordered_by_refinement() {
        assert!(Representation::Ref < Representation::Default);
        assert!(Representation::Default < Representation::Full);
    }
}
