use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which colour/texture set a region is painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Each region in its own colour.
    #[default]
    Mosaic,
    /// Each region in its group colour.
    Families,
}

/// How selection criteria combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Any single criterion matching is enough.
    #[default]
    Any,
    /// Every non-empty tag criterion must be fully covered; location overrides.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("undefined {kind} `{value}`")]
pub struct UndefinedModeError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ViewMode {
    type Err = UndefinedModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mosaic" => Ok(Self::Mosaic),
            "families" | "family" => Ok(Self::Families),
            _ => Err(UndefinedModeError {
                kind: "view mode",
                value: s.to_owned(),
            }),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = UndefinedModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" | "one_of" => Ok(Self::Any),
            "all" | "all_of" => Ok(Self::All),
            _ => Err(UndefinedModeError {
                kind: "selection mode",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mosaic => "mosaic",
            Self::Families => "families",
        })
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "any",
            Self::All => "all",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!("Mosaic".parse::<ViewMode>(), Ok(ViewMode::Mosaic));
        assert_eq!(" families ".parse::<ViewMode>(), Ok(ViewMode::Families));
        assert_eq!("ALL".parse::<SelectionMode>(), Ok(SelectionMode::All));
        assert_eq!("one_of".parse::<SelectionMode>(), Ok(SelectionMode::Any));
    }

    #[test]
    fn unknown_mode_fails_fast() {
        let err = "both".parse::<SelectionMode>().unwrap_err();
        assert_eq!(err.kind, "selection mode");
        assert_eq!(err.to_string(), "undefined selection mode `both`");
        assert!("satellite".parse::<ViewMode>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for mode in [ViewMode::Mosaic, ViewMode::Families] {
            assert_eq!(mode.to_string().parse::<ViewMode>(), Ok(mode));
        }
        for mode in [SelectionMode::Any, SelectionMode::All] {
            assert_eq!(mode.to_string().parse::<SelectionMode>(), Ok(mode));
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&ViewMode::Families).expect("serialize"),
            "\"families\""
        );
        let mode: SelectionMode = serde_json::from_str("\"all\"").expect("deserialize");
        assert_eq!(mode, SelectionMode::All);
        assert!(serde_json::from_str::<SelectionMode>("\"some\"").is_err());
    }
}
