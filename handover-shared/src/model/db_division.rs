use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// `db_division` as classified by C1. `Vertebrates` is the
/// default when a compara/ancestral name omits the division segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbDivision {
    Vertebrates,
    Plants,
    Metazoa,
    Fungi,
    Protists,
    Bacteria,
    Pan,
}

impl DbDivision {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbDivision::Vertebrates => "vertebrates",
            DbDivision::Plants => "plants",
            DbDivision::Metazoa => "metazoa",
            DbDivision::Fungi => "fungi",
            DbDivision::Protists => "protists",
            DbDivision::Bacteria => "bacteria",
            DbDivision::Pan => "pan",
        }
    }
}

impl fmt::Display for DbDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbDivision {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertebrates" => Ok(DbDivision::Vertebrates),
            "plants" => Ok(DbDivision::Plants),
            "metazoa" => Ok(DbDivision::Metazoa),
            "fungi" => Ok(DbDivision::Fungi),
            "protists" => Ok(DbDivision::Protists),
            "bacteria" => Ok(DbDivision::Bacteria),
            "pan" => Ok(DbDivision::Pan),
            other => Err(ParseError::DivisionNotAllowed {
                division: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for d in [
            DbDivision::Vertebrates,
            DbDivision::Plants,
            DbDivision::Metazoa,
            DbDivision::Fungi,
            DbDivision::Protists,
            DbDivision::Bacteria,
            DbDivision::Pan,
        ] {
            assert_eq!(d, d.to_string().parse().unwrap());
        }
    }

    #[test]
    fn rejects_unknown_division() {
        assert!("atlantis".parse::<DbDivision>().is_err());
    }
}
