use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// `db_type` as classified by C1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Core,
    Rnaseq,
    Cdna,
    Otherfeatures,
    Variation,
    Funcgen,
    Compara,
    Ancestral,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Core => "core",
            DbType::Rnaseq => "rnaseq",
            DbType::Cdna => "cdna",
            DbType::Otherfeatures => "otherfeatures",
            DbType::Variation => "variation",
            DbType::Funcgen => "funcgen",
            DbType::Compara => "compara",
            DbType::Ancestral => "ancestral",
        }
    }

    /// The species-pattern type alternation; excludes compara/ancestral, which
    /// are classified by their own patterns.
    pub fn is_species_type(&self) -> bool {
        !matches!(self, DbType::Compara | DbType::Ancestral)
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(DbType::Core),
            "rnaseq" => Ok(DbType::Rnaseq),
            "cdna" => Ok(DbType::Cdna),
            "otherfeatures" => Ok(DbType::Otherfeatures),
            "variation" => Ok(DbType::Variation),
            "funcgen" => Ok(DbType::Funcgen),
            "compara" => Ok(DbType::Compara),
            "ancestral" => Ok(DbType::Ancestral),
            other => Err(ParseError::DatabaseTypeNotAllowed {
                db_type: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for t in [
            DbType::Core,
            DbType::Rnaseq,
            DbType::Cdna,
            DbType::Otherfeatures,
            DbType::Variation,
            DbType::Funcgen,
            DbType::Compara,
            DbType::Ancestral,
        ] {
            assert_eq!(t, t.to_string().parse().unwrap());
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert!("protein_tree".parse::<DbType>().is_err());
    }

    #[test]
    fn compara_and_ancestral_are_not_species_types() {
        assert!(!DbType::Compara.is_species_type());
        assert!(!DbType::Ancestral.is_species_type());
        assert!(DbType::Core.is_species_type());
    }
}
