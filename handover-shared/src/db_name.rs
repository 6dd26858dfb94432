//! C1 — Name parser & router.
//!
//! Three compiled patterns classify a database name, first match wins. The
//! patterns and the `bacteria*`/GRCh37 staging rules are grounded in the
//! original `species_pattern`/`compara_pattern`/`ancestral_pattern` and
//! `check_staging_server` helpers this module replaces.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ParseError, ParseResult};
use crate::model::{DbDivision, DbType};

static SPECIES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<prefix>[A-Za-z0-9]+(?:_[A-Za-z0-9]+)*)_(?P<type>core|rnaseq|cdna|otherfeatures|variation|funcgen)(?:_\d+)?_(?P<release>\d+)_(?P<assembly>\d+)$",
    )
    .unwrap()
});

static COMPARA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^ensembl_compara(?:_(?P<division>vertebrates|plants|metazoa|fungi|protists|bacteria|pan)(?:_homology)?)?(?:_\d+)?_(?P<release>\d+)$",
    )
    .unwrap()
});

static ANCESTRAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^ensembl_ancestral(?:_(?P<division>vertebrates|plants|metazoa|fungi|protists|bacteria|pan))?(?:_\d+)?_(?P<release>\d+)$",
    )
    .unwrap()
});

/// Tagged classification result of a database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Species {
        prefix: String,
        db_type: DbType,
        release: u32,
        assembly: String,
    },
    Compara {
        division: DbDivision,
        release: u32,
    },
    Ancestral {
        division: DbDivision,
        release: u32,
    },
}

impl Classification {
    pub fn release(&self) -> u32 {
        match self {
            Classification::Species { release, .. }
            | Classification::Compara { release, .. }
            | Classification::Ancestral { release, .. } => *release,
        }
    }

    pub fn db_type(&self) -> DbType {
        match self {
            Classification::Species { db_type, .. } => *db_type,
            Classification::Compara { .. } => DbType::Compara,
            Classification::Ancestral { .. } => DbType::Ancestral,
        }
    }
}

/// Classify a database name against the species/compara/ancestral patterns,
/// first match wins. Missing division segments default to `vertebrates`.
pub fn classify(database: &str) -> ParseResult<Classification> {
    if let Some(caps) = SPECIES_PATTERN.captures(database) {
        let prefix = caps["prefix"].to_string();
        let db_type: DbType = caps["type"].parse().map_err(|_| {
            ParseError::InvalidDatabaseName(database.to_string())
        })?;
        let release: u32 = caps["release"].parse().unwrap();
        let assembly = caps["assembly"].to_string();
        return Ok(Classification::Species {
            prefix,
            db_type,
            release,
            assembly,
        });
    }

    if let Some(caps) = COMPARA_PATTERN.captures(database) {
        let division = caps
            .name("division")
            .map(|m| m.as_str().parse().unwrap())
            .unwrap_or(DbDivision::Vertebrates);
        let release: u32 = caps["release"].parse().unwrap();
        return Ok(Classification::Compara { division, release });
    }

    if let Some(caps) = ANCESTRAL_PATTERN.captures(database) {
        let division = caps
            .name("division")
            .map(|m| m.as_str().parse().unwrap())
            .unwrap_or(DbDivision::Vertebrates);
        let release: u32 = caps["release"].parse().unwrap();
        return Ok(Classification::Ancestral { division, release });
    }

    Err(ParseError::InvalidDatabaseName(database.to_string()))
}

/// Result of routing a classified database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub staging_uri: String,
    pub db_division: DbDivision,
    pub progress_total: u8,
    pub is_grch37: bool,
}

/// Decide staging target, division, and pipeline length for a classified
/// database name, after checking the release and division gates.
///
/// `compara_species` carries the GRCh37-linked compara member species used
/// by the original's `check_grch37` helper (a compara db routes to secondary
/// staging when one of its member species is the GRCh37 human assembly).
pub fn route(
    classification: &Classification,
    database: &str,
    configured_release: u32,
    staging_uri: &str,
    secondary_staging_uri: &str,
    allowed_divisions: &[DbDivision],
    compara_member_is_grch37: bool,
) -> ParseResult<Route> {
    if classification.release() != configured_release {
        return Err(ParseError::ReleaseMismatch {
            database: database.to_string(),
            parsed: classification.release(),
            configured: configured_release,
        });
    }

    let (db_division, is_grch37) = match classification {
        Classification::Species {
            prefix, assembly, ..
        } => {
            let is_bacteria = prefix.starts_with("bacteria");
            let is_grch37 = prefix == "homo_sapiens" && assembly == "37";
            let division = if is_bacteria {
                DbDivision::Bacteria
            } else {
                DbDivision::Vertebrates
            };
            (division, is_grch37)
        }
        Classification::Compara { division, .. } => (*division, compara_member_is_grch37),
        Classification::Ancestral { division, .. } => (*division, false),
    };

    if !allowed_divisions.contains(&db_division) {
        return Err(ParseError::DivisionNotAllowed {
            division: db_division.to_string(),
        });
    }

    let use_secondary = is_grch37 || matches!(classification, Classification::Species{ prefix, .. } if prefix.starts_with("bacteria"));
    let staging = if use_secondary {
        secondary_staging_uri
    } else {
        staging_uri
    }
    .to_string();

    let progress_total = if is_grch37 { 2 } else { 3 };

    Ok(Route {
        staging_uri: staging,
        db_division,
        progress_total,
        is_grch37,
    })
}
