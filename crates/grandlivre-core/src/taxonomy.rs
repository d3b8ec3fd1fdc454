//! Statement taxonomies
//!
//! Classification tables mapping statement line items to sets of
//! account-code prefixes. The tables are data, not code: versioned YAML
//! documents embedded in the crate, deserialized once and validated for
//! prefix disjointness before any statement is built. Category names,
//! line labels and prefix sets are load-bearing: downstream totals are
//! compared against them to the cent.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const BILAN_ACTIF_YAML: &str = include_str!("../taxonomies/bilan_actif.yaml");
const BILAN_PASSIF_YAML: &str = include_str!("../taxonomies/bilan_passif.yaml");
const COMPTE_DE_RESULTAT_YAML: &str = include_str!("../taxonomies/compte_de_resultat.yaml");

/// Statement family a taxonomy describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BilanActif,
    BilanPassif,
    CompteDeResultat,
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::BilanActif => write!(f, "bilan_actif"),
            StatementKind::BilanPassif => write!(f, "bilan_passif"),
            StatementKind::CompteDeResultat => write!(f, "compte_de_resultat"),
        }
    }
}

/// A named line item holding account-code prefixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub libelle: String,
    pub comptes: Vec<String>,
}

/// Sub-category (sous-masse) grouping line items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SousMasse {
    pub nom: String,
    pub lignes: Vec<LineItem>,
}

/// Top-level category (grande masse). The compte de résultat keeps its
/// line items directly on the category, without a sub-category level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrandeMasse {
    pub nom: String,
    #[serde(default)]
    pub sous_masses: Vec<SousMasse>,
    #[serde(default)]
    pub lignes: Vec<LineItem>,
}

/// One statement classification table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    pub version: u32,
    pub statement: StatementKind,
    pub masses: Vec<GrandeMasse>,
}

impl Taxonomy {
    pub fn bilan_actif() -> CoreResult<Self> {
        Self::from_yaml(BILAN_ACTIF_YAML)
    }

    pub fn bilan_passif() -> CoreResult<Self> {
        Self::from_yaml(BILAN_PASSIF_YAML)
    }

    pub fn compte_de_resultat() -> CoreResult<Self> {
        Self::from_yaml(COMPTE_DE_RESULTAT_YAML)
    }

    /// Parse one taxonomy document and validate it.
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let taxonomy: Taxonomy = serde_yaml::from_str(content)
            .map_err(|e| CoreError::TaxonomyError {
                message: e.to_string(),
            })?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// All line items in document order.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> + '_ {
        self.masses.iter().flat_map(|m| {
            m.lignes
                .iter()
                .chain(m.sous_masses.iter().flat_map(|s| s.lignes.iter()))
        })
    }

    /// All prefixes across every line item.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.items()
            .flat_map(|item| item.comptes.iter().map(String::as_str))
    }

    /// Rejects duplicate or overlapping prefixes across the leaves of
    /// this statement. With an overlap, one account would be counted
    /// into two different line items and the totals would drift.
    pub fn validate(&self) -> CoreResult<()> {
        let prefixes: Vec<&str> = self.prefixes().collect();
        for (i, first) in prefixes.iter().enumerate() {
            for second in &prefixes[i + 1..] {
                if first.starts_with(second) || second.starts_with(first) {
                    return Err(CoreError::OverlappingPrefixes {
                        statement: self.statement.to_string(),
                        first: (*first).to_string(),
                        second: (*second).to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether any line item of this taxonomy claims the account code.
    pub fn covers(&self, code: &str) -> bool {
        self.prefixes().any(|prefix| code.starts_with(prefix))
    }
}

/// Contra-asset prefix paired with an asset prefix: class-2 prefixes map
/// onto the matching 28x depreciation accounts, anything else onto the
/// x9 provision accounts (39x, 49x, 59x...).
pub fn contra_prefix(prefix: &str) -> String {
    match prefix.strip_prefix('2') {
        Some(rest) => format!("28{rest}"),
        None => format!("{prefix}9"),
    }
}

/// The three built-in statement tables, loaded and validated together.
#[derive(Debug, Clone)]
pub struct Taxonomies {
    pub actif: Taxonomy,
    pub passif: Taxonomy,
    pub resultat: Taxonomy,
}

impl Taxonomies {
    pub fn builtin() -> CoreResult<Self> {
        Ok(Self {
            actif: Taxonomy::bilan_actif()?,
            passif: Taxonomy::bilan_passif()?,
            resultat: Taxonomy::compte_de_resultat()?,
        })
    }

    /// True when some line item of any statement, or a contra account
    /// paired with an actif item, claims the account code.
    pub fn covers(&self, code: &str) -> bool {
        self.actif.covers(code)
            || self.passif.covers(code)
            || self.resultat.covers(code)
            || self
                .actif
                .prefixes()
                .any(|prefix| code.starts_with(&contra_prefix(prefix)))
    }
}
