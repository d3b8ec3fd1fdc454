//! Error and warning types for grandlivre-core
//!
//! Hard errors (`CoreError`) only arise from configuration problems such
//! as an invalid taxonomy document. Data-quality findings are modelled as
//! `Warning` values carried on the generated statements: the engine never
//! fails a computation because the ledger is dirty, it reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for grandlivre-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Taxonomy error: {message}")]
    TaxonomyError { message: String },

    #[error("Overlapping prefixes in taxonomy '{statement}': '{first}' and '{second}'")]
    OverlappingPrefixes {
        statement: String,
        first: String,
        second: String,
    },
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Warning codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// A ledger line references an account missing from the chart
    UnknownAccount,
    /// An account with movements matches no statement line item
    UncoveredAccount,
    /// One pièce does not balance (sum debit != sum credit)
    UnbalancedPiece,
    /// Trial balance debit and credit columns diverge
    LedgerOutOfBalance,
    /// Actif and passif totals diverge for one period
    EquilibriumViolation,
    /// Indirect cash flow does not reconcile with the treasury delta
    CashFlowMismatch,
    /// Equity moved outside result appropriation between two closes
    UnexplainedEquityMovement,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::UnknownAccount => write!(f, "UNKNOWN_ACCOUNT"),
            WarningKind::UncoveredAccount => write!(f, "UNCOVERED_ACCOUNT"),
            WarningKind::UnbalancedPiece => write!(f, "UNBALANCED_PIECE"),
            WarningKind::LedgerOutOfBalance => write!(f, "LEDGER_OUT_OF_BALANCE"),
            WarningKind::EquilibriumViolation => write!(f, "EQUILIBRIUM_VIOLATION"),
            WarningKind::CashFlowMismatch => write!(f, "CASH_FLOW_MISMATCH"),
            WarningKind::UnexplainedEquityMovement => write!(f, "UNEXPLAINED_EQUITY_MOVEMENT"),
        }
    }
}

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational finding
    Info,
    /// Figures may be affected
    Warning,
    /// Figures are wrong or unverifiable
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A data-quality finding attached to a generated statement.
///
/// Warnings annotate, they never abort: a statement with warnings still
/// carries every figure the ledger allowed the engine to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }

    pub fn unknown_account(code: &str) -> Self {
        Self::new(
            WarningKind::UnknownAccount,
            Severity::Warning,
            format!("compte {code} absent du plan comptable: ses mouvements sont ignorés"),
        )
    }

    pub fn uncovered_account(code: &str) -> Self {
        Self::new(
            WarningKind::UncoveredAccount,
            Severity::Info,
            format!("compte {code} mouvementé mais rattaché à aucun poste des états"),
        )
    }

    pub fn unbalanced_piece(numero_piece: &str, ecart: Decimal) -> Self {
        Self::new(
            WarningKind::UnbalancedPiece,
            Severity::Error,
            format!("pièce {numero_piece} déséquilibrée: écart débit-crédit de {ecart}"),
        )
    }

    pub fn ledger_out_of_balance(solde_debit: Decimal, solde_credit: Decimal) -> Self {
        Self::new(
            WarningKind::LedgerOutOfBalance,
            Severity::Error,
            format!("balance déséquilibrée: soldes débiteurs {solde_debit} / créditeurs {solde_credit}"),
        )
    }

    pub fn equilibrium_violation(periode: &str, actif: Decimal, passif: Decimal) -> Self {
        Self::new(
            WarningKind::EquilibriumViolation,
            Severity::Error,
            format!("bilan {periode} déséquilibré: actif net {actif} / passif {passif}"),
        )
    }

    pub fn cash_flow_mismatch(calculee: Decimal, observee: Decimal) -> Self {
        Self::new(
            WarningKind::CashFlowMismatch,
            Severity::Warning,
            format!(
                "variation de trésorerie calculée {calculee} différente de la variation constatée {observee}"
            ),
        )
    }

    pub fn unexplained_equity_movement(periode: &str, ecart: Decimal) -> Self {
        Self::new(
            WarningKind::UnexplainedEquityMovement,
            Severity::Info,
            format!("capitaux propres {periode}: mouvement de {ecart} non expliqué par l'affectation du résultat"),
        )
    }

    /// Log through the `log` facade at a level matching the severity.
    pub fn emit(&self) {
        match self.severity {
            Severity::Info => log::info!(target: "grandlivre::warning", "[{}] {}", self.kind, self.message),
            Severity::Warning => log::warn!(target: "grandlivre::warning", "[{}] {}", self.kind, self.message),
            Severity::Error => log::error!(target: "grandlivre::warning", "[{}] {}", self.kind, self.message),
        }
    }
}

/// Append the warnings of `extra` not already present in `sink`.
pub(crate) fn merge_warnings(sink: &mut Vec<Warning>, extra: Vec<Warning>) {
    for warning in extra {
        if !sink.contains(&warning) {
            sink.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_kind_display() {
        assert_eq!(WarningKind::UnknownAccount.to_string(), "UNKNOWN_ACCOUNT");
        assert_eq!(WarningKind::CashFlowMismatch.to_string(), "CASH_FLOW_MISMATCH");
    }

    #[test]
    fn test_merge_warnings_deduplicates() {
        let a = Warning::unknown_account("471000");
        let b = Warning::uncovered_account("801000");
        let mut sink = vec![a.clone()];
        merge_warnings(&mut sink, vec![a, b.clone()]);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1], b);
    }
}
