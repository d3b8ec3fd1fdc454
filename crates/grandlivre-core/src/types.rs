//! Core data model
//!
//! Accounts and ledger lines mirror the columns of the `plan_comptable`
//! and `ecritures` tables. Both are supplied wholesale per invocation and
//! never mutated by the engine; every statement is a pure re-derivation
//! from the snapshot passed in.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One account of the chart of accounts (plan comptable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Hierarchical account code, e.g. "411000"
    pub numero_compte: String,
    /// Display label
    pub libelle: String,
}

impl Account {
    pub fn new(numero_compte: impl Into<String>, libelle: impl Into<String>) -> Self {
        Self {
            numero_compte: numero_compte.into(),
            libelle: libelle.into(),
        }
    }

    /// Leading class digit of the account code (1-9)
    pub fn classe(&self) -> Option<u8> {
        classe_of(&self.numero_compte)
    }
}

/// One posted ledger line.
///
/// Lines sharing a `numero_piece` form one transaction (pièce) whose
/// debits and credits must cancel out; the posting layer enforces that
/// invariant, the engine assumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: i64,
    pub journal_code: String,
    pub date: NaiveDate,
    pub numero_piece: String,
    pub compte_general: String,
    pub libelle: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Aggregated movements and class-signed balance of one account over a
/// filtered line subset. Ephemeral: recomputed on every query because the
/// subset changes per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub compte: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub solde: Decimal,
}

impl AccountBalance {
    pub fn zero(compte: impl Into<String>) -> Self {
        Self {
            compte: compte.into(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            solde: Decimal::ZERO,
        }
    }

    /// Raw debit-minus-credit delta, ignoring the class convention.
    pub fn raw_delta(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}

/// Leading class digit of an account code, when the code starts with 1-9.
pub fn classe_of(code: &str) -> Option<u8> {
    code.chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
        .filter(|d| (1..=9).contains(d))
}

/// Debit-normal classes: assets and stocks (2-5) plus expenses (6).
pub fn is_debit_normal(classe: u8) -> bool {
    matches!(classe, 2..=6)
}

/// Credit-normal classes: equity and liability roots (1) plus income (7).
pub fn is_credit_normal(classe: u8) -> bool {
    matches!(classe, 1 | 7)
}

/// Class-signed variation contributed by one line: debit-normal classes
/// accumulate debit - credit, credit-normal classes credit - debit.
/// Classes 8 and 9 carry no convention and contribute nothing.
pub fn signed_variation(classe: Option<u8>, debit: Decimal, credit: Decimal) -> Decimal {
    match classe {
        Some(c) if is_debit_normal(c) => debit - credit,
        Some(c) if is_credit_normal(c) => credit - debit,
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classe_of() {
        assert_eq!(classe_of("411000"), Some(4));
        assert_eq!(classe_of("101"), Some(1));
        assert_eq!(classe_of("707000"), Some(7));
        assert_eq!(classe_of("0000"), None);
        assert_eq!(classe_of(""), None);
        assert_eq!(classe_of("X12"), None);
    }

    #[test]
    fn test_sign_conventions() {
        // expense account: debit-normal
        let solde = signed_variation(Some(6), Decimal::from(100), Decimal::from(30));
        assert_eq!(solde, Decimal::from(70));

        // income account: credit-normal
        let solde = signed_variation(Some(7), Decimal::from(10), Decimal::from(90));
        assert_eq!(solde, Decimal::from(80));

        // class 8 carries no convention
        let solde = signed_variation(Some(8), Decimal::from(50), Decimal::ZERO);
        assert_eq!(solde, Decimal::ZERO);
    }
}
