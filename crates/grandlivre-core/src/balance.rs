//! Balance calculator and trial balances (balance de vérification)

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::period::PeriodFilters;
use crate::types::{
    classe_of, is_credit_normal, is_debit_normal, signed_variation, Account, AccountBalance,
    LedgerLine,
};

/// Per-account balances over one filtered line subset, plus the codes of
/// lines that matched no account of the chart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceSet {
    pub soldes: BTreeMap<String, AccountBalance>,
    pub codes_inconnus: BTreeSet<String>,
}

impl BalanceSet {
    /// Class-signed balance of one account, zero when absent.
    pub fn solde(&self, compte: &str) -> Decimal {
        self.soldes
            .get(compte)
            .map(|b| b.solde)
            .unwrap_or(Decimal::ZERO)
    }

    /// One warning per unknown account code referenced by the lines.
    pub fn unknown_account_warnings(&self) -> Vec<Warning> {
        self.codes_inconnus
            .iter()
            .map(|code| Warning::unknown_account(code))
            .collect()
    }
}

/// Accumulates every line onto its account and applies the class sign
/// convention. Lines whose account is not in the chart are recorded in
/// `codes_inconnus` and otherwise ignored, so their contribution is lost.
pub fn compute_balances(comptes: &[Account], lignes: &[LedgerLine]) -> BalanceSet {
    compute_balances_where(comptes, lignes, |_| true)
}

/// Same as [`compute_balances`], restricted to lines accepted by `filtre`.
pub fn compute_balances_where<F>(comptes: &[Account], lignes: &[LedgerLine], filtre: F) -> BalanceSet
where
    F: Fn(&LedgerLine) -> bool,
{
    let mut soldes: BTreeMap<String, AccountBalance> = comptes
        .iter()
        .map(|c| (c.numero_compte.clone(), AccountBalance::zero(&c.numero_compte)))
        .collect();
    let mut codes_inconnus = BTreeSet::new();

    for ligne in lignes.iter().filter(|l| filtre(l)) {
        let Some(balance) = soldes.get_mut(&ligne.compte_general) else {
            codes_inconnus.insert(ligne.compte_general.clone());
            continue;
        };
        balance.total_debit += ligne.debit;
        balance.total_credit += ligne.credit;
        balance.solde += signed_variation(classe_of(&ligne.compte_general), ligne.debit, ligne.credit);
    }

    BalanceSet {
        soldes,
        codes_inconnus,
    }
}

// ==================== Standard Trial Balance ====================

/// One row of the trial balance; at most one of `solde_debit` and
/// `solde_credit` is nonzero, chosen by the account-class convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub numero_compte: String,
    pub libelle: String,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub solde_debit: Decimal,
    pub solde_credit: Decimal,
}

/// Column totals of the trial balance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub solde_debit: Decimal,
    pub solde_credit: Decimal,
}

impl TrialBalanceTotals {
    /// The fundamental ledger invariant: debit and credit balance columns
    /// must cancel out.
    pub fn is_balanced(&self) -> bool {
        (self.solde_debit - self.solde_credit).abs() < crate::tolerance()
    }
}

/// Flat trial balance over one line subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    pub lignes: Vec<TrialBalanceRow>,
    pub totaux: TrialBalanceTotals,
    pub warnings: Vec<Warning>,
}

/// Builds the standard trial balance over the lines accepted by `filtre`.
/// Accounts without any movement are omitted.
pub fn trial_balance<F>(comptes: &[Account], lignes: &[LedgerLine], filtre: F) -> TrialBalance
where
    F: Fn(&LedgerLine) -> bool,
{
    let set = compute_balances_where(comptes, lignes, filtre);
    let labels: BTreeMap<&str, &str> = comptes
        .iter()
        .map(|c| (c.numero_compte.as_str(), c.libelle.as_str()))
        .collect();

    let mut rows = Vec::new();
    let mut totaux = TrialBalanceTotals::default();

    for (code, balance) in &set.soldes {
        if balance.total_debit.is_zero() && balance.total_credit.is_zero() {
            continue;
        }
        let solde = balance.raw_delta();
        let classe = classe_of(code);
        let debiteur = matches!(classe, Some(c) if (is_debit_normal(c) && solde > Decimal::ZERO)
            || (is_credit_normal(c) && solde < Decimal::ZERO));
        let (solde_debit, solde_credit) = if debiteur {
            (solde.abs(), Decimal::ZERO)
        } else {
            (Decimal::ZERO, solde.abs())
        };

        totaux.total_debit += balance.total_debit;
        totaux.total_credit += balance.total_credit;
        totaux.solde_debit += solde_debit;
        totaux.solde_credit += solde_credit;

        rows.push(TrialBalanceRow {
            numero_compte: code.clone(),
            libelle: labels.get(code.as_str()).unwrap_or(&"").to_string(),
            total_debit: balance.total_debit,
            total_credit: balance.total_credit,
            solde_debit,
            solde_credit,
        });
    }

    let mut warnings = set.unknown_account_warnings();
    if !totaux.is_balanced() {
        warnings.push(Warning::ledger_out_of_balance(
            totaux.solde_debit,
            totaux.solde_credit,
        ));
    }
    for warning in &warnings {
        warning.emit();
    }

    TrialBalance {
        lignes: rows,
        totaux,
        warnings,
    }
}

// ==================== Comparative Trial Balance ====================

/// One row of the comparative trial balance: class-signed balances for
/// both exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeTrialBalanceRow {
    pub numero_compte: String,
    pub libelle: String,
    pub solde_n: Decimal,
    pub solde_n1: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparativeTrialBalanceTotals {
    pub solde_n: Decimal,
    pub solde_n1: Decimal,
}

/// Comparative trial balance, keeping every account active in at least
/// one of the two exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeTrialBalance {
    pub lignes: Vec<ComparativeTrialBalanceRow>,
    pub totaux: ComparativeTrialBalanceTotals,
    pub warnings: Vec<Warning>,
}

pub fn comparative_trial_balance(
    comptes: &[Account],
    lignes: &[LedgerLine],
    periods: &PeriodFilters,
) -> ComparativeTrialBalance {
    let set_n = compute_balances_where(comptes, lignes, |l| periods.cumulative_n(l));
    let set_n1 = compute_balances_where(comptes, lignes, |l| periods.cumulative_n1(l));

    let mut rows = Vec::new();
    let mut totaux = ComparativeTrialBalanceTotals::default();

    for compte in comptes {
        let solde_n = set_n.solde(&compte.numero_compte);
        let solde_n1 = set_n1.solde(&compte.numero_compte);
        if solde_n.is_zero() && solde_n1.is_zero() {
            continue;
        }
        totaux.solde_n += solde_n;
        totaux.solde_n1 += solde_n1;
        rows.push(ComparativeTrialBalanceRow {
            numero_compte: compte.numero_compte.clone(),
            libelle: compte.libelle.clone(),
            solde_n,
            solde_n1,
        });
    }

    let warnings = set_n.unknown_account_warnings();
    for warning in &warnings {
        warning.emit();
    }

    ComparativeTrialBalance {
        lignes: rows,
        totaux,
        warnings,
    }
}
