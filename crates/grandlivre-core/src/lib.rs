//! Financial statement aggregation engine
//!
//! Turns a flat, append-only list of double-entry ledger lines into
//! hierarchical, period-comparable statements: balance de vérification,
//! bilan, compte de résultat, tableau des flux de trésorerie and tableau
//! de variation des capitaux propres. Every computation is a pure
//! function of the accounts, the lines and an explicit closing date; the
//! engine performs no I/O, holds no state and never reads the clock.
//!
//! Data-quality findings never abort a computation: statements come back
//! annotated with structured warnings (unknown accounts, uncovered
//! accounts, equilibrium violations, reconciliation mismatches).

pub mod annexe;
pub mod balance;
pub mod cashflow;
pub mod comparative;
pub mod equity;
pub mod error;
pub mod period;
pub mod statement;
pub mod taxonomy;
pub mod types;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub use annexe::{tableau_immobilisations, TableauImmobilisations};
pub use balance::{
    comparative_trial_balance, compute_balances, compute_balances_where, trial_balance,
    BalanceSet, ComparativeTrialBalance, TrialBalance, TrialBalanceRow, TrialBalanceTotals,
};
pub use cashflow::{derive_cash_flow, TableauFluxTresorerie};
pub use comparative::{
    compose_bilan, compose_resultat, passif_at, BilanComparatif, ResultatComparatif,
};
pub use equity::{
    capitaux_propres_from_passif, generer_tvcp, roll_forward, CapitauxPropres,
    TableauVariationCapitauxPropres,
};
pub use error::{CoreError, CoreResult, Severity, Warning, WarningKind};
pub use period::{one_year_earlier, PeriodFilters};
pub use statement::{
    build_bilan, build_bilan_side, build_resultat, Bilan, BilanSide, BuildOptions,
    CompteDeResultat, Montants,
};
pub use taxonomy::{contra_prefix, StatementKind, Taxonomies, Taxonomy};
pub use types::{classe_of, Account, AccountBalance, LedgerLine};

/// Comparison tolerance for equilibrium and reconciliation checks.
pub(crate) fn tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// The full statement set produced from one ledger snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialReports {
    pub date_cloture: NaiveDate,
    pub balance: TrialBalance,
    pub balance_comparative: ComparativeTrialBalance,
    pub bilan: BilanComparatif,
    pub compte_de_resultat: ResultatComparatif,
    pub tableau_flux: TableauFluxTresorerie,
    pub tableau_variation_capitaux: TableauVariationCapitauxPropres,
    pub tableau_immobilisations: TableauImmobilisations,
    /// Ledger-wide findings: unknown and uncovered account codes
    pub warnings: Vec<Warning>,
}

/// Generates every statement with the built-in taxonomies.
pub fn generate_reports(
    comptes: &[Account],
    ecritures: &[LedgerLine],
    date_cloture: NaiveDate,
) -> CoreResult<FinancialReports> {
    let taxonomies = Taxonomies::builtin()?;
    Ok(generate_reports_with(
        &taxonomies,
        comptes,
        ecritures,
        date_cloture,
    ))
}

/// Generates every statement with caller-supplied (already validated)
/// taxonomies.
pub fn generate_reports_with(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    ecritures: &[LedgerLine],
    date_cloture: NaiveDate,
) -> FinancialReports {
    let periods = PeriodFilters::resolve(date_cloture);

    let balance = trial_balance(comptes, ecritures, |l| periods.cumulative_n(l));
    let balance_comparative = comparative_trial_balance(comptes, ecritures, &periods);
    let bilan = compose_bilan(taxonomies, comptes, ecritures, date_cloture);
    let compte_de_resultat = compose_resultat(taxonomies, comptes, ecritures, date_cloture);
    let tableau_flux = derive_cash_flow(&bilan, &compte_de_resultat);
    let tableau_variation_capitaux = generer_tvcp(taxonomies, comptes, ecritures, date_cloture);
    let tableau_immobilisations = tableau_immobilisations(ecritures, date_cloture);

    let warnings = ledger_warnings(taxonomies, comptes, ecritures);

    FinancialReports {
        date_cloture,
        balance,
        balance_comparative,
        bilan,
        compte_de_resultat,
        tableau_flux,
        tableau_variation_capitaux,
        tableau_immobilisations,
        warnings,
    }
}

/// Ledger-wide data-integrity findings: lines pointing at accounts
/// missing from the chart, and moved accounts that no statement line
/// item claims.
fn ledger_warnings(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    ecritures: &[LedgerLine],
) -> Vec<Warning> {
    let set = compute_balances(comptes, ecritures);
    let mut warnings = set.unknown_account_warnings();

    for (code, balance) in &set.soldes {
        if balance.total_debit.is_zero() && balance.total_credit.is_zero() {
            continue;
        }
        if !taxonomies.covers(code) {
            warnings.push(Warning::uncovered_account(code));
        }
    }
    for warning in &warnings {
        warning.emit();
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ligne(id: i64, d: NaiveDate, piece: &str, compte: &str, debit: i64, credit: i64) -> LedgerLine {
        LedgerLine {
            id,
            journal_code: "VT".to_string(),
            date: d,
            numero_piece: piece.to_string(),
            compte_general: compte.to_string(),
            libelle: String::new(),
            debit: dec(debit),
            credit: dec(credit),
        }
    }

    fn plan() -> Vec<Account> {
        vec![
            Account::new("411000", "Clients"),
            Account::new("512000", "Banque"),
            Account::new("707000", "Ventes"),
        ]
    }

    /// One sale on credit in June, collected two weeks later.
    fn lignes_scenario() -> Vec<LedgerLine> {
        vec![
            ligne(1, date(2025, 6, 1), "P-1", "411000", 1000, 0),
            ligne(2, date(2025, 6, 1), "P-1", "707000", 0, 1000),
            ligne(3, date(2025, 6, 15), "P-2", "512000", 1000, 0),
            ligne(4, date(2025, 6, 15), "P-2", "411000", 0, 1000),
        ]
    }

    #[test]
    fn test_full_statement_set_on_reference_scenario() {
        let comptes = plan();
        let lignes = lignes_scenario();
        let reports = generate_reports(&comptes, &lignes, date(2025, 12, 31)).unwrap();

        // trial balance: clients settled, bank debit 1000, sales credit 1000
        let clients = reports
            .balance
            .lignes
            .iter()
            .find(|r| r.numero_compte == "411000")
            .unwrap();
        assert_eq!(clients.solde_debit, Decimal::ZERO);
        assert_eq!(clients.solde_credit, Decimal::ZERO);
        let banque = reports
            .balance
            .lignes
            .iter()
            .find(|r| r.numero_compte == "512000")
            .unwrap();
        assert_eq!(banque.solde_debit, dec(1000));
        let ventes = reports
            .balance
            .lignes
            .iter()
            .find(|r| r.numero_compte == "707000")
            .unwrap();
        assert_eq!(ventes.solde_credit, dec(1000));
        assert!(reports.balance.totaux.is_balanced());

        // income statement over the 2025 window
        let ventes_cr = reports
            .compte_de_resultat
            .section("Produits d'exploitation")
            .and_then(|s| {
                s.lignes
                    .iter()
                    .find(|l| l.libelle == "Ventes de marchandises")
            })
            .unwrap();
        assert_eq!(ventes_cr.montant_n, dec(1000));
        assert_eq!(reports.compte_de_resultat.soldes.n.benefice_ou_perte, dec(1000));

        // balance sheet: treasury 1000 against the exercise result 1000
        let tresorerie = reports
            .bilan
            .actif
            .masse("ACTIF CIRCULANT")
            .and_then(|m| m.sous_masse("Trésorerie"))
            .unwrap();
        assert_eq!(tresorerie.total_n.net, dec(1000));
        assert_eq!(reports.bilan.actif.total_n.net, dec(1000));
        assert_eq!(reports.bilan.passif.total_n.net, dec(1000));
        assert!(reports.bilan.warnings.is_empty());

        // cash flow reconciles: all of the result turned into cash
        assert_eq!(reports.tableau_flux.variation_tresorerie, dec(1000));
        assert!(reports.tableau_flux.warnings.is_empty());

        assert!(reports.warnings.is_empty());
    }

    #[test]
    fn test_statement_generation_is_idempotent() {
        let comptes = plan();
        let lignes = lignes_scenario();

        let first = generate_reports(&comptes, &lignes, date(2025, 12, 31)).unwrap();
        let second = generate_reports(&comptes, &lignes, date(2025, 12, 31)).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_uncovered_and_unknown_codes_are_flagged() {
        let mut comptes = plan();
        comptes.push(Account::new("801000", "Engagements donnés"));
        let mut lignes = lignes_scenario();
        // class-8 movement: no statement claims it
        lignes.push(ligne(5, date(2025, 7, 1), "P-3", "801000", 50, 0));
        // line on an account missing from the chart
        lignes.push(ligne(6, date(2025, 7, 2), "P-4", "999999", 10, 0));

        let reports = generate_reports(&comptes, &lignes, date(2025, 12, 31)).unwrap();
        assert!(reports
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UncoveredAccount && w.message.contains("801000")));
        assert!(reports
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnknownAccount && w.message.contains("999999")));
    }

    #[test]
    fn test_corrupt_ledger_degrades_without_panicking() {
        let comptes = plan();
        // unbalanced pièce: the posting layer should never let this
        // through, the engine still has to answer
        let lignes = vec![ligne(1, date(2025, 6, 1), "P-1", "512000", 500, 0)];
        let reports = generate_reports(&comptes, &lignes, date(2025, 12, 31)).unwrap();

        assert!(!reports.balance.totaux.is_balanced());
        assert!(reports
            .balance
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::LedgerOutOfBalance));
        assert!(reports
            .bilan
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::EquilibriumViolation));
    }
}
