//! Generic statement builder
//!
//! One builder walks a taxonomy against computed balances and produces a
//! statement tree with bottom-up totals. The two bilan sides and the
//! compte de résultat are parameterizations of it, not separate
//! implementations; N and N-1 reuse the same code through the
//! comparative composer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::BalanceSet;
use crate::error::Warning;
use crate::taxonomy::{contra_prefix, LineItem, Taxonomies, Taxonomy};
use crate::types::{classe_of, LedgerLine};

// ==================== Bilan ====================

/// brut / amortissements / net triple carried by every bilan node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Montants {
    pub brut: Decimal,
    pub amortissements: Decimal,
    pub net: Decimal,
}

impl Montants {
    fn accumulate(&mut self, other: &Montants) {
        self.brut += other.brut;
        self.amortissements += other.amortissements;
        self.net += other.net;
    }
}

/// One bilan line item with its gross / depreciation / net amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanLigne {
    pub libelle: String,
    pub montant_brut: Decimal,
    pub amortissements: Decimal,
    pub montant_net: Decimal,
}

impl BilanLigne {
    pub(crate) fn montants_view(&self) -> Montants {
        Montants {
            brut: self.montant_brut,
            amortissements: self.amortissements,
            net: self.montant_net,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanSousMasse {
    pub nom: String,
    pub lignes: Vec<BilanLigne>,
    pub total: Montants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanMasse {
    pub nom: String,
    pub sous_masses: Vec<BilanSousMasse>,
    pub total: Montants,
}

impl BilanMasse {
    pub fn sous_masse(&self, nom: &str) -> Option<&BilanSousMasse> {
        self.sous_masses.iter().find(|s| s.nom == nom)
    }
}

impl BilanSousMasse {
    pub fn ligne(&self, libelle: &str) -> Option<&BilanLigne> {
        self.lignes.iter().find(|l| l.libelle == libelle)
    }
}

/// One side of the bilan (actif or passif) for a single period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanSide {
    pub masses: Vec<BilanMasse>,
    pub total: Montants,
}

impl BilanSide {
    pub fn masse(&self, nom: &str) -> Option<&BilanMasse> {
        self.masses.iter().find(|m| m.nom == nom)
    }
}

/// Controls how leaf amounts are read off the balances.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Negate the raw debit-minus-credit delta. The passif is presented
    /// as the negation of the actif-style delta rather than through
    /// per-class conventions; both sides share one formula on purpose.
    pub sign_flip: bool,
    /// Carry the paired contra accounts (28x / x9) in the
    /// amortissements column and net the line.
    pub gross_net_split: bool,
}

impl BuildOptions {
    pub fn actif() -> Self {
        Self {
            sign_flip: false,
            gross_net_split: true,
        }
    }

    pub fn passif() -> Self {
        Self {
            sign_flip: true,
            gross_net_split: false,
        }
    }
}

fn raw_delta_for_prefixes(balances: &BalanceSet, prefixes: &[String]) -> Decimal {
    balances
        .soldes
        .values()
        .filter(|b| prefixes.iter().any(|p| b.compte.starts_with(p.as_str())))
        .map(|b| b.raw_delta())
        .sum()
}

/// Balance of the paired contra accounts, accumulated credit-normal so
/// that netting a line keeps actif and passif totals in equilibrium.
fn contra_balance_for_prefixes(balances: &BalanceSet, prefixes: &[String]) -> Decimal {
    let contra: Vec<String> = prefixes.iter().map(|p| contra_prefix(p)).collect();
    balances
        .soldes
        .values()
        .filter(|b| contra.iter().any(|p| b.compte.starts_with(p.as_str())))
        .map(|b| b.total_credit - b.total_debit)
        .sum()
}

fn build_bilan_ligne(
    item: &LineItem,
    balances: &BalanceSet,
    options: BuildOptions,
    resultat_exercice: Option<Decimal>,
) -> BilanLigne {
    // the result line mirrors the income statement, not class-12 soldes
    if let Some(resultat) = resultat_exercice {
        if item.comptes.iter().any(|c| c == "12") {
            return BilanLigne {
                libelle: item.libelle.clone(),
                montant_brut: resultat,
                amortissements: Decimal::ZERO,
                montant_net: resultat,
            };
        }
    }

    let raw = raw_delta_for_prefixes(balances, &item.comptes);
    let montant_brut = if options.sign_flip { -raw } else { raw };
    let (amortissements, montant_net) = if options.gross_net_split {
        let amort = contra_balance_for_prefixes(balances, &item.comptes);
        (amort, montant_brut - amort)
    } else {
        (Decimal::ZERO, montant_brut)
    };

    BilanLigne {
        libelle: item.libelle.clone(),
        montant_brut,
        amortissements,
        montant_net,
    }
}

/// Builds one side of the bilan for a single period. `resultat_exercice`
/// feeds the line mapped onto prefix "12" when given.
pub fn build_bilan_side(
    taxonomy: &Taxonomy,
    balances: &BalanceSet,
    options: BuildOptions,
    resultat_exercice: Option<Decimal>,
) -> BilanSide {
    let mut masses = Vec::new();
    let mut total = Montants::default();

    for masse in &taxonomy.masses {
        let mut sous_masses = Vec::new();
        let mut total_masse = Montants::default();

        for sous_masse in &masse.sous_masses {
            let lignes: Vec<BilanLigne> = sous_masse
                .lignes
                .iter()
                .map(|item| build_bilan_ligne(item, balances, options, resultat_exercice))
                .collect();

            let mut total_sous_masse = Montants::default();
            for ligne in &lignes {
                total_sous_masse.accumulate(&ligne.montants_view());
            }
            total_masse.accumulate(&total_sous_masse);

            sous_masses.push(BilanSousMasse {
                nom: sous_masse.nom.clone(),
                lignes,
                total: total_sous_masse,
            });
        }

        total.accumulate(&total_masse);
        masses.push(BilanMasse {
            nom: masse.nom.clone(),
            sous_masses,
            total: total_masse,
        });
    }

    BilanSide { masses, total }
}

/// Full single-period bilan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bilan {
    pub actif: BilanSide,
    pub passif: BilanSide,
    pub warnings: Vec<Warning>,
}

/// Assembles both bilan sides from one balance set and the exercise
/// result, and checks the actif/passif equilibrium. A violation is
/// reported as a warning, never corrected.
pub fn build_bilan(
    taxonomies: &Taxonomies,
    balances: &BalanceSet,
    resultat_exercice: Decimal,
    periode: &str,
) -> Bilan {
    let actif = build_bilan_side(&taxonomies.actif, balances, BuildOptions::actif(), None);
    let passif = build_bilan_side(
        &taxonomies.passif,
        balances,
        BuildOptions::passif(),
        Some(resultat_exercice),
    );

    let mut warnings = balances.unknown_account_warnings();
    if (actif.total.net - passif.total.net).abs() >= crate::tolerance() {
        warnings.push(Warning::equilibrium_violation(
            periode,
            actif.total.net,
            passif.total.net,
        ));
    }
    for warning in &warnings {
        warning.emit();
    }

    Bilan {
        actif,
        passif,
        warnings,
    }
}

// ==================== Compte de Résultat ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultatLigne {
    pub libelle: String,
    pub montant: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultatSection {
    pub nom: String,
    pub lignes: Vec<ResultatLigne>,
    pub total: Decimal,
}

/// Intermediate management balances of the compte de résultat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultatSoldes {
    pub total_produits_exploitation: Decimal,
    pub total_charges_exploitation: Decimal,
    pub resultat_exploitation: Decimal,
    pub resultat_financier: Decimal,
    pub resultat_courant_avant_impot: Decimal,
    pub benefice_ou_perte: Decimal,
}

/// Single-period compte de résultat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompteDeResultat {
    pub sections: Vec<ResultatSection>,
    pub soldes: ResultatSoldes,
    pub warnings: Vec<Warning>,
}

impl CompteDeResultat {
    pub fn section(&self, nom: &str) -> Option<&ResultatSection> {
        self.sections.iter().find(|s| s.nom == nom)
    }

    fn section_total(&self, nom: &str) -> Decimal {
        self.section(nom).map(|s| s.total).unwrap_or(Decimal::ZERO)
    }
}

pub(crate) const PRODUITS_EXPLOITATION: &str = "Produits d'exploitation";
pub(crate) const CHARGES_EXPLOITATION: &str = "Charges d'exploitation";
pub(crate) const PRODUITS_FINANCIERS: &str = "Produits financiers";
pub(crate) const CHARGES_FINANCIERES: &str = "Charges financières";

fn est_ligne_de_gestion(ligne: &LedgerLine) -> bool {
    matches!(classe_of(&ligne.compte_general), Some(6 | 7))
}

/// Builds the compte de résultat over the lines accepted by `periode`.
/// Only class 6 and 7 lines feed the sections; leaf amounts follow the
/// class sign convention, so expenses and income both read positive.
pub fn build_resultat<F>(
    taxonomy: &Taxonomy,
    comptes: &[crate::types::Account],
    lignes: &[LedgerLine],
    periode: F,
) -> CompteDeResultat
where
    F: Fn(&LedgerLine) -> bool,
{
    let balances = crate::balance::compute_balances_where(comptes, lignes, |l| {
        est_ligne_de_gestion(l) && periode(l)
    });

    let mut sections = Vec::new();
    for masse in &taxonomy.masses {
        let items = masse
            .lignes
            .iter()
            .chain(masse.sous_masses.iter().flat_map(|s| s.lignes.iter()));

        let mut total = Decimal::ZERO;
        let mut lignes_calculees = Vec::new();
        for item in items {
            let montant: Decimal = balances
                .soldes
                .values()
                .filter(|b| item.comptes.iter().any(|p| b.compte.starts_with(p.as_str())))
                .map(|b| b.solde)
                .sum();
            total += montant;
            lignes_calculees.push(ResultatLigne {
                libelle: item.libelle.clone(),
                montant,
            });
        }
        sections.push(ResultatSection {
            nom: masse.nom.clone(),
            lignes: lignes_calculees,
            total,
        });
    }

    let warnings = balances.unknown_account_warnings();
    for warning in &warnings {
        warning.emit();
    }

    let mut resultat = CompteDeResultat {
        sections,
        soldes: ResultatSoldes::default(),
        warnings,
    };

    let total_produits_exploitation = resultat.section_total(PRODUITS_EXPLOITATION);
    let total_charges_exploitation = resultat.section_total(CHARGES_EXPLOITATION);
    let resultat_exploitation = total_produits_exploitation - total_charges_exploitation;
    let resultat_financier =
        resultat.section_total(PRODUITS_FINANCIERS) - resultat.section_total(CHARGES_FINANCIERES);
    let resultat_courant_avant_impot = resultat_exploitation + resultat_financier;

    resultat.soldes = ResultatSoldes {
        total_produits_exploitation,
        total_charges_exploitation,
        resultat_exploitation,
        resultat_financier,
        resultat_courant_avant_impot,
        benefice_ou_perte: resultat_courant_avant_impot,
    };

    resultat
}
