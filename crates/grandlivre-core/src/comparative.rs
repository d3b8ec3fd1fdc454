//! Comparative composition: exercise N and N-1 from one immutable ledger
//!
//! The same builders run twice over differently filtered lines and the
//! resulting trees are merged node by node; identical taxonomies
//! guarantee identical shapes. Stock figures always come from cumulative
//! filters, flow figures always from the calendar-year windows, including
//! the result line injected into the passif.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::compute_balances_where;
use crate::error::{merge_warnings, Warning};
use crate::period::PeriodFilters;
use crate::statement::{
    build_bilan, build_bilan_side, build_resultat, BilanSide, BuildOptions, CompteDeResultat,
    Montants, ResultatSoldes,
};
use crate::taxonomy::Taxonomies;
use crate::types::{Account, LedgerLine};

// ==================== Comparative Bilan ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanLigneComparative {
    pub libelle: String,
    pub n: Montants,
    pub n1: Montants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanSousMasseComparative {
    pub nom: String,
    pub lignes: Vec<BilanLigneComparative>,
    pub total_n: Montants,
    pub total_n1: Montants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanMasseComparative {
    pub nom: String,
    pub sous_masses: Vec<BilanSousMasseComparative>,
    pub total_n: Montants,
    pub total_n1: Montants,
}

impl BilanMasseComparative {
    pub fn sous_masse(&self, nom: &str) -> Option<&BilanSousMasseComparative> {
        self.sous_masses.iter().find(|s| s.nom == nom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanSideComparative {
    pub masses: Vec<BilanMasseComparative>,
    pub total_n: Montants,
    pub total_n1: Montants,
}

impl BilanSideComparative {
    pub fn masse(&self, nom: &str) -> Option<&BilanMasseComparative> {
        self.masses.iter().find(|m| m.nom == nom)
    }
}

/// Comparative bilan carrying both exercises per node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilanComparatif {
    pub date_cloture_n: NaiveDate,
    pub date_cloture_n1: NaiveDate,
    pub actif: BilanSideComparative,
    pub passif: BilanSideComparative,
    pub warnings: Vec<Warning>,
}

fn zip_side(n: BilanSide, n1: BilanSide) -> BilanSideComparative {
    let masses = n
        .masses
        .into_iter()
        .zip(n1.masses)
        .map(|(masse_n, masse_n1)| BilanMasseComparative {
            nom: masse_n.nom,
            total_n: masse_n.total,
            total_n1: masse_n1.total,
            sous_masses: masse_n
                .sous_masses
                .into_iter()
                .zip(masse_n1.sous_masses)
                .map(|(sm_n, sm_n1)| BilanSousMasseComparative {
                    nom: sm_n.nom,
                    total_n: sm_n.total,
                    total_n1: sm_n1.total,
                    lignes: sm_n
                        .lignes
                        .into_iter()
                        .zip(sm_n1.lignes)
                        .map(|(ligne_n, ligne_n1)| {
                            let n = ligne_n.montants_view();
                            let n1 = ligne_n1.montants_view();
                            BilanLigneComparative {
                                libelle: ligne_n.libelle,
                                n,
                                n1,
                            }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    BilanSideComparative {
        masses,
        total_n: n.total,
        total_n1: n1.total,
    }
}

/// Runs the bilan builders for N and N-1 and merges the trees.
pub fn compose_bilan(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    lignes: &[LedgerLine],
    date_cloture: NaiveDate,
) -> BilanComparatif {
    let periods = PeriodFilters::resolve(date_cloture);

    let balances_n = compute_balances_where(comptes, lignes, |l| periods.cumulative_n(l));
    let balances_n1 = compute_balances_where(comptes, lignes, |l| periods.cumulative_n1(l));

    // flow measures are never cumulative: the injected result comes from
    // the calendar-year windows
    let resultat_n = build_resultat(&taxonomies.resultat, comptes, lignes, |l| periods.window_n(l));
    let resultat_n1 =
        build_resultat(&taxonomies.resultat, comptes, lignes, |l| periods.window_n1(l));

    let bilan_n = build_bilan(
        taxonomies,
        &balances_n,
        resultat_n.soldes.benefice_ou_perte,
        "N",
    );
    let bilan_n1 = build_bilan(
        taxonomies,
        &balances_n1,
        resultat_n1.soldes.benefice_ou_perte,
        "N-1",
    );

    let mut warnings = bilan_n.warnings;
    merge_warnings(&mut warnings, bilan_n1.warnings);

    BilanComparatif {
        date_cloture_n: periods.cloture_n,
        date_cloture_n1: periods.cloture_n1,
        actif: zip_side(bilan_n.actif, bilan_n1.actif),
        passif: zip_side(bilan_n.passif, bilan_n1.passif),
        warnings,
    }
}

/// Passif side alone, at an arbitrary closing date. Used by the equity
/// roll-forward, which needs three consecutive closing snapshots.
pub fn passif_at(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    lignes: &[LedgerLine],
    date_cloture: NaiveDate,
) -> BilanSide {
    let periods = PeriodFilters::resolve(date_cloture);
    let balances = compute_balances_where(comptes, lignes, |l| periods.cumulative_n(l));
    let resultat = build_resultat(&taxonomies.resultat, comptes, lignes, |l| periods.window_n(l));
    build_bilan_side(
        &taxonomies.passif,
        &balances,
        BuildOptions::passif(),
        Some(resultat.soldes.benefice_ou_perte),
    )
}

// ==================== Comparative Compte de Résultat ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultatLigneComparative {
    pub libelle: String,
    pub montant_n: Decimal,
    pub montant_n1: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultatSectionComparative {
    pub nom: String,
    pub lignes: Vec<ResultatLigneComparative>,
    pub total_n: Decimal,
    pub total_n1: Decimal,
}

/// Intermediate balances for both exercises.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultatSoldesComparatifs {
    pub n: ResultatSoldes,
    pub n1: ResultatSoldes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultatComparatif {
    pub date_cloture_n: NaiveDate,
    pub date_cloture_n1: NaiveDate,
    pub sections: Vec<ResultatSectionComparative>,
    pub soldes: ResultatSoldesComparatifs,
    pub warnings: Vec<Warning>,
}

impl ResultatComparatif {
    pub fn section(&self, nom: &str) -> Option<&ResultatSectionComparative> {
        self.sections.iter().find(|s| s.nom == nom)
    }
}

fn zip_resultat(n: CompteDeResultat, n1: CompteDeResultat) -> Vec<ResultatSectionComparative> {
    n.sections
        .into_iter()
        .zip(n1.sections)
        .map(|(section_n, section_n1)| ResultatSectionComparative {
            nom: section_n.nom,
            total_n: section_n.total,
            total_n1: section_n1.total,
            lignes: section_n
                .lignes
                .into_iter()
                .zip(section_n1.lignes)
                .map(|(ligne_n, ligne_n1)| ResultatLigneComparative {
                    libelle: ligne_n.libelle,
                    montant_n: ligne_n.montant,
                    montant_n1: ligne_n1.montant,
                })
                .collect(),
        })
        .collect()
}

/// Runs the compte de résultat for both calendar-year windows and merges
/// the sections.
pub fn compose_resultat(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    lignes: &[LedgerLine],
    date_cloture: NaiveDate,
) -> ResultatComparatif {
    let periods = PeriodFilters::resolve(date_cloture);

    let resultat_n = build_resultat(&taxonomies.resultat, comptes, lignes, |l| periods.window_n(l));
    let resultat_n1 =
        build_resultat(&taxonomies.resultat, comptes, lignes, |l| periods.window_n1(l));

    let mut warnings = resultat_n.warnings.clone();
    merge_warnings(&mut warnings, resultat_n1.warnings.clone());

    let soldes = ResultatSoldesComparatifs {
        n: resultat_n.soldes.clone(),
        n1: resultat_n1.soldes.clone(),
    };

    ResultatComparatif {
        date_cloture_n: periods.cloture_n,
        date_cloture_n1: periods.cloture_n1,
        sections: zip_resultat(resultat_n, resultat_n1),
        soldes,
        warnings,
    }
}
