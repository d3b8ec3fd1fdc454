//! Annexe: fixed-asset movements of the exercise
//!
//! Gross class-2 values rolled from the opening balance through the
//! acquisitions and disposals of the exercise.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::PeriodFilters;
use crate::types::LedgerLine;

/// Gross fixed-asset roll of one exercise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableauImmobilisations {
    pub brut_debut: Decimal,
    pub augmentations: Decimal,
    pub diminutions: Decimal,
    pub brut_fin: Decimal,
}

/// Sums class-2 movements: debits of the exercise window are
/// acquisitions, credits are disposals, everything prior feeds the
/// opening balance.
pub fn tableau_immobilisations(
    lignes: &[LedgerLine],
    date_cloture: NaiveDate,
) -> TableauImmobilisations {
    let periods = PeriodFilters::resolve(date_cloture);

    let mut brut_debut = Decimal::ZERO;
    let mut augmentations = Decimal::ZERO;
    let mut diminutions = Decimal::ZERO;

    for ligne in lignes {
        if !ligne.compte_general.starts_with('2') {
            continue;
        }
        if ligne.date < periods.debut_n {
            brut_debut += ligne.debit - ligne.credit;
        } else if periods.window_n(ligne) {
            augmentations += ligne.debit;
            diminutions += ligne.credit;
        }
    }

    TableauImmobilisations {
        brut_debut,
        augmentations,
        diminutions,
        brut_fin: brut_debut + augmentations - diminutions,
    }
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

    fn ligne(id: i64, d: NaiveDate, compte: &str, debit: i64, credit: i64) -> LedgerLine {
        LedgerLine {
            id,
            journal_code: "OD".to_string(),
            date: d,
            numero_piece: format!("P-{id}"),
            compte_general: compte.to_string(),
            libelle: String::new(),
            debit: dec(debit),
            credit: dec(credit),
        }
    }

    #[test]
    fn test_roll_from_opening_to_closing() {
        let lignes = vec![
            // opening stock of machines
            ligne(1, date(2024, 6, 1), "215000", 8000, 0),
            // exercise: one acquisition, one disposal
            ligne(2, date(2025, 2, 1), "215000", 3000, 0),
            ligne(3, date(2025, 9, 1), "215000", 0, 1000),
            // non class-2 noise, and a movement after closing
            ligne(4, date(2025, 3, 1), "512000", 500, 0),
            ligne(5, date(2026, 1, 15), "215000", 700, 0),
        ];
        let table = tableau_immobilisations(&lignes, date(2025, 12, 31));

        assert_eq!(table.brut_debut, dec(8000));
        assert_eq!(table.augmentations, dec(3000));
        assert_eq!(table.diminutions, dec(1000));
        assert_eq!(table.brut_fin, dec(10000));
    }
}
