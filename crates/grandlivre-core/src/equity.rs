//! Tableau de variation des capitaux propres (TVCP)
//!
//! Rolls equity forward across three consecutive closing snapshots:
//! opening balance, appropriation of the prior result into reserves, net
//! income of the exercise, closing balance, repeated for two exercises.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::comparative::passif_at;
use crate::error::Warning;
use crate::period::{one_year_earlier, PeriodFilters};
use crate::statement::{build_resultat, BilanSide};
use crate::taxonomy::Taxonomies;
use crate::types::{Account, LedgerLine};

const CAPITAUX_PROPRES: &str = "CAPITAUX PROPRES";
const CAPITAL_ET_RESERVES: &str = "Capital et réserves";
const RESULTAT_ET_SUBVENTIONS: &str = "Résultat et subventions";

/// Equity position at one closing date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitauxPropres {
    pub capital: Decimal,
    pub reserves: Decimal,
    pub resultat: Decimal,
}

impl CapitauxPropres {
    pub fn total(&self) -> Decimal {
        self.capital + self.reserves + self.resultat
    }
}

/// One row of the TVCP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LigneTvcp {
    pub libelle: String,
    pub capital: Decimal,
    pub reserves: Decimal,
    pub resultat: Decimal,
    pub total: Decimal,
}

impl LigneTvcp {
    fn new(libelle: String, capital: Decimal, reserves: Decimal, resultat: Decimal) -> Self {
        Self {
            libelle,
            capital,
            reserves,
            resultat,
            total: capital + reserves + resultat,
        }
    }
}

/// Statement of changes in equity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableauVariationCapitauxPropres {
    pub lignes: Vec<LigneTvcp>,
    pub warnings: Vec<Warning>,
}

/// Reads the equity position off a single-period passif side. The
/// reserves column is everything of "Capital et réserves" that is not
/// the capital line itself.
pub fn capitaux_propres_from_passif(passif: &BilanSide) -> CapitauxPropres {
    let Some(cp) = passif.masse(CAPITAUX_PROPRES) else {
        return CapitauxPropres::default();
    };

    let capital = cp
        .sous_masse(CAPITAL_ET_RESERVES)
        .and_then(|s| s.ligne("Capital"))
        .map(|l| l.montant_net)
        .unwrap_or(Decimal::ZERO);
    let reserves = cp
        .sous_masse(CAPITAL_ET_RESERVES)
        .map(|s| s.total.net - capital)
        .unwrap_or(Decimal::ZERO);
    let resultat = cp
        .sous_masse(RESULTAT_ET_SUBVENTIONS)
        .and_then(|s| s.lignes.iter().find(|l| l.libelle.starts_with("Résultat")))
        .map(|l| l.montant_net)
        .unwrap_or(Decimal::ZERO);

    CapitauxPropres {
        capital,
        reserves,
        resultat,
    }
}

/// Builds the TVCP rows from three closing snapshots and the net incomes
/// of the two rolled exercises. `annee_n` is the year of the last close.
pub fn roll_forward(
    solde_n2: &CapitauxPropres,
    solde_n1: &CapitauxPropres,
    solde_n: &CapitauxPropres,
    resultat_net_n1: Decimal,
    resultat_net_n: Decimal,
    annee_n: i32,
) -> TableauVariationCapitauxPropres {
    let zero = Decimal::ZERO;
    let lignes = vec![
        LigneTvcp::new(
            format!("Solde au 31 décembre {}", annee_n - 2),
            solde_n2.capital,
            solde_n2.reserves,
            solde_n2.resultat,
        ),
        LigneTvcp::new(
            format!("Affectation du résultat {}", annee_n - 2),
            zero,
            solde_n2.resultat,
            -solde_n2.resultat,
        ),
        LigneTvcp::new(
            format!("Résultat net exercice {}", annee_n - 1),
            zero,
            zero,
            resultat_net_n1,
        ),
        LigneTvcp::new(
            format!("Solde au 31 décembre {}", annee_n - 1),
            solde_n1.capital,
            solde_n1.reserves,
            solde_n1.resultat,
        ),
        LigneTvcp::new(
            format!("Affectation du résultat {}", annee_n - 1),
            zero,
            solde_n1.resultat,
            -solde_n1.resultat,
        ),
        LigneTvcp::new(
            format!("Résultat net exercice {annee_n}"),
            zero,
            zero,
            resultat_net_n,
        ),
        LigneTvcp::new(
            format!("Solde au 31 décembre {annee_n}"),
            solde_n.capital,
            solde_n.reserves,
            solde_n.resultat,
        ),
    ];

    // a closing total that the appropriation and the net income cannot
    // explain means equity moved some other way (capital increase,
    // distribution); reported for review, the snapshots stay authoritative
    let mut warnings = Vec::new();
    for (periode, attendu, constate) in [
        (
            format!("{}", annee_n - 1),
            solde_n2.total() + resultat_net_n1,
            solde_n1.total(),
        ),
        (
            format!("{annee_n}"),
            solde_n1.total() + resultat_net_n,
            solde_n.total(),
        ),
    ] {
        let ecart = constate - attendu;
        if ecart.abs() >= crate::tolerance() {
            let warning = Warning::unexplained_equity_movement(&periode, ecart);
            warning.emit();
            warnings.push(warning);
        }
    }

    TableauVariationCapitauxPropres { lignes, warnings }
}

/// Full TVCP from the ledger: three passif snapshots at N, N-1 and N-2
/// closes, plus the windowed net incomes of the two exercises.
pub fn generer_tvcp(
    taxonomies: &Taxonomies,
    comptes: &[Account],
    lignes: &[LedgerLine],
    date_cloture: NaiveDate,
) -> TableauVariationCapitauxPropres {
    let cloture_n1 = one_year_earlier(date_cloture);
    let cloture_n2 = one_year_earlier(cloture_n1);

    let passif_n = passif_at(taxonomies, comptes, lignes, date_cloture);
    let passif_n1 = passif_at(taxonomies, comptes, lignes, cloture_n1);
    let passif_n2 = passif_at(taxonomies, comptes, lignes, cloture_n2);

    let periods = PeriodFilters::resolve(date_cloture);
    let resultat_net_n = build_resultat(&taxonomies.resultat, comptes, lignes, |l| {
        periods.window_n(l)
    })
    .soldes
    .benefice_ou_perte;
    let resultat_net_n1 = build_resultat(&taxonomies.resultat, comptes, lignes, |l| {
        periods.window_n1(l)
    })
    .soldes
    .benefice_ou_perte;

    roll_forward(
        &capitaux_propres_from_passif(&passif_n2),
        &capitaux_propres_from_passif(&passif_n1),
        &capitaux_propres_from_passif(&passif_n),
        resultat_net_n1,
        resultat_net_n,
        date_cloture.year(),
    )
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

    fn plan() -> Vec<Account> {
        vec![
            Account::new("101000", "Capital"),
            Account::new("106800", "Autres réserves"),
            Account::new("120000", "Résultat de l'exercice"),
            Account::new("512000", "Banque"),
            Account::new("607000", "Achats de marchandises"),
            Account::new("707000", "Ventes de marchandises"),
        ]
    }

    #[test]
    fn test_roll_forward_rows() {
        let n2 = CapitauxPropres {
            capital: dec(5000),
            reserves: dec(100),
            resultat: dec(400),
        };
        let n1 = CapitauxPropres {
            capital: dec(5000),
            reserves: dec(500),
            resultat: dec(600),
        };
        let n = CapitauxPropres {
            capital: dec(5000),
            reserves: dec(1100),
            resultat: dec(900),
        };
        let tvcp = roll_forward(&n2, &n1, &n, dec(600), dec(900), 2025);

        assert_eq!(tvcp.lignes.len(), 7);
        assert_eq!(tvcp.lignes[0].libelle, "Solde au 31 décembre 2023");
        assert_eq!(tvcp.lignes[0].total, dec(5500));

        // appropriation moves the prior result into reserves
        assert_eq!(tvcp.lignes[1].reserves, dec(400));
        assert_eq!(tvcp.lignes[1].resultat, dec(-400));
        assert_eq!(tvcp.lignes[1].total, Decimal::ZERO);

        assert_eq!(tvcp.lignes[2].resultat, dec(600));
        assert_eq!(tvcp.lignes[3].total, dec(6100));
        assert_eq!(tvcp.lignes[6].libelle, "Solde au 31 décembre 2025");
        assert_eq!(tvcp.lignes[6].total, dec(7000));
        assert!(tvcp.warnings.is_empty());
    }

    #[test]
    fn test_unexplained_movement_is_flagged() {
        let n2 = CapitauxPropres::default();
        // equity appears without any net income explaining it
        let n1 = CapitauxPropres {
            capital: dec(3000),
            reserves: Decimal::ZERO,
            resultat: Decimal::ZERO,
        };
        let n = n1;
        let tvcp = roll_forward(&n2, &n1, &n, Decimal::ZERO, Decimal::ZERO, 2025);

        assert!(tvcp
            .warnings
            .iter()
            .any(|w| w.kind == crate::WarningKind::UnexplainedEquityMovement));
    }

    #[test]
    fn test_generer_tvcp_from_ledger() {
        let comptes = plan();
        let lignes = vec![
            // 2023: capital paid in, first exercise sells 400
            ligne(1, date(2023, 1, 5), "512000", 5000, 0),
            ligne(2, date(2023, 1, 5), "101000", 0, 5000),
            ligne(3, date(2023, 6, 1), "512000", 400, 0),
            ligne(4, date(2023, 6, 1), "707000", 0, 400),
            // 2024: 2023 result appropriated into reserves, then 600 of trading
            ligne(5, date(2024, 1, 15), "120000", 400, 0),
            ligne(6, date(2024, 1, 15), "106800", 0, 400),
            ligne(7, date(2024, 3, 1), "512000", 600, 0),
            ligne(8, date(2024, 3, 1), "707000", 0, 600),
            // 2025: 2024 result appropriated, then 900 of trading
            ligne(9, date(2025, 1, 10), "120000", 600, 0),
            ligne(10, date(2025, 1, 10), "106800", 0, 600),
            ligne(11, date(2025, 3, 1), "512000", 900, 0),
            ligne(12, date(2025, 3, 1), "707000", 0, 900),
        ];
        let taxonomies = Taxonomies::builtin().unwrap();
        let tvcp = generer_tvcp(&taxonomies, &comptes, &lignes, date(2025, 12, 31));

        assert_eq!(tvcp.lignes.len(), 7);
        // closing snapshots carry the windowed net incomes
        assert_eq!(tvcp.lignes[0].capital, dec(5000));
        assert_eq!(tvcp.lignes[0].resultat, dec(400));
        assert_eq!(tvcp.lignes[2].resultat, dec(600));
        assert_eq!(tvcp.lignes[3].reserves, dec(400));
        assert_eq!(tvcp.lignes[3].total, dec(6000));
        assert_eq!(tvcp.lignes[5].resultat, dec(900));
        assert_eq!(tvcp.lignes[6].capital, dec(5000));
        assert_eq!(tvcp.lignes[6].reserves, dec(1000));
        assert_eq!(tvcp.lignes[6].resultat, dec(900));
        assert_eq!(tvcp.lignes[6].total, dec(6900));
        assert!(tvcp.warnings.is_empty());
    }
}
