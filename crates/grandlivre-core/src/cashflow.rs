//! Tableau des flux de trésorerie (indirect method)
//!
//! Derived arithmetically from the comparative bilan and compte de
//! résultat, without a new ledger scan. The result is cross-checked
//! against the treasury delta read directly off the bilan; a mismatch is
//! reported, never masked, since it points at a classification gap.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::comparative::{BilanComparatif, ResultatComparatif};
use crate::error::Warning;
use crate::statement::CHARGES_EXPLOITATION;

const ACTIF_IMMOBILISE: &str = "ACTIF IMMOBILISE";
const ACTIF_CIRCULANT: &str = "ACTIF CIRCULANT";
const CAPITAUX_PROPRES: &str = "CAPITAUX PROPRES";
const DETTES: &str = "DETTES";

/// Cash-flow statement, indirect method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableauFluxTresorerie {
    pub resultat_net_n: Decimal,
    pub dotations_amort_prov: Decimal,
    pub var_stocks: Decimal,
    pub var_clients: Decimal,
    pub var_fournisseurs: Decimal,
    pub flux_operationnel_net: Decimal,
    pub decaissements_immo: Decimal,
    pub flux_investissement_net: Decimal,
    pub var_capitaux_propres: Decimal,
    pub var_dettes_financieres: Decimal,
    pub flux_financement_net: Decimal,
    pub variation_tresorerie: Decimal,
    pub tresorerie_ouverture: Decimal,
    pub tresorerie_cloture: Decimal,
    pub warnings: Vec<Warning>,
}

fn sous_masse_net(bilan_side: &crate::comparative::BilanSideComparative, masse: &str, sous_masse: &str) -> (Decimal, Decimal) {
    bilan_side
        .masse(masse)
        .and_then(|m| m.sous_masse(sous_masse))
        .map(|s| (s.total_n.net, s.total_n1.net))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO))
}

fn masse_brut(bilan_side: &crate::comparative::BilanSideComparative, masse: &str) -> (Decimal, Decimal) {
    bilan_side
        .masse(masse)
        .map(|m| (m.total_n.brut, m.total_n1.brut))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO))
}

fn masse_net(bilan_side: &crate::comparative::BilanSideComparative, masse: &str) -> (Decimal, Decimal) {
    bilan_side
        .masse(masse)
        .map(|m| (m.total_n.net, m.total_n1.net))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO))
}

/// Builds the cash-flow statement from the two comparative statements.
pub fn derive_cash_flow(
    bilan: &BilanComparatif,
    resultat: &ResultatComparatif,
) -> TableauFluxTresorerie {
    let resultat_net_n = resultat.soldes.n.benefice_ou_perte;

    // non-cash expense added back to the operating flow
    let dotations_amort_prov = resultat
        .section(CHARGES_EXPLOITATION)
        .and_then(|s| s.lignes.iter().find(|l| l.libelle.starts_with("Dotations")))
        .map(|l| l.montant_n)
        .unwrap_or(Decimal::ZERO);

    // working capital: an asset increase consumes cash, a liability
    // increase provides cash
    let (stocks_n, stocks_n1) = sous_masse_net(&bilan.actif, ACTIF_CIRCULANT, "Stocks");
    let var_stocks = -(stocks_n - stocks_n1);

    let (clients_n, clients_n1) = sous_masse_net(&bilan.actif, ACTIF_CIRCULANT, "Créances");
    let var_clients = -(clients_n - clients_n1);

    let (fournisseurs_n, fournisseurs_n1) =
        sous_masse_net(&bilan.passif, DETTES, "Dettes d'exploitation");
    let var_fournisseurs = fournisseurs_n - fournisseurs_n1;

    let flux_operationnel_net =
        resultat_net_n + dotations_amort_prov + var_stocks + var_clients + var_fournisseurs;

    // capital expenditure read off the gross fixed-asset delta, net of
    // the depreciation already added back above
    let (immo_n, immo_n1) = masse_brut(&bilan.actif, ACTIF_IMMOBILISE);
    let decaissements_immo = -(immo_n - immo_n1 - dotations_amort_prov);
    let flux_investissement_net = decaissements_immo;

    let (capitaux_n, capitaux_n1) = masse_net(&bilan.passif, CAPITAUX_PROPRES);
    let var_capitaux_propres = (capitaux_n - capitaux_n1) - resultat_net_n;

    let (dettes_fin_n, dettes_fin_n1) =
        sous_masse_net(&bilan.passif, DETTES, "Dettes financières");
    let var_dettes_financieres = dettes_fin_n - dettes_fin_n1;

    let flux_financement_net = var_capitaux_propres + var_dettes_financieres;

    let variation_tresorerie =
        flux_operationnel_net + flux_investissement_net + flux_financement_net;

    let (tresorerie_cloture, tresorerie_ouverture) =
        sous_masse_net(&bilan.actif, ACTIF_CIRCULANT, "Trésorerie");

    let mut warnings = Vec::new();
    let variation_constatee = tresorerie_cloture - tresorerie_ouverture;
    if (variation_tresorerie - variation_constatee).abs() >= crate::tolerance() {
        let warning = Warning::cash_flow_mismatch(variation_tresorerie, variation_constatee);
        warning.emit();
        warnings.push(warning);
    }

    TableauFluxTresorerie {
        resultat_net_n,
        dotations_amort_prov,
        var_stocks,
        var_clients,
        var_fournisseurs,
        flux_operationnel_net,
        decaissements_immo,
        flux_investissement_net,
        var_capitaux_propres,
        var_dettes_financieres,
        flux_financement_net,
        variation_tresorerie,
        tresorerie_ouverture,
        tresorerie_cloture,
        warnings,
    }
}
