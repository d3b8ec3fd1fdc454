//! Ledger store
//!
//! The statement engine is a pure function over in-memory collections;
//! this crate is the caller-side source of those collections. A ledger
//! store hands back the full chart of accounts and every posted line,
//! unfiltered: period filtering is the engine's job. A JSON snapshot
//! store is provided, other backends implement [`LedgerStore`].

pub mod error;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use grandlivre_core::{Account, LedgerLine, Warning};

pub use error::StoreError;

/// Store reference type
pub type StoreRef = Arc<dyn LedgerStore>;

/// Full ledger snapshot as persisted by the posting layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub comptes: Vec<Account>,
    #[serde(default)]
    pub ecritures: Vec<LedgerLine>,
}

impl LedgerSnapshot {
    /// Re-checks the invariant the posting layer is supposed to enforce:
    /// within one pièce, debits and credits cancel out. One warning per
    /// violating pièce; the snapshot is returned as-is either way.
    pub fn verify_pieces(&self) -> Vec<Warning> {
        let mut totals: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
        for ligne in &self.ecritures {
            let entry = totals
                .entry(ligne.numero_piece.as_str())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += ligne.debit;
            entry.1 += ligne.credit;
        }

        let warnings: Vec<Warning> = totals
            .iter()
            .filter(|(_, (debit, credit))| debit != credit)
            .map(|(piece, (debit, credit))| Warning::unbalanced_piece(piece, *debit - *credit))
            .collect();
        for warning in &warnings {
            warning.emit();
        }
        warnings
    }
}

/// Trait for ledger stores
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Whole snapshot in one call
    async fn fetch_snapshot(&self) -> Result<LedgerSnapshot, StoreError>;

    /// All accounts of the chart
    async fn fetch_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.fetch_snapshot().await?.comptes)
    }

    /// All posted ledger lines, unfiltered
    async fn fetch_entries(&self) -> Result<Vec<LedgerLine>, StoreError> {
        Ok(self.fetch_snapshot().await?.ecritures)
    }
}

/// JSON file-backed store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn fetch_snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotFound {
                path: self.path.to_string_lossy().to_string(),
            });
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let snapshot: LedgerSnapshot =
            serde_json::from_str(&content).map_err(|e| StoreError::InvalidSnapshot {
                path: self.path.to_string_lossy().to_string(),
                message: e.to_string(),
            })?;
        log::debug!(
            "snapshot loaded: {} comptes, {} écritures",
            snapshot.comptes.len(),
            snapshot.ecritures.len()
        );
        Ok(snapshot)
    }
}
