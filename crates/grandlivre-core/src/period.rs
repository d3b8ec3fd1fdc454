//! Closing-date resolution into ledger-line filters
//!
//! Stock-type statements (bilan, balance) accumulate every line posted up
//! to the closing date; flow-type statements (compte de résultat) only
//! see the calendar-year window. Both filters exist for exercise N and
//! for the comparative exercise N-1, one year earlier.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::LedgerLine;

/// Filter bounds derived from the exercise-N closing date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodFilters {
    pub cloture_n: NaiveDate,
    pub cloture_n1: NaiveDate,
    pub debut_n: NaiveDate,
    pub debut_n1: NaiveDate,
}

impl PeriodFilters {
    /// Derive all four filter bounds from the closing date.
    pub fn resolve(date_cloture: NaiveDate) -> Self {
        Self {
            cloture_n: date_cloture,
            cloture_n1: one_year_earlier(date_cloture),
            debut_n: first_of_january(date_cloture.year()),
            debut_n1: first_of_january(date_cloture.year() - 1),
        }
    }

    /// Every line posted up to the closing date (stock view, exercise N).
    pub fn cumulative_n(&self, ligne: &LedgerLine) -> bool {
        ligne.date <= self.cloture_n
    }

    /// Every line posted up to the comparative closing date.
    pub fn cumulative_n1(&self, ligne: &LedgerLine) -> bool {
        ligne.date <= self.cloture_n1
    }

    /// Lines inside the calendar-year window of exercise N (flow view).
    pub fn window_n(&self, ligne: &LedgerLine) -> bool {
        self.debut_n <= ligne.date && ligne.date <= self.cloture_n
    }

    /// Lines inside the calendar-year window of exercise N-1.
    pub fn window_n1(&self, ligne: &LedgerLine) -> bool {
        self.debut_n1 <= ligne.date && ligne.date <= self.cloture_n1
    }
}

/// Same month and day one year earlier. A Feb 29 closing date has no
/// counterpart in a non-leap year and clamps to Feb 28.
pub fn one_year_earlier(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() - 1, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, 2, 28))
        .unwrap_or(date)
}

fn first_of_january(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn ligne(date: NaiveDate) -> LedgerLine {
        LedgerLine {
            id: 1,
            journal_code: "OD".to_string(),
            date,
            numero_piece: "P-1".to_string(),
            compte_general: "512000".to_string(),
            libelle: "test".to_string(),
            debit: Decimal::from(10),
            credit: Decimal::ZERO,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_closing_date_is_inclusive() {
        let periods = PeriodFilters::resolve(date(2025, 12, 31));
        let on_close = ligne(date(2025, 12, 31));
        let after_close = ligne(date(2026, 1, 1));

        assert!(periods.cumulative_n(&on_close));
        assert!(periods.window_n(&on_close));
        assert!(!periods.cumulative_n(&after_close));
        assert!(!periods.window_n(&after_close));
    }

    #[test]
    fn test_window_excludes_prior_exercises() {
        let periods = PeriodFilters::resolve(date(2025, 12, 31));
        let prior = ligne(date(2024, 6, 1));

        assert!(periods.cumulative_n(&prior));
        assert!(!periods.window_n(&prior));
        assert!(periods.window_n1(&prior));
    }

    #[test]
    fn test_n1_bounds() {
        let periods = PeriodFilters::resolve(date(2025, 6, 30));
        assert_eq!(periods.cloture_n1, date(2024, 6, 30));
        assert_eq!(periods.debut_n, date(2025, 1, 1));
        assert_eq!(periods.debut_n1, date(2024, 1, 1));

        let in_window_n1 = ligne(date(2024, 3, 15));
        let after_window_n1 = ligne(date(2024, 7, 1));
        assert!(periods.window_n1(&in_window_n1));
        assert!(!periods.window_n1(&after_window_n1));
    }

    #[test]
    fn test_leap_day_clamps_to_feb_28() {
        assert_eq!(one_year_earlier(date(2024, 2, 29)), date(2023, 2, 28));
        assert_eq!(one_year_earlier(date(2024, 2, 28)), date(2023, 2, 28));

        let periods = PeriodFilters::resolve(date(2024, 2, 29));
        assert_eq!(periods.cloture_n1, date(2023, 2, 28));
        assert!(periods.cumulative_n1(&ligne(date(2023, 2, 28))));
        assert!(!periods.cumulative_n1(&ligne(date(2023, 3, 1))));
    }
}
