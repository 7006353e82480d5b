//! Concept resolution against a statement slice.
//!
//! A concept is looked up by a primary key (account name or taxonomy id) in a
//! primary statement division. When the primary key has no row, an ordered
//! list of alternatives is tried: alternative names, then alternative ids,
//! then the primary key in alternative divisions. The first alternative with
//! a non-empty current-term amount wins.

use dart_core::{PeriodOffset, RawLineItem, StatementDivision, StatementSlice, is_report_period};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::normalize::normalize;

/// How a concept is matched against a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConceptKey<'a> {
    /// Match on `account_nm`.
    Name(&'a str),
    /// Match on `account_id`.
    Id(&'a str),
}

impl ConceptKey<'_> {
    fn matches(&self, row: &RawLineItem) -> bool {
        match self {
            Self::Name(name) => row.account_name.trim() == *name,
            Self::Id(id) => row.account_id.as_deref() == Some(*id),
        }
    }
}

/// Primary key plus fallbacks for one concept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConceptSpec<'a> {
    /// Primary lookup key.
    pub key: ConceptKey<'a>,
    /// Division the primary key is searched in.
    pub division: StatementDivision,
    /// Account names tried in the primary division.
    pub alt_names: &'a [&'a str],
    /// Taxonomy ids tried in the primary division.
    pub alt_ids: &'a [&'a str],
    /// Divisions the primary key is retried in.
    pub alt_divisions: &'a [StatementDivision],
}

impl<'a> ConceptSpec<'a> {
    /// Creates a spec with no fallbacks.
    #[must_use]
    pub const fn new(key: ConceptKey<'a>, division: StatementDivision) -> Self {
        Self {
            key,
            division,
            alt_names: &[],
            alt_ids: &[],
            alt_divisions: &[],
        }
    }

    /// Sets the alternative account names.
    #[must_use]
    pub const fn alt_names(mut self, names: &'a [&'a str]) -> Self {
        self.alt_names = names;
        self
    }

    /// Sets the alternative taxonomy ids.
    #[must_use]
    pub const fn alt_ids(mut self, ids: &'a [&'a str]) -> Self {
        self.alt_ids = ids;
        self
    }

    /// Sets the alternative divisions.
    #[must_use]
    pub const fn alt_divisions(mut self, divisions: &'a [StatementDivision]) -> Self {
        self.alt_divisions = divisions;
        self
    }

    /// Returns the lookup candidates in the order they are tried, primary first.
    #[must_use]
    pub fn candidates(&self) -> Vec<Candidate<'a>> {
        let capacity =
            1 + self.alt_names.len() + self.alt_ids.len() + self.alt_divisions.len();
        let mut candidates = Vec::with_capacity(capacity);
        candidates.push(Candidate {
            key: self.key,
            division: self.division,
        });
        candidates.extend(self.alt_names.iter().map(|name| Candidate {
            key: ConceptKey::Name(*name),
            division: self.division,
        }));
        candidates.extend(self.alt_ids.iter().map(|id| Candidate {
            key: ConceptKey::Id(*id),
            division: self.division,
        }));
        candidates.extend(self.alt_divisions.iter().map(|division| Candidate {
            key: self.key,
            division: *division,
        }));
        candidates
    }
}

/// A single `(key, division)` lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Key to match.
    pub key: ConceptKey<'a>,
    /// Division to search.
    pub division: StatementDivision,
}

impl Candidate<'_> {
    /// Finds the first row of the slice matching this candidate.
    ///
    /// Only rows whose current-term label is a report period ("제 N 기") are
    /// considered. Ties go to the earliest row in source order.
    #[must_use]
    pub fn lookup(&self, slice: &StatementSlice<'_>) -> Option<ResolvedMetric> {
        slice
            .rows()
            .iter()
            .find(|row| {
                row.statement_division == self.division
                    && self.key.matches(row)
                    && is_report_period(&row.period_label)
            })
            .map(|row| ResolvedMetric::from_row(row))
    }
}

/// Normalized current, prior and prior-two amounts of one concept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetric {
    /// Current-term amount.
    pub current: String,
    /// Prior-term amount.
    pub prior: String,
    /// Amount two terms back.
    pub prior2: String,
}

impl ResolvedMetric {
    /// The not-found triple.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            current: String::new(),
            prior: String::new(),
            prior2: String::new(),
        }
    }

    /// Normalizes all three amounts of a row.
    #[must_use]
    pub fn from_row(row: &RawLineItem) -> Self {
        Self {
            current: normalize(row.current_amount.as_deref()),
            prior: normalize(row.prior_amount.as_deref()),
            prior2: normalize(row.prior2_amount.as_deref()),
        }
    }

    /// Returns the amount for a period offset.
    #[must_use]
    pub fn get(&self, offset: PeriodOffset) -> &str {
        match offset {
            PeriodOffset::Current => &self.current,
            PeriodOffset::Prior => &self.prior,
            PeriodOffset::PriorTwo => &self.prior2,
        }
    }

    /// Returns true if all three amounts are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.prior.is_empty() && self.prior2.is_empty()
    }
}

/// Resolves a concept in a slice.
///
/// The primary candidate is accepted as soon as a row matches, even if its
/// current amount is empty. Alternatives are accepted only with a non-empty
/// current amount. Returns [`ResolvedMetric::empty`] if nothing qualifies.
#[must_use]
pub fn resolve(slice: &StatementSlice<'_>, spec: &ConceptSpec<'_>) -> ResolvedMetric {
    let candidates = spec.candidates();
    let Some((primary, alternatives)) = candidates.split_first() else {
        return ResolvedMetric::empty();
    };

    if let Some(found) = primary.lookup(slice) {
        return found;
    }

    for candidate in alternatives {
        match candidate.lookup(slice) {
            Some(found) if !found.current.is_empty() => {
                trace!(
                    primary = ?spec.key,
                    key = ?candidate.key,
                    division = %candidate.division,
                    "Resolved concept through fallback"
                );
                return found;
            }
            _ => continue,
        }
    }

    trace!(
        primary = ?spec.key,
        division = %spec.division,
        year = slice.business_year(),
        "Concept not found in slice"
    );
    ResolvedMetric::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_core::{FsDivision, LineItemTable};

    const BS: StatementDivision = StatementDivision::BalanceSheet;
    const IS: StatementDivision = StatementDivision::IncomeStatement;
    const CIS: StatementDivision = StatementDivision::ComprehensiveIncome;

    fn row(name: &str, division: StatementDivision, current: &str) -> RawLineItem {
        RawLineItem::new(name, division, "제 10 기", "2023", FsDivision::Consolidated)
            .with_amounts(Some(current), Some("900000"), Some("800000"))
    }

    fn resolve_in(rows: Vec<RawLineItem>, spec: &ConceptSpec<'_>) -> ResolvedMetric {
        let table = LineItemTable::from_rows(rows);
        let slices = table.slices();
        resolve(&slices[0], spec)
    }

    #[test]
    fn test_primary_name_match() {
        let spec = ConceptSpec::new(ConceptKey::Name("자산총계"), BS);
        let found = resolve_in(vec![row("자산총계", BS, "1000000")], &spec);
        assert_eq!(found.current, "1000");
        assert_eq!(found.prior, "900");
        assert_eq!(found.prior2, "800");
    }

    #[test]
    fn test_primary_id_match() {
        let spec = ConceptSpec::new(ConceptKey::Id("ifrs-full_Assets"), BS);
        let rows = vec![
            row("자산 합계", BS, "2000000").with_account_id("ifrs-full_Assets"),
            row("자산총계", BS, "1000000"),
        ];
        assert_eq!(resolve_in(rows, &spec).current, "2000");
    }

    #[test]
    fn test_first_row_wins_on_ties() {
        let spec = ConceptSpec::new(ConceptKey::Name("자산총계"), BS);
        let rows = vec![row("자산총계", BS, "1000000"), row("자산총계", BS, "7000000")];
        assert_eq!(resolve_in(rows, &spec).current, "1000");
    }

    #[test]
    fn test_division_is_respected() {
        let spec = ConceptSpec::new(ConceptKey::Name("매출액"), IS);
        let found = resolve_in(vec![row("매출액", CIS, "1000000")], &spec);
        assert_eq!(found, ResolvedMetric::empty());
    }

    #[test]
    fn test_non_report_period_rows_are_ignored() {
        let spec = ConceptSpec::new(ConceptKey::Name("자산총계"), BS);
        let mut stale = row("자산총계", BS, "1000000");
        stale.period_label = "2023.12.31 현재".to_string();
        assert!(resolve_in(vec![stale], &spec).is_empty());
    }

    #[test]
    fn test_alias_order_is_respected() {
        let spec = ConceptSpec::new(ConceptKey::Id("ifrs-full_Revenue"), IS)
            .alt_names(&["매출액", "영업수익"]);
        let rows = vec![row("영업수익", IS, "3000000"), row("매출액", IS, "5000000")];
        assert_eq!(resolve_in(rows, &spec).current, "5000");
    }

    #[test]
    fn test_alt_ids_follow_alt_names() {
        let spec = ConceptSpec::new(ConceptKey::Name("단기차입금"), BS)
            .alt_names(&["단기차입부채"])
            .alt_ids(&["ifrs-full_ShorttermBorrowings"]);
        let rows = vec![
            row("차입금(단기)", BS, "4000000").with_account_id("ifrs-full_ShorttermBorrowings"),
        ];
        assert_eq!(resolve_in(rows, &spec).current, "4000");
    }

    #[test]
    fn test_alt_division_fallback() {
        let spec = ConceptSpec::new(ConceptKey::Name("매출액"), IS).alt_divisions(&[CIS]);
        let found = resolve_in(vec![row("매출액", CIS, "1000000")], &spec);
        assert_eq!(found.current, "1000");
    }

    #[test]
    fn test_alternative_with_empty_current_is_skipped() {
        let spec = ConceptSpec::new(ConceptKey::Id("ifrs-full_Revenue"), IS)
            .alt_names(&["매출액", "영업수익"]);
        let mut empty = row("매출액", IS, "");
        empty.current_amount = None;
        let rows = vec![empty, row("영업수익", IS, "3000000")];
        assert_eq!(resolve_in(rows, &spec).current, "3000");
    }

    #[test]
    fn test_primary_with_empty_current_is_kept() {
        let spec = ConceptSpec::new(ConceptKey::Name("매출액"), IS).alt_names(&["영업수익"]);
        let mut empty = row("매출액", IS, "");
        empty.current_amount = None;
        let rows = vec![empty, row("영업수익", IS, "3000000")];
        let found = resolve_in(rows, &spec);
        assert_eq!(found.current, "");
        assert_eq!(found.prior, "900");
    }

    #[test]
    fn test_exhausted_alternatives_yield_empty() {
        let spec = ConceptSpec::new(ConceptKey::Name("매출액"), IS)
            .alt_names(&["영업수익"])
            .alt_divisions(&[CIS]);
        let found = resolve_in(vec![row("자산총계", BS, "1000000")], &spec);
        assert_eq!(found, ResolvedMetric::empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let spec = ConceptSpec::new(ConceptKey::Id("ifrs-full_Revenue"), IS)
            .alt_names(&["매출액"])
            .alt_divisions(&[CIS]);
        let table = LineItemTable::from_rows(vec![row("매출액", IS, "1234567")]);
        let slices = table.slices();
        let first = resolve(&slices[0], &spec);
        let second = resolve(&slices[0], &spec);
        assert_eq!(first, second);
        assert_eq!(first.current, "1234");
    }

    #[test]
    fn test_candidate_order() {
        let spec = ConceptSpec::new(ConceptKey::Name("a"), IS)
            .alt_names(&["b"])
            .alt_ids(&["c"])
            .alt_divisions(&[CIS]);
        let keys: Vec<(ConceptKey<'_>, StatementDivision)> =
            spec.candidates().iter().map(|c| (c.key, c.division)).collect();
        assert_eq!(
            keys,
            vec![
                (ConceptKey::Name("a"), IS),
                (ConceptKey::Name("b"), IS),
                (ConceptKey::Id("c"), IS),
                (ConceptKey::Name("a"), CIS),
            ]
        );
    }

    #[test]
    fn test_resolved_metric_offsets() {
        let metric = ResolvedMetric {
            current: "1".into(),
            prior: "2".into(),
            prior2: "3".into(),
        };
        assert_eq!(metric.get(PeriodOffset::Current), "1");
        assert_eq!(metric.get(PeriodOffset::Prior), "2");
        assert_eq!(metric.get(PeriodOffset::PriorTwo), "3");
    }
}
