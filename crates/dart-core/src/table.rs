//! Raw line-item tables and their statement slices.
//!
//! A [`LineItemTable`] holds every account row fetched for one company. The
//! preprocessing engine never looks at the table as a whole; it works on
//! [`StatementSlice`]s, the rows sharing one `(business_year, fs_division)`
//! pair, in the order DART delivered them.

use polars::prelude::{DataFrame, StringChunked};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DartError, Result},
    period::ReportCode,
    types::{FsDivision, RawLineItem, StatementDivision},
};

/// Account rows for one company, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemTable {
    rows: Vec<RawLineItem>,
}

impl LineItemTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Creates a table from rows.
    #[must_use]
    pub const fn from_rows(rows: Vec<RawLineItem>) -> Self {
        Self { rows }
    }

    /// Builds a table from a DataFrame using DART's column names.
    ///
    /// `account_nm`, `sj_div`, `thstrm_nm`, `bsns_year` and `fs_div` are
    /// required. `account_id`, `thstrm_amount`, `frmtrm_amount`,
    /// `bfefrmtrm_amount`, `corp_code`, `reprt_code`, `rcept_no`, `sj_nm`,
    /// `account_detail`, `ord` and `currency` are optional; a missing column
    /// leaves the field absent.
    ///
    /// # Errors
    /// Returns [`DartError::Parse`] if a required column is missing, a column
    /// is not a string column, or a division/report code is invalid.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let account_nm = required_column(df, "account_nm")?;
        let sj_div = required_column(df, "sj_div")?;
        let thstrm_nm = required_column(df, "thstrm_nm")?;
        let bsns_year = required_column(df, "bsns_year")?;
        let fs_div = required_column(df, "fs_div")?;

        let account_id = optional_column(df, "account_id")?;
        let thstrm_amount = optional_column(df, "thstrm_amount")?;
        let frmtrm_amount = optional_column(df, "frmtrm_amount")?;
        let bfefrmtrm_amount = optional_column(df, "bfefrmtrm_amount")?;
        let corp_code = optional_column(df, "corp_code")?;
        let reprt_code = optional_column(df, "reprt_code")?;
        let rcept_no = optional_column(df, "rcept_no")?;
        let account_detail = optional_column(df, "account_detail")?;
        let sj_nm = optional_column(df, "sj_nm")?;
        let ord = optional_column(df, "ord")?;
        let currency = optional_column(df, "currency")?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let statement_division: StatementDivision = sj_div
                .get(i)
                .ok_or_else(|| DartError::Parse(format!("Missing sj_div at row {i}")))?
                .parse()?;
            let fs_division: FsDivision = fs_div
                .get(i)
                .ok_or_else(|| DartError::Parse(format!("Missing fs_div at row {i}")))?
                .parse()?;
            let report_code = match cell(reprt_code, i) {
                Some(code) => code.parse()?,
                None => ReportCode::default(),
            };

            rows.push(RawLineItem {
                account_name: account_nm.get(i).unwrap_or_default().to_string(),
                account_id: cell(account_id, i).map(str::to_string),
                statement_division,
                statement_name: cell(sj_nm, i).map(str::to_string),
                period_label: thstrm_nm.get(i).unwrap_or_default().to_string(),
                current_amount: cell(thstrm_amount, i).map(str::to_string),
                prior_amount: cell(frmtrm_amount, i).map(str::to_string),
                prior2_amount: cell(bfefrmtrm_amount, i).map(str::to_string),
                business_year: bsns_year.get(i).unwrap_or_default().to_string(),
                fs_division,
                corp_code: cell(corp_code, i).unwrap_or_default().to_string(),
                report_code,
                receipt_no: cell(rcept_no, i).map(str::to_string),
                account_detail: cell(account_detail, i).map(str::to_string),
                ord: cell(ord, i).map(str::to_string),
                currency: cell(currency, i).map(str::to_string),
            });
        }

        Ok(Self { rows })
    }

    /// Appends a row.
    pub fn push(&mut self, row: RawLineItem) {
        self.rows.push(row);
    }

    /// Appends every row of another table.
    pub fn append(&mut self, other: Self) {
        self.rows.extend(other.rows);
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns an iterator over the rows.
    pub fn iter(&self) -> impl Iterator<Item = &RawLineItem> {
        self.rows.iter()
    }

    /// Partitions the rows into slices keyed by `(business_year, fs_division)`.
    ///
    /// Slices appear in the order their key first occurs; rows inside a slice
    /// keep source order.
    #[must_use]
    pub fn slices(&self) -> Vec<StatementSlice<'_>> {
        let mut slices: Vec<StatementSlice<'_>> = Vec::new();
        for row in &self.rows {
            let existing = slices.iter().position(|s| {
                s.business_year == row.business_year && s.fs_division == row.fs_division
            });
            match existing {
                Some(i) => slices[i].rows.push(row),
                None => slices.push(StatementSlice {
                    business_year: &row.business_year,
                    fs_division: row.fs_division,
                    rows: vec![row],
                }),
            }
        }
        slices
    }
}

impl FromIterator<RawLineItem> for LineItemTable {
    fn from_iter<I: IntoIterator<Item = RawLineItem>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LineItemTable {
    type Item = RawLineItem;
    type IntoIter = std::vec::IntoIter<RawLineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// The rows of one `(business_year, fs_division)` pair.
#[derive(Clone, Debug)]
pub struct StatementSlice<'a> {
    business_year: &'a str,
    fs_division: FsDivision,
    rows: Vec<&'a RawLineItem>,
}

impl<'a> StatementSlice<'a> {
    /// Creates a slice from borrowed rows.
    #[must_use]
    pub const fn new(
        business_year: &'a str,
        fs_division: FsDivision,
        rows: Vec<&'a RawLineItem>,
    ) -> Self {
        Self {
            business_year,
            fs_division,
            rows,
        }
    }

    /// Business year as delivered.
    #[must_use]
    pub const fn business_year(&self) -> &'a str {
        self.business_year
    }

    /// Consolidated or separate.
    #[must_use]
    pub const fn fs_division(&self) -> FsDivision {
        self.fs_division
    }

    /// Rows in source order.
    #[must_use]
    pub fn rows(&self) -> &[&'a RawLineItem] {
        &self.rows
    }

    /// Corporation code of the first row.
    #[must_use]
    pub fn corp_code(&self) -> &'a str {
        self.rows.first().map_or("", |r| r.corp_code.as_str())
    }

    /// Report code of the first row.
    #[must_use]
    pub fn report_code(&self) -> ReportCode {
        self.rows.first().map(|r| r.report_code).unwrap_or_default()
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    optional_column(df, name)?
        .ok_or_else(|| DartError::Parse(format!("Missing required column: {name}")))
}

fn optional_column<'a>(df: &'a DataFrame, name: &str) -> Result<Option<&'a StringChunked>> {
    match df.column(name) {
        Ok(column) => column
            .str()
            .map(Some)
            .map_err(|e| DartError::Parse(format!("Column {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn cell(column: Option<&StringChunked>, i: usize) -> Option<&str> {
    column.and_then(|c| c.get(i))
}
