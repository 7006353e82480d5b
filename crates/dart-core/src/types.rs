//! Core data types for DART financial statements.
//!
//! This module defines the fundamental data structures:
//!
//! - [`StatementDivision`] - Which statement a line item belongs to (`sj_div`)
//! - [`FsDivision`] - Consolidated or separate statements (`fs_div`)
//! - [`RawLineItem`] - One account row as delivered by DART
//! - [`CompanyIdentity`] - Identity fields joined in from the company directory
//! - [`Metric`] / [`FinancialMetrics`] - The canonical metric set
//! - [`FinancialRecord`] - One canonical record per slice and period offset

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DartError;
use crate::period::ReportCode;

/// Statement division of a line item (`sj_div`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementDivision {
    /// Balance sheet (`BS`).
    BalanceSheet,
    /// Statement of comprehensive income (`CIS`).
    ComprehensiveIncome,
    /// Income statement (`IS`).
    IncomeStatement,
    /// Cash flow statement (`CF`).
    CashFlow,
    /// Statement of changes in equity (`SCE`).
    ChangesInEquity,
}

impl StatementDivision {
    /// Returns the DART code for this division.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "BS",
            Self::ComprehensiveIncome => "CIS",
            Self::IncomeStatement => "IS",
            Self::CashFlow => "CF",
            Self::ChangesInEquity => "SCE",
        }
    }
}

impl fmt::Display for StatementDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StatementDivision {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BS" => Ok(Self::BalanceSheet),
            "CIS" => Ok(Self::ComprehensiveIncome),
            "IS" => Ok(Self::IncomeStatement),
            "CF" => Ok(Self::CashFlow),
            "SCE" => Ok(Self::ChangesInEquity),
            other => Err(DartError::Parse(format!(
                "Invalid statement division: {other}"
            ))),
        }
    }
}

/// Consolidated or separate financial statements (`fs_div`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsDivision {
    /// Consolidated statements (`CFS`).
    #[default]
    Consolidated,
    /// Separate statements (`OFS`).
    Separate,
}

impl FsDivision {
    /// Both kinds, consolidated first.
    pub const ALL: [Self; 2] = [Self::Consolidated, Self::Separate];

    /// Returns the DART code for this kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Consolidated => "CFS",
            Self::Separate => "OFS",
        }
    }

    /// Returns the Korean statement name DART uses (`fs_nm`).
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Consolidated => "연결재무제표",
            Self::Separate => "재무제표",
        }
    }
}

impl fmt::Display for FsDivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FsDivision {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "CFS" => Ok(Self::Consolidated),
            "OFS" => Ok(Self::Separate),
            other => Err(DartError::Parse(format!("Invalid fs division: {other}"))),
        }
    }
}

/// One account row of a DART full financial statement.
///
/// Amounts are kept as delivered (numeric text, units of 1 KRW). Rows are
/// grouped into slices by `(business_year, fs_division)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLineItem {
    /// Account name (`account_nm`).
    pub account_name: String,
    /// Standardized taxonomy id (`account_id`), e.g. `ifrs-full_Assets`.
    pub account_id: Option<String>,
    /// Statement the row belongs to.
    pub statement_division: StatementDivision,
    /// Statement name as delivered (`sj_nm`), e.g. "재무상태표".
    pub statement_name: Option<String>,
    /// Current-term label (`thstrm_nm`), e.g. "제 10 기".
    pub period_label: String,
    /// Current-term amount (`thstrm_amount`).
    pub current_amount: Option<String>,
    /// Prior-term amount (`frmtrm_amount`).
    pub prior_amount: Option<String>,
    /// Amount two terms back (`bfefrmtrm_amount`).
    pub prior2_amount: Option<String>,
    /// Business year as delivered (`bsns_year`).
    pub business_year: String,
    /// Consolidated or separate.
    pub fs_division: FsDivision,
    /// DART corporation code (`corp_code`).
    pub corp_code: String,
    /// Report the row came from.
    pub report_code: ReportCode,
    /// Receipt number of the filing (`rcept_no`).
    pub receipt_no: Option<String>,
    /// Account detail (`account_detail`), used by changes-in-equity rows.
    pub account_detail: Option<String>,
    /// Ordering within the statement (`ord`).
    pub ord: Option<String>,
    /// Currency code (`currency`).
    pub currency: Option<String>,
}

impl RawLineItem {
    /// Creates a new line item with the fields every row carries.
    #[must_use]
    pub fn new(
        account_name: impl Into<String>,
        statement_division: StatementDivision,
        period_label: impl Into<String>,
        business_year: impl Into<String>,
        fs_division: FsDivision,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_id: None,
            statement_division,
            statement_name: None,
            period_label: period_label.into(),
            current_amount: None,
            prior_amount: None,
            prior2_amount: None,
            business_year: business_year.into(),
            fs_division,
            corp_code: String::new(),
            report_code: ReportCode::default(),
            receipt_no: None,
            account_detail: None,
            ord: None,
            currency: None,
        }
    }

    /// Sets the standardized taxonomy id.
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Sets the statement name.
    #[must_use]
    pub fn with_statement_name(mut self, statement_name: impl Into<String>) -> Self {
        self.statement_name = Some(statement_name.into());
        self
    }

    /// Sets the account detail.
    #[must_use]
    pub fn with_account_detail(mut self, account_detail: impl Into<String>) -> Self {
        self.account_detail = Some(account_detail.into());
        self
    }

    /// Returns the key stores upsert this row on once it is attributed to
    /// `company_id`.
    #[must_use]
    pub fn key(&self, company_id: i64) -> LineItemKey {
        LineItemKey {
            company_id,
            corp_code: self.corp_code.clone(),
            business_year: self.business_year.clone(),
            report_code: self.report_code,
            fs_division: self.fs_division,
            statement_division: self.statement_division,
            statement_name: self.statement_name.clone(),
            account_id: self.account_id.clone(),
            account_name: self.account_name.clone(),
            account_detail: self.account_detail.clone(),
        }
    }

    /// Sets the three period amounts.
    #[must_use]
    pub fn with_amounts(
        mut self,
        current: Option<&str>,
        prior: Option<&str>,
        prior2: Option<&str>,
    ) -> Self {
        self.current_amount = current.map(str::to_string);
        self.prior_amount = prior.map(str::to_string);
        self.prior2_amount = prior2.map(str::to_string);
        self
    }

    /// Sets the corporation code.
    #[must_use]
    pub fn with_corp_code(mut self, corp_code: impl Into<String>) -> Self {
        self.corp_code = corp_code.into();
        self
    }

    /// Sets the report code.
    #[must_use]
    pub const fn with_report_code(mut self, report_code: ReportCode) -> Self {
        self.report_code = report_code;
        self
    }
}

/// Natural key a store upserts raw [`RawLineItem`]s on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemKey {
    /// Internal company id the row is attributed to.
    pub company_id: i64,
    /// DART corporation code.
    pub corp_code: String,
    /// Business year as delivered.
    pub business_year: String,
    /// Report the row came from.
    pub report_code: ReportCode,
    /// Consolidated or separate.
    pub fs_division: FsDivision,
    /// Statement the row belongs to.
    pub statement_division: StatementDivision,
    /// Statement name.
    pub statement_name: Option<String>,
    /// Standardized taxonomy id.
    pub account_id: Option<String>,
    /// Account name.
    pub account_name: String,
    /// Account detail.
    pub account_detail: Option<String>,
}

/// Company identity joined in from the company directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// Internal company id.
    pub company_id: i64,
    /// Business registration number (사업자등록번호).
    pub biz_num: Option<String>,
    /// Corporation registration number (법인등록번호).
    pub corporation_num: Option<String>,
    /// Internal cross-reference id.
    pub illu_id: Option<String>,
}

impl CompanyIdentity {
    /// Creates an identity with only the company id set.
    #[must_use]
    pub const fn new(company_id: i64) -> Self {
        Self {
            company_id,
            biz_num: None,
            corporation_num: None,
            illu_id: None,
        }
    }

    /// Sets the business registration number.
    #[must_use]
    pub fn with_biz_num(mut self, biz_num: impl Into<String>) -> Self {
        self.biz_num = Some(biz_num.into());
        self
    }

    /// Sets the corporation registration number.
    #[must_use]
    pub fn with_corporation_num(mut self, corporation_num: impl Into<String>) -> Self {
        self.corporation_num = Some(corporation_num.into());
        self
    }

    /// Sets the cross-reference id.
    #[must_use]
    pub fn with_illu_id(mut self, illu_id: impl Into<String>) -> Self {
        self.illu_id = Some(illu_id.into());
        self
    }
}

/// Canonical financial metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// 매출액.
    Sales,
    /// 매출원가.
    SalesCost,
    /// 영업이익.
    OperatingProfit,
    /// 당기순이익.
    NetProfit,
    /// 자본금.
    CapitalAmount,
    /// 자본총계.
    CapitalTotal,
    /// 부채총계.
    DebtTotal,
    /// 자산총계.
    AssetTotal,
    /// 총포괄손익.
    ComprehensiveIncome,
    /// 부채비율 (derived).
    FinancialDebtRatio,
    /// 유형자산.
    TangibleAsset,
    /// 무형자산.
    NonTangibleAsset,
    /// 유동자산.
    CurrentAsset,
    /// 비유동자산.
    NonCurrentAsset,
    /// 유동부채.
    CurrentLiabilities,
    /// 자기자본 (derived).
    NetWorth,
    /// 당좌자산 (derived).
    QuickAsset,
    /// 재고자산.
    InventoriesAsset,
    /// 매입채무.
    AccountsPayable,
    /// 매출채권.
    TradeReceivable,
    /// 단기차입금.
    ShortTermLoan,
    /// 순운전자본 (derived).
    NetWorkingCapital,
    /// 판매비와관리비.
    SellingGeneralAdministrativeExpenses,
}

impl Metric {
    /// Every metric, in record column order.
    pub const ALL: [Self; 23] = [
        Self::Sales,
        Self::SalesCost,
        Self::OperatingProfit,
        Self::NetProfit,
        Self::CapitalAmount,
        Self::CapitalTotal,
        Self::DebtTotal,
        Self::AssetTotal,
        Self::ComprehensiveIncome,
        Self::FinancialDebtRatio,
        Self::TangibleAsset,
        Self::NonTangibleAsset,
        Self::CurrentAsset,
        Self::NonCurrentAsset,
        Self::CurrentLiabilities,
        Self::NetWorth,
        Self::QuickAsset,
        Self::InventoriesAsset,
        Self::AccountsPayable,
        Self::TradeReceivable,
        Self::ShortTermLoan,
        Self::NetWorkingCapital,
        Self::SellingGeneralAdministrativeExpenses,
    ];

    /// Column name used for this metric in stores.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::SalesCost => "sales_cost",
            Self::OperatingProfit => "operating_profit",
            Self::NetProfit => "net_profit",
            Self::CapitalAmount => "capital_amount",
            Self::CapitalTotal => "capital_total",
            Self::DebtTotal => "debt_total",
            Self::AssetTotal => "asset_total",
            Self::ComprehensiveIncome => "comprehensive_income",
            Self::FinancialDebtRatio => "financial_debt_ratio",
            Self::TangibleAsset => "tangible_asset",
            Self::NonTangibleAsset => "non_tangible_asset",
            Self::CurrentAsset => "current_asset",
            Self::NonCurrentAsset => "non_current_asset",
            Self::CurrentLiabilities => "current_liabilities",
            Self::NetWorth => "net_worth",
            Self::QuickAsset => "quick_asset",
            Self::InventoriesAsset => "inventories_asset",
            Self::AccountsPayable => "accounts_payable",
            Self::TradeReceivable => "trade_receivable",
            Self::ShortTermLoan => "short_term_loan",
            Self::NetWorkingCapital => "net_working_capital",
            Self::SellingGeneralAdministrativeExpenses => {
                "selling_general_administrative_expenses"
            }
        }
    }

    /// Returns true if the metric is computed from other metrics rather than
    /// resolved from line items.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(
            self,
            Self::FinancialDebtRatio | Self::NetWorth | Self::QuickAsset | Self::NetWorkingCapital
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Values of every canonical metric for one period.
///
/// Amounts are in thousands of KRW; an empty string means the value was not
/// found or could not be derived.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    /// 매출액.
    pub sales: String,
    /// 매출원가.
    pub sales_cost: String,
    /// 영업이익.
    pub operating_profit: String,
    /// 당기순이익.
    pub net_profit: String,
    /// 자본금.
    pub capital_amount: String,
    /// 자본총계.
    pub capital_total: String,
    /// 부채총계.
    pub debt_total: String,
    /// 자산총계.
    pub asset_total: String,
    /// 총포괄손익.
    pub comprehensive_income: String,
    /// 부채비율, in percent.
    pub financial_debt_ratio: String,
    /// 유형자산.
    pub tangible_asset: String,
    /// 무형자산.
    pub non_tangible_asset: String,
    /// 유동자산.
    pub current_asset: String,
    /// 비유동자산.
    pub non_current_asset: String,
    /// 유동부채.
    pub current_liabilities: String,
    /// 자기자본.
    pub net_worth: String,
    /// 당좌자산.
    pub quick_asset: String,
    /// 재고자산.
    pub inventories_asset: String,
    /// 매입채무.
    pub accounts_payable: String,
    /// 매출채권.
    pub trade_receivable: String,
    /// 단기차입금.
    pub short_term_loan: String,
    /// 순운전자본.
    pub net_working_capital: String,
    /// 판매비와관리비.
    pub selling_general_administrative_expenses: String,
}

impl FinancialMetrics {
    fn slot(&mut self, metric: Metric) -> &mut String {
        match metric {
            Metric::Sales => &mut self.sales,
            Metric::SalesCost => &mut self.sales_cost,
            Metric::OperatingProfit => &mut self.operating_profit,
            Metric::NetProfit => &mut self.net_profit,
            Metric::CapitalAmount => &mut self.capital_amount,
            Metric::CapitalTotal => &mut self.capital_total,
            Metric::DebtTotal => &mut self.debt_total,
            Metric::AssetTotal => &mut self.asset_total,
            Metric::ComprehensiveIncome => &mut self.comprehensive_income,
            Metric::FinancialDebtRatio => &mut self.financial_debt_ratio,
            Metric::TangibleAsset => &mut self.tangible_asset,
            Metric::NonTangibleAsset => &mut self.non_tangible_asset,
            Metric::CurrentAsset => &mut self.current_asset,
            Metric::NonCurrentAsset => &mut self.non_current_asset,
            Metric::CurrentLiabilities => &mut self.current_liabilities,
            Metric::NetWorth => &mut self.net_worth,
            Metric::QuickAsset => &mut self.quick_asset,
            Metric::InventoriesAsset => &mut self.inventories_asset,
            Metric::AccountsPayable => &mut self.accounts_payable,
            Metric::TradeReceivable => &mut self.trade_receivable,
            Metric::ShortTermLoan => &mut self.short_term_loan,
            Metric::NetWorkingCapital => &mut self.net_working_capital,
            Metric::SellingGeneralAdministrativeExpenses => {
                &mut self.selling_general_administrative_expenses
            }
        }
    }

    /// Returns the value stored for `metric`.
    #[must_use]
    pub fn get(&self, metric: Metric) -> &str {
        match metric {
            Metric::Sales => &self.sales,
            Metric::SalesCost => &self.sales_cost,
            Metric::OperatingProfit => &self.operating_profit,
            Metric::NetProfit => &self.net_profit,
            Metric::CapitalAmount => &self.capital_amount,
            Metric::CapitalTotal => &self.capital_total,
            Metric::DebtTotal => &self.debt_total,
            Metric::AssetTotal => &self.asset_total,
            Metric::ComprehensiveIncome => &self.comprehensive_income,
            Metric::FinancialDebtRatio => &self.financial_debt_ratio,
            Metric::TangibleAsset => &self.tangible_asset,
            Metric::NonTangibleAsset => &self.non_tangible_asset,
            Metric::CurrentAsset => &self.current_asset,
            Metric::NonCurrentAsset => &self.non_current_asset,
            Metric::CurrentLiabilities => &self.current_liabilities,
            Metric::NetWorth => &self.net_worth,
            Metric::QuickAsset => &self.quick_asset,
            Metric::InventoriesAsset => &self.inventories_asset,
            Metric::AccountsPayable => &self.accounts_payable,
            Metric::TradeReceivable => &self.trade_receivable,
            Metric::ShortTermLoan => &self.short_term_loan,
            Metric::NetWorkingCapital => &self.net_working_capital,
            Metric::SellingGeneralAdministrativeExpenses => {
                &self.selling_general_administrative_expenses
            }
        }
    }

    /// Stores `value` for `metric`.
    pub fn set(&mut self, metric: Metric, value: impl Into<String>) {
        *self.slot(metric) = value.into();
    }
}

/// Natural key a store upserts [`FinancialRecord`]s on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Internal company id.
    pub company_id: i64,
    /// DART corporation code.
    pub corp_code: String,
    /// Period year of the record.
    pub business_year: i32,
    /// Report the record was derived from.
    pub report_code: ReportCode,
    /// Consolidated or separate.
    pub fs_division: FsDivision,
}

/// One canonical financial record: a company, a statement kind and a period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRecord {
    /// Company identity from the directory.
    pub identity: CompanyIdentity,
    /// DART corporation code.
    pub corp_code: String,
    /// Report the record was derived from.
    pub report_code: ReportCode,
    /// Consolidated or separate.
    pub fs_division: FsDivision,
    /// Period year: the slice's business year minus the period offset.
    pub business_year: i32,
    /// Period year as text (재무일자).
    pub acct_dt: String,
    /// Metric values for the period.
    pub metrics: FinancialMetrics,
}

impl FinancialRecord {
    /// Creates an empty record for a company and period.
    #[must_use]
    pub fn new(
        identity: CompanyIdentity,
        corp_code: impl Into<String>,
        report_code: ReportCode,
        fs_division: FsDivision,
        business_year: i32,
    ) -> Self {
        Self {
            identity,
            corp_code: corp_code.into(),
            report_code,
            fs_division,
            business_year,
            acct_dt: business_year.to_string(),
            metrics: FinancialMetrics::default(),
        }
    }

    /// Sets the metric values.
    #[must_use]
    pub fn with_metrics(mut self, metrics: FinancialMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// 재무제표구분코드: the DART code of the statement kind.
    #[must_use]
    pub const fn financial_decide_code(&self) -> &'static str {
        self.fs_division.code()
    }

    /// 재무제표구분명: the Korean name of the statement kind.
    #[must_use]
    pub const fn financial_decide_desc(&self) -> &'static str {
        self.fs_division.description()
    }

    /// Returns the key stores upsert this record on.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            company_id: self.identity.company_id,
            corp_code: self.corp_code.clone(),
            business_year: self.business_year,
            report_code: self.report_code,
            fs_division: self.fs_division,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_codes() {
        for division in [
            StatementDivision::BalanceSheet,
            StatementDivision::ComprehensiveIncome,
            StatementDivision::IncomeStatement,
            StatementDivision::CashFlow,
            StatementDivision::ChangesInEquity,
        ] {
            assert_eq!(division.code().parse::<StatementDivision>().unwrap(), division);
        }
        assert!("XX".parse::<StatementDivision>().is_err());

        assert_eq!("OFS".parse::<FsDivision>().unwrap(), FsDivision::Separate);
        assert_eq!(FsDivision::Consolidated.description(), "연결재무제표");
    }

    #[test]
    fn test_metric_slots_are_distinct() {
        let mut metrics = FinancialMetrics::default();
        for (i, metric) in Metric::ALL.iter().enumerate() {
            metrics.set(*metric, i.to_string());
        }
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metrics.get(*metric), i.to_string());
        }
    }

    #[test]
    fn test_derived_metrics() {
        let derived: Vec<Metric> = Metric::ALL.into_iter().filter(Metric::is_derived).collect();
        assert_eq!(
            derived,
            vec![
                Metric::FinancialDebtRatio,
                Metric::NetWorth,
                Metric::QuickAsset,
                Metric::NetWorkingCapital
            ]
        );
    }

    #[test]
    fn test_record_key() {
        let identity = CompanyIdentity::new(7).with_biz_num("1234567890");
        let record = FinancialRecord::new(
            identity,
            "00126380",
            ReportCode::Annual,
            FsDivision::Separate,
            2022,
        );
        let key = record.key();
        assert_eq!(key.company_id, 7);
        assert_eq!(key.business_year, 2022);
        assert_eq!(record.acct_dt, "2022");
        assert_eq!(record.financial_decide_code(), "OFS");
    }

    #[test]
    fn test_line_item_key_distinguishes_account_detail() {
        let row = RawLineItem::new(
            "자본금",
            StatementDivision::ChangesInEquity,
            "제 10 기",
            "2023",
            FsDivision::Consolidated,
        )
        .with_statement_name("자본변동표")
        .with_corp_code("00126380");
        let opening = row.clone().with_account_detail("기초자본");
        let closing = row.with_account_detail("기말자본");

        assert_ne!(opening.key(1), closing.key(1));
        assert_ne!(opening.key(1), opening.key(2));
        assert_eq!(opening.key(1).statement_name.as_deref(), Some("자본변동표"));
    }
}
