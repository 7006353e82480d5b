//! Company registration details (기업개황) as published by DART.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DartError;

/// Market a company is listed on, from DART's `corp_cls`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingMarket {
    /// KOSPI (`Y`).
    Kospi,
    /// KOSDAQ (`K`).
    Kosdaq,
    /// KONEX (`N`).
    Konex,
    /// Not listed on an exchange (`E`).
    Other,
}

impl ListingMarket {
    /// Returns DART's `corp_cls` letter.
    #[must_use]
    pub const fn corp_cls(&self) -> &'static str {
        match self {
            Self::Kospi => "Y",
            Self::Kosdaq => "K",
            Self::Konex => "N",
            Self::Other => "E",
        }
    }

    /// Returns the listing market id (상장시장구분코드).
    #[must_use]
    pub const fn id(&self) -> u8 {
        match self {
            Self::Kospi => 1,
            Self::Kosdaq => 2,
            Self::Konex => 3,
            Self::Other => 9,
        }
    }

    /// Returns the Korean market name (상장코드명).
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Kospi => "코스피",
            Self::Kosdaq => "코스닥",
            Self::Konex => "코넥스",
            Self::Other => "대상아님",
        }
    }
}

impl fmt::Display for ListingMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for ListingMarket {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Y" => Ok(Self::Kospi),
            "K" => Ok(Self::Kosdaq),
            "N" => Ok(Self::Konex),
            "E" => Ok(Self::Other),
            other => Err(DartError::Parse(format!("Invalid corp_cls: {other}"))),
        }
    }
}

/// Registration details of one company (`company.json`).
///
/// Text fields are kept as delivered; DART sends an empty string for
/// anything it does not know. `company_id` is attached locally by matching
/// the business registration number against the company directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Internal company id, if the directory knows the company.
    pub company_id: Option<i64>,
    /// Eight-digit DART company code (`corp_code`).
    pub corp_code: String,
    /// Registered name (`corp_name`).
    pub corp_name: String,
    /// English name (`corp_name_eng`).
    pub corp_name_eng: String,
    /// Name used on the exchange (`stock_name`).
    pub stock_name: String,
    /// Six-digit ticker, empty if unlisted (`stock_code`).
    pub stock_code: String,
    /// Representative name (`ceo_nm`).
    pub ceo_name: String,
    /// Market class letter (`corp_cls`).
    pub corp_cls: String,
    /// Corporate registration number, 법인등록번호 (`jurir_no`).
    pub corporation_num: String,
    /// Business registration number, 사업자등록번호 (`bizr_no`).
    pub biz_num: String,
    /// Head office address (`adres`).
    pub address: String,
    /// Homepage (`hm_url`).
    pub homepage_url: String,
    /// Investor relations page (`ir_url`).
    pub ir_url: String,
    /// Phone number (`phn_no`).
    pub phone: String,
    /// Fax number (`fax_no`).
    pub fax: String,
    /// KSIC industry code (`induty_code`).
    pub industry_code: String,
    /// Establishment date, `YYYYMMDD` (`est_dt`).
    pub establishment_date: String,
    /// Fiscal year-end month, `MM` (`acc_mt`).
    pub acct_month: String,
}

impl CompanyInfo {
    /// Creates an otherwise empty record for a corp code.
    #[must_use]
    pub fn new(corp_code: impl Into<String>) -> Self {
        Self {
            corp_code: corp_code.into(),
            ..Default::default()
        }
    }

    /// Sets the internal company id.
    #[must_use]
    pub const fn with_company_id(mut self, company_id: i64) -> Self {
        self.company_id = Some(company_id);
        self
    }

    /// Sets the business registration number.
    #[must_use]
    pub fn with_biz_num(mut self, biz_num: impl Into<String>) -> Self {
        self.biz_num = biz_num.into();
        self
    }

    /// Sets the market class letter.
    #[must_use]
    pub fn with_corp_cls(mut self, corp_cls: impl Into<String>) -> Self {
        self.corp_cls = corp_cls.into();
        self
    }

    /// Returns the listing market, or `None` for an unknown class letter.
    #[must_use]
    pub fn listing_market(&self) -> Option<ListingMarket> {
        self.corp_cls.parse().ok()
    }

    /// Returns true if the company has a stock code.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        !self.stock_code.trim().is_empty()
    }
}
