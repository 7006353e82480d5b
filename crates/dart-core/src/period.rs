//! Report and period definitions.
//!
//! This module defines [`ReportCode`] for the DART report being requested,
//! [`PeriodOffset`] for the three comparative columns every DART statement
//! carries, and the "제 N 기" report-period label check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DartError;

/// DART report code (`reprt_code`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    /// Annual business report (`11011`).
    #[default]
    Annual,
    /// Half-year report (`11012`).
    HalfYear,
    /// First-quarter report (`11013`).
    FirstQuarter,
    /// Third-quarter report (`11014`).
    ThirdQuarter,
}

impl ReportCode {
    /// Returns the code DART expects in `reprt_code`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Annual => "11011",
            Self::HalfYear => "11012",
            Self::FirstQuarter => "11013",
            Self::ThirdQuarter => "11014",
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportCode {
    type Err = DartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "11011" => Ok(Self::Annual),
            "11012" => Ok(Self::HalfYear),
            "11013" => Ok(Self::FirstQuarter),
            "11014" => Ok(Self::ThirdQuarter),
            other => Err(DartError::Parse(format!("Invalid report code: {other}"))),
        }
    }
}

/// Which comparative column of a statement a value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodOffset {
    /// Current term (`thstrm`).
    Current,
    /// Prior term (`frmtrm`).
    Prior,
    /// Term before the prior one (`bfefrmtrm`).
    PriorTwo,
}

impl PeriodOffset {
    /// All offsets, current first.
    pub const ALL: [Self; 3] = [Self::Current, Self::Prior, Self::PriorTwo];

    /// Number of years this offset lies before the business year.
    #[must_use]
    pub const fn years_back(&self) -> i32 {
        match self {
            Self::Current => 0,
            Self::Prior => 1,
            Self::PriorTwo => 2,
        }
    }
}

/// Returns true if `label` is a report-period label of the form "제 N 기".
///
/// N must be a positive integer. Spaces around N are optional and anything
/// after "기" is ignored, so quarterly labels such as "제 55 기 3분기" match.
#[must_use]
pub fn is_report_period(label: &str) -> bool {
    let Some(rest) = label.trim_start().strip_prefix('제') else {
        return false;
    };
    let rest = rest.trim_start();
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    let (digits, tail) = rest.split_at(digits_end);

    let positive = digits.parse::<u64>().is_ok_and(|n| n > 0);
    positive && tail.trim_start().starts_with('기')
}
