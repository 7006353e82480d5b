//! Wire formats of `fnlttSinglAcntAll.json` and `company.json` and their
//! mapping into core types.

use dart_core::{
    CompanyInfo, DartError, LineItemTable, RawLineItem, ReportCode, Result, StatementDivision,
};
use serde::Deserialize;
use tracing::debug;

use crate::StatementRequest;

/// Status of a successful response.
pub const STATUS_OK: &str = "000";

/// Status DART returns when there is no data for the query.
pub const STATUS_NO_DATA: &str = "013";

/// Status DART returns when the daily request quota is exhausted.
pub const STATUS_RATE_LIMITED: &str = "020";

/// Statuses DART returns for unregistered, blocked or unauthorized keys.
pub const STATUS_AUTH_FAILED: [&str; 3] = ["010", "011", "012"];

/// `account_id` placeholder for accounts without a standard taxonomy id.
pub const NO_STANDARD_ACCOUNT: &str = "-표준계정코드 미사용-";

/// Response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) list: Vec<StatementRow>,
}

/// One account row.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementRow {
    rcept_no: Option<String>,
    reprt_code: Option<String>,
    bsns_year: Option<String>,
    corp_code: Option<String>,
    sj_div: String,
    sj_nm: Option<String>,
    account_id: Option<String>,
    account_nm: String,
    account_detail: Option<String>,
    thstrm_nm: Option<String>,
    thstrm_amount: Option<String>,
    frmtrm_amount: Option<String>,
    bfefrmtrm_amount: Option<String>,
    ord: Option<String>,
    currency: Option<String>,
}

/// `company.json` response: the status envelope and the company fields share
/// one flat object.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CompanyResponse {
    status: String,
    message: String,
    corp_code: String,
    corp_name: String,
    corp_name_eng: String,
    stock_name: String,
    stock_code: String,
    ceo_nm: String,
    corp_cls: String,
    jurir_no: String,
    bizr_no: String,
    adres: String,
    hm_url: String,
    ir_url: String,
    phn_no: String,
    fax_no: String,
    induty_code: String,
    est_dt: String,
    acc_mt: String,
}

impl From<CompanyResponse> for CompanyInfo {
    fn from(r: CompanyResponse) -> Self {
        Self {
            company_id: None,
            corp_code: r.corp_code,
            corp_name: r.corp_name,
            corp_name_eng: r.corp_name_eng,
            stock_name: r.stock_name,
            stock_code: r.stock_code,
            ceo_name: r.ceo_nm,
            corp_cls: r.corp_cls,
            corporation_num: r.jurir_no,
            biz_num: r.bizr_no,
            address: r.adres,
            homepage_url: r.hm_url,
            ir_url: r.ir_url,
            phone: r.phn_no,
            fax: r.fax_no,
            industry_code: r.induty_code,
            establishment_date: r.est_dt,
            acct_month: r.acc_mt,
        }
    }
}

/// Checks a DART status code.
///
/// Returns `Ok(true)` if the response carries data and `Ok(false)` for the
/// no-data status.
///
/// # Errors
/// Returns [`DartError::AuthenticationFailed`], [`DartError::RateLimited`] or
/// [`DartError::Api`] depending on the status.
pub fn check_status(status: &str, message: &str) -> Result<bool> {
    match status {
        STATUS_OK => Ok(true),
        STATUS_NO_DATA => Ok(false),
        STATUS_RATE_LIMITED => Err(DartError::RateLimited { retry_after: None }),
        s if STATUS_AUTH_FAILED.contains(&s) => {
            Err(DartError::AuthenticationFailed(format!("{s}: {message}")))
        }
        s => Err(DartError::Api {
            status: s.to_string(),
            message: message.to_string(),
        }),
    }
}

/// Parses a response body into a line-item table.
///
/// Fields the rows omit (`bsns_year`, `corp_code`, `reprt_code`) fall back to
/// the request. `fs_div` is not part of the rows and always comes from the
/// request. Rows with an unknown `sj_div` are dropped.
///
/// # Errors
/// Returns [`DartError::Parse`] for malformed JSON and the errors of
/// [`check_status`].
pub fn parse_statement(body: &str, request: &StatementRequest) -> Result<LineItemTable> {
    let response: StatementResponse = serde_json::from_str(body)
        .map_err(|e| DartError::Parse(format!("Failed to parse statement response: {e}")))?;

    if !check_status(&response.status, &response.message)? {
        debug!(
            corp_code = %request.corp_code,
            year = request.business_year,
            fs_div = %request.fs_division,
            "No statement data"
        );
        return Ok(LineItemTable::new());
    }

    Ok(response
        .list
        .into_iter()
        .filter_map(|row| row.into_line_item(request))
        .collect())
}

/// Parses a `company.json` body.
///
/// Returns `Ok(None)` when DART has no data for the corp code. `company_id`
/// is left unset.
///
/// # Errors
/// Returns [`DartError::Parse`] for malformed JSON and the errors of
/// [`check_status`].
pub fn parse_company_info(body: &str) -> Result<Option<CompanyInfo>> {
    let response: CompanyResponse = serde_json::from_str(body)
        .map_err(|e| DartError::Parse(format!("Failed to parse company response: {e}")))?;

    if !check_status(&response.status, &response.message)? {
        debug!("No company data");
        return Ok(None);
    }
    Ok(Some(response.into()))
}

impl StatementRow {
    fn into_line_item(self, request: &StatementRequest) -> Option<RawLineItem> {
        let statement_division = match self.sj_div.parse::<StatementDivision>() {
            Ok(division) => division,
            Err(e) => {
                debug!(account = %self.account_nm, error = %e, "Dropping row");
                return None;
            }
        };

        let report_code = self
            .reprt_code
            .as_deref()
            .and_then(|c| c.parse::<ReportCode>().ok())
            .unwrap_or(request.report_code);

        Some(RawLineItem {
            account_name: self.account_nm,
            account_id: self
                .account_id
                .filter(|id| !id.trim().is_empty() && id != NO_STANDARD_ACCOUNT),
            statement_division,
            statement_name: self.sj_nm.filter(|name| !name.trim().is_empty()),
            period_label: self.thstrm_nm.unwrap_or_default(),
            current_amount: self.thstrm_amount,
            prior_amount: self.frmtrm_amount,
            prior2_amount: self.bfefrmtrm_amount,
            business_year: self
                .bsns_year
                .unwrap_or_else(|| request.business_year.to_string()),
            fs_division: request.fs_division,
            corp_code: self.corp_code.unwrap_or_else(|| request.corp_code.clone()),
            report_code,
            receipt_no: self.rcept_no,
            account_detail: self.account_detail,
            ord: self.ord,
            currency: self.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dart_core::FsDivision;

    const SAMSUNG_2023: &str = r#"{
        "status": "000",
        "message": "정상",
        "list": [
            {
                "rcept_no": "20240312000736",
                "reprt_code": "11011",
                "bsns_year": "2023",
                "corp_code": "00126380",
                "sj_div": "BS",
                "sj_nm": "재무상태표",
                "account_id": "ifrs-full_Equity",
                "account_nm": "자본총계",
                "account_detail": "-",
                "thstrm_nm": "제 55 기",
                "thstrm_amount": "363677865000000",
                "frmtrm_nm": "제 54 기",
                "frmtrm_amount": "354749604000000",
                "bfefrmtrm_nm": "제 53 기",
                "bfefrmtrm_amount": "305147594000000",
                "ord": "25",
                "currency": "KRW"
            },
            {
                "rcept_no": "20240312000736",
                "reprt_code": "11011",
                "bsns_year": "2023",
                "corp_code": "00126380",
                "sj_div": "CIS",
                "sj_nm": "포괄손익계산서",
                "account_id": "-표준계정코드 미사용-",
                "account_nm": "기타영업외수익",
                "account_detail": "-",
                "thstrm_nm": "제 55 기",
                "thstrm_amount": "1000000",
                "frmtrm_nm": "제 54 기",
                "frmtrm_amount": "",
                "ord": "7",
                "currency": "KRW"
            },
            {
                "sj_div": "XX",
                "account_nm": "알 수 없음"
            }
        ]
    }"#;

    fn request() -> StatementRequest {
        StatementRequest::new("00126380", 2023).with_fs_division(FsDivision::Separate)
    }

    #[test]
    fn test_parse_rows() {
        let table = parse_statement(SAMSUNG_2023, &request()).unwrap();
        assert_eq!(table.len(), 2);

        let rows: Vec<&RawLineItem> = table.iter().collect();
        let equity = rows[0];
        assert_eq!(equity.account_name, "자본총계");
        assert_eq!(equity.account_id.as_deref(), Some("ifrs-full_Equity"));
        assert_eq!(equity.statement_division, StatementDivision::BalanceSheet);
        assert_eq!(equity.period_label, "제 55 기");
        assert_eq!(equity.current_amount.as_deref(), Some("363677865000000"));
        assert_eq!(equity.prior2_amount.as_deref(), Some("305147594000000"));
        assert_eq!(equity.fs_division, FsDivision::Separate);
        assert_eq!(equity.receipt_no.as_deref(), Some("20240312000736"));
        assert_eq!(equity.statement_name.as_deref(), Some("재무상태표"));
    }

    #[test]
    fn test_non_standard_account_id_is_dropped() {
        let table = parse_statement(SAMSUNG_2023, &request()).unwrap();
        let other = table.iter().nth(1).unwrap();
        assert_eq!(other.account_id, None);
        assert_eq!(other.prior2_amount, None);
    }

    #[test]
    fn test_missing_fields_fall_back_to_request() {
        let body = r#"{"status":"000","message":"정상","list":[
            {"sj_div":"IS","account_nm":"매출액","thstrm_nm":"제 9 기","thstrm_amount":"5000"}
        ]}"#;
        let request = StatementRequest::new("00164779", 2022)
            .with_report_code(ReportCode::HalfYear);
        let table = parse_statement(body, &request).unwrap();
        let row = table.iter().next().unwrap();
        assert_eq!(row.business_year, "2022");
        assert_eq!(row.corp_code, "00164779");
        assert_eq!(row.report_code, ReportCode::HalfYear);
        assert_eq!(row.fs_division, FsDivision::Consolidated);
    }

    #[test]
    fn test_no_data_is_empty() {
        let body = r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#;
        let table = parse_statement(body, &request()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status("000", "정상").unwrap());
        assert!(!check_status("013", "").unwrap());
        assert!(matches!(
            check_status("010", "등록되지 않은 키입니다."),
            Err(DartError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            check_status("012", ""),
            Err(DartError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            check_status("020", "요청 제한을 초과하였습니다."),
            Err(DartError::RateLimited { retry_after: None })
        ));
        match check_status("100", "필드의 부적절한 값입니다.") {
            Err(DartError::Api { status, message }) => {
                assert_eq!(status, "100");
                assert_eq!(message, "필드의 부적절한 값입니다.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_statement("<html>", &request()).unwrap_err();
        assert!(matches!(err, DartError::Parse(_)));
    }

    const SAMSUNG_COMPANY: &str = r#"{
        "status": "000",
        "message": "정상",
        "corp_code": "00126380",
        "corp_name": "삼성전자(주)",
        "corp_name_eng": "SAMSUNG ELECTRONICS CO,.LTD",
        "stock_name": "삼성전자",
        "stock_code": "005930",
        "ceo_nm": "한종희, 경계현",
        "corp_cls": "Y",
        "jurir_no": "1301110006246",
        "bizr_no": "1248100998",
        "adres": "경기도 수원시 영통구  삼성로 129 (매탄동)",
        "hm_url": "www.samsung.com/sec",
        "ir_url": "",
        "phn_no": "02-2255-0114",
        "fax_no": "031-200-7538",
        "induty_code": "264",
        "est_dt": "19690113",
        "acc_mt": "12"
    }"#;

    #[test]
    fn test_parse_company_info() {
        let info = parse_company_info(SAMSUNG_COMPANY).unwrap().unwrap();
        assert_eq!(info.corp_code, "00126380");
        assert_eq!(info.stock_name, "삼성전자");
        assert_eq!(info.biz_num, "1248100998");
        assert_eq!(info.corporation_num, "1301110006246");
        assert_eq!(info.industry_code, "264");
        assert_eq!(info.acct_month, "12");
        assert_eq!(info.company_id, None);
        assert_eq!(info.listing_market(), Some(dart_core::ListingMarket::Kospi));
    }

    #[test]
    fn test_company_info_status_handling() {
        let no_data = r#"{"status":"013","message":"조회된 데이타가 없습니다."}"#;
        assert_eq!(parse_company_info(no_data).unwrap(), None);

        let blocked = r#"{"status":"011","message":"사용할 수 없는 키입니다."}"#;
        assert!(matches!(
            parse_company_info(blocked),
            Err(DartError::AuthenticationFailed(_))
        ));
    }
}
