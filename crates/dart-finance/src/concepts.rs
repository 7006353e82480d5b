//! Concept table: canonical metric → DART lookup keys.
//!
//! Companies tag the same account inconsistently. Where DART publishes a
//! standard taxonomy id the table searches on it first and falls back to the
//! Korean account names seen in filings; accounts without a reliable id are
//! searched by name first. Income statement concepts retry in the
//! comprehensive income statement, where companies that publish a single
//! combined statement file them.

use dart_core::{Metric, StatementDivision};

use crate::resolver::{ConceptKey, ConceptSpec};

const BS: StatementDivision = StatementDivision::BalanceSheet;
const IS: StatementDivision = StatementDivision::IncomeStatement;
const CIS: StatementDivision = StatementDivision::ComprehensiveIncome;

/// A resolvable metric and how to find it.
#[derive(Clone, Copy, Debug)]
pub struct Concept {
    /// Metric the concept fills.
    pub metric: Metric,
    /// Lookup keys.
    pub spec: ConceptSpec<'static>,
}

const fn concept(metric: Metric, spec: ConceptSpec<'static>) -> Concept {
    Concept { metric, spec }
}

/// Every metric resolved from line items. Derived metrics are absent.
pub const CONCEPTS: &[Concept] = &[
    // Income statement
    concept(
        Metric::Sales,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_Revenue"), IS)
            .alt_names(&["매출액", "수익(매출액)", "영업수익", "매출"])
            .alt_divisions(&[CIS]),
    ),
    concept(
        Metric::SalesCost,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_CostOfSales"), IS)
            .alt_names(&["매출원가", "영업비용"])
            .alt_divisions(&[CIS]),
    ),
    concept(
        Metric::OperatingProfit,
        ConceptSpec::new(ConceptKey::Id("dart_OperatingIncomeLoss"), IS)
            .alt_names(&["영업이익", "영업이익(손실)", "영업손실"])
            .alt_divisions(&[CIS]),
    ),
    concept(
        Metric::NetProfit,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_ProfitLoss"), IS)
            .alt_names(&[
                "당기순이익",
                "당기순이익(손실)",
                "반기순이익",
                "분기순이익",
            ])
            .alt_ids(&["ifrs-full_ProfitLossAttributableToOwnersOfParent"])
            .alt_divisions(&[CIS]),
    ),
    concept(
        Metric::SellingGeneralAdministrativeExpenses,
        ConceptSpec::new(ConceptKey::Name("판매비와관리비"), IS)
            .alt_names(&["판매비와 관리비", "판매비및관리비", "판매관리비"])
            .alt_ids(&["dart_TotalSellingGeneralAdministrativeExpenses"])
            .alt_divisions(&[CIS]),
    ),
    // Comprehensive income statement
    concept(
        Metric::ComprehensiveIncome,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_ComprehensiveIncome"), CIS)
            .alt_names(&["총포괄손익", "총포괄이익", "당기총포괄이익", "총포괄이익(손실)"])
            .alt_divisions(&[IS]),
    ),
    // Balance sheet - equity and totals
    concept(
        Metric::CapitalAmount,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_IssuedCapital"), BS)
            .alt_names(&["자본금"]),
    ),
    concept(
        Metric::CapitalTotal,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_Equity"), BS)
            .alt_names(&["자본총계", "자본 총계"])
            .alt_ids(&["ifrs-full_EquityAttributableToOwnersOfParent"]),
    ),
    concept(
        Metric::DebtTotal,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_Liabilities"), BS)
            .alt_names(&["부채총계", "부채 총계"]),
    ),
    concept(
        Metric::AssetTotal,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_Assets"), BS)
            .alt_names(&["자산총계", "자산 총계"]),
    ),
    // Balance sheet - assets
    concept(
        Metric::TangibleAsset,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_PropertyPlantAndEquipment"), BS)
            .alt_names(&["유형자산"]),
    ),
    concept(
        Metric::NonTangibleAsset,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_IntangibleAssetsOtherThanGoodwill"), BS)
            .alt_names(&["무형자산", "영업권 이외의 무형자산"])
            .alt_ids(&["ifrs-full_IntangibleAssetsAndGoodwill"]),
    ),
    concept(
        Metric::CurrentAsset,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_CurrentAssets"), BS).alt_names(&["유동자산"]),
    ),
    concept(
        Metric::NonCurrentAsset,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_NoncurrentAssets"), BS)
            .alt_names(&["비유동자산"]),
    ),
    concept(
        Metric::InventoriesAsset,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_Inventories"), BS).alt_names(&["재고자산"]),
    ),
    concept(
        Metric::TradeReceivable,
        ConceptSpec::new(ConceptKey::Name("매출채권"), BS)
            .alt_names(&["매출채권 및 기타채권", "매출채권및기타채권", "단기매출채권"])
            .alt_ids(&[
                "ifrs-full_TradeAndOtherCurrentReceivables",
                "dart_ShortTermTradeReceivable",
            ]),
    ),
    // Balance sheet - liabilities
    concept(
        Metric::CurrentLiabilities,
        ConceptSpec::new(ConceptKey::Id("ifrs-full_CurrentLiabilities"), BS)
            .alt_names(&["유동부채"]),
    ),
    concept(
        Metric::AccountsPayable,
        ConceptSpec::new(ConceptKey::Name("매입채무"), BS)
            .alt_names(&["매입채무 및 기타채무", "매입채무및기타채무", "단기매입채무"])
            .alt_ids(&[
                "ifrs-full_TradeAndOtherCurrentPayables",
                "ifrs-full_TradeAndOtherCurrentPayablesToTradeSuppliers",
            ]),
    ),
    concept(
        Metric::ShortTermLoan,
        ConceptSpec::new(ConceptKey::Name("단기차입금"), BS)
            .alt_names(&["단기차입부채"])
            .alt_ids(&["ifrs-full_ShorttermBorrowings"]),
    ),
];

/// Returns the concept for a metric, or `None` for derived metrics.
#[must_use]
pub fn concept_for(metric: Metric) -> Option<&'static Concept> {
    CONCEPTS.iter().find(|c| c.metric == metric)
}
