//! Dispatch table: one entry per logical operation.
//!
//! Every retrieval the façade offers is described here as data: which
//! upstream query it issues, which post-processing step runs on the answer,
//! and how it is named in log lines. The façade itself has a single code
//! path driven by these entries.

use super::provider::{BoardKind, DataError, StatementKind, UpstreamQuery};
use super::request::{NormalizedRequest, Period, A_SHARE_MARKET};
use super::table::{Table, Value};

/// Column carrying the reporting period in statement tables.
pub const REPORT_PERIOD_COLUMN: &str = "报告期";

/// Return-on-equity column in the summary indicator table.
pub const ROE_COLUMN: &str = "净资产收益率";

/// Display-name column in snapshot and board-member tables.
pub const NAME_COLUMN: &str = "名称";

/// Stock-code column in snapshot and board-member tables.
pub const CODE_COLUMN: &str = "代码";

/// Operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    History,
    Financial,
    Info,
}

/// Every logical retrieval operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DailyHistory,
    WeeklyHistory,
    MonthlyHistory,
    FinancialSummary,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Valuation,
    RoeHistory,
    MarketSnapshot,
    CompanyProfile,
    TopHolders,
    IndustryBoards,
    StocksByIndustry,
    ConceptBoards,
    StocksByConcept,
    RegionBoards,
    StocksByRegion,
    SearchByName,
    SearchByCodeOrName,
}

/// Step applied to the upstream answer before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    None,
    /// Narrow to (报告期, 净资产收益率) when the ROE column exists.
    NarrowToRoe,
    /// Keep rows whose name column contains the request key.
    NameContainsKey,
    /// Keep rows whose code or name column contains the request key.
    CodeOrNameContainsKey,
}

impl PostProcess {
    pub fn apply(self, table: Table, request: &NormalizedRequest) -> Result<Table, DataError> {
        match self {
            PostProcess::None => Ok(table),
            PostProcess::NarrowToRoe => narrow_to_roe(table, &request.symbol),
            PostProcess::NameContainsKey => filter_by_name(table, &request.key),
            PostProcess::CodeOrNameContainsKey => filter_by_code_or_name(table, &request.key),
        }
    }
}

/// Builds the upstream query for a normalized request.
pub type QueryBuilder = fn(&NormalizedRequest) -> Result<UpstreamQuery, DataError>;

/// A dispatch table entry.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub operation: Operation,
    /// Stable identifier (CLI, logs).
    pub name: &'static str,
    pub family: Family,
    /// Human-readable noun for progress lines.
    pub label: &'static str,
    pub build: QueryBuilder,
    pub post: PostProcess,
}

const fn entry(
    operation: Operation,
    name: &'static str,
    family: Family,
    label: &'static str,
    build: QueryBuilder,
    post: PostProcess,
) -> OperationSpec {
    OperationSpec {
        operation,
        name,
        family,
        label,
        build,
        post,
    }
}

/// Indexed by `Operation as usize`.
#[rustfmt::skip]
static OPERATIONS: [OperationSpec; 20] = [
    entry(Operation::DailyHistory, "daily_history", Family::History, "daily bars", daily, PostProcess::None),
    entry(Operation::WeeklyHistory, "weekly_history", Family::History, "weekly bars", weekly, PostProcess::None),
    entry(Operation::MonthlyHistory, "monthly_history", Family::History, "monthly bars", monthly, PostProcess::None),
    entry(Operation::FinancialSummary, "financial_summary", Family::Financial, "financial indicators", summary, PostProcess::None),
    entry(Operation::BalanceSheet, "balance_sheet", Family::Financial, "balance sheet rows", balance_sheet, PostProcess::None),
    entry(Operation::IncomeStatement, "income_statement", Family::Financial, "income statement rows", income_statement, PostProcess::None),
    entry(Operation::CashFlow, "cash_flow", Family::Financial, "cash-flow statement rows", cash_flow, PostProcess::None),
    entry(Operation::Valuation, "valuation", Family::Financial, "PE/PB rows", valuation, PostProcess::None),
    entry(Operation::RoeHistory, "roe_history", Family::Financial, "ROE rows", summary, PostProcess::NarrowToRoe),
    entry(Operation::MarketSnapshot, "market_snapshot", Family::Info, "listed stocks", snapshot, PostProcess::None),
    entry(Operation::CompanyProfile, "company_profile", Family::Info, "profile fields", profile, PostProcess::None),
    entry(Operation::TopHolders, "top_holders", Family::Info, "shareholder rows", top_holders, PostProcess::None),
    entry(Operation::IndustryBoards, "industry_boards", Family::Info, "industry boards", industry_boards, PostProcess::None),
    entry(Operation::StocksByIndustry, "stocks_by_industry", Family::Info, "industry members", industry_members, PostProcess::None),
    entry(Operation::ConceptBoards, "concept_boards", Family::Info, "concept boards", concept_boards, PostProcess::None),
    entry(Operation::StocksByConcept, "stocks_by_concept", Family::Info, "concept members", concept_members, PostProcess::None),
    entry(Operation::RegionBoards, "region_boards", Family::Info, "region boards", region_boards, PostProcess::None),
    entry(Operation::StocksByRegion, "stocks_by_region", Family::Info, "region members", region_members, PostProcess::None),
    entry(Operation::SearchByName, "search_by_name", Family::Info, "matching stocks", snapshot, PostProcess::NameContainsKey),
    entry(Operation::SearchByCodeOrName, "search_by_code_or_name", Family::Info, "matching stocks", snapshot, PostProcess::CodeOrNameContainsKey),
];

impl Operation {
    pub const ALL: [Operation; 20] = [
        Operation::DailyHistory,
        Operation::WeeklyHistory,
        Operation::MonthlyHistory,
        Operation::FinancialSummary,
        Operation::BalanceSheet,
        Operation::IncomeStatement,
        Operation::CashFlow,
        Operation::Valuation,
        Operation::RoeHistory,
        Operation::MarketSnapshot,
        Operation::CompanyProfile,
        Operation::TopHolders,
        Operation::IndustryBoards,
        Operation::StocksByIndustry,
        Operation::ConceptBoards,
        Operation::StocksByConcept,
        Operation::RegionBoards,
        Operation::StocksByRegion,
        Operation::SearchByName,
        Operation::SearchByCodeOrName,
    ];

    pub fn spec(self) -> &'static OperationSpec {
        &OPERATIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn family(self) -> Family {
        self.spec().family
    }

    pub fn from_name(name: &str) -> Option<Operation> {
        OPERATIONS.iter().find(|s| s.name == name).map(|s| s.operation)
    }
}

// ─── Query builders ─────────────────────────────────────────────────

fn history(req: &NormalizedRequest, period: Period) -> UpstreamQuery {
    UpstreamQuery::History {
        symbol: req.symbol.clone(),
        period,
        start_date: req.start_date.clone(),
        end_date: req.end_date.clone(),
        adjust: req.adjust.clone(),
    }
}

fn daily(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(history(req, Period::Daily))
}

fn weekly(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(history(req, Period::Weekly))
}

fn monthly(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(history(req, Period::Monthly))
}

fn statement(req: &NormalizedRequest, kind: StatementKind) -> UpstreamQuery {
    UpstreamQuery::Statement {
        symbol: req.symbol.clone(),
        kind,
    }
}

fn summary(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(statement(req, StatementKind::Summary))
}

fn balance_sheet(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(statement(req, StatementKind::BalanceSheet))
}

fn income_statement(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(statement(req, StatementKind::IncomeStatement))
}

fn cash_flow(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(statement(req, StatementKind::CashFlow))
}

fn valuation(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(statement(req, StatementKind::Valuation))
}

fn snapshot(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    if req.market != A_SHARE_MARKET {
        return Err(DataError::UnsupportedMarket(req.market.clone()));
    }
    Ok(UpstreamQuery::Snapshot)
}

fn profile(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(UpstreamQuery::Profile {
        symbol: req.symbol.clone(),
    })
}

fn top_holders(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    Ok(UpstreamQuery::TopHolders {
        symbol: req.symbol.clone(),
    })
}

fn boards(kind: BoardKind) -> Result<UpstreamQuery, DataError> {
    Ok(UpstreamQuery::Boards { kind })
}

fn members(req: &NormalizedRequest, kind: BoardKind) -> Result<UpstreamQuery, DataError> {
    Ok(UpstreamQuery::BoardMembers {
        kind,
        board: req.key.clone(),
    })
}

fn industry_boards(_: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    boards(BoardKind::Industry)
}

fn industry_members(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    members(req, BoardKind::Industry)
}

fn concept_boards(_: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    boards(BoardKind::Concept)
}

fn concept_members(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    members(req, BoardKind::Concept)
}

fn region_boards(_: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    boards(BoardKind::Region)
}

fn region_members(req: &NormalizedRequest) -> Result<UpstreamQuery, DataError> {
    members(req, BoardKind::Region)
}

// ─── Post-processing ────────────────────────────────────────────────

fn narrow_to_roe(table: Table, symbol: &str) -> Result<Table, DataError> {
    if !table.has_column(ROE_COLUMN) {
        tracing::info!(symbol, "no ROE column in indicator table; returning it unfiltered");
        return Ok(table);
    }
    table
        .select(&[REPORT_PERIOD_COLUMN, ROE_COLUMN])
        .ok_or_else(|| {
            DataError::ResponseFormatChanged(format!(
                "indicator table has {ROE_COLUMN} but no {REPORT_PERIOD_COLUMN}"
            ))
        })
}

fn filter_by_name(table: Table, keyword: &str) -> Result<Table, DataError> {
    let idx = table.column_index(NAME_COLUMN).ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("snapshot has no {NAME_COLUMN} column"))
    })?;
    Ok(table.filter_rows(|row| {
        row[idx]
            .as_text()
            .is_some_and(|name| name.contains(keyword))
    }))
}

fn filter_by_code_or_name(table: Table, keyword: &str) -> Result<Table, DataError> {
    let (Some(code_idx), Some(name_idx)) =
        (table.column_index(CODE_COLUMN), table.column_index(NAME_COLUMN))
    else {
        return Err(DataError::ResponseFormatChanged(format!(
            "snapshot lacks {CODE_COLUMN} or {NAME_COLUMN} column"
        )));
    };
    let contains = |v: &Value| v.as_text().is_some_and(|t| t.contains(keyword));
    Ok(table.filter_rows(|row| contains(&row[code_idx]) || contains(&row[name_idx])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::request::{Defaults, RetrievalRequest};
    use crate::data::table::Value;
    use chrono::NaiveDate;

    fn normalized(req: RetrievalRequest) -> NormalizedRequest {
        req.normalize_at(&Defaults::default(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
    }

    #[test]
    fn table_is_indexed_by_discriminant() {
        for (i, op) in Operation::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
            assert_eq!(op.spec().operation, *op);
        }
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()), Some(op));
        }
        assert_eq!(Operation::from_name("nope"), None);
    }

    #[test]
    fn families() {
        assert_eq!(Operation::WeeklyHistory.family(), Family::History);
        assert_eq!(Operation::RoeHistory.family(), Family::Financial);
        assert_eq!(Operation::SearchByName.family(), Family::Info);
    }

    #[test]
    fn search_delegates_to_snapshot() {
        let req = normalized(
            RetrievalRequest::builder(Operation::SearchByName)
                .key("银行")
                .build(),
        );
        let query = (req.operation.spec().build)(&req).unwrap();
        assert_eq!(query, UpstreamQuery::Snapshot);
    }

    #[test]
    fn snapshot_rejects_other_markets() {
        let req = normalized(
            RetrievalRequest::builder(Operation::MarketSnapshot)
                .market("港股")
                .build(),
        );
        let err = (req.operation.spec().build)(&req).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedMarket(m) if m == "港股"));
    }

    #[test]
    fn members_carry_the_board_name() {
        let req = normalized(
            RetrievalRequest::builder(Operation::StocksByConcept)
                .key("人工智能")
                .build(),
        );
        let query = (req.operation.spec().build)(&req).unwrap();
        assert_eq!(
            query,
            UpstreamQuery::BoardMembers {
                kind: BoardKind::Concept,
                board: "人工智能".into()
            }
        );
    }

    #[test]
    fn code_or_name_search_matches_either_column() {
        let mut t = Table::new([CODE_COLUMN, NAME_COLUMN]);
        t.push_row(vec!["600036".into(), "招商银行".into()]).unwrap();
        t.push_row(vec!["600519".into(), "贵州茅台".into()]).unwrap();
        t.push_row(vec![Value::Null, Value::Null]).unwrap();

        assert_eq!(filter_by_code_or_name(t.clone(), "6005").unwrap().len(), 1);
        assert_eq!(filter_by_code_or_name(t.clone(), "银行").unwrap().len(), 1);
        assert_eq!(filter_by_code_or_name(t.clone(), "600").unwrap().len(), 2);
        assert!(filter_by_code_or_name(Table::new([NAME_COLUMN]), "600").is_err());
    }

    #[test]
    fn roe_narrowing_requires_period_column() {
        let mut t = Table::new([ROE_COLUMN]);
        t.push_row(vec![Value::Number(12.5)]).unwrap();
        assert!(narrow_to_roe(t, "600000").is_err());
    }
}
