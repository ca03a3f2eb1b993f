//! Retrieval façade.
//!
//! `MarketData` is the only entry point callers use to fetch tables. Every
//! operation follows the same path: normalize the request, look up its
//! dispatch entry, issue one upstream query, post-process, and return a
//! `Retrieved`. Any error along the way is logged and becomes
//! `Retrieved::Empty`; nothing is returned as `Err` and nothing panics on
//! bad input.

use super::dispatch::{Operation, OperationSpec};
use super::outcome::Retrieved;
use super::provider::{DataError, UpstreamProvider};
use super::request::{Adjust, Defaults, NormalizedRequest, RetrievalRequest};
use super::table::Table;

/// Retrieval façade over one upstream provider.
pub struct MarketData<P> {
    provider: P,
    defaults: Defaults,
}

impl<P: UpstreamProvider> MarketData<P> {
    pub fn new(provider: P) -> Self {
        Self::with_defaults(provider, Defaults::default())
    }

    pub fn with_defaults(provider: P, defaults: Defaults) -> Self {
        Self { provider, defaults }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Run any operation described by a request.
    pub fn fetch(&self, request: &RetrievalRequest) -> Retrieved {
        tracing::debug!(
            operation = request.operation().name(),
            symbol = request.symbol(),
            key = request.key(),
            start = request.start_date(),
            end = request.end_date(),
            adjust = request.adjust().map(Adjust::tag),
            market = request.market(),
            "normalizing request"
        );
        self.fetch_normalized(&request.normalize(&self.defaults))
    }

    /// Run an already-normalized request.
    pub fn fetch_normalized(&self, request: &NormalizedRequest) -> Retrieved {
        let spec = request.operation.spec();
        match self.run(spec, request) {
            Ok(table) => {
                let result = Retrieved::from(table);
                if result.is_empty() {
                    tracing::warn!(
                        operation = spec.name,
                        subject = request.subject(),
                        "no {} returned",
                        spec.label
                    );
                } else {
                    tracing::info!(
                        operation = spec.name,
                        subject = request.subject(),
                        rows = result.len(),
                        "retrieved {} {}",
                        result.len(),
                        spec.label
                    );
                }
                result
            }
            Err(e) => {
                tracing::warn!(
                    operation = spec.name,
                    subject = request.subject(),
                    provider = self.provider.name(),
                    "failed to retrieve {}: {e}",
                    spec.label
                );
                Retrieved::Empty
            }
        }
    }

    fn run(&self, spec: &OperationSpec, request: &NormalizedRequest) -> Result<Table, DataError> {
        let query = (spec.build)(request)?;
        let table = self.provider.query(&query)?;
        spec.post.apply(table, request)
    }

    // ─── History family ─────────────────────────────────────────────

    pub fn daily_history(
        &self,
        symbol: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        adjust: Option<Adjust>,
    ) -> Retrieved {
        self.history(Operation::DailyHistory, symbol, start_date, end_date, adjust)
    }

    pub fn weekly_history(
        &self,
        symbol: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        adjust: Option<Adjust>,
    ) -> Retrieved {
        self.history(Operation::WeeklyHistory, symbol, start_date, end_date, adjust)
    }

    pub fn monthly_history(
        &self,
        symbol: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        adjust: Option<Adjust>,
    ) -> Retrieved {
        self.history(Operation::MonthlyHistory, symbol, start_date, end_date, adjust)
    }

    fn history(
        &self,
        operation: Operation,
        symbol: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        adjust: Option<Adjust>,
    ) -> Retrieved {
        let request = RetrievalRequest::builder(operation)
            .symbol(symbol)
            .start_date_opt(start_date)
            .end_date_opt(end_date)
            .adjust_opt(adjust)
            .build();
        self.fetch(&request)
    }

    // ─── Financial family ───────────────────────────────────────────

    pub fn financial_summary(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::FinancialSummary, symbol)
    }

    pub fn balance_sheet(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::BalanceSheet, symbol)
    }

    pub fn income_statement(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::IncomeStatement, symbol)
    }

    pub fn cash_flow(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::CashFlow, symbol)
    }

    /// PE/PB history.
    pub fn valuation(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::Valuation, symbol)
    }

    /// (报告期, 净资产收益率) from the summary indicators, or the whole
    /// indicator table when it has no ROE column.
    pub fn roe_history(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::RoeHistory, symbol)
    }

    fn by_symbol(&self, operation: Operation, symbol: &str) -> Retrieved {
        self.fetch(&RetrievalRequest::builder(operation).symbol(symbol).build())
    }

    // ─── Info family ────────────────────────────────────────────────

    /// Quote table for every listed stock. Only `A股` is supported; `None`
    /// means the configured default market.
    pub fn market_snapshot(&self, market: Option<&str>) -> Retrieved {
        self.fetch(
            &RetrievalRequest::builder(Operation::MarketSnapshot)
                .market_opt(market)
                .build(),
        )
    }

    /// Item/value facts about one company.
    pub fn company_profile(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::CompanyProfile, symbol)
    }

    /// Ten largest shareholders.
    pub fn top_holders(&self, symbol: &str) -> Retrieved {
        self.by_symbol(Operation::TopHolders, symbol)
    }

    pub fn industry_boards(&self) -> Retrieved {
        self.fetch(&RetrievalRequest::builder(Operation::IndustryBoards).build())
    }

    pub fn stocks_by_industry(&self, industry: &str) -> Retrieved {
        self.by_key(Operation::StocksByIndustry, industry)
    }

    pub fn concept_boards(&self) -> Retrieved {
        self.fetch(&RetrievalRequest::builder(Operation::ConceptBoards).build())
    }

    pub fn stocks_by_concept(&self, concept: &str) -> Retrieved {
        self.by_key(Operation::StocksByConcept, concept)
    }

    pub fn region_boards(&self) -> Retrieved {
        self.fetch(&RetrievalRequest::builder(Operation::RegionBoards).build())
    }

    pub fn stocks_by_region(&self, region: &str) -> Retrieved {
        self.by_key(Operation::StocksByRegion, region)
    }

    /// Snapshot rows whose 名称 contains `keyword`.
    pub fn search_by_name(&self, keyword: &str) -> Retrieved {
        self.by_key(Operation::SearchByName, keyword)
    }

    /// Snapshot rows whose 代码 or 名称 contains `keyword`, so a partial
    /// code such as `6005` finds `600519`.
    pub fn search_by_code_or_name(&self, keyword: &str) -> Retrieved {
        self.by_key(Operation::SearchByCodeOrName, keyword)
    }

    fn by_key(&self, operation: Operation, key: &str) -> Retrieved {
        self.fetch(&RetrievalRequest::builder(operation).key(key).build())
    }
}
