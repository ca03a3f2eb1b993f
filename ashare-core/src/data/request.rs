//! Retrieval requests and parameter normalization.
//!
//! A `RetrievalRequest` names one operation plus whatever parameters the
//! caller chose to give. Before dispatch it is normalized: every optional
//! parameter gets its documented default, producing a `NormalizedRequest`
//! that the dispatch table turns into an upstream query.
//!
//! Dates are plain `YYYYMMDD` strings. They are never parsed or validated
//! here; a malformed date reaches the upstream untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::dispatch::Operation;

/// Start of the default history window.
pub const DEFAULT_START_DATE: &str = "20200101";

/// Format of request dates.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The only market the full-market snapshot supports.
pub const A_SHARE_MARKET: &str = "A股";

/// Price adjustment convention for history bars.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Adjust {
    /// `qfq`
    #[default]
    Forward,
    /// `hfq`
    Backward,
    /// empty tag
    Unadjusted,
    /// Unrecognized tag, forwarded verbatim.
    Other(String),
}

impl Adjust {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "qfq" => Adjust::Forward,
            "hfq" => Adjust::Backward,
            "" => Adjust::Unadjusted,
            other => Adjust::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Adjust::Forward => "qfq",
            Adjust::Backward => "hfq",
            Adjust::Unadjusted => "",
            Adjust::Other(tag) => tag,
        }
    }
}

impl From<String> for Adjust {
    fn from(tag: String) -> Self {
        Adjust::from_tag(&tag)
    }
}

impl From<Adjust> for String {
    fn from(adjust: Adjust) -> Self {
        adjust.tag().to_string()
    }
}

impl fmt::Display for Adjust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Bar period for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    pub fn tag(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
        }
    }
}

/// Values used for parameters the caller left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub start_date: String,
    pub adjust: Adjust,
    pub market: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            start_date: DEFAULT_START_DATE.to_string(),
            adjust: Adjust::Forward,
            market: A_SHARE_MARKET.to_string(),
        }
    }
}

/// Caller-supplied parameters. Anything `None` is filled in by normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RequestParams {
    symbol: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    adjust: Option<Adjust>,
    key: Option<String>,
    market: Option<String>,
}

/// One logical retrieval: an operation plus its parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    operation: Operation,
    params: RequestParams,
}

impl RetrievalRequest {
    pub fn builder(operation: Operation) -> RequestBuilder {
        RequestBuilder {
            operation,
            params: RequestParams::default(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn symbol(&self) -> Option<&str> {
        self.params.symbol.as_deref()
    }

    pub fn start_date(&self) -> Option<&str> {
        self.params.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.params.end_date.as_deref()
    }

    pub fn adjust(&self) -> Option<&Adjust> {
        self.params.adjust.as_ref()
    }

    /// Board name or search keyword.
    pub fn key(&self) -> Option<&str> {
        self.params.key.as_deref()
    }

    pub fn market(&self) -> Option<&str> {
        self.params.market.as_deref()
    }

    /// Resolve defaults against today's local date.
    pub fn normalize(&self, defaults: &Defaults) -> NormalizedRequest {
        self.normalize_at(defaults, chrono::Local::now().date_naive())
    }

    /// Resolve defaults against an explicit "today".
    pub fn normalize_at(&self, defaults: &Defaults, today: NaiveDate) -> NormalizedRequest {
        let p = &self.params;
        NormalizedRequest {
            operation: self.operation,
            symbol: p.symbol.clone().unwrap_or_default(),
            start_date: p
                .start_date
                .clone()
                .unwrap_or_else(|| defaults.start_date.clone()),
            end_date: p
                .end_date
                .clone()
                .unwrap_or_else(|| today.format(DATE_FORMAT).to_string()),
            adjust: p.adjust.clone().unwrap_or_else(|| defaults.adjust.clone()),
            key: p.key.clone().unwrap_or_default(),
            market: p.market.clone().unwrap_or_else(|| defaults.market.clone()),
        }
    }
}

/// Builder for `RetrievalRequest`.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    operation: Operation,
    params: RequestParams,
}

impl RequestBuilder {
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.params.symbol = Some(symbol.into());
        self
    }

    pub fn start_date(mut self, date: impl Into<String>) -> Self {
        self.params.start_date = Some(date.into());
        self
    }

    pub fn end_date(mut self, date: impl Into<String>) -> Self {
        self.params.end_date = Some(date.into());
        self
    }

    /// Optional-friendly setters for callers forwarding their own `Option`s.
    pub fn start_date_opt(mut self, date: Option<&str>) -> Self {
        self.params.start_date = date.map(str::to_string);
        self
    }

    pub fn end_date_opt(mut self, date: Option<&str>) -> Self {
        self.params.end_date = date.map(str::to_string);
        self
    }

    pub fn adjust(mut self, adjust: Adjust) -> Self {
        self.params.adjust = Some(adjust);
        self
    }

    pub fn adjust_opt(mut self, adjust: Option<Adjust>) -> Self {
        self.params.adjust = adjust;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.params.key = Some(key.into());
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.params.market = Some(market.into());
        self
    }

    pub fn market_opt(mut self, market: Option<&str>) -> Self {
        self.params.market = market.map(str::to_string);
        self
    }

    pub fn build(self) -> RetrievalRequest {
        RetrievalRequest {
            operation: self.operation,
            params: self.params,
        }
    }
}

/// A request with every parameter resolved. This is what the dispatch table sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub operation: Operation,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
    pub adjust: Adjust,
    pub key: String,
    pub market: String,
}

impl NormalizedRequest {
    /// What the request is about, for log lines.
    pub fn subject(&self) -> &str {
        if !self.symbol.is_empty() {
            &self.symbol
        } else if !self.key.is_empty() {
            &self.key
        } else {
            &self.market
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn absent_dates_resolve_to_epoch_and_today() {
        let req = RetrievalRequest::builder(Operation::DailyHistory)
            .symbol("600000")
            .build();
        let n = req.normalize_at(&Defaults::default(), today());
        assert_eq!(n.start_date, "20200101");
        assert_eq!(n.end_date, "20240315");
        assert_eq!(n.adjust, Adjust::Forward);
    }

    #[test]
    fn explicit_values_are_kept_verbatim() {
        let req = RetrievalRequest::builder(Operation::WeeklyHistory)
            .symbol("000001")
            .start_date("2023-13-45")
            .end_date("garbage")
            .adjust(Adjust::from_tag("xyz"))
            .build();
        let n = req.normalize_at(&Defaults::default(), today());
        assert_eq!(n.start_date, "2023-13-45");
        assert_eq!(n.end_date, "garbage");
        assert_eq!(n.adjust.tag(), "xyz");
    }

    #[test]
    fn builder_records_only_what_was_given() {
        let req = RetrievalRequest::builder(Operation::DailyHistory)
            .symbol("600000")
            .end_date("20231231")
            .build();
        assert_eq!(req.operation(), Operation::DailyHistory);
        assert_eq!(req.symbol(), Some("600000"));
        assert_eq!(req.start_date(), None);
        assert_eq!(req.end_date(), Some("20231231"));
        assert_eq!(req.adjust(), None);
        assert_eq!(req.key(), None);
        assert_eq!(req.market(), None);

        let req = RetrievalRequest::builder(Operation::MarketSnapshot)
            .market_opt(Some("A股"))
            .adjust_opt(Some(Adjust::Backward))
            .key("银行")
            .build();
        assert_eq!(req.market(), Some("A股"));
        assert_eq!(req.adjust(), Some(&Adjust::Backward));
        assert_eq!(req.key(), Some("银行"));
    }

    #[test]
    fn adjust_tags_roundtrip() {
        for tag in ["qfq", "hfq", "", "weird"] {
            assert_eq!(Adjust::from_tag(tag).tag(), tag);
        }
        assert_eq!(Adjust::from_tag(""), Adjust::Unadjusted);
    }

    #[test]
    fn market_defaults_to_a_shares() {
        let req = RetrievalRequest::builder(Operation::MarketSnapshot).build();
        let n = req.normalize_at(&Defaults::default(), today());
        assert_eq!(n.market, A_SHARE_MARKET);
        assert_eq!(n.subject(), A_SHARE_MARKET);
    }

    #[test]
    fn lookup_keys_are_not_touched() {
        let req = RetrievalRequest::builder(Operation::StocksByIndustry)
            .key("  Bank ")
            .build();
        let n = req.normalize_at(&Defaults::default(), today());
        assert_eq!(n.key, "  Bank ");
    }

    #[test]
    fn defaults_come_from_caller_settings() {
        let defaults = Defaults {
            start_date: "20150101".into(),
            adjust: Adjust::Backward,
            market: A_SHARE_MARKET.into(),
        };
        let req = RetrievalRequest::builder(Operation::MonthlyHistory)
            .symbol("600519")
            .build();
        let n = req.normalize_at(&defaults, today());
        assert_eq!(n.start_date, "20150101");
        assert_eq!(n.adjust, Adjust::Backward);
    }
}
