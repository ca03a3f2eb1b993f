//! Upstream provider trait and structured error types.
//!
//! The `UpstreamProvider` trait abstracts over the market-data source so the
//! façade can be driven by the live Eastmoney client or by a stub in tests.
//! Each `UpstreamQuery` variant is one capability of the source.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::request::{Adjust, Period};
use super::table::{Table, TableError};

/// Which financial statement to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Key indicators (EPS, ROE, margins) per reporting period.
    Summary,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    /// Daily PE/PB valuation history.
    Valuation,
}

/// Board taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    Industry,
    Concept,
    Region,
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoardKind::Industry => "industry",
            BoardKind::Concept => "concept",
            BoardKind::Region => "region",
        })
    }
}

/// One call into the upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamQuery {
    History {
        symbol: String,
        period: Period,
        start_date: String,
        end_date: String,
        adjust: Adjust,
    },
    Statement {
        symbol: String,
        kind: StatementKind,
    },
    /// Real-time quote table of every listed A-share.
    Snapshot,
    Profile {
        symbol: String,
    },
    TopHolders {
        symbol: String,
    },
    Boards {
        kind: BoardKind,
    },
    BoardMembers {
        kind: BoardKind,
        board: String,
    },
}

/// Structured error types for upstream calls.
///
/// None of these escape the façade; they are logged and turned into the
/// empty sentinel.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("{kind} board not found: {name}")]
    BoardNotFound { kind: BoardKind, name: String },

    #[error("market not supported: {0}")]
    UnsupportedMarket(String),

    #[error("malformed table: {0}")]
    Table(#[from] TableError),

    #[error("data error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for DataError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DataError::Timeout(e.to_string())
        } else if e.is_decode() {
            DataError::ResponseFormatChanged(e.to_string())
        } else {
            DataError::NetworkUnreachable(e.to_string())
        }
    }
}

/// Trait for market-data sources.
///
/// Implementations answer one query with one blocking round trip, returning
/// the rows in the order the source produced them.
pub trait UpstreamProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Run a single query.
    fn query(&self, query: &UpstreamQuery) -> Result<Table, DataError>;
}

impl<T: UpstreamProvider + ?Sized> UpstreamProvider for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn query(&self, query: &UpstreamQuery) -> Result<Table, DataError> {
        (**self).query(query)
    }
}

impl<T: UpstreamProvider + ?Sized> UpstreamProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn query(&self, query: &UpstreamQuery) -> Result<Table, DataError> {
        (**self).query(query)
    }
}

impl<T: UpstreamProvider + ?Sized> UpstreamProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn query(&self, query: &UpstreamQuery) -> Result<Table, DataError> {
        (**self).query(query)
    }
}
