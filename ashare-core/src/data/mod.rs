//! Retrieval: request normalization, upstream dispatch, result sentinel

pub mod dispatch;
pub mod eastmoney;
pub mod facade;
pub mod outcome;
pub mod provider;
pub mod request;
pub mod symbol;
pub mod table;

pub use dispatch::{Family, Operation, OperationSpec, PostProcess};
pub use eastmoney::EastmoneyProvider;
pub use facade::MarketData;
pub use outcome::Retrieved;
pub use provider::{BoardKind, DataError, StatementKind, UpstreamProvider, UpstreamQuery};
pub use request::{Adjust, Defaults, NormalizedRequest, Period, RetrievalRequest};
pub use symbol::Exchange;
pub use table::{Table, TableError, Value};
