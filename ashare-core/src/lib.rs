//! A-share market data: fetch, normalize, persist.
//!
//! - Retrieval façade over an upstream provider, one method per operation
//! - Parameter normalization with configured defaults
//! - Result sentinel: every failure or empty answer becomes `Retrieved::Empty`
//! - CSV (BOM-prefixed UTF-8) and XLSX persistence
//! - Static settings loaded from TOML

pub mod config;
pub mod data;
pub mod persist;

pub use config::{ConfigError, Settings};
pub use data::{MarketData, Retrieved, Table, Value};
pub use persist::{PersistError, PersistenceTarget, SaveOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the façade and its values can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Table>();
        require_sync::<Table>();
        require_send::<Retrieved>();
        require_sync::<Retrieved>();
        require_send::<data::NormalizedRequest>();
        require_sync::<data::NormalizedRequest>();
        require_send::<data::UpstreamQuery>();
        require_sync::<data::UpstreamQuery>();
        require_send::<Settings>();
        require_sync::<Settings>();
        require_send::<PersistenceTarget>();
        require_sync::<PersistenceTarget>();

        require_send::<MarketData<data::EastmoneyProvider>>();
        require_sync::<MarketData<data::EastmoneyProvider>>();
    }

    /// Every operation reachable through the façade has a dispatch entry.
    #[test]
    fn every_operation_has_a_dispatch_entry() {
        for op in data::Operation::ALL {
            assert_eq!(op.spec().operation, op);
            assert_eq!(data::Operation::from_name(op.name()), Some(op));
        }
    }
}
