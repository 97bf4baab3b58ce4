//! Trait for sources of tank gas-level history.

use anyhow::Result;

use crate::reading::RawReading;

/// Abstraction over where a tank's history comes from (the dashboard's
/// REST backend, a fixture, a replay file).
#[async_trait::async_trait]
pub trait HistoryApi: Send + Sync {
    /// Returns the tank's readings in whatever order the source keeps them.
    async fn tank_history(&self, tank_id: &str) -> Result<Vec<RawReading>>;
}
