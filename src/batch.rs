//! Concurrent per-tank summaries for the `batch` command.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::analyzers::analyzer::analyze_history;
use crate::analyzers::period::Period;
use crate::analyzers::trend::TrendPolicy;
use crate::parser::normalize_readings;
use crate::services::history_api::HistoryApi;
use crate::stats::TankSummary;

/// Fetches slower than this are flagged in the logs.
const SLOW_FETCH_SECS: u64 = 15;

/// Fetches and analyzes every tank in `tank_ids`, at most `concurrency` at
/// a time (a value of 0 is treated as 1).
///
/// Returns one row per tank in input order. A tank that fails to load
/// yields an error row instead of aborting the batch.
pub async fn summarize_tanks<Tz>(
    api: Arc<dyn HistoryApi>,
    tank_ids: &[String],
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
    policy: TrendPolicy,
    concurrency: usize,
) -> Vec<TankSummary>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(tank_ids.len());

    for tank_id in tank_ids {
        let sem = semaphore.clone();
        let api = api.clone();
        let tz = tz.clone();
        let id = tank_id.clone();

        let tank_span = tracing::info_span!("process_tank", tank_id = %tank_id);

        let task = tokio::spawn(
            async move {
                let Ok(_permit) = sem.acquire().await else {
                    return TankSummary::from_error(now, "cancelled", "batch semaphore closed")
                        .with_tank_id(&id);
                };
                summarize_tank(api.as_ref(), &id, period, now, &tz, &policy).await
            }
            .instrument(tank_span),
        );

        tasks.push((tank_id, task));
    }

    let mut rows = Vec::with_capacity(tasks.len());
    for (tank_id, task) in tasks {
        match task.await {
            Ok(row) => rows.push(row),
            Err(e) => {
                error!(tank_id = %tank_id, error = %e, "Tank task failed to complete");
                rows.push(TankSummary::from_error(now, "task_error", &e.to_string()).with_tank_id(tank_id));
            }
        }
    }

    let failed = rows.iter().filter(|r| r.is_error()).count();
    info!(tanks = rows.len(), failed, "Batch finished");
    rows
}

async fn summarize_tank<Tz: TimeZone + Sync>(
    api: &dyn HistoryApi,
    tank_id: &str,
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
    policy: &TrendPolicy,
) -> TankSummary {
    let fetch_start = Instant::now();
    match api.tank_history(tank_id).await {
        Ok(raw) => {
            let elapsed = fetch_start.elapsed();
            if elapsed.as_secs() > SLOW_FETCH_SECS {
                warn!(elapsed_secs = elapsed.as_secs(), "History fetch was slow");
            }
            debug!(raw = raw.len(), "History received, analyzing");

            let readings = normalize_readings(&raw, tz);
            let analysis = analyze_history(&readings, period, now, tz, policy);
            info!(
                readings = analysis.filtered_readings,
                points = analysis.points.len(),
                "Tank processed successfully"
            );
            TankSummary::from_analysis(&analysis, now).with_tank_id(tank_id)
        }
        Err(e) => {
            error!(error = %e, "Tank history fetch failed");
            TankSummary::from_error(now, "fetch_error", &format!("{e:#}")).with_tank_id(tank_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::RawReading;
    use anyhow::{Result, bail};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct InMemoryApi {
        tanks: HashMap<String, Vec<RawReading>>,
    }

    #[async_trait]
    impl HistoryApi for InMemoryApi {
        async fn tank_history(&self, tank_id: &str) -> Result<Vec<RawReading>> {
            match self.tanks.get(tank_id) {
                Some(readings) => Ok(readings.clone()),
                None => bail!("tank {tank_id} not found"),
            }
        }
    }

    fn raw(recorded_at: &str, pct: f64, liters: f64) -> RawReading {
        serde_json::from_value(json!({
            "recordedAt": recorded_at,
            "gasLevelPercentage": pct,
            "gasLevelLiters": liters,
        }))
        .unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn api() -> Arc<dyn HistoryApi> {
        let mut tanks = HashMap::new();
        tanks.insert(
            "1".to_string(),
            vec![
                raw("2024-05-08T10:00:00Z", 90.0, 270.0),
                raw("2024-05-09T10:00:00Z", 70.0, 210.0),
            ],
        );
        tanks.insert("2".to_string(), vec![]);
        Arc::new(InMemoryApi { tanks })
    }

    #[tokio::test]
    async fn test_rows_follow_input_order_and_failures_are_recorded() {
        let ids: Vec<String> = ["2", "missing", "1"].iter().map(|s| s.to_string()).collect();

        let rows = summarize_tanks(api(), &ids, Period::Last7Days, fixed_now(), &Utc, TrendPolicy::default(), 2).await;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].tank_id.as_deref(), Some("2"));
        assert_eq!(rows[0].readings, 0);
        assert!(!rows[0].is_error());

        assert_eq!(rows[1].tank_id.as_deref(), Some("missing"));
        assert_eq!(rows[1].error_type.as_deref(), Some("fetch_error"));

        assert_eq!(rows[2].tank_id.as_deref(), Some("1"));
        assert_eq!(rows[2].points, 2);
        assert_eq!(rows[2].consumption, 60.0);
        assert_eq!(rows[2].trend.as_deref(), Some("decreasing"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let ids = vec!["1".to_string()];
        let rows = summarize_tanks(api(), &ids, Period::All, fixed_now(), &Utc, TrendPolicy::default(), 0).await;
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_error());
    }
}
