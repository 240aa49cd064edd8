use crate::alerts::{evaluate, AlertRule};
use crate::client::TelemetrySource;
use crate::config::DashboardConfig;
use crate::metrics::{ACTIVE_ALERTS, POLLS_TOTAL, POLL_FAILURES_TOTAL};
use crate::view::DashboardView;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

pub type SharedView = Arc<RwLock<DashboardView>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered { alerts: usize },
    Failed,
}

/// Fetches the latest sample and renders it, together with its threshold
/// alerts, into the shared view.
pub struct SensorDashboardClient<S> {
    source: S,
    rules: Vec<AlertRule>,
    view: SharedView,
}

impl<S: TelemetrySource> SensorDashboardClient<S> {
    pub fn new(source: S, config: &DashboardConfig) -> Self {
        Self::with_rules(source, AlertRule::defaults(config))
    }

    pub fn with_rules(source: S, rules: Vec<AlertRule>) -> Self {
        Self {
            source,
            rules,
            view: Arc::new(RwLock::new(DashboardView::new())),
        }
    }

    pub fn view(&self) -> SharedView {
        Arc::clone(&self.view)
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// One poll cycle. Failures are logged and rendered, never returned.
    pub async fn fetch_and_render(&self) -> CycleOutcome {
        POLLS_TOTAL.inc();

        match self.source.fetch_latest().await {
            Ok(sample) => {
                let alerts = evaluate(&self.rules, &sample);
                let count = alerts.len();
                for alert in &alerts {
                    warn!(metric = ?alert.metric, "{}", alert.text);
                }

                // values and alerts land under one write lock
                self.view.write().await.apply_sample(&sample, alerts);
                ACTIVE_ALERTS.set(count as f64);

                debug!(
                    entry_id = ?sample.entry_id,
                    soil_moisture = sample.soil_moisture,
                    temperature = sample.temperature,
                    humidity = sample.humidity,
                    light_intensity = sample.light_intensity,
                    alerts = count,
                    "Rendered latest sample"
                );
                CycleOutcome::Rendered { alerts: count }
            }
            Err(e) => {
                POLL_FAILURES_TOTAL.inc();
                error!("Error fetching data: {}", e);
                self.view.write().await.apply_failure();
                CycleOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::model::{Metric, TelemetrySample};
    use crate::view::{AlertsPanel, FETCH_ERROR_TEXT, NO_ALERTS_TEXT};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed script of fetch results.
    struct Scripted(Mutex<VecDeque<Result<TelemetrySample, FetchError>>>);

    impl Scripted {
        fn new(results: Vec<Result<TelemetrySample, FetchError>>) -> Self {
            Self(Mutex::new(results.into()))
        }
    }

    impl TelemetrySource for Scripted {
        async fn fetch_latest(&self) -> Result<TelemetrySample, FetchError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::EmptyFeed))
        }
    }

    fn sample(soil_moisture: f64, temperature: f64) -> TelemetrySample {
        TelemetrySample {
            soil_moisture,
            temperature,
            humidity: 60.0,
            light_intensity: 80.0,
            entry_id: Some(3),
            created_at: None,
        }
    }

    fn client(results: Vec<Result<TelemetrySample, FetchError>>) -> SensorDashboardClient<Scripted> {
        SensorDashboardClient::new(Scripted::new(results), &DashboardConfig::new("1", "k"))
    }

    #[test]
    fn test_rules_follow_config() {
        let mut config = DashboardConfig::new("1", "k");
        config.temperature_max = 28.0;
        let dashboard = SensorDashboardClient::new(Scripted::new(vec![]), &config);

        let thresholds: Vec<_> = dashboard
            .rules()
            .iter()
            .map(|r| (r.metric, r.threshold))
            .collect();
        assert_eq!(
            thresholds,
            vec![(Metric::SoilMoisture, 30.0), (Metric::Temperature, 28.0)]
        );
    }

    #[test]
    fn test_custom_rules_only() {
        tokio_test::block_on(async {
            let dashboard = SensorDashboardClient::with_rules(
                Scripted::new(vec![Ok(sample(10.0, 40.0))]),
                vec![AlertRule::temperature_high(35.0)],
            );
            assert_eq!(dashboard.rules().len(), 1);
            assert_eq!(
                dashboard.fetch_and_render().await,
                CycleOutcome::Rendered { alerts: 1 }
            );
        });
    }

    #[test]
    fn test_cycle_renders_sample() {
        tokio_test::block_on(async {
            let dashboard = client(vec![Ok(sample(45.678, 20.1))]);

            assert_eq!(
                dashboard.fetch_and_render().await,
                CycleOutcome::Rendered { alerts: 0 }
            );

            let view = dashboard.view();
            let view = view.read().await;
            assert_eq!(view.value_text(Metric::SoilMoisture), Some("45.68 %"));
            assert_eq!(view.value_text(Metric::Temperature), Some("20.10 °C"));
            assert_eq!(view.alert_lines(), vec![NO_ALERTS_TEXT.to_string()]);
        });
    }

    #[test]
    fn test_cycle_renders_both_alerts() {
        tokio_test::block_on(async {
            let dashboard = client(vec![Ok(sample(10.0, 40.0))]);

            assert_eq!(
                dashboard.fetch_and_render().await,
                CycleOutcome::Rendered { alerts: 2 }
            );
            let view = dashboard.view();
            let lines = view.read().await.alert_lines();
            assert!(lines[0].contains("Low Soil Moisture"));
            assert!(lines[1].contains("High Temperature"));
        });
    }

    #[test]
    fn test_failed_cycle_keeps_previous_values() {
        tokio_test::block_on(async {
            let dashboard = client(vec![Ok(sample(45.0, 20.0)), Err(FetchError::EmptyFeed)]);

            dashboard.fetch_and_render().await;
            assert_eq!(dashboard.fetch_and_render().await, CycleOutcome::Failed);

            let view = dashboard.view();
            let view = view.read().await;
            assert_eq!(view.value_text(Metric::SoilMoisture), Some("45.00 %"));
            assert_eq!(view.alerts(), &AlertsPanel::FetchFailed);
            assert_eq!(view.alert_lines(), vec![FETCH_ERROR_TEXT.to_string()]);
        });
    }

    #[test]
    fn test_failure_before_first_sample() {
        tokio_test::block_on(async {
            let dashboard = client(vec![Err(FetchError::EmptyFeed)]);
            dashboard.fetch_and_render().await;

            let view = dashboard.view();
            let view = view.read().await;
            assert!(view.value_text(Metric::Humidity).is_none());
            assert_eq!(view.alerts(), &AlertsPanel::FetchFailed);
        });
    }

    #[test]
    fn test_identical_responses_render_identically() {
        tokio_test::block_on(async {
            let dashboard = client(vec![Ok(sample(10.0, 20.0)), Ok(sample(10.0, 20.0))]);

            dashboard.fetch_and_render().await;
            let first = dashboard.view().read().await.render_html(60).unwrap();
            dashboard.fetch_and_render().await;
            let second = dashboard.view().read().await.render_html(60).unwrap();

            assert_eq!(first, second);
        });
    }
}
