//! Display surfaces of the dashboard.
//!
//! Four value surfaces and one alerts region, keyed by the same element ids
//! the HTML page uses. A successful cycle overwrites all of them at once; a
//! failed cycle only touches the alerts region.

use crate::alerts::AlertMessage;
use crate::model::{Metric, TelemetrySample};
use askama::Template;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const NO_ALERTS_TEXT: &str = "No alerts at the moment.";
pub const FETCH_ERROR_TEXT: &str = "Error fetching data from ThingSpeak.";

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "alerts", rename_all = "snake_case")]
pub enum AlertsPanel {
    /// Nothing fetched yet
    #[default]
    Pending,
    NoAlerts,
    Alerts(Vec<AlertMessage>),
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashboardView {
    values: BTreeMap<&'static str, String>,
    alerts: AlertsPanel,
    pub entry_id: Option<u64>,
    pub sample_time: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub cycles: u64,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one whole cycle: every value surface plus the alerts region.
    pub fn apply_sample(&mut self, sample: &TelemetrySample, alerts: Vec<AlertMessage>) {
        for metric in Metric::ALL {
            self.values
                .insert(metric.element_id(), sample.formatted(metric));
        }

        self.alerts = if alerts.is_empty() {
            AlertsPanel::NoAlerts
        } else {
            AlertsPanel::Alerts(alerts)
        };

        let now = Utc::now();
        self.entry_id = sample.entry_id;
        self.sample_time = sample.created_at;
        self.last_success = Some(now);
        self.last_attempt = Some(now);
        self.cycles += 1;
    }

    /// Value surfaces keep their last-known-good text.
    pub fn apply_failure(&mut self) {
        self.alerts = AlertsPanel::FetchFailed;
        self.last_attempt = Some(Utc::now());
        self.cycles += 1;
    }

    pub fn value_text(&self, metric: Metric) -> Option<&str> {
        self.values.get(metric.element_id()).map(String::as_str)
    }

    pub fn alerts(&self) -> &AlertsPanel {
        &self.alerts
    }

    /// Text lines of the alerts region as shown to the user.
    pub fn alert_lines(&self) -> Vec<String> {
        match &self.alerts {
            AlertsPanel::Pending => Vec::new(),
            AlertsPanel::NoAlerts => vec![NO_ALERTS_TEXT.to_string()],
            AlertsPanel::Alerts(alerts) => alerts.iter().map(|a| a.text.clone()).collect(),
            AlertsPanel::FetchFailed => vec![FETCH_ERROR_TEXT.to_string()],
        }
    }

    /// Inner HTML of the `alerts` element
    pub fn alerts_html(&self) -> askama::Result<String> {
        AlertsTemplate {
            alert_lines: self.alert_lines(),
            highlight: self.highlight_alerts(),
        }
        .render()
    }

    /// Full dashboard page. `refresh_secs` sets the browser reload interval.
    pub fn render_html(&self, refresh_secs: u64) -> askama::Result<String> {
        let cards = Metric::ALL
            .iter()
            .map(|&metric| Card {
                label: metric.label(),
                id: metric.element_id(),
                value: self.value_text(metric).unwrap_or("--"),
            })
            .collect();

        IndexTemplate {
            refresh_secs,
            cards,
            alert_lines: self.alert_lines(),
            highlight: self.highlight_alerts(),
            updated: self
                .sample_time
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        }
        .render()
    }

    // the placeholder is the only unhighlighted line
    fn highlight_alerts(&self) -> bool {
        !matches!(self.alerts, AlertsPanel::NoAlerts)
    }
}

struct Card<'a> {
    label: &'static str,
    id: &'static str,
    value: &'a str,
}

#[derive(Template)]
#[template(path = "alerts.html")]
struct AlertsTemplate {
    alert_lines: Vec<String>,
    highlight: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    refresh_secs: u64,
    cards: Vec<Card<'a>>,
    alert_lines: Vec<String>,
    highlight: bool,
    updated: Option<String>,
}
