use crate::config::DashboardConfig;
use crate::model::{format_value, Metric, TelemetrySample};
use serde::{Deserialize, Serialize};
use std::fmt;

const WARNING_GLYPH: &str = "⚠️";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    LessThan,
    GreaterThan,
}

impl Comparison {
    pub fn violated_by(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => value < threshold,
            Comparison::GreaterThan => value > threshold,
        }
    }
}

/// Fixed threshold check on one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRule {
    pub metric: Metric,
    pub comparison: Comparison,
    pub threshold: f64,
    pub label: &'static str,
}

impl AlertRule {
    pub fn soil_moisture_low(threshold: f64) -> Self {
        Self {
            metric: Metric::SoilMoisture,
            comparison: Comparison::LessThan,
            threshold,
            label: "Low Soil Moisture",
        }
    }

    pub fn temperature_high(threshold: f64) -> Self {
        Self {
            metric: Metric::Temperature,
            comparison: Comparison::GreaterThan,
            threshold,
            label: "High Temperature",
        }
    }

    /// Both rules, in evaluation order.
    pub fn defaults(config: &DashboardConfig) -> Vec<AlertRule> {
        vec![
            AlertRule::soil_moisture_low(config.soil_moisture_min),
            AlertRule::temperature_high(config.temperature_max),
        ]
    }

    /// Compares the parsed value, not the two-decimal display text.
    pub fn check(&self, sample: &TelemetrySample) -> Option<AlertMessage> {
        let value = sample.value(self.metric);
        if !self.comparison.violated_by(value, self.threshold) {
            return None;
        }

        Some(AlertMessage {
            metric: self.metric,
            text: format!(
                "{} {}: {}{} (Threshold: {}{})",
                WARNING_GLYPH,
                self.label,
                format_value(value),
                self.metric.unit(),
                self.threshold,
                self.metric.unit()
            ),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub metric: Metric,
    pub text: String,
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Alerts fired by `sample`, in rule order.
pub fn evaluate(rules: &[AlertRule], sample: &TelemetrySample) -> Vec<AlertMessage> {
    rules.iter().filter_map(|rule| rule.check(sample)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sample(soil_moisture: f64, temperature: f64) -> TelemetrySample {
        TelemetrySample {
            soil_moisture,
            temperature,
            humidity: 50.0,
            light_intensity: 50.0,
            entry_id: None,
            created_at: None,
        }
    }

    fn rules() -> Vec<AlertRule> {
        AlertRule::defaults(&DashboardConfig::new("1", "k"))
    }

    #[test]
    fn test_no_alerts_within_thresholds() {
        assert!(evaluate(&rules(), &sample(45.678, 20.1)).is_empty());
    }

    #[test]
    fn test_no_alerts_for_random_healthy_readings() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let s = sample(rng.gen_range(30.0..=100.0), rng.gen_range(-20.0..=35.0));
            assert!(evaluate(&rules(), &s).is_empty(), "unexpected alert for {:?}", s);
        }
    }

    #[test]
    fn test_low_soil_moisture() {
        let alerts = evaluate(&rules(), &sample(12.346, 20.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].text,
            "⚠️ Low Soil Moisture: 12.35% (Threshold: 30%)"
        );
    }

    #[test]
    fn test_high_temperature() {
        let alerts = evaluate(&rules(), &sample(50.0, 35.5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Metric::Temperature);
        assert_eq!(
            alerts[0].to_string(),
            "⚠️ High Temperature: 35.50°C (Threshold: 35°C)"
        );
    }

    #[test]
    fn test_both_alerts_in_rule_order() {
        let alerts = evaluate(&rules(), &sample(10.0, 40.0));
        let texts: Vec<_> = alerts.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "⚠️ Low Soil Moisture: 10.00% (Threshold: 30%)",
                "⚠️ High Temperature: 40.00°C (Threshold: 35°C)",
            ]
        );
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        assert!(evaluate(&rules(), &sample(30.0, 35.0)).is_empty());
    }

    #[test]
    fn test_raw_value_decides_near_boundary() {
        // 29.996 displays as 30.00 but is below the threshold
        let alerts = evaluate(&rules(), &sample(29.996, 20.0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].text,
            "⚠️ Low Soil Moisture: 30.00% (Threshold: 30%)"
        );

        // 35.004 displays as 35.00 but is above the threshold
        assert_eq!(evaluate(&rules(), &sample(50.0, 35.004)).len(), 1);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut config = DashboardConfig::new("1", "k");
        config.soil_moisture_min = 22.5;
        let alerts = evaluate(&AlertRule::defaults(&config), &sample(20.0, 0.0));
        assert_eq!(
            alerts[0].text,
            "⚠️ Low Soil Moisture: 20.00% (Threshold: 22.5%)"
        );
    }
}
