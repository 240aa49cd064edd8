use crate::errors::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /channels/{id}/feeds.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub channel: Option<ChannelInfo>,
    pub feeds: Vec<Feed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_entry_id: Option<u64>,
}

/// One feed entry. Field values arrive as strings, numbers or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<Value>,
    #[serde(default)]
    pub field2: Option<Value>,
    #[serde(default)]
    pub field3: Option<Value>,
    #[serde(default)]
    pub field4: Option<Value>,
}

impl Feed {
    pub fn field(&self, metric: Metric) -> Option<&Value> {
        match metric {
            Metric::SoilMoisture => self.field1.as_ref(),
            Metric::Temperature => self.field2.as_ref(),
            Metric::Humidity => self.field3.as_ref(),
            Metric::LightIntensity => self.field4.as_ref(),
        }
    }

    fn number(&self, metric: Metric) -> Result<f64, FetchError> {
        let field = metric.field_name();
        let parsed = match self.field(metric) {
            None | Some(Value::Null) => return Err(FetchError::MissingField { field }),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(FetchError::InvalidField {
                field,
                value: self.field(metric).map(Value::to_string).unwrap_or_default(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SoilMoisture,
    Temperature,
    Humidity,
    LightIntensity,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::SoilMoisture,
        Metric::Temperature,
        Metric::Humidity,
        Metric::LightIntensity,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            Metric::SoilMoisture => "field1",
            Metric::Temperature => "field2",
            Metric::Humidity => "field3",
            Metric::LightIntensity => "field4",
        }
    }

    /// Key of the display element the value is written into
    pub fn element_id(self) -> &'static str {
        match self {
            Metric::SoilMoisture => "soil-moisture",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::LightIntensity => "light-intensity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            _ => "%",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::SoilMoisture => "Soil Moisture",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::LightIntensity => "Light Intensity",
        }
    }
}

/// Latest reading of the sensor array, rebuilt on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub soil_moisture: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    pub entry_id: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl TelemetrySample {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SoilMoisture => self.soil_moisture,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::LightIntensity => self.light_intensity,
        }
    }

    /// Display text for one surface, e.g. `45.68 %`
    pub fn formatted(&self, metric: Metric) -> String {
        format!("{} {}", format_value(self.value(metric)), metric.unit())
    }
}

impl TryFrom<&Feed> for TelemetrySample {
    type Error = FetchError;

    fn try_from(feed: &Feed) -> Result<Self, Self::Error> {
        Ok(Self {
            soil_moisture: feed.number(Metric::SoilMoisture)?,
            temperature: feed.number(Metric::Temperature)?,
            humidity: feed.number(Metric::Humidity)?,
            light_intensity: feed.number(Metric::LightIntensity)?,
            entry_id: feed.entry_id,
            created_at: feed.created_at,
        })
    }
}

impl TryFrom<FeedResponse> for TelemetrySample {
    type Error = FetchError;

    /// Uses the first entry, which is the most recent one when `results=1`.
    fn try_from(response: FeedResponse) -> Result<Self, Self::Error> {
        let latest = response.feeds.first().ok_or(FetchError::EmptyFeed)?;
        TelemetrySample::try_from(latest)
    }
}

/// Two fractional digits, halfway cases rounded away from zero.
pub fn format_value(value: f64) -> String {
    // exact halfway cases at two decimals are the odd multiples of 1/8;
    // `{:.2}` would round those to even
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return format!("{:.2}", value + value.signum() * 0.001);
    }
    format!("{:.2}", value)
}
