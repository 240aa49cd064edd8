use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// ThingSpeak-shaped feed entry. Field values are strings on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub created_at: DateTime<Utc>,
    pub entry_id: u64,
    pub field1: String,
    pub field2: String,
    pub field3: String,
    pub field4: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub name: String,
    pub field1: String,
    pub field2: String,
    pub field3: String,
    pub field4: String,
    pub last_entry_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsBody {
    pub channel: Channel,
    pub feeds: Vec<Feed>,
}

impl Channel {
    pub fn new(id: u64, last_entry_id: u64) -> Self {
        Self {
            id,
            name: "Sensor Array".to_string(),
            field1: "Soil Moisture".to_string(),
            field2: "Temperature".to_string(),
            field3: "Humidity".to_string(),
            field4: "Light Intensity".to_string(),
            last_entry_id,
        }
    }
}

/// One reading; `outlier_rate` is the chance each metric leaves its normal range.
pub fn generate_feed(
    rng: &mut impl Rng,
    entry_id: u64,
    created_at: DateTime<Utc>,
    outlier_rate: f64,
) -> Feed {
    let soil_moisture = if rng.gen_bool(outlier_rate) {
        rng.gen_range(0.0..30.0) // dry soil
    } else {
        rng.gen_range(30.0..80.0)
    };

    let temperature = if rng.gen_bool(outlier_rate) {
        rng.gen_range(35.0..50.0) // heat
    } else {
        rng.gen_range(15.0..35.0)
    };

    let humidity = rng.gen_range(30.0..90.0);
    let light_intensity = rng.gen_range(0.0..100.0);

    Feed {
        created_at,
        entry_id,
        field1: format!("{:.3}", soil_moisture),
        field2: format!("{:.3}", temperature),
        field3: format!("{:.3}", humidity),
        field4: format!("{:.3}", light_intensity),
    }
}
