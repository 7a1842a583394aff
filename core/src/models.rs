use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// One entry of the plant catalog, as parsed from the care-guide CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub light: String,
    #[serde(default)]
    pub water: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub image: String,
}

/// Stored watering row, keyed by plant name (1:1 with a catalog entry).
///
/// Absent fields are omitted on the wire so an upsert never clobbers
/// columns it did not set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WateringRecord {
    pub plant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_interval_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_water_due_at: Option<String>,
}

impl WateringRecord {
    /// A row for `plant_name` with every other field absent.
    #[must_use]
    pub fn named(plant_name: impl Into<String>) -> Self {
        Self {
            plant_name: plant_name.into(),
            category: None,
            default_interval_days: None,
            last_watered_at: None,
            next_water_due_at: None,
        }
    }
}

pub fn validate_interval_days(days: i64) -> Result<()> {
    if days <= 0 {
        bail!("Interval days must be greater than 0 (got {days})");
    }
    Ok(())
}
