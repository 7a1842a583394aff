use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

use frond_core::models::WateringRecord;
use frond_core::service::WateringStore;

use crate::config::StoreConfig;

const TABLE_PATH: &str = "rest/v1/waterings";
const SELECT_COLUMNS: &str =
    "plant_name,category,default_interval_days,last_watered_at,next_water_due_at";

/// Watering store backed by a Supabase (PostgREST) `waterings` table keyed
/// by plant name.
///
/// Built without credentials it reports `available() == false` and every
/// operation returns the unconfigured error, so callers can run in
/// catalog-only mode without special-casing the network layer.
pub struct SupabaseStore {
    client: reqwest::Client,
    config: Option<StoreConfig>,
}

impl SupabaseStore {
    #[must_use]
    pub fn new(config: Option<StoreConfig>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "frond-cli/{} (plant care tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    fn config(&self) -> Result<&StoreConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| anyhow!("watering store is not configured"))
    }

    async fn select(&self, filter: Option<(&str, String)>) -> Result<Vec<WateringRecord>> {
        let config = self.config()?;

        let mut request = self
            .client
            .get(format!("{}/{TABLE_PATH}", config.url))
            .header("apikey", &config.key)
            .bearer_auth(&config.key)
            .query(&[("select", SELECT_COLUMNS)]);

        if let Some((column, value)) = filter {
            request = request.query(&[(column, value.as_str())]);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach watering store")?
            .error_for_status()
            .context("Watering store rejected the query")?;

        response
            .json()
            .await
            .context("Failed to parse watering store response")
    }
}

#[async_trait]
impl WateringStore for SupabaseStore {
    fn available(&self) -> bool {
        self.config.is_some()
    }

    async fn fetch(&self, plant_name: &str) -> Result<Option<WateringRecord>> {
        let rows = self
            .select(Some(("plant_name", format!("eq.{plant_name}"))))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_all(&self) -> Result<Vec<WateringRecord>> {
        self.select(None).await
    }

    async fn upsert(&self, record: &WateringRecord) -> Result<WateringRecord> {
        let config = self.config()?;

        let response = self
            .client
            .post(format!("{}/{TABLE_PATH}", config.url))
            .header("apikey", &config.key)
            .bearer_auth(&config.key)
            // merge-duplicates keeps columns the payload omits, so a
            // snooze never clears last_watered_at.
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(record)
            .send()
            .await
            .context("Failed to reach watering store")?
            .error_for_status()
            .context("Watering store rejected the upsert")?;

        let rows: Vec<WateringRecord> = response
            .json()
            .await
            .context("Failed to parse watering store response")?;

        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Watering store upsert returned no rows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> SupabaseStore {
        SupabaseStore::new(None)
    }

    #[test]
    fn test_unconfigured_store_is_unavailable() {
        assert!(!unconfigured().available());
        assert!(
            SupabaseStore::new(Some(StoreConfig {
                url: "https://example.supabase.co".to_string(),
                key: "anon".to_string(),
            }))
            .available()
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_rejects_operations() {
        let store = unconfigured();

        let err = store.fetch("Aloe Vera").await.unwrap_err();
        assert_eq!(err.to_string(), "watering store is not configured");

        let err = store.fetch_all().await.unwrap_err();
        assert_eq!(err.to_string(), "watering store is not configured");

        let record = WateringRecord::named("Aloe Vera");
        let err = store.upsert(&record).await.unwrap_err();
        assert_eq!(err.to_string(), "watering store is not configured");
    }

    // Integration tests against a real project. Run manually:
    // SUPABASE_URL=... SUPABASE_ANON_KEY=... cargo test -- --ignored

    #[tokio::test]
    #[ignore = "hits a live Supabase project"]
    async fn test_fetch_all_live() {
        let store = SupabaseStore::from_env();
        assert!(store.available(), "SUPABASE_URL / SUPABASE_ANON_KEY not set");

        let rows = store.fetch_all().await.unwrap();
        for row in rows {
            assert!(!row.plant_name.is_empty());
        }
    }

    #[tokio::test]
    #[ignore = "hits a live Supabase project"]
    async fn test_upsert_then_fetch_live() {
        let store = SupabaseStore::from_env();
        assert!(store.available(), "SUPABASE_URL / SUPABASE_ANON_KEY not set");

        let mut record = WateringRecord::named("__frond_test__");
        record.default_interval_days = Some(9);

        let saved = store.upsert(&record).await.unwrap();
        assert_eq!(saved.default_interval_days, Some(9));

        let fetched = store.fetch("__frond_test__").await.unwrap();
        assert_eq!(fetched.unwrap().default_interval_days, Some(9));
    }
}
