//! Where the poller gets its medication list.
//!
//! Provides the [`MedicationSource`] trait and [`HttpMedicationSource`], which
//! reads a JSON array of [`Medication`] from an HTTP endpoint. Any server
//! speaking that contract works, `ember serve` included.

use std::time::Duration;

use anyhow::{Context, Result};

use super::types::Medication;

/// A provider of the current medication list.
#[allow(async_fn_in_trait)]
pub trait MedicationSource {
    /// Fetch every medication. An error aborts the poll cycle.
    async fn fetch_medications(&self) -> Result<Vec<Medication>>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Medication list served as JSON over HTTP GET.
pub struct HttpMedicationSource {
    client: reqwest::Client,
    url: String,
}

impl HttpMedicationSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &crate::config::ReminderConfig) -> Result<Self> {
        Self::new(
            config.medications_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

impl MedicationSource for HttpMedicationSource {
    async fn fetch_medications(&self) -> Result<Vec<Medication>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {}", self.url))?;

        anyhow::ensure!(
            response.status().is_success(),
            "medication source returned HTTP {}",
            response.status()
        );

        let body = response
            .text()
            .await
            .context("error reading medication list")?;
        parse_medications(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Decode a medication list payload.
pub fn parse_medications(body: &str) -> Result<Vec<Medication>> {
    serde_json::from_str(body).context("malformed medication list")
}
