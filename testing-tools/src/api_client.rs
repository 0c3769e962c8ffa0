use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Publishes a new-dev notification the way the dev registration flow does.
    pub async fn publish_new_dev(&self, dev: &Value) -> Result<()> {
        let url = format!("{}/notifications/new-dev", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "dev": dev }))
            .send()
            .await
            .context("Failed to publish new dev")?;

        expect_status(response, StatusCode::ACCEPTED, "publish new dev").await?;
        Ok(())
    }

    /// Returns the sessions the server currently has registered.
    pub async fn list_connections(&self) -> Result<Vec<Value>> {
        let url = format!("{}/realtime/connections", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to list realtime connections")?;

        let response = expect_status(response, StatusCode::OK, "list connections").await?;
        let body: Value = response
            .json()
            .await
            .context("Failed to parse connections response")?;

        Ok(body["data"].as_array().cloned().unwrap_or_default())
    }

    pub async fn update_coordinates(
        &self,
        session_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<()> {
        let url = format!("{}/realtime/{}/coordinates", self.base_url, session_id);

        let response = self
            .client
            .put(&url)
            .json(&json!({ "latitude": latitude, "longitude": longitude }))
            .send()
            .await
            .context("Failed to update coordinates")?;

        expect_status(response, StatusCode::NO_CONTENT, "update coordinates").await?;
        Ok(())
    }
}

async fn expect_status(
    response: reqwest::Response,
    expected: StatusCode,
    action: &str,
) -> Result<reqwest::Response> {
    if response.status() == expected {
        return Ok(response);
    }

    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    anyhow::bail!("Failed to {}: {} - Response: {}", action, status, body);
}
