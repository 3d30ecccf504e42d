//! Resolv points API client.
//!
//! Consumes two read-only endpoints:
//! - `GET {base}/points/stats` → `{ "totalPoints": number, ... }`
//! - `GET {base}/points?address=<addr>` → `{ "dailyPoints": number, "totalPoints": number, ... }`

use super::{DataSourceError, PointsSource};
use crate::domain::{Address, Decimal, ParticipantFigures};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResolvPointsSource {
    client: Client,
    base_url: String,
}

impl ResolvPointsSource {
    /// Build a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?query, "Requesting points API");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DataSourceError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let subject = query.first().map(|(_, v)| *v).unwrap_or(path);
            return Err(DataSourceError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            return Err(DataSourceError::HttpError {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DataSourceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl PointsSource for ResolvPointsSource {
    async fn fetch_global_total(&self) -> Result<Decimal, DataSourceError> {
        let json = self.get_json("/points/stats", &[]).await?;
        parse_global_total(&json)
    }

    async fn fetch_participant(
        &self,
        address: &Address,
    ) -> Result<ParticipantFigures, DataSourceError> {
        let json = self
            .get_json("/points", &[("address", address.as_str())])
            .await?;
        parse_participant(address, &json)
    }
}

fn parse_global_total(json: &serde_json::Value) -> Result<Decimal, DataSourceError> {
    match json.get("totalPoints") {
        Some(v) if !v.is_null() => decimal_field("totalPoints", v),
        _ => Err(DataSourceError::ParseError(
            "Missing totalPoints field".to_string(),
        )),
    }
}

/// Absent figures read as zero; present but non-numeric figures are an error.
fn parse_participant(
    address: &Address,
    json: &serde_json::Value,
) -> Result<ParticipantFigures, DataSourceError> {
    let optional = |name: &str| match json.get(name) {
        Some(v) if !v.is_null() => decimal_field(name, v),
        _ => Ok(Decimal::zero()),
    };

    Ok(ParticipantFigures::new(
        address.clone(),
        optional("dailyPoints")?,
        optional("totalPoints")?,
    ))
}

fn decimal_field(name: &str, value: &serde_json::Value) -> Result<Decimal, DataSourceError> {
    serde_json::from_value::<Decimal>(value.clone())
        .map_err(|e| DataSourceError::ParseError(format!("Invalid {}: {}", name, e)))
}
