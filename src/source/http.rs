use std::time::Duration;

use async_trait::async_trait;

use super::AncestorSource;
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{Dataset, PersonId};

/// Path of the expand endpoint, relative to the site root.
const EXPAND_PATH: &str = "/api/arbre/expand";

/// Calls `GET /api/arbre/expand?person_id=<id>&gens=<n>&mode=ancestors`.
#[derive(Debug, Clone)]
pub struct HttpAncestorSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAncestorSource {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("arbre/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, EXPAND_PATH)
    }
}

#[async_trait]
impl AncestorSource for HttpAncestorSource {
    async fn expand(&self, person: PersonId, gens: u32) -> Result<Dataset, AppError> {
        let url = self.endpoint();
        tracing::debug!(%url, %person, gens, "Requesting ancestors");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("person_id", person.to_string()),
                ("gens", gens.to_string()),
                ("mode", "ancestors".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                person,
            });
        }

        let body = response.bytes().await?;
        let dataset: Dataset = serde_json::from_slice(&body)?;
        tracing::debug!(
            %person,
            people = dataset.people.len(),
            links = dataset.links.len(),
            "Ancestors received"
        );
        Ok(dataset)
    }
}
