//! Headless CMS access for the content endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_CONTENTFUL_BASE_URL: &str = "https://cdn.contentful.com";

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_entry(&self, id: &str) -> Result<Value>;

    /// The entries collection for a content type, optionally narrowed to
    /// entries whose `fields.slug` equals `slug`.
    async fn get_entries(&self, content_type: &str, slug: Option<&str>) -> Result<Value>;
}

#[derive(Clone, Debug)]
pub struct ContentfulConfig {
    pub base_url: Url,
    pub space_id: String,
    pub environment: String,
    pub access_token: SecretString,
}

impl ContentfulConfig {
    /// Builds a config when all three credentials are present.
    pub fn from_parts(
        base_url: Url,
        space_id: Option<String>,
        environment: Option<String>,
        access_token: Option<SecretString>,
    ) -> Result<Self> {
        match (space_id, environment, access_token) {
            (Some(space_id), Some(environment), Some(access_token)) => Ok(Self {
                base_url,
                space_id,
                environment,
                access_token,
            }),
            _ => Err(Error::Config(
                "Contentful environment variables are not set".to_owned(),
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContentfulClient {
    client: Client,
    config: ContentfulConfig,
}

impl ContentfulClient {
    pub fn new(client: Client, config: ContentfulConfig) -> Self {
        Self { client, config }
    }

    /// The entries collection, or one entry when `id` is given. The id is
    /// pushed as a single percent-encoded segment and can never climb out of
    /// `entries/`.
    fn entries_url(&self, id: Option<&str>) -> Result<Url> {
        let mut url = self.config.base_url.clone();

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                Error::Config(format!(
                    "Contentful base URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?;

            segments.pop_if_empty().extend([
                "spaces",
                self.config.space_id.as_str(),
                "environments",
                self.config.environment.as_str(),
                "entries",
            ]);

            if let Some(id) = id {
                if matches!(id, "" | "." | "..") {
                    return Err(Error::NotFound);
                }
                segments.push(id);
            }
        }

        Ok(url)
    }

    async fn get_json(&self, url: Url, query: &[(&str, &str)]) -> Result<Value> {
        debug!(%url, "querying content store");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .query(query)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::NotFound),
            status if !status.is_success() => Err(Error::HttpStatus(status)),
            _ => Ok(response.json().await?),
        }
    }
}

#[async_trait]
impl ContentStore for ContentfulClient {
    async fn get_entry(&self, id: &str) -> Result<Value> {
        let url = self.entries_url(Some(id))?;

        self.get_json(url, &[]).await
    }

    async fn get_entries(&self, content_type: &str, slug: Option<&str>) -> Result<Value> {
        let url = self.entries_url(None)?;
        let mut query = vec![("content_type", content_type)];

        if let Some(slug) = slug {
            query.push(("fields.slug", slug));
        }

        self.get_json(url, &query).await
    }
}
