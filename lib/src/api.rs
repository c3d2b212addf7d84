use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::progress::CompletionMap;
use crate::session::UserDetail;

pub const GET_PROGRESS_PATH: &str = "/api/get-progress";
pub const UPDATE_PROGRESS_PATH: &str = "/api/update-progress";
pub const GET_CONTENT_PATH: &str = "/api/get-content";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub user: UserDetail,
    #[serde(default)]
    pub progress: CompletionMap,
}

#[derive(Serialize, Clone, Debug)]
pub struct UpdateProgressRequest<'a> {
    pub updates: &'a [ProgressUpdate],
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateProgressResponse {
    pub success: bool,
    pub modified: u64,
    pub inserted: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GetProgressResponse {
    #[serde(default)]
    pub progress: CompletionMap,
}

/// Remote side of progress persistence.
#[async_trait]
pub trait ProgressApi: Send + Sync {
    async fn get_progress(&self, user: &UserDetail) -> Result<CompletionMap>;

    async fn update_progress(&self, updates: &[ProgressUpdate]) -> Result<UpdateProgressResponse>;
}

/// Talks to the progress handlers over HTTP.
#[derive(Clone, Debug)]
pub struct HttpProgressApi {
    client: Client,
    base_url: Url,
}

impl HttpProgressApi {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ProgressApi for HttpProgressApi {
    async fn get_progress(&self, user: &UserDetail) -> Result<CompletionMap> {
        let url = self.base_url.join(GET_PROGRESS_PATH)?;
        let user = serde_json::to_string(user)?;

        let response = self
            .client
            .get(url)
            .query(&[("user", user)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        Ok(response.json::<GetProgressResponse>().await?.progress)
    }

    async fn update_progress(&self, updates: &[ProgressUpdate]) -> Result<UpdateProgressResponse> {
        let url = self.base_url.join(UPDATE_PROGRESS_PATH)?;

        let response = self
            .client
            .post(url)
            .json(&UpdateProgressRequest { updates })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}
