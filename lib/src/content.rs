//! Fetches chapter files and course entries for the editor.

use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, warn};
use url::Url;

use crate::api::GET_CONTENT_PATH;
use crate::data::{ChapterFiles, File, Language};
use crate::error::{Error, Result};
use crate::raw_data::{RawAsset, RawChapterEntry};

pub const COURSE_MODULE_TYPE: &str = "courseModule";

#[derive(Clone, Debug)]
pub struct ContentFetcher {
    client: Client,
    api_base: Url,
    asset_scheme: String,
}

impl ContentFetcher {
    pub fn new(client: Client, api_base: Url) -> Self {
        Self {
            client,
            api_base,
            asset_scheme: "https:".to_owned(),
        }
    }

    /// Scheme prefixed to protocol-relative asset urls (`//host/path`).
    pub fn with_asset_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.asset_scheme = scheme.into();
        self
    }

    pub async fn fetch_file(&self, descriptor: &Value) -> Result<File> {
        let raw_file = RawAsset::from_value(descriptor)?;
        let url = if raw_file.url.starts_with("//") {
            format!("{}{}", self.asset_scheme, raw_file.url)
        } else {
            raw_file.url.clone()
        };

        let code = self.download(&url).await.map_err(|err| {
            error!("Error fetching file {}: {err}", raw_file.file_name);
            err
        })?;

        Ok(File {
            language: Language::from_file_name(&raw_file.file_name)
                .as_str()
                .to_owned(),
            file_name: raw_file.file_name,
            code,
        })
    }

    async fn download(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        Ok(response.text().await?)
    }

    /// Fetches the source, template and solution groups. A group in which
    /// any file fails comes back empty; the other groups are unaffected.
    pub async fn files_for_chapter(&self, entry: &Value) -> Result<ChapterFiles> {
        let fields = RawChapterEntry::from_value(entry)?;

        let (source, template, solution) = tokio::join!(
            self.fetch_group("source", fields.source.unwrap_or_default()),
            self.fetch_group("template", fields.template.unwrap_or_default()),
            self.fetch_group("solution", fields.solution.unwrap_or_default()),
        );

        Ok(ChapterFiles {
            source,
            template,
            solution,
        })
    }

    async fn fetch_group(&self, group: &str, descriptors: Vec<Value>) -> Vec<File> {
        try_join_all(descriptors.iter().map(|descriptor| self.fetch_file(descriptor)))
            .await
            .unwrap_or_else(|err| {
                warn!("Error fetching {group} files: {err}");
                Vec::new()
            })
    }

    /// Raw content-store JSON through the content endpoint. Not cached.
    pub async fn get_content(
        &self,
        content_type: &str,
        slug: Option<&str>,
        id: Option<&str>,
    ) -> Result<Value> {
        let url = self.api_base.join(GET_CONTENT_PATH)?;
        let mut query = vec![("type", content_type)];

        if let Some(slug) = slug {
            query.push(("slug", slug));
        }
        if let Some(id) = id {
            query.push(("id", id));
        }

        let response = self.client.get(url).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn course_details(&self, slug: &str) -> Result<Value> {
        self.get_content(COURSE_MODULE_TYPE, Some(slug), None)
            .await
            .map_err(|err| {
                error!("Error fetching course details for {slug}: {err}");
                err
            })
    }
}
