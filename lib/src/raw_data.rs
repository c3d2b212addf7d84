use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Content-store asset as delivered inside an entry, e.g.
/// `{ "fields": { "file": { "url": "//cdn/...", "fileName": "main.rs" } } }`.
#[derive(Serialize, Deserialize, Debug)]
pub struct RawAsset {
    pub fields: Option<RawAssetFields>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RawAssetFields {
    pub file: Option<RawAssetFile>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawAssetFile {
    pub url: String,
    pub file_name: String,
}

impl RawAsset {
    pub fn from_value(value: &Value) -> Result<RawAssetFile> {
        if !value.is_object() {
            return Err(Error::InvalidDescriptor(
                "File is not an object or file.fields is null".to_owned(),
            ));
        }

        let raw: Self = serde_json::from_value(value.clone()).map_err(|err| {
            Error::InvalidDescriptor(format!("File descriptor is malformed: {err}"))
        })?;

        raw.fields
            .ok_or_else(|| {
                Error::InvalidDescriptor("File is not an object or file.fields is null".to_owned())
            })?
            .file
            .ok_or_else(|| Error::InvalidDescriptor("File descriptor has no fields.file".to_owned()))
    }
}

/// Chapter entry holding the three asset groups.
#[derive(Serialize, Deserialize, Debug)]
pub struct RawChapterEntry {
    pub fields: Option<RawChapterFields>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct RawChapterFields {
    #[serde(default)]
    pub source: Option<Vec<Value>>,
    #[serde(default)]
    pub template: Option<Vec<Value>>,
    #[serde(default)]
    pub solution: Option<Vec<Value>>,
}

impl RawChapterEntry {
    pub fn from_value(value: &Value) -> Result<RawChapterFields> {
        let raw: Self = serde_json::from_value(value.clone()).map_err(|err| {
            Error::InvalidDescriptor(format!("Chapter entry is malformed: {err}"))
        })?;

        raw.fields
            .ok_or_else(|| Error::InvalidDescriptor("Chapter entry has no fields".to_owned()))
    }
}
