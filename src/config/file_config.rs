use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Warehouse engine: "redshift" or "sqlite".
    pub backend: Option<String>,
    /// "per-statement" or "per-stage".
    pub commit_mode: Option<String>,

    pub cluster: Option<ClusterConfig>,
    pub sqlite: Option<SqliteConfig>,
    pub s3: Option<S3Config>,
    pub iam_role: Option<IamRoleConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClusterConfig {
    pub host: Option<String>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SqliteConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct S3Config {
    pub log_data: Option<String>,
    /// JSONPaths document for the event log; `auto` mapping when absent.
    pub log_jsonpath: Option<String>,
    pub song_data: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct IamRoleConfig {
    pub arn: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
