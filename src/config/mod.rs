mod file_config;

pub use file_config::{ClusterConfig, FileConfig, IamRoleConfig, S3Config, SqliteConfig};

use crate::error::{EtlError, EtlResult};
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "dwh.toml";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_REDSHIFT_PORT: u16 = 5439;

/// How statements inside a stage are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CommitMode {
    /// Every statement commits on its own; a failure keeps earlier results.
    #[default]
    PerStatement,
    /// A whole stage runs in one transaction and is rolled back on failure.
    PerStage,
}

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub per_stage: bool,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClusterSettings {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl fmt::Debug for ClusterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterSettings")
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Redshift(ClusterSettings),
    Sqlite { path: PathBuf },
}

/// Locations of the two bulk sources. For the SQLite backend these are local
/// files or directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSources {
    pub log_data: String,
    pub log_jsonpath: Option<String>,
    pub song_data: String,
    pub region: String,
}

/// Role the warehouse assumes to read the bulk sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCredential {
    pub arn: String,
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub backend: Backend,
    pub commit_mode: CommitMode,
    pub sources: BulkSources,
    pub credential: Option<RoleCredential>,
}

fn missing(key: &str) -> EtlError {
    EtlError::Config(format!("missing required setting `{}`", key))
}

fn required(value: Option<String>, key: &str) -> EtlResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(missing(key)),
    }
}

impl WarehouseConfig {
    /// Resolve configuration from the TOML file and CLI flags.
    /// `--per-stage` on the command line wins over the file's commit mode.
    pub fn resolve(cli: &CliConfig, file: FileConfig) -> EtlResult<Self> {
        let backend_name = file.backend.unwrap_or_else(|| "redshift".to_string());

        let backend = match backend_name.to_ascii_lowercase().as_str() {
            "redshift" => {
                let cluster = file.cluster.ok_or_else(|| missing("cluster"))?;
                Backend::Redshift(ClusterSettings {
                    host: required(cluster.host, "cluster.host")?,
                    dbname: required(cluster.dbname, "cluster.dbname")?,
                    user: required(cluster.user, "cluster.user")?,
                    password: cluster.password.unwrap_or_default(),
                    port: cluster.port.unwrap_or(DEFAULT_REDSHIFT_PORT),
                })
            }
            "sqlite" => {
                let sqlite = file.sqlite.ok_or_else(|| missing("sqlite"))?;
                Backend::Sqlite {
                    path: PathBuf::from(required(sqlite.path, "sqlite.path")?),
                }
            }
            other => {
                return Err(EtlError::Config(format!(
                    "unknown backend `{}`, expected `redshift` or `sqlite`",
                    other
                )))
            }
        };

        let commit_mode = if cli.per_stage {
            CommitMode::PerStage
        } else {
            match file.commit_mode {
                Some(s) => parse_commit_mode(&s).ok_or_else(|| {
                    EtlError::Config(format!(
                        "unknown commit_mode `{}`, expected `per-statement` or `per-stage`",
                        s
                    ))
                })?,
                None => CommitMode::default(),
            }
        };

        let s3 = file.s3.ok_or_else(|| missing("s3"))?;
        let sources = BulkSources {
            log_data: required(s3.log_data, "s3.log_data")?,
            log_jsonpath: s3.log_jsonpath.filter(|p| !p.trim().is_empty()),
            song_data: required(s3.song_data, "s3.song_data")?,
            region: s3.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };

        let credential = file
            .iam_role
            .and_then(|role| role.arn)
            .filter(|arn| !arn.trim().is_empty())
            .map(|arn| RoleCredential { arn });

        if matches!(backend, Backend::Redshift(_)) && credential.is_none() {
            return Err(missing("iam_role.arn"));
        }

        Ok(Self {
            backend,
            commit_mode,
            sources,
            credential,
        })
    }
}

/// Uses clap's ValueEnum trait for parsing.
fn parse_commit_mode(s: &str) -> Option<CommitMode> {
    CommitMode::from_str(s, true).ok()
}
