//! Error types for the dashboard.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("feed error: {0}")]
    Feed(#[from] traffic_feed::Error),

    #[error("store error: {0}")]
    Store(#[from] traffic_feed::StoreError),

    #[error("loading traffic updates failed: {0}")]
    Load(#[from] traffic_feed::LoadError),

    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid --{flag} value {value:?}, expected NAME=STATUS")]
    StatusPair { flag: &'static str, value: String },

    #[error("message must not be empty")]
    EmptyMessage,
}
