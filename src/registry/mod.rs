use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use crate::models::Ecosystem;

pub mod golang;
pub mod maven;
pub mod npm;
pub mod pypi;
pub mod rubygems;

pub(crate) const USER_AGENT: &str = "depforge/0.1.0";

/// Best-effort external source for the newest published version of a
/// package. Must tolerate absence: `Ok(None)` and errors are both treated
/// as "no answer" by the engine, leaving the unresolved sentinel in place.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn latest_version(&self, name: &str, ecosystem: Ecosystem) -> Result<Option<String>>;
}

/// Queries the public registries, one per ecosystem.
pub struct RegistryVersionSource {
    client: Client,
}

impl RegistryVersionSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VersionSource for RegistryVersionSource {
    async fn latest_version(&self, name: &str, ecosystem: Ecosystem) -> Result<Option<String>> {
        match ecosystem {
            Ecosystem::Python => pypi::fetch_latest(&self.client, name).await,
            Ecosystem::Node => npm::fetch_latest(&self.client, name).await,
            Ecosystem::Java => maven::fetch_latest(&self.client, name).await,
            Ecosystem::Go => golang::fetch_latest(&self.client, name).await,
            Ecosystem::Ruby => rubygems::fetch_latest(&self.client, name).await,
        }
    }
}

/// Offline source: never answers, so every unresolved requirement stays
/// unresolved without touching the network.
pub struct OfflineVersionSource;

#[async_trait]
impl VersionSource for OfflineVersionSource {
    async fn latest_version(&self, _name: &str, _ecosystem: Ecosystem) -> Result<Option<String>> {
        Ok(None)
    }
}
