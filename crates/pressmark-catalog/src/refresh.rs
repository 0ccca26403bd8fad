//! Catalog refresh management.
//!
//! Decides whether the local catalog needs replacing before a scan, and
//! performs the replacement. The remote release check is skipped
//! entirely while the local catalog is inside the freshness window, so
//! repeated invocations don't hammer the release API.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::time::Duration;

use chrono::Utc;
use flate2::read::GzDecoder;
use pressmark_client::ReleaseClient;
use pressmark_core::VersionNumber;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::store::{CatalogStore, GroupRequest, StoreState, ARCHIVE_NAME};

/// Refresh policy knobs
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// How old the local catalog may get before the remote release
    /// check runs at all
    pub freshness_window: Duration,

    /// Release asset holding the catalog bundle
    pub asset_name: String,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(24 * 60 * 60),
            asset_name: ARCHIVE_NAME.to_string(),
        }
    }
}

/// Decides on and performs catalog replacement
pub struct RefreshManager {
    store: CatalogStore,
    client: ReleaseClient,
    options: RefreshOptions,
}

impl RefreshManager {
    /// Create a manager with default options
    #[must_use]
    pub fn new(store: CatalogStore, client: ReleaseClient) -> Self {
        Self::with_options(store, client, RefreshOptions::default())
    }

    /// Create a manager with custom options
    #[must_use]
    pub const fn with_options(
        store: CatalogStore,
        client: ReleaseClient,
        options: RefreshOptions,
    ) -> Self {
        Self {
            store,
            client,
            options,
        }
    }

    /// Whether the local catalog should be replaced before scanning.
    ///
    /// True when no local version exists, when a requested group's base
    /// document is missing from the current version, or when the
    /// catalog is stale **and** the remote reports a newer release. The
    /// remote check never runs inside the freshness window.
    pub async fn needs_update(&self, requests: &[GroupRequest]) -> CatalogResult<bool> {
        let Some(current) = self.store.current_version() else {
            debug!("no local catalog version");
            return Ok(true);
        };

        if !self.store.has_required_files(&current, requests) {
            debug!(version = %current, "required catalog documents missing");
            return Ok(true);
        }

        if let Some(state) = self.store.state() {
            let age = Utc::now().signed_duration_since(state.fetched_at);
            let window = chrono::Duration::from_std(self.options.freshness_window)
                .unwrap_or_else(|_| chrono::Duration::days(1));
            if age < window {
                debug!(version = %current, "catalog inside freshness window");
                return Ok(false);
            }
        }

        let release = self
            .client
            .latest()
            .await
            .map_err(|e| CatalogError::Refresh(e.to_string()))?;
        let remote = VersionNumber::new(release.tag_name);

        Ok(remote > current)
    }

    /// Fetch the latest release, persist its archive and extract it
    /// into a version-named directory. Returns the new version.
    pub async fn refresh(&self) -> CatalogResult<VersionNumber> {
        let release = self
            .client
            .latest()
            .await
            .map_err(|e| CatalogError::Refresh(e.to_string()))?;

        let asset = release.asset_named(&self.options.asset_name).ok_or_else(|| {
            CatalogError::Refresh(format!(
                "release {} has no asset named {}",
                release.tag_name, self.options.asset_name
            ))
        })?;

        let bytes = self
            .client
            .download_asset(asset)
            .await
            .map_err(|e| CatalogError::Refresh(e.to_string()))?;

        let version = VersionNumber::new(release.tag_name.clone());
        info!(version = %version, bytes = bytes.len(), "downloaded catalog archive");

        let archive_path = self.store.archive_path();
        fs::create_dir_all(self.store.root())
            .map_err(|e| CatalogError::io(self.store.root(), e))?;
        fs::write(&archive_path, &bytes).map_err(|e| CatalogError::io(&archive_path, e))?;

        self.extract(&bytes, &version)?;
        self.store.write_state(&StoreState {
            fetched_at: Utc::now(),
        })?;

        Ok(version)
    }

    /// Extract the gzipped JSON bundle into the version directory.
    ///
    /// The bundle is a single JSON object mapping document file names to
    /// catalog documents; each entry becomes its own file.
    fn extract(&self, archive: &[u8], version: &VersionNumber) -> CatalogResult<()> {
        let mut decoder = GzDecoder::new(archive);
        let mut payload = String::new();
        decoder
            .read_to_string(&mut payload)
            .map_err(|e| CatalogError::Refresh(format!("archive is not valid gzip: {e}")))?;

        let bundle: BTreeMap<String, serde_json::Value> = serde_json::from_str(&payload)
            .map_err(|e| CatalogError::Refresh(format!("archive bundle is not valid JSON: {e}")))?;

        if bundle.is_empty() {
            return Err(CatalogError::Refresh("archive bundle is empty".into()));
        }

        let dir = self.store.version_dir(version);
        fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;

        for (name, document) in bundle {
            if name.contains('/') || name.contains('\\') {
                warn!(name, "skipping bundle entry with path separator");
                continue;
            }
            let path = dir.join(&name);
            let payload = serde_json::to_string_pretty(&document)
                .map_err(|e| CatalogError::Refresh(e.to_string()))?;
            fs::write(&path, payload).map_err(|e| CatalogError::io(&path, e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gzip_bundle(bundle: &serde_json::Value) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(bundle.to_string().as_bytes())
            .unwrap();
        encoder.finish().unwrap()
    }

    fn plugin_bundle() -> serde_json::Value {
        serde_json::json!({
            "plugins.json": {
                "key": "plugins",
                "file_lists": [
                    {"key": "plugins/a", "files": [
                        {"path": "readme.txt", "signatures": [
                            {"hash": "aa", "versions": ["1.0"]}
                        ]}
                    ]}
                ]
            }
        })
    }

    async fn mount_release(server: &MockServer, tag: &str, archive: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": tag,
                "assets": [{"name": ARCHIVE_NAME, "url": format!("{}/asset", server.uri())}]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/asset"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
            .mount(server)
            .await;
    }

    fn manager(root: &std::path::Path, base_url: String, window: Duration) -> RefreshManager {
        RefreshManager::with_options(
            CatalogStore::new(root),
            ReleaseClient::builder().base_url(base_url).build(),
            RefreshOptions {
                freshness_window: window,
                asset_name: ARCHIVE_NAME.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn refresh_extracts_version_directory() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        mount_release(&server, "2.1.0", gzip_bundle(&plugin_bundle())).await;

        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));
        let version = manager.refresh().await.unwrap();

        assert_eq!(version.as_str(), "2.1.0");
        assert!(tmp.path().join("2.1.0").join("plugins.json").exists());
        assert!(tmp.path().join(ARCHIVE_NAME).exists());

        let store = CatalogStore::new(tmp.path());
        let catalog = store.load_catalog(&[GroupRequest::base("plugins")]).unwrap();
        assert_eq!(catalog.component_count(), 1);
    }

    #[tokio::test]
    async fn missing_catalog_needs_update_without_remote_call() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        // no mocks mounted: any request would 404 and the test would
        // fail on the Refresh error below
        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));

        let requests = [GroupRequest::base("plugins")];
        assert!(manager.needs_update(&requests).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_catalog_skips_remote_check() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = CatalogStore::new(tmp.path());
        let dir = tmp.path().join("2.0.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugins.json"), r#"{"key": "plugins"}"#).unwrap();
        store
            .write_state(&StoreState {
                fetched_at: Utc::now(),
            })
            .unwrap();

        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));
        let requests = [GroupRequest::base("plugins")];

        assert!(!manager.needs_update(&requests).await.unwrap());
        // MockServer verifies expect(0) on drop
    }

    #[tokio::test]
    async fn stale_catalog_checks_remote_for_newer_release() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        mount_release(&server, "2.1.0", Vec::new()).await;

        let store = CatalogStore::new(tmp.path());
        let dir = tmp.path().join("2.0.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugins.json"), r#"{"key": "plugins"}"#).unwrap();
        store
            .write_state(&StoreState {
                fetched_at: Utc::now() - chrono::Duration::days(7),
            })
            .unwrap();

        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));
        let requests = [GroupRequest::base("plugins")];

        assert!(manager.needs_update(&requests).await.unwrap());
    }

    #[tokio::test]
    async fn stale_catalog_with_no_newer_release_is_kept() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        mount_release(&server, "2.0.0", Vec::new()).await;

        let store = CatalogStore::new(tmp.path());
        let dir = tmp.path().join("2.0.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugins.json"), r#"{"key": "plugins"}"#).unwrap();
        store
            .write_state(&StoreState {
                fetched_at: Utc::now() - chrono::Duration::days(7),
            })
            .unwrap();

        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));
        let requests = [GroupRequest::base("plugins")];

        assert!(!manager.needs_update(&requests).await.unwrap());
    }

    #[tokio::test]
    async fn missing_asset_is_refresh_error() {
        let tmp = TempDir::new().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tag_name": "2.1.0",
                "assets": []
            })))
            .mount(&server)
            .await;

        let manager = manager(tmp.path(), server.uri(), Duration::from_secs(3600));
        let err = manager.refresh().await.unwrap_err();

        assert!(matches!(err, CatalogError::Refresh(_)));
    }
}
