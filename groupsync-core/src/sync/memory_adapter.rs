//! In-memory resource manager
//!
//! Backs the CLI (through a JSON manifest) and the test suites. Failures can
//! be injected per repository, per resource, or for listing as a whole.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::sync::Mutex;

use super::adapter::{AdapterError, AdapterResult, LocalResource, LocalResourceAdapter};
use crate::model::{RepositoryRef, ResourceRef};

/// On-disk form of the local node's resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalManifest {
    #[serde(default)]
    pub repositories: Vec<RepositoryRef>,
    #[serde(default)]
    pub resources: Vec<ManifestResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    pub name: String,
    pub version: String,
    /// Omitted when the status is unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed: Option<bool>,
}

#[derive(Debug, Default)]
struct State {
    repositories: Vec<RepositoryRef>,
    resources: BTreeMap<ResourceRef, Option<bool>>,
    failing_repositories: BTreeSet<String>,
    failing_resources: BTreeSet<ResourceRef>,
    listing_fails: bool,
    install_calls: Vec<ResourceRef>,
    uninstall_calls: Vec<ResourceRef>,
    repository_calls: Vec<RepositoryRef>,
}

/// Local resource manager holding its state in memory
#[derive(Debug)]
pub struct MemoryResourceAdapter {
    category: String,
    state: Mutex<State>,
}

impl MemoryResourceAdapter {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn from_manifest(category: impl Into<String>, manifest: LocalManifest) -> Self {
        let mut state = State {
            repositories: manifest.repositories,
            ..State::default()
        };
        for resource in manifest.resources {
            let key = ResourceRef::new(resource.name, resource.version);
            state.resources.insert(key, resource.installed);
        }
        Self {
            category: category.into(),
            state: Mutex::new(state),
        }
    }

    /// Load a JSON manifest; a missing file yields an empty manager
    pub fn load_manifest(
        category: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> AdapterResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(category));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_manifest(category, serde_json::from_str(&contents)?))
    }

    pub async fn manifest(&self) -> LocalManifest {
        let state = self.state.lock().await;
        LocalManifest {
            repositories: state.repositories.clone(),
            resources: state
                .resources
                .iter()
                .map(|(r, installed)| ManifestResource {
                    name: r.name.clone(),
                    version: r.version.clone(),
                    installed: *installed,
                })
                .collect(),
        }
    }

    pub async fn save_manifest(&self, path: impl AsRef<Path>) -> AdapterResult<()> {
        let contents = serde_json::to_string_pretty(&self.manifest().await)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Make a resource known locally with the given status
    pub async fn put_resource(&self, resource: ResourceRef, installed: Option<bool>) {
        self.state.lock().await.resources.insert(resource, installed);
    }

    pub async fn put_repository(&self, repository: RepositoryRef) {
        let mut state = self.state.lock().await;
        if !state.repositories.contains(&repository) {
            state.repositories.push(repository);
        }
    }

    /// Every later `add_repository` / `remove_repository` for `uri` fails
    pub async fn fail_repository(&self, uri: impl Into<String>) {
        self.state.lock().await.failing_repositories.insert(uri.into());
    }

    /// Every later `install` / `uninstall` of `resource` fails
    pub async fn fail_resource(&self, resource: ResourceRef) {
        self.state.lock().await.failing_resources.insert(resource);
    }

    pub async fn fail_listing(&self, fails: bool) {
        self.state.lock().await.listing_fails = fails;
    }

    /// Resources passed to `install`, in call order, successful or not
    pub async fn install_calls(&self) -> Vec<ResourceRef> {
        self.state.lock().await.install_calls.clone()
    }

    pub async fn uninstall_calls(&self) -> Vec<ResourceRef> {
        self.state.lock().await.uninstall_calls.clone()
    }

    /// Repositories passed to `add_repository` / `remove_repository`
    pub async fn repository_calls(&self) -> Vec<RepositoryRef> {
        self.state.lock().await.repository_calls.clone()
    }

    pub async fn repositories(&self) -> Vec<RepositoryRef> {
        self.state.lock().await.repositories.clone()
    }
}

#[async_trait]
impl LocalResourceAdapter for MemoryResourceAdapter {
    fn category(&self) -> &str {
        &self.category
    }

    async fn list_repositories(&self) -> AdapterResult<Vec<RepositoryRef>> {
        let state = self.state.lock().await;
        if state.listing_fails {
            return Err(AdapterError::Unavailable("repository listing failed".to_string()));
        }
        Ok(state.repositories.clone())
    }

    async fn list_resources(&self) -> AdapterResult<Vec<LocalResource>> {
        let state = self.state.lock().await;
        if state.listing_fails {
            return Err(AdapterError::Unavailable("resource listing failed".to_string()));
        }
        Ok(state
            .resources
            .iter()
            .filter_map(|(r, installed)| installed.map(|flag| LocalResource::new(r.clone(), flag)))
            .collect())
    }

    async fn add_repository(&self, repository: &RepositoryRef) -> AdapterResult<()> {
        let mut state = self.state.lock().await;
        state.repository_calls.push(repository.clone());
        if state.failing_repositories.contains(repository.as_str()) {
            return Err(AdapterError::Rejected(format!("cannot resolve {}", repository)));
        }
        if !state.repositories.contains(repository) {
            state.repositories.push(repository.clone());
        }
        Ok(())
    }

    async fn remove_repository(&self, repository: &RepositoryRef) -> AdapterResult<()> {
        let mut state = self.state.lock().await;
        state.repository_calls.push(repository.clone());
        if state.failing_repositories.contains(repository.as_str()) {
            return Err(AdapterError::Rejected(format!("cannot remove {}", repository)));
        }
        let before = state.repositories.len();
        state.repositories.retain(|r| r != repository);
        if state.repositories.len() == before {
            return Err(AdapterError::NotFound(repository.to_string()));
        }
        Ok(())
    }

    async fn install(&self, resource: &ResourceRef) -> AdapterResult<()> {
        let mut state = self.state.lock().await;
        state.install_calls.push(resource.clone());
        if state.failing_resources.contains(resource) {
            return Err(AdapterError::Rejected(format!("cannot install {}", resource)));
        }
        match state.resources.get_mut(resource) {
            Some(installed) => {
                *installed = Some(true);
                Ok(())
            }
            None => Err(AdapterError::NotFound(resource.to_string())),
        }
    }

    async fn uninstall(&self, resource: &ResourceRef) -> AdapterResult<()> {
        let mut state = self.state.lock().await;
        state.uninstall_calls.push(resource.clone());
        if state.failing_resources.contains(resource) {
            return Err(AdapterError::Rejected(format!("cannot uninstall {}", resource)));
        }
        match state.resources.get_mut(resource) {
            Some(installed) => {
                *installed = Some(false);
                Ok(())
            }
            None => Err(AdapterError::NotFound(resource.to_string())),
        }
    }

    async fn is_registered_locally(&self, repository: &RepositoryRef) -> bool {
        self.state.lock().await.repositories.contains(repository)
    }

    async fn is_installed_locally(&self, resource: &ResourceRef) -> Option<bool> {
        self.state.lock().await.resources.get(resource).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repo(uri: &str) -> RepositoryRef {
        RepositoryRef::parse(uri).unwrap()
    }

    #[tokio::test]
    async fn test_install_known_resource() {
        let adapter = MemoryResourceAdapter::new("features");
        let r = ResourceRef::new("webconsole", "1.0");
        adapter.put_resource(r.clone(), Some(false)).await;

        adapter.install(&r).await.unwrap();
        assert_eq!(adapter.is_installed_locally(&r).await, Some(true));
        assert_eq!(adapter.install_calls().await, vec![r.clone()]);

        adapter.uninstall(&r).await.unwrap();
        assert_eq!(adapter.is_installed_locally(&r).await, Some(false));
    }

    #[tokio::test]
    async fn test_install_unknown_resource_is_not_found() {
        let adapter = MemoryResourceAdapter::new("features");
        let r = ResourceRef::new("ghost", "0.1");
        assert!(matches!(adapter.install(&r).await, Err(AdapterError::NotFound(_))));
        assert_eq!(adapter.is_installed_locally(&r).await, None);
    }

    #[tokio::test]
    async fn test_unknown_status_is_not_listed() {
        let adapter = MemoryResourceAdapter::new("features");
        adapter.put_resource(ResourceRef::new("a", "1"), None).await;
        adapter.put_resource(ResourceRef::new("b", "1"), Some(false)).await;

        let listed = adapter.list_resources().await.unwrap();
        assert_eq!(listed, vec![LocalResource::new(ResourceRef::new("b", "1"), false)]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let adapter = MemoryResourceAdapter::new("features");
        let r = ResourceRef::new("a", "1");
        adapter.put_resource(r.clone(), Some(false)).await;
        adapter.fail_resource(r.clone()).await;
        adapter.fail_repository("mvn:bad/repo").await;

        assert!(adapter.install(&r).await.is_err());
        assert!(adapter.add_repository(&repo("mvn:bad/repo")).await.is_err());
        assert!(adapter.add_repository(&repo("mvn:good/repo")).await.is_ok());
        assert_eq!(adapter.repositories().await, vec![repo("mvn:good/repo")]);

        adapter.fail_listing(true).await;
        assert!(adapter.list_repositories().await.is_err());
        assert!(adapter.list_resources().await.is_err());
    }

    #[tokio::test]
    async fn test_remove_repository() {
        let adapter = MemoryResourceAdapter::new("features");
        adapter.put_repository(repo("mvn:a/1")).await;

        adapter.remove_repository(&repo("mvn:a/1")).await.unwrap();
        assert!(!adapter.is_registered_locally(&repo("mvn:a/1")).await);
        assert!(matches!(
            adapter.remove_repository(&repo("mvn:a/1")).await,
            Err(AdapterError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_manifest_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(
            &path,
            r#"{
                "repositories": ["mvn:org.acme/features/1.0/xml/features"],
                "resources": [
                    {"name": "webconsole", "version": "1.0", "installed": true},
                    {"name": "scheduler", "version": "2.1"}
                ]
            }"#,
        )
        .unwrap();

        let adapter = MemoryResourceAdapter::load_manifest("features", &path).unwrap();
        assert_eq!(adapter.category(), "features");
        let webconsole = ResourceRef::new("webconsole", "1.0");
        assert_eq!(adapter.is_installed_locally(&webconsole).await, Some(true));
        let scheduler = ResourceRef::new("scheduler", "2.1");
        assert_eq!(adapter.is_installed_locally(&scheduler).await, None);

        adapter.save_manifest(&path).await.unwrap();
        let reloaded = MemoryResourceAdapter::load_manifest("features", &path).unwrap();
        assert_eq!(reloaded.manifest().await, adapter.manifest().await);
    }

    #[test]
    fn test_manifest_rejects_malformed_repository() {
        let parsed: Result<LocalManifest, _> =
            serde_json::from_str(r#"{"repositories": ["no scheme"]}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_manifest_io_errors() {
        let dir = tempdir().unwrap();
        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(
            MemoryResourceAdapter::load_manifest("features", &corrupt),
            Err(AdapterError::Manifest(_))
        ));

        let missing = dir.path().join("nope.json");
        let empty = MemoryResourceAdapter::load_manifest("features", &missing).unwrap();
        assert_eq!(empty.manifest().await, LocalManifest::default());

        let adapter = MemoryResourceAdapter::new("features");
        let unwritable = dir.path().join("no-such-dir").join("local.json");
        assert!(matches!(
            adapter.save_manifest(&unwritable).await,
            Err(AdapterError::Manifest(_))
        ));
    }
}
