//! Builder for fake clientsets seeded with objects, fixtures and reactors

use crate::action::Action;
use crate::apis::{Builder, Image};
use crate::client::FakeBuildV1alpha1;
use crate::client_utils::{extract_gvk, extract_namespace, gvk_of, gvk_to_gvr};
use crate::reactor::{Reactor, WatchReactor};
use crate::recorder::Fake;
use crate::tracker::ObjectTracker;
use crate::watch::Watcher;
use crate::{Error, Result};
use kube::Resource;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Fake clientset for the build.pivotal.io API
///
/// All typed clients obtained from one clientset share a single recorder,
/// so actions from every resource land in the same [`Clientset::actions`] log.
#[derive(Clone)]
pub struct Clientset {
    fake: Arc<Fake>,
}

impl Clientset {
    /// A clientset with an empty tracker
    pub fn new() -> Self {
        Self::from_fake(Fake::new(Arc::new(default_tracker())))
    }

    pub fn from_fake(fake: Fake) -> Self {
        Self {
            fake: Arc::new(fake),
        }
    }

    pub fn build_v1alpha1(&self) -> FakeBuildV1alpha1 {
        FakeBuildV1alpha1::new(Arc::clone(&self.fake))
    }

    pub fn fake(&self) -> &Arc<Fake> {
        &self.fake
    }

    pub fn tracker(&self) -> &Arc<ObjectTracker> {
        self.fake.tracker()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.fake.actions()
    }

    pub fn clear_actions(&self) {
        self.fake.clear_actions()
    }
}

impl Default for Clientset {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating fake clientsets
///
/// # Example
///
/// ```rust
/// use build_service_client::apis::{Builder, BuilderSpec};
/// use build_service_client::ClientsetBuilder;
/// use kube::api::GetParams;
///
/// let mut builder = Builder::new("default-builder", BuilderSpec {
///     image: "cloudfoundry/cnb:bionic".to_string(),
///     update_policy: None,
/// });
/// builder.metadata.namespace = Some("build".to_string());
///
/// let clientset = ClientsetBuilder::new().with_object(builder).build().unwrap();
/// let found = clientset
///     .build_v1alpha1()
///     .builders("build")
///     .get("default-builder", &GetParams::default())
///     .unwrap();
/// assert_eq!(found.spec.image, "cloudfoundry/cnb:bionic");
/// ```
pub struct ClientsetBuilder {
    initial_objects: Vec<Value>,
    reactors: Vec<Reactor>,
    watch_reactors: Vec<WatchReactor>,
    fixture_dir: Option<PathBuf>,
    // First seed object that failed to serialize; `build` returns it.
    seed_error: Option<Error>,
}

impl ClientsetBuilder {
    pub fn new() -> Self {
        Self {
            initial_objects: Vec::new(),
            reactors: Vec::new(),
            watch_reactors: Vec::new(),
            fixture_dir: None,
            seed_error: None,
        }
    }

    /// Seed the tracker with an object when the clientset is built
    ///
    /// An object that cannot be serialized makes [`build`](Self::build) fail
    /// with `Error::SerializationError`.
    pub fn with_object<K>(mut self, obj: K) -> Self
    where
        K: Resource + Serialize,
    {
        match serde_json::to_value(&obj) {
            Ok(value) => self.initial_objects.push(value),
            Err(e) => {
                debug!("Seed object failed to serialize: {}", e);
                self.seed_error.get_or_insert(Error::SerializationError(e));
            }
        }
        self
    }

    pub fn with_objects<K>(mut self, objects: Vec<K>) -> Self
    where
        K: Resource + Serialize,
    {
        for obj in objects {
            self = self.with_object(obj);
        }
        self
    }

    /// Seed objects given as JSON; each needs `apiVersion`, `kind` and `metadata.name`
    pub fn with_runtime_objects(mut self, objects: Vec<Value>) -> Self {
        self.initial_objects.extend(objects);
        self
    }

    /// Add a reactor ahead of the tracker-backed default reaction
    ///
    /// Reactors run in the order they were added. Each one can:
    /// - Return `Ok(Some(value))` to answer the action
    /// - Return `Ok(None)` to defer to the next reactor
    /// - Return `Err(e)` to fail the call
    pub fn with_reactor<F>(mut self, verb: &str, resource: &str, reaction: F) -> Self
    where
        F: Fn(&Action) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.reactors.push(Reactor::new(verb, resource, reaction));
        self
    }

    /// Add a watch reactor ahead of the tracker-backed watch
    pub fn with_watch_reactor<F>(mut self, resource: &str, reaction: F) -> Self
    where
        F: Fn(&Action) -> Result<Option<Watcher>> + Send + Sync + 'static,
    {
        self.watch_reactors.push(WatchReactor::new(resource, reaction));
        self
    }

    /// Base directory for `load_fixture` paths
    pub fn with_fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dir = Some(dir.into());
        self
    }

    /// Load objects from a YAML fixture file
    ///
    /// Multi-document files (separated by `---`) are supported. Objects without a
    /// namespace are placed in `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a document is not valid YAML.
    pub fn load_fixture(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let fixture_path = match &self.fixture_dir {
            Some(dir) => dir.join(path),
            None => path.as_ref().to_path_buf(),
        };

        let content = std::fs::read_to_string(&fixture_path).map_err(|e| Error::Fixture {
            path: fixture_path.clone(),
            reason: e.to_string(),
        })?;

        use serde::Deserialize;
        for document in serde_yaml::Deserializer::from_str(&content) {
            let mut value = Value::deserialize(document).map_err(|e| Error::Fixture {
                path: fixture_path.clone(),
                reason: e.to_string(),
            })?;

            if value.is_null() {
                continue;
            }

            if let Some(metadata) = value.get_mut("metadata").and_then(|m| m.as_object_mut()) {
                metadata
                    .entry("namespace")
                    .or_insert_with(|| Value::String("default".to_string()));
            }

            self.initial_objects.push(value);
        }

        Ok(self)
    }

    pub fn load_fixtures<P>(mut self, paths: impl IntoIterator<Item = P>) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        for path in paths {
            self = self.load_fixture(path)?;
        }
        Ok(self)
    }

    /// Build the clientset
    ///
    /// Seed objects are added to the tracker as-is (resourceVersion is only set
    /// when missing), not created.
    ///
    /// # Errors
    ///
    /// Returns an error if any seed object cannot be added.
    pub fn build(self) -> Result<Clientset> {
        if let Some(err) = self.seed_error {
            return Err(err);
        }

        let tracker = Arc::new(default_tracker());

        for obj in self.initial_objects {
            let gvk = extract_gvk(&obj)?;
            let gvr = gvk_to_gvr(&gvk);
            let namespace = extract_namespace(&obj).unwrap_or_default().to_string();

            tracker
                .add(&gvr, obj, &namespace)
                .map_err(|e| Error::Internal(format!("Failed to add initial object: {}", e)))?;
        }

        let fake = Fake::new(Arc::clone(&tracker));
        fake.prepend_reactors(self.reactors);
        fake.prepend_watch_reactors(self.watch_reactors);

        debug!("Built fake clientset");
        Ok(Clientset::from_fake(fake))
    }
}

impl Default for ClientsetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder and Image both carry a status subresource.
fn default_tracker() -> ObjectTracker {
    let tracker = ObjectTracker::new();
    tracker.add_status_subresource(gvk_of::<Builder>());
    tracker.add_status_subresource(gvk_of::<Image>());
    tracker
}
