//! Resource Manager - shared, load-once resources keyed by name and type
//!
//! Script types declare the resources they need as [`ResourceRequest`]s. The
//! load pass walks the [`ScriptManifest`] and, for every (name, type) pair:
//! - reuses an already-loaded entry, recording the requesting type as a consumer
//! - otherwise asks the [`AssetLoader`] once and stores the result
//!
//! A failed load is logged and skipped; the rest of the pass continues. Every
//! consumer of a key shares the same loaded instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use thiserror::Error;

use super::manifest::ScriptManifest;
use super::{AssetError, AssetLoader};
use crate::ecs::behaviour::short_type_name;
use crate::events::LoadInfo;
use crate::foundation::time::Stopwatch;

/// Resource Manager errors
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No entry for this key
    #[error("Resource not found: {0}")]
    NotFound(ResourceInfo),

    /// An entry for this key already exists
    #[error("Resource already loaded: {0}")]
    AlreadyLoaded(ResourceInfo),

    /// The stored payload is not of the requested type
    #[error("Resource {info} does not hold a {expected}")]
    TypeMismatch {
        /// Requested key
        info: ResourceInfo,
        /// Requested type
        expected: TypeTag,
    },
}

/// Runtime type identity with a readable name
///
/// Equality and hashing use the `TypeId` only.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Tag of `T`
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
        }
    }

    /// Underlying type id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Short type name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Resource key: a name plus the type it loads as
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceInfo {
    resource_name: String,
    target: TypeTag,
}

impl ResourceInfo {
    /// Key for `name` loaded as `target`
    pub fn new(resource_name: impl Into<String>, target: TypeTag) -> Self {
        Self {
            resource_name: resource_name.into(),
            target,
        }
    }

    /// Key for `name` loaded as `T`
    pub fn of<T: Any>(resource_name: impl Into<String>) -> Self {
        Self::new(resource_name, TypeTag::of::<T>())
    }

    /// Resource name
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Target type
    pub fn target(&self) -> TypeTag {
        self.target
    }
}

impl fmt::Display for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.resource_name, self.target)
    }
}

/// A loaded resource and the types that requested it
pub struct ResourceEntry {
    resource: Rc<dyn Any>,
    dependencies: Vec<TypeTag>,
}

impl ResourceEntry {
    /// Shared payload
    pub fn resource(&self) -> &Rc<dyn Any> {
        &self.resource
    }

    /// Consumer types in first-request order, without duplicates
    pub fn dependencies(&self) -> &[TypeTag] {
        &self.dependencies
    }

    /// Record a consumer; returns `false` if it was already recorded
    pub fn add_dependency(&mut self, consumer: TypeTag) -> bool {
        if self.dependencies.contains(&consumer) {
            return false;
        }
        self.dependencies.push(consumer);
        true
    }
}

impl fmt::Debug for ResourceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceEntry")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Loaded resources keyed by [`ResourceInfo`], in load order
#[derive(Debug, Default)]
pub struct ResourceDependencyTree {
    entries: HashMap<ResourceInfo, ResourceEntry>,
    order: Vec<ResourceInfo>,
}

impl ResourceDependencyTree {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key has an entry
    pub fn contains_resource(&self, info: &ResourceInfo) -> bool {
        self.entries.contains_key(info)
    }

    /// Entry for the key
    pub fn get_resource(&self, info: &ResourceInfo) -> Result<&ResourceEntry, ResourceError> {
        self.entries
            .get(info)
            .ok_or_else(|| ResourceError::NotFound(info.clone()))
    }

    /// Mutable entry for the key
    pub fn get_resource_mut(&mut self, info: &ResourceInfo) -> Result<&mut ResourceEntry, ResourceError> {
        self.entries
            .get_mut(info)
            .ok_or_else(|| ResourceError::NotFound(info.clone()))
    }

    /// Insert a new entry whose only consumer is `consumer`
    ///
    /// Fails if the key is already present; check [`Self::contains_resource`]
    /// first and record the consumer on the existing entry instead.
    pub fn add(&mut self, info: ResourceInfo, consumer: TypeTag, resource: Rc<dyn Any>) -> Result<(), ResourceError> {
        if self.entries.contains_key(&info) {
            return Err(ResourceError::AlreadyLoaded(info));
        }
        self.order.push(info.clone());
        self.entries.insert(
            info,
            ResourceEntry {
                resource,
                dependencies: vec![consumer],
            },
        );
        Ok(())
    }

    /// Entries in load order
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceInfo, &ResourceEntry)> {
        self.order
            .iter()
            .filter_map(|info| self.entries.get(info).map(|entry| (info, entry)))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One script type's need for one or more resources of a single type
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    names: Vec<String>,
    target: TypeTag,
}

impl ResourceRequest {
    /// Request `names`, each loaded as `T`
    pub fn new<T: Any>(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            log::warn!("Resource request for {} names no resources", short_type_name::<T>());
        }
        Self {
            names,
            target: TypeTag::of::<T>(),
        }
    }

    /// Requested names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Type every name loads as
    pub fn target(&self) -> TypeTag {
        self.target
    }
}

/// Configuration for Resource Manager
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Log one line per loaded resource after each load pass
    pub log_summary: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self { log_summary: true }
    }
}

/// Counts from one load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Pairs loaded through the asset loader
    pub loaded: usize,
    /// Pairs served by an existing entry
    pub reused: usize,
    /// Pairs whose load or conversion failed
    pub failed: usize,
}

/// Owner of the resource dependency tree and its load pass
#[derive(Debug, Default)]
pub struct ResourceManager {
    tree: ResourceDependencyTree,
    config: ResourceConfig,
}

impl ResourceManager {
    /// Create an empty manager
    pub fn new(config: ResourceConfig) -> Self {
        Self {
            tree: ResourceDependencyTree::new(),
            config,
        }
    }

    /// Load every resource requested by the manifest's script types
    pub fn load_all(&mut self, manifest: &ScriptManifest, loader: &dyn AssetLoader, info: &LoadInfo) -> LoadReport {
        let stopwatch = Stopwatch::start_new();
        log::debug!("Resource load pass started: {}", info.info());

        let mut report = LoadReport::default();
        for script in manifest.scripts() {
            for request in script.requests() {
                for name in request.names() {
                    let key = ResourceInfo::new(name.as_str(), request.target());
                    if let Ok(entry) = self.tree.get_resource_mut(&key) {
                        entry.add_dependency(script.tag());
                        report.reused += 1;
                        continue;
                    }

                    let added = load_resource(loader, &key)
                        .map_err(|err| err.to_string())
                        .and_then(|resource| {
                            self.tree
                                .add(key.clone(), script.tag(), resource)
                                .map_err(|err| err.to_string())
                        });
                    match added {
                        Ok(()) => report.loaded += 1,
                        Err(err) => {
                            log::error!("Resource Manager failed to load {} for {}: {}", key, script.tag(), err);
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        if self.config.log_summary {
            for (info, entry) in self.tree.iter() {
                let consumers: Vec<&str> = entry.dependencies().iter().map(|tag| tag.name()).collect();
                log::debug!(
                    "{} types loaded resource {} of type {}",
                    consumers.join(","),
                    info.resource_name(),
                    info.target()
                );
            }
        }

        log::info!(
            "Resource load pass: {} loaded, {} reused, {} failed in {:.2}ms",
            report.loaded,
            report.reused,
            report.failed,
            stopwatch.elapsed_millis()
        );
        report
    }

    /// Shared instance of the resource `name` loaded as `T`
    pub fn get<T: Any>(&self, name: &str) -> Result<Rc<T>, ResourceError> {
        let info = ResourceInfo::of::<T>(name);
        let resource = Rc::clone(self.tree.get_resource(&info)?.resource());
        resource.downcast::<T>().map_err(|_| ResourceError::TypeMismatch {
            info,
            expected: TypeTag::of::<T>(),
        })
    }

    /// Whether `name` is loaded as `T`
    pub fn contains<T: Any>(&self, name: &str) -> bool {
        self.tree.contains_resource(&ResourceInfo::of::<T>(name))
    }

    /// Consumer types of a loaded resource
    pub fn dependencies_of(&self, info: &ResourceInfo) -> Option<&[TypeTag]> {
        self.tree.get_resource(info).ok().map(ResourceEntry::dependencies)
    }

    /// The dependency tree
    pub fn tree(&self) -> &ResourceDependencyTree {
        &self.tree
    }

    /// Mutable dependency tree, for resources supplied outside a load pass
    pub fn tree_mut(&mut self) -> &mut ResourceDependencyTree {
        &mut self.tree
    }

    /// Configuration
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }
}

fn load_resource(loader: &dyn AssetLoader, info: &ResourceInfo) -> Result<Rc<dyn Any>, AssetError> {
    let loaded = loader.load(info.resource_name(), info.target())?;
    if (*loaded).type_id() != info.target().id() {
        return Err(AssetError::ConversionFailed {
            name: info.resource_name().to_string(),
            target: info.target().name().to_string(),
        });
    }
    Ok(Rc::from(loaded))
}
