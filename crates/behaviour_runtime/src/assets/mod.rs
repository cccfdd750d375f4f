//! Asset loading and shared resources
//!
//! - [`AssetLoader`]: the boundary that turns a resource name into a typed payload
//! - [`FileAssetLoader`]: reads files under a root directory and decodes them
//! - [`ResourceManager`]: load-once resource store fed by script requests

pub mod manifest;
pub mod resource_manager;
pub mod texture;

pub use manifest::{ScriptManifest, ScriptType};
pub use resource_manager::{
    LoadReport, ResourceConfig, ResourceDependencyTree, ResourceEntry, ResourceError, ResourceInfo,
    ResourceManager, ResourceRequest, TypeTag,
};
pub use texture::Texture;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Asset trait for payloads decodable from raw bytes
pub trait Asset: Send + Sync + 'static {
    /// Load asset from raw bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError>
    where
        Self: Sized;
}

impl Asset for String {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| AssetError::LoadFailed(format!("Invalid UTF-8: {}", e)))
    }
}

impl Asset for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        Ok(bytes.to_vec())
    }
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to decode asset data
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// The loader has no decoder for the requested type
    #[error("Cannot load '{name}' as {target}: unsupported type")]
    UnsupportedType {
        /// Resource name
        name: String,
        /// Requested type
        target: String,
    },

    /// The loader returned a payload of another type
    #[error("Loaded '{name}' could not be converted to {target}")]
    ConversionFailed {
        /// Resource name
        name: String,
        /// Requested type
        target: String,
    },

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Synchronous asset source
///
/// Returns a payload whose dynamic type must be exactly `target`. Closures
/// with the same signature are loaders.
pub trait AssetLoader {
    /// Load `name` as `target`
    fn load(&self, name: &str, target: TypeTag) -> Result<Box<dyn Any>, AssetError>;
}

impl<F> AssetLoader for F
where
    F: Fn(&str, TypeTag) -> Result<Box<dyn Any>, AssetError>,
{
    fn load(&self, name: &str, target: TypeTag) -> Result<Box<dyn Any>, AssetError> {
        self(name, target)
    }
}

/// Loader that finds nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAssetLoader;

impl AssetLoader for NullAssetLoader {
    fn load(&self, name: &str, _target: TypeTag) -> Result<Box<dyn Any>, AssetError> {
        Err(AssetError::NotFound(name.to_string()))
    }
}

type Decoder = fn(&[u8]) -> Result<Box<dyn Any>, AssetError>;

fn decode<T: Asset>(bytes: &[u8]) -> Result<Box<dyn Any>, AssetError> {
    Ok(Box::new(T::from_bytes(bytes)?))
}

/// Loader reading `root/name` from disk
///
/// Decodes [`Texture`], `String` and `Vec<u8>` out of the box; more types can
/// be added with [`FileAssetLoader::with_format`].
pub struct FileAssetLoader {
    root: PathBuf,
    decoders: HashMap<TypeId, Decoder>,
}

impl FileAssetLoader {
    /// Loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            decoders: HashMap::new(),
        }
        .with_format::<Texture>()
        .with_format::<String>()
        .with_format::<Vec<u8>>()
    }

    /// Add a decodable type
    pub fn with_format<T: Asset>(mut self) -> Self {
        self.decoders.insert(TypeId::of::<T>(), decode::<T>);
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for FileAssetLoader {
    fn load(&self, name: &str, target: TypeTag) -> Result<Box<dyn Any>, AssetError> {
        let decoder = self.decoders.get(&target.id()).ok_or_else(|| AssetError::UnsupportedType {
            name: name.to_string(),
            target: target.name().to_string(),
        })?;

        let path = self.root.join(name);
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path)?;
        log::debug!("Read {} bytes from {:?} as {}", bytes.len(), path, target);

        decoder(&bytes)
    }
}

impl std::fmt::Debug for FileAssetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAssetLoader")
            .field("root", &self.root)
            .field("formats", &self.decoders.len())
            .finish()
    }
}
