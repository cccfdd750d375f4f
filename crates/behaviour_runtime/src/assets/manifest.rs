//! Script manifest
//!
//! Registry of script types and the resources each declares. The load pass
//! walks it instead of discovering script types at run time.

use super::resource_manager::{ResourceRequest, TypeTag};
use crate::ecs::Script;

/// One registered script type and its declared requests
#[derive(Debug, Clone)]
pub struct ScriptType {
    tag: TypeTag,
    requests: Vec<ResourceRequest>,
}

impl ScriptType {
    /// The script type
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Declared resource requests
    pub fn requests(&self) -> &[ResourceRequest] {
        &self.requests
    }
}

/// All script types known to a runtime, in registration order
#[derive(Debug, Clone, Default)]
pub struct ScriptManifest {
    scripts: Vec<ScriptType>,
}

impl ScriptManifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script type with its declared requests
    ///
    /// Returns `false` if the type was already registered.
    pub fn register<S: Script>(&mut self) -> bool {
        self.register_type(TypeTag::of::<S>(), S::resource_requests())
    }

    /// Register a consumer type with explicit requests
    ///
    /// Returns `false` if the type was already registered.
    pub fn register_type(&mut self, tag: TypeTag, requests: Vec<ResourceRequest>) -> bool {
        if self.contains(tag) {
            return false;
        }
        log::debug!("Registered script type {} with {} resource request(s)", tag, requests.len());
        self.scripts.push(ScriptType { tag, requests });
        true
    }

    /// Whether the type is registered
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.scripts.iter().any(|script| script.tag == tag)
    }

    /// Registered script types
    pub fn scripts(&self) -> &[ScriptType] {
        &self.scripts
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Texture;

    struct Ship;

    impl Script for Ship {
        fn resource_requests() -> Vec<ResourceRequest> {
            vec![ResourceRequest::new::<Texture>(["ship.png", "flame.png"])]
        }
    }

    struct Idle;

    impl Script for Idle {}

    #[test]
    fn test_register_collects_declared_requests() {
        let mut manifest = ScriptManifest::new();
        assert!(manifest.register::<Ship>());
        assert!(manifest.register::<Idle>());

        let ship = &manifest.scripts()[0];
        assert_eq!(ship.tag(), TypeTag::of::<Ship>());
        assert_eq!(ship.requests()[0].names(), ["ship.png".to_string(), "flame.png".to_string()]);
        assert!(manifest.scripts()[1].requests().is_empty());
    }

    #[test]
    fn test_register_twice_is_noop() {
        let mut manifest = ScriptManifest::new();
        assert!(manifest.register::<Ship>());
        assert!(!manifest.register::<Ship>());
        assert_eq!(manifest.len(), 1);
    }
}
