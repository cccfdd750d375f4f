//! Tag registry
//!
//! The set of tag strings known to a runtime. Game objects register their tag
//! here when it is assigned.

/// Ordered set of known tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    tags: Vec<String>,
}

impl TagRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with `tags`, duplicates and empty strings dropped
    pub fn with_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut registry = Self::new();
        for tag in tags {
            registry.register(tag.as_ref());
        }
        registry
    }

    /// Add a tag; returns `false` if it is empty or already known
    pub fn register(&mut self, tag: &str) -> bool {
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        log::debug!("Registered tag '{}'", tag);
        true
    }

    /// Whether the tag is known
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Known tags in registration order
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Number of known tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tag is known
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
