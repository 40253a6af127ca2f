// ResourceManager - string-keyed registry of resources

use crate::resource::{ResourceError, ResourceResult};
use std::collections::HashMap;

/// A resource that knows the key it registers under
pub trait Resource {
    fn resource_key(&self) -> &str;
}

/// Registry of resources by key
///
/// Keys are unique: registering a key twice is rejected with
/// `ResourceError::DuplicateKey` and the first registration stays in place.
#[derive(Debug)]
pub struct ResourceManager<R> {
    resources: HashMap<String, R>,
}

impl<R> ResourceManager<R> {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }

    /// Register a resource under an explicit key
    pub fn add_resource_as(&mut self, key: impl Into<String>, resource: R) -> ResourceResult<()> {
        let key = key.into();
        if self.resources.contains_key(&key) {
            return Err(ResourceError::DuplicateKey(key));
        }
        self.resources.insert(key, resource);
        Ok(())
    }

    pub fn get_resource(&self, key: &str) -> ResourceResult<&R> {
        self.resources
            .get(key)
            .ok_or_else(|| ResourceError::NotFound(key.to_string()))
    }

    pub fn remove_resource(&mut self, key: &str) -> ResourceResult<R> {
        self.resources
            .remove(key)
            .ok_or_else(|| ResourceError::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<R: Resource> ResourceManager<R> {
    /// Register a resource under its own key
    pub fn add_resource(&mut self, resource: R) -> ResourceResult<()> {
        let key = resource.resource_key().to_string();
        self.add_resource_as(key, resource)
    }
}

impl<R> Default for ResourceManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, u32);

    impl Resource for Named {
        fn resource_key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut manager = ResourceManager::new();
        manager.add_resource(Named("a", 1)).unwrap();
        manager.add_resource_as("b", Named("ignored", 2)).unwrap();

        assert_eq!(manager.get_resource("a").unwrap().1, 1);
        assert_eq!(manager.get_resource("b").unwrap().1, 2);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut manager = ResourceManager::new();
        manager.add_resource(Named("a", 1)).unwrap();

        let result = manager.add_resource(Named("a", 2));
        assert_eq!(result, Err(ResourceError::DuplicateKey("a".into())));
        // First registration wins
        assert_eq!(manager.get_resource("a").unwrap().1, 1);
    }

    #[test]
    fn test_missing_key() {
        let manager: ResourceManager<Named> = ResourceManager::new();
        assert!(matches!(
            manager.get_resource("nope"),
            Err(ResourceError::NotFound(key)) if key == "nope"
        ));
    }

    #[test]
    fn test_remove_resource() {
        let mut manager = ResourceManager::new();
        manager.add_resource(Named("a", 1)).unwrap();
        assert_eq!(manager.remove_resource("a").unwrap().1, 1);
        assert!(!manager.contains("a"));
        assert!(manager.remove_resource("a").is_err());
    }
}
