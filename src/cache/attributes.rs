//! Reconciled attribute request sets.
//!
//! A request names one attribute layer a material needs in a GPU buffer.
//! The cache keeps two sets per geometry: the currently materialized set
//! and a time-windowed "used over time" set driving eviction.

use parking_lot::Mutex;

use crate::curves::{AttrDomain, AttrType};
use crate::gpu::safe_attr_name;

/// Maximum number of attribute slots per geometry.
pub const MAX_ATTRIBUTES: usize = 15;

/// One requested attribute layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRequest {
    /// Attribute name in the generic store.
    pub name: String,
    /// Value type of the layer.
    pub data_type: AttrType,
    /// Storage domain of the layer.
    pub domain: AttrDomain,
}

impl AttributeRequest {
    /// Create a request.
    pub fn new(name: impl Into<String>, data_type: AttrType, domain: AttrDomain) -> Self {
        Self {
            name: name.into(),
            data_type,
            domain,
        }
    }
}

/// Ordered set of attribute requests, capped at [`MAX_ATTRIBUTES`].
///
/// Order is allocation order: a request's position is its buffer slot for
/// as long as the set stays materialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeRequestSet {
    requests: Vec<AttributeRequest>,
}

impl AttributeRequestSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request if absent. Ignored with a warning when the set is
    /// full.
    pub fn add_request(&mut self, request: AttributeRequest) {
        if self.requests.contains(&request) {
            return;
        }
        if self.requests.len() >= MAX_ATTRIBUTES {
            log::warn!(
                "attribute request limit ({}) reached, ignoring '{}'",
                MAX_ATTRIBUTES,
                request.name
            );
            return;
        }
        self.requests.push(request);
    }

    /// Whether every request of `other` is present in this set.
    pub fn contains_all(&self, other: &AttributeRequestSet) -> bool {
        other.requests.iter().all(|r| self.requests.contains(r))
    }

    /// Union `other` into this set, under the cache's advisory lock.
    ///
    /// The lock is the scoped-acquisition hook for future multi-consumer
    /// reconciliation over one geometry; today each geometry is merged
    /// from a single thread per frame.
    pub fn merge(&mut self, other: &AttributeRequestSet, lock: &Mutex<()>) {
        let _guard = lock.lock();
        for request in &other.requests {
            self.add_request(request.clone());
        }
    }

    /// Remove every request.
    pub fn clear(&mut self) {
        self.requests.clear();
    }

    /// Number of requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Requests in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeRequest> {
        self.requests.iter()
    }

    /// Slot of the named request, if present.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.requests.iter().position(|r| r.name == name)
    }
}

impl<'a> IntoIterator for &'a AttributeRequestSet {
    type Item = &'a AttributeRequest;
    type IntoIter = std::slice::Iter<'a, AttributeRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}

/// Shader sampler name of an attribute buffer: `"a"` plus the
/// transliterated attribute name.
pub fn attr_sampler_name(name: &str) -> String {
    format!("a{}", safe_attr_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> AttributeRequest {
        AttributeRequest::new(name, AttrType::Color, AttrDomain::Point)
    }

    #[test]
    fn test_add_request_deduplicates() {
        let mut set = AttributeRequestSet::new();
        set.add_request(request("color"));
        set.add_request(request("color"));
        assert_eq!(set.len(), 1);

        // Same name, different domain: a distinct request.
        set.add_request(AttributeRequest::new(
            "color",
            AttrType::Color,
            AttrDomain::Curve,
        ));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_capped_at_max() {
        let mut set = AttributeRequestSet::new();
        for i in 0..MAX_ATTRIBUTES + 3 {
            set.add_request(request(&format!("attr_{i}")));
        }
        assert_eq!(set.len(), MAX_ATTRIBUTES);
    }

    #[test]
    fn test_contains_all() {
        let mut used = AttributeRequestSet::new();
        used.add_request(request("a"));
        used.add_request(request("b"));

        let mut needed = AttributeRequestSet::new();
        needed.add_request(request("b"));
        assert!(used.contains_all(&needed));

        needed.add_request(request("c"));
        assert!(!used.contains_all(&needed));
        // Subset holds in one direction only.
        assert!(!needed.contains_all(&used));
    }

    #[test]
    fn test_merge_is_union() {
        let lock = Mutex::new(());
        let mut a = AttributeRequestSet::new();
        a.add_request(request("x"));
        let mut b = AttributeRequestSet::new();
        b.add_request(request("x"));
        b.add_request(request("y"));

        a.merge(&b, &lock);
        assert_eq!(a.len(), 2);
        assert_eq!(a.find("y"), Some(1));
    }

    #[test]
    fn test_sampler_name_mangling() {
        assert_eq!(attr_sampler_name("uv_map"), "auv_map");
        // Unsafe characters are transliterated, never passed through.
        assert!(!attr_sampler_name("my attr.x").contains(' '));
    }
}
