//! Pipeline phases.
//!
//! A [`Phase`] is a first-class marker value, not a string key: equality
//! is identity-based, so two independently declared phases never collide
//! even when they share a display name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A named, ordered slot in a pipeline grouping interceptors by purpose.
///
/// Cheap to clone; clones compare equal, fresh declarations do not.
#[derive(Clone)]
pub struct Phase {
    name: Arc<str>,
}

impl Phase {
    /// Declare a new phase. The returned value (and its clones) is the
    /// only handle that identifies it.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Display name, for diagnostics only; never used for lookup.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Phase {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Phase {}

impl Hash for Phase {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.name) as *const u8 as usize).hash(state);
    }
}

impl fmt::Debug for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase(`{}`)", self.name)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
