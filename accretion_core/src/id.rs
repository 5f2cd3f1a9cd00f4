// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity types shared by the producer and the mounting side.

use core::fmt;
use std::borrow::Borrow;
use std::sync::Arc;

/// Identifies one logical tree (a React-style "surface").
///
/// A [`MountingManager`](crate::manager::MountingManager) is bound to exactly
/// one physical surface but still receives batches tagged with a
/// `SurfaceId`, which it validates against its configuration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    /// Returns the tag the producer uses as the parent of top-level nodes.
    ///
    /// An insert whose parent is this tag attaches directly to the bound
    /// surface's root layer.
    #[inline]
    #[must_use]
    pub const fn root_tag(self) -> Tag {
        Tag(self.0 as u64)
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Unique identifier of a tree node.
///
/// Stable across the node's lifetime and never reused while the node's
/// retained component exists.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u64);

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name of a component type, e.g. `"View"` or `"Paragraph"`.
///
/// Cloning is an `Arc` bump; names are compared by content.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentName(Arc<str>);

impl ComponentName {
    /// Creates a component name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Borrow<str> for ComponentName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentName({:?})", &*self.0)
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque handle to a drawable instance.
///
/// Handles are issued by a [`ComponentDelegate`](crate::component::ComponentDelegate)
/// and passed back to it without interpretation. They do not own the
/// instance; the provider that holds the retained component decides when
/// [`destroy_instance`](crate::component::ComponentDelegate::destroy_instance)
/// runs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrawableHandle(pub u64);

impl fmt::Debug for DrawableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawableHandle({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn root_tag_mirrors_surface_id() {
        assert_eq!(SurfaceId(11).root_tag(), Tag(11));
    }

    #[test]
    fn component_names_compare_by_content() {
        let a = ComponentName::new("View");
        let b = ComponentName::from("View");
        assert_eq!(a, b);

        let mut map = HashMap::new();
        map.insert(a, 1_u32);
        assert_eq!(map.get("View"), Some(&1));
    }

    #[test]
    fn debug_formats_are_compact() {
        assert_eq!(format!("{:?}", Tag(5)), "Tag(5)");
        assert_eq!(format!("{}", Tag(5)), "#5");
        assert_eq!(format!("{:?}", SurfaceId(1)), "SurfaceId(1)");
        assert_eq!(format!("{}", ComponentName::new("Text")), "Text");
    }
}
