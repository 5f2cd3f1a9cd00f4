// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component descriptors: the producer's view of a node at one revision.

use kurbo::Rect;
use serde_json::{Map, Value};

use crate::id::{ComponentName, Tag};

/// An attribute set ("props") for one component.
///
/// Keys iterate in sorted order, so two attribute sets with the same content
/// print and compare identically regardless of how the producer built them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(Map<String, Value>);

impl Props {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of `self` with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`, returning the previous value if any.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.to_owned(), value.into())
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Layout output computed upstream for one node.
///
/// `frame` is expressed in the parent's coordinate space; the scene graph
/// derives absolute frames during evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutMetrics {
    /// Frame relative to the parent node.
    pub frame: Rect,
    /// Whether the node is excluded from display (`display: none`).
    pub hidden: bool,
}

impl LayoutMetrics {
    /// Creates visible metrics with the given frame.
    #[must_use]
    pub const fn from_frame(frame: Rect) -> Self {
        Self {
            frame,
            hidden: false,
        }
    }
}

/// Describes one node as computed by the external reconciler.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDescriptor {
    /// Component type, used to select the [`Provider`](crate::registry::Provider).
    pub name: ComponentName,
    /// Node identity.
    pub tag: Tag,
    /// Attribute set.
    pub props: Props,
    /// Layout output.
    pub layout: LayoutMetrics,
    /// Structural parent, if the node is (or is about to be) attached.
    pub parent: Option<Tag>,
    /// Position among the parent's children.
    pub index: usize,
}

impl ComponentDescriptor {
    /// Creates a detached descriptor with empty props and zero layout.
    #[must_use]
    pub fn new(name: impl Into<ComponentName>, tag: Tag) -> Self {
        Self {
            name: name.into(),
            tag,
            props: Props::new(),
            layout: LayoutMetrics::default(),
            parent: None,
            index: 0,
        }
    }

    /// Returns `self` with the given props.
    #[must_use]
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Returns `self` with the given layout metrics.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutMetrics) -> Self {
        self.layout = layout;
        self
    }

    /// Returns `self` positioned at `index` under `parent`.
    #[must_use]
    pub fn at(mut self, parent: Tag, index: usize) -> Self {
        self.parent = Some(parent);
        self.index = index;
        self
    }
}
