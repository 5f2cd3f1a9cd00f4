// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained components and the drawable contract they are built on.
//!
//! The mounting side never draws. For every component type it talks to a
//! [`ComponentDelegate`], which knows how to allocate a drawable instance for
//! a descriptor, apply new props to it, run imperative commands, and release
//! it again. The delegate hands back a non-owning [`DrawableHandle`]; the
//! [`Provider`](crate::registry::Provider) owns the [`RetainedComponent`]
//! that holds it, so destruction happens exactly when a Delete is applied.

use serde_json::Value;
use thiserror::Error;

use crate::descriptor::{ComponentDescriptor, LayoutMetrics, Props};
use crate::id::{ComponentName, DrawableHandle, Tag};
use crate::scene::LayerId;

/// How much of a component's visual output must be redrawn after a prop
/// update.
///
/// Levels are ordered; [`merge`](Self::merge) keeps the larger one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Invalidation {
    /// Nothing visible changed.
    #[default]
    None,
    /// Part of the content must be repainted.
    Partial,
    /// The content must be redrawn from scratch.
    Full,
}

impl Invalidation {
    /// Returns the larger of two levels.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Returns `true` unless the level is [`None`](Self::None).
    #[must_use]
    pub const fn needs_paint(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Why a drawable instance could not be created.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateError {
    /// The drawable collaborator ran out of resources.
    #[error("drawable resources exhausted")]
    Exhausted,
    /// The collaborator refused the descriptor.
    #[error("instance rejected: {0}")]
    Rejected(String),
}

/// The drawable/paint collaborator for one component type.
///
/// Implementations own whatever native objects back a component (render
/// nodes, paragraph builders, image decoders) and are addressed only through
/// the handles they issue.
pub trait ComponentDelegate: Send {
    /// Allocates a drawable instance for `descriptor`.
    fn create_instance(
        &mut self,
        descriptor: &ComponentDescriptor,
    ) -> Result<DrawableHandle, CreateError>;

    /// Applies a new attribute set and reports what must be repainted.
    ///
    /// `force_update` asks the delegate to treat every attribute as changed.
    fn update_props(
        &mut self,
        handle: DrawableHandle,
        props: &Props,
        force_update: bool,
    ) -> Invalidation;

    /// Releases a drawable instance. The handle is not used again.
    fn destroy_instance(&mut self, handle: DrawableHandle);

    /// Runs an imperative, non-structural command (e.g. `"focus"`).
    fn dispatch_command(&mut self, handle: DrawableHandle, command: &str, args: &Value) {
        tracing::debug!(?handle, command, %args, "command not implemented");
    }
}

/// One live tree node's retained state.
///
/// Created on the first Create (or preliminary allocation) for a tag and
/// dropped when the matching Delete is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct RetainedComponent {
    /// Node identity.
    pub tag: Tag,
    /// Component type.
    pub name: ComponentName,
    /// Drawable instance issued by the type's delegate.
    pub handle: DrawableHandle,
    /// Scene layer owned by this component.
    pub layer: LayerId,
    /// Latest accepted attribute set.
    pub props: Props,
    /// Latest accepted layout.
    pub layout: LayoutMetrics,
    /// Allocated ahead of time and not yet claimed by a Create.
    pub preliminary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_merge_keeps_the_larger_level() {
        assert_eq!(Invalidation::None.merge(Invalidation::Partial), Invalidation::Partial);
        assert_eq!(Invalidation::Full.merge(Invalidation::Partial), Invalidation::Full);
        assert!(!Invalidation::None.needs_paint());
        assert!(Invalidation::Partial.needs_paint());
    }

    #[test]
    fn create_error_messages() {
        assert_eq!(CreateError::Exhausted.to_string(), "drawable resources exhausted");
        assert_eq!(
            CreateError::Rejected("bad source".into()).to_string(),
            "instance rejected: bad source"
        );
    }
}
