// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation instructions and ordered batches.
//!
//! A [`MutationBatch`] describes one atomic transition of a surface's tree
//! from revision N to revision N+1. Mutations inside a batch are applied in
//! the given order with no reordering and no deduplication.

use core::fmt;

use crate::descriptor::ComponentDescriptor;
use crate::id::{SurfaceId, Tag};

/// Field-less discriminant of a [`Mutation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Instantiate a retained component.
    Create,
    /// Destroy a retained component.
    Delete,
    /// Attach a component under a parent.
    Insert,
    /// Detach a component from its parent without destroying it.
    Remove,
    /// Replace a component's props and layout.
    Update,
}

impl MutationKind {
    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural or attribute change instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    /// Creates the component described by the descriptor. No parent link is
    /// established.
    Create(ComponentDescriptor),
    /// Deletes the component. It must already be detached upstream, but
    /// deletion still detaches it defensively.
    Delete(ComponentDescriptor),
    /// Attaches the component under `descriptor.parent` at `descriptor.index`.
    Insert(ComponentDescriptor),
    /// Detaches the component from `descriptor.parent`.
    Remove(ComponentDescriptor),
    /// Moves the component from the `old` description to the `new` one.
    Update {
        /// The description the producer last sent.
        old: ComponentDescriptor,
        /// The description to apply.
        new: ComponentDescriptor,
    },
}

impl Mutation {
    /// Returns the discriminant.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Create(_) => MutationKind::Create,
            Self::Delete(_) => MutationKind::Delete,
            Self::Insert(_) => MutationKind::Insert,
            Self::Remove(_) => MutationKind::Remove,
            Self::Update { .. } => MutationKind::Update,
        }
    }

    /// Returns the descriptor that identifies the target component.
    ///
    /// For updates this is the new description.
    #[must_use]
    pub const fn descriptor(&self) -> &ComponentDescriptor {
        match self {
            Self::Create(d) | Self::Delete(d) | Self::Insert(d) | Self::Remove(d) => d,
            Self::Update { new, .. } => new,
        }
    }

    /// Returns the tag of the target component.
    #[must_use]
    pub const fn tag(&self) -> Tag {
        self.descriptor().tag
    }
}

/// An ordered list of mutations for one surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationBatch {
    /// Surface whose tree this batch transforms.
    pub surface_id: SurfaceId,
    /// Producer-assigned revision, strictly increasing per surface.
    pub revision: u64,
    /// Mutations in application order.
    pub mutations: Vec<Mutation>,
}

impl MutationBatch {
    /// Creates a batch.
    #[must_use]
    pub fn new(surface_id: SurfaceId, revision: u64, mutations: Vec<Mutation>) -> Self {
        Self {
            surface_id,
            revision,
            mutations,
        }
    }

    /// Creates an empty batch, meaning "nothing pending".
    #[must_use]
    pub fn empty(surface_id: SurfaceId) -> Self {
        Self {
            surface_id,
            revision: 0,
            mutations: Vec::new(),
        }
    }

    /// Returns `true` if the batch carries no mutations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Returns the number of mutations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_targets_the_new_descriptor() {
        let old = ComponentDescriptor::new("View", Tag(3));
        let mut new = old.clone();
        new.props.insert("color", "red");
        let m = Mutation::Update {
            old,
            new: new.clone(),
        };
        assert_eq!(m.kind(), MutationKind::Update);
        assert_eq!(m.tag(), Tag(3));
        assert_eq!(m.descriptor(), &new);
    }

    #[test]
    fn empty_batch_reports_empty() {
        let batch = MutationBatch::empty(SurfaceId(1));
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert_eq!(batch.revision, 0);
    }

    #[test]
    fn kind_labels() {
        assert_eq!(MutationKind::Create.to_string(), "create");
        assert_eq!(MutationKind::Remove.as_str(), "remove");
    }
}
