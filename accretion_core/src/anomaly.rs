// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable protocol violations.
//!
//! An [`Anomaly`] never aborts a transaction. The offending mutation (or
//! batch) is skipped, the anomaly is logged through `tracing` and forwarded
//! to the trace sink, and application continues with the next instruction.

use thiserror::Error;

use crate::component::CreateError;
use crate::id::{ComponentName, SurfaceId, Tag};
use crate::mutation::MutationKind;

/// A diagnostic raised while applying mutations or imperative commands.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Anomaly {
    /// No provider is registered for the component type.
    #[error("no provider registered for component type {name} (tag {tag})")]
    UnknownComponentType {
        /// Target tag.
        tag: Tag,
        /// Requested type.
        name: ComponentName,
    },
    /// An insert, remove, or update referenced a tag with no live component.
    #[error("{kind} of unknown tag {tag}")]
    UnknownTag {
        /// Mutation that was skipped.
        kind: MutationKind,
        /// Target tag.
        tag: Tag,
    },
    /// A create arrived for a tag that already has a live component.
    #[error("duplicate create for tag {tag}")]
    DuplicateCreate {
        /// Target tag.
        tag: Tag,
    },
    /// The drawable collaborator could not instantiate the component.
    #[error("create failed for tag {tag}")]
    CreateFailed {
        /// Target tag, left unregistered.
        tag: Tag,
        /// What the collaborator reported.
        #[source]
        source: CreateError,
    },
    /// A preliminary allocation of another type was discarded by a create.
    #[error("preliminary {found} for tag {tag} discarded by create of {requested}")]
    PreliminaryMismatch {
        /// Target tag.
        tag: Tag,
        /// Type of the discarded allocation.
        found: ComponentName,
        /// Type the create asked for.
        requested: ComponentName,
    },
    /// An insert carried no parent tag.
    #[error("insert of tag {tag} has no parent")]
    MissingParent {
        /// Target tag.
        tag: Tag,
    },
    /// An insert named a parent with no live component.
    #[error("insert of tag {tag} under unknown parent {parent}")]
    UnknownParent {
        /// Target tag.
        tag: Tag,
        /// Requested parent.
        parent: Tag,
    },
    /// An insert would make a component its own ancestor.
    #[error("insert of tag {tag} under its own descendant {parent}")]
    CyclicInsert {
        /// Target tag.
        tag: Tag,
        /// Requested parent.
        parent: Tag,
    },
    /// A remove targeted a component that has no parent.
    #[error("remove of detached tag {tag}")]
    NotAttached {
        /// Target tag.
        tag: Tag,
    },
    /// An insert targeted a component that is still attached; it was moved.
    #[error("insert of attached tag {tag}, moved from its previous parent")]
    AlreadyAttached {
        /// Target tag.
        tag: Tag,
    },
    /// A delete targeted a tag with no live component.
    #[error("delete of unknown tag {tag}")]
    DeleteUnknown {
        /// Target tag.
        tag: Tag,
    },
    /// A delete destroyed a component whose children were still attached.
    #[error("delete of tag {tag} orphaned {count} attached children")]
    OrphanedChildren {
        /// Target tag.
        tag: Tag,
        /// Number of children left detached.
        count: usize,
    },
    /// A batch was tagged with a surface other than the bound one.
    #[error("batch for {actual:?} skipped, bound to {expected:?}")]
    ForeignSurface {
        /// Surface the manager serves.
        expected: SurfaceId,
        /// Surface the batch was tagged with.
        actual: SurfaceId,
    },
    /// A batch was not newer than the last applied one.
    #[error("stale batch revision {revision} skipped (last applied {last_applied})")]
    StaleBatch {
        /// Revision of the pulled batch.
        revision: u64,
        /// Revision last applied.
        last_applied: u64,
    },
    /// A command or native prop update named a tag with no live component.
    #[error("{operation} for unknown tag {tag}")]
    UnknownCommandTarget {
        /// Target tag.
        tag: Tag,
        /// Command name, or `"setNativeProps"`.
        operation: String,
    },
}

impl Anomaly {
    /// Returns a stable numeric code, used by recorded traces.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::UnknownComponentType { .. } => 1,
            Self::UnknownTag { .. } => 2,
            Self::DuplicateCreate { .. } => 3,
            Self::CreateFailed { .. } => 4,
            Self::PreliminaryMismatch { .. } => 5,
            Self::MissingParent { .. } => 6,
            Self::UnknownParent { .. } => 7,
            Self::NotAttached { .. } => 8,
            Self::AlreadyAttached { .. } => 9,
            Self::DeleteUnknown { .. } => 10,
            Self::OrphanedChildren { .. } => 11,
            Self::ForeignSurface { .. } => 12,
            Self::StaleBatch { .. } => 13,
            Self::UnknownCommandTarget { .. } => 14,
            Self::CyclicInsert { .. } => 15,
        }
    }

    /// Returns the tag the anomaly is about, if it concerns one node.
    #[must_use]
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Self::UnknownComponentType { tag, .. }
            | Self::UnknownTag { tag, .. }
            | Self::DuplicateCreate { tag }
            | Self::CreateFailed { tag, .. }
            | Self::PreliminaryMismatch { tag, .. }
            | Self::MissingParent { tag }
            | Self::UnknownParent { tag, .. }
            | Self::CyclicInsert { tag, .. }
            | Self::NotAttached { tag }
            | Self::AlreadyAttached { tag }
            | Self::DeleteUnknown { tag }
            | Self::OrphanedChildren { tag, .. }
            | Self::UnknownCommandTarget { tag, .. } => Some(*tag),
            Self::ForeignSurface { .. } | Self::StaleBatch { .. } => None,
        }
    }

    /// Returns a short name for the anomaly class, matching what
    /// [`name_for_code`] returns for its [`code`](Self::code).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        name_for_code(self.code())
    }
}

/// Maps an [`Anomaly::code`] back to a short name.
///
/// Unknown codes map to `"unknown"`.
#[must_use]
pub const fn name_for_code(code: u16) -> &'static str {
    match code {
        1 => "unknown-component-type",
        2 => "unknown-tag",
        3 => "duplicate-create",
        4 => "create-failed",
        5 => "preliminary-mismatch",
        6 => "missing-parent",
        7 => "unknown-parent",
        8 => "not-attached",
        9 => "already-attached",
        10 => "delete-unknown",
        11 => "orphaned-children",
        12 => "foreign-surface",
        13 => "stale-batch",
        14 => "unknown-command-target",
        15 => "cyclic-insert",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn messages_name_the_tag() {
        let a = Anomaly::UnknownTag {
            kind: MutationKind::Update,
            tag: Tag(9),
        };
        assert_eq!(a.to_string(), "update of unknown tag #9");
        assert_eq!(a.tag(), Some(Tag(9)));
        assert_eq!(a.name(), "unknown-tag");
    }

    #[test]
    fn create_failed_exposes_its_source() {
        let a = Anomaly::CreateFailed {
            tag: Tag(2),
            source: CreateError::Exhausted,
        };
        let source = a.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("drawable resources exhausted"));
    }

    #[test]
    fn batch_level_anomalies_have_no_tag() {
        let a = Anomaly::StaleBatch {
            revision: 3,
            last_applied: 4,
        };
        assert_eq!(a.tag(), None);
        assert_eq!(a.code(), 13);
    }

    #[test]
    fn codes_round_trip_through_names() {
        assert_eq!(name_for_code(Anomaly::DeleteUnknown { tag: Tag(1) }.code()), "delete-unknown");
        assert_eq!(name_for_code(0), "unknown");
        assert_eq!(name_for_code(99), "unknown");
    }
}
