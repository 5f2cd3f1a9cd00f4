// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The callback interface a reconciler drives.
//!
//! A reconciler (or the scheduler around it) owns a `dyn SchedulerDelegate`
//! and calls it from its own threads. [`MountingManager`] implements it by
//! forwarding to its inherent methods, so integrations that want a trait
//! object and code that holds the manager directly see the same behavior.
//!
//! [`MountingManager`]: crate::manager::MountingManager

use serde_json::Value;

use crate::descriptor::{ComponentDescriptor, Props};
use crate::id::{SurfaceId, Tag};

/// Notifications from the producer side of the hand-off.
///
/// Every method is fire-and-forget and may be called from any thread.
pub trait SchedulerDelegate: Send + Sync {
    /// A new batch was committed for `surface_id`.
    fn did_finish_transaction(&self, surface_id: SurfaceId);

    /// A component will probably be created soon; allocating it now is
    /// optional.
    fn did_request_preliminary_allocation(
        &self,
        surface_id: SurfaceId,
        descriptor: &ComponentDescriptor,
    );

    /// An imperative command addressed to one live component.
    fn did_dispatch_command(&self, tag: Tag, command: &str, args: &Value);

    /// Props replaced outside the mutation pipeline.
    fn did_set_native_props(&self, tag: Tag, props: Props);

    /// The pointer/focus responder changed.
    fn did_set_responder(&self, surface_id: SurfaceId, tag: Tag, initial_tag: Tag, block_native: bool);

    /// The pointer/focus responder was released.
    fn did_clear_responder(&self);
}
