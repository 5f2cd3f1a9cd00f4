// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The five mutation handlers.
//!
//! Each handler either applies its mutation completely or skips it, pushing
//! the reason onto [`Applier::anomalies`]. Handlers that succeed may still
//! report an anomaly (a moved insert, an orphaning delete) for diagnostics.

use crate::anomaly::Anomaly;
use crate::component::RetainedComponent;
use crate::descriptor::{ComponentDescriptor, LayoutMetrics};
use crate::id::Tag;
use crate::mutation::{Mutation, MutationKind};
use crate::registry::ComponentRegistry;
use crate::scene::{LayerId, SceneStore};

/// Borrowed view of the manager state that mutations edit.
pub(crate) struct Applier<'a> {
    pub(crate) registry: &'a mut ComponentRegistry,
    pub(crate) scene: &'a mut SceneStore,
    /// Parent sentinel meaning "the bound surface".
    pub(crate) root_tag: Tag,
    pub(crate) force_prop_updates: bool,
    /// Anomalies raised since the caller last drained this list.
    pub(crate) anomalies: Vec<Anomaly>,
}

impl<'a> Applier<'a> {
    pub(crate) fn new(
        registry: &'a mut ComponentRegistry,
        scene: &'a mut SceneStore,
        root_tag: Tag,
        force_prop_updates: bool,
    ) -> Self {
        Self {
            registry,
            scene,
            root_tag,
            force_prop_updates,
            anomalies: Vec::new(),
        }
    }

    /// Applies one mutation. Returns `false` if it was skipped.
    pub(crate) fn apply(&mut self, mutation: Mutation) -> bool {
        match mutation {
            Mutation::Create(descriptor) => self.create(descriptor),
            Mutation::Delete(descriptor) => self.delete(descriptor.tag),
            Mutation::Insert(descriptor) => self.insert(&descriptor),
            Mutation::Remove(descriptor) => self.remove(descriptor.tag),
            Mutation::Update { old, new } => self.update(&old, new),
        }
    }

    /// Allocates a component ahead of its Create.
    ///
    /// Returns `false` when the hint was ignored: the tag is already live,
    /// the type is unknown, or the delegate refused.
    pub(crate) fn preallocate(&mut self, descriptor: &ComponentDescriptor) -> bool {
        let tag = descriptor.tag;
        if self.registry.contains(tag) {
            tracing::debug!(%tag, "preliminary allocation for live tag ignored");
            return false;
        }
        let Some(provider) = self.registry.provider_mut(descriptor.name.as_str()) else {
            tracing::debug!(
                %tag,
                name = %descriptor.name,
                "preliminary allocation for unknown type ignored"
            );
            return false;
        };
        match provider.instantiate(descriptor) {
            Ok(handle) => {
                let layer = self.new_layer(tag, descriptor.layout);
                self.registry.insert(RetainedComponent {
                    tag,
                    name: descriptor.name.clone(),
                    handle,
                    layer,
                    props: descriptor.props.clone(),
                    layout: descriptor.layout,
                    preliminary: true,
                });
                true
            }
            Err(error) => {
                tracing::debug!(%tag, %error, "preliminary allocation failed");
                false
            }
        }
    }

    fn create(&mut self, descriptor: ComponentDescriptor) -> bool {
        let tag = descriptor.tag;
        if let Some(existing) = self.registry.get(tag) {
            if !existing.preliminary {
                self.anomalies.push(Anomaly::DuplicateCreate { tag });
                return false;
            }
            if existing.name == descriptor.name {
                self.adopt(descriptor);
                return true;
            }
            let found = existing.name.clone();
            self.discard(tag);
            self.anomalies.push(Anomaly::PreliminaryMismatch {
                tag,
                found,
                requested: descriptor.name.clone(),
            });
        }

        let Some(provider) = self.registry.provider_mut(descriptor.name.as_str()) else {
            self.anomalies.push(Anomaly::UnknownComponentType {
                tag,
                name: descriptor.name,
            });
            return false;
        };
        match provider.instantiate(&descriptor) {
            Ok(handle) => {
                let layer = self.new_layer(tag, descriptor.layout);
                self.registry.insert(RetainedComponent {
                    tag,
                    name: descriptor.name,
                    handle,
                    layer,
                    props: descriptor.props,
                    layout: descriptor.layout,
                    preliminary: false,
                });
                true
            }
            Err(source) => {
                self.anomalies.push(Anomaly::CreateFailed { tag, source });
                false
            }
        }
    }

    /// Claims a preliminary allocation for a Create of the same type.
    fn adopt(&mut self, descriptor: ComponentDescriptor) {
        let tag = descriptor.tag;
        if let Some(component) = self.registry.get_mut(tag) {
            component.preliminary = false;
        }
        tracing::trace!(%tag, "adopted preliminary allocation");
        self.sync_layout(tag, descriptor.layout);
        self.sync_props(tag, descriptor);
    }

    fn delete(&mut self, tag: Tag) -> bool {
        let Some(layer) = self.registry.get(tag).map(|c| c.layer) else {
            self.anomalies.push(Anomaly::DeleteUnknown { tag });
            return false;
        };
        let count = self.scene.destroy_layer(layer);
        if count > 0 {
            self.anomalies.push(Anomaly::OrphanedChildren { tag, count });
        }
        let _ = self.registry.destroy(tag);
        true
    }

    fn insert(&mut self, descriptor: &ComponentDescriptor) -> bool {
        let tag = descriptor.tag;
        let Some(layer) = self.layer_of(tag, MutationKind::Insert) else {
            return false;
        };
        let Some(parent) = descriptor.parent else {
            self.anomalies.push(Anomaly::MissingParent { tag });
            return false;
        };
        let parent_layer = if parent == self.root_tag {
            self.scene.root()
        } else if let Some(component) = self.registry.get(parent) {
            component.layer
        } else {
            self.anomalies.push(Anomaly::UnknownParent { tag, parent });
            return false;
        };
        if self.is_ancestor_or_self(layer, parent_layer) {
            self.anomalies.push(Anomaly::CyclicInsert { tag, parent });
            return false;
        }

        if self.scene.parent(layer).is_some() {
            self.scene.remove_from_parent(layer);
            self.anomalies.push(Anomaly::AlreadyAttached { tag });
        }
        self.scene.insert_child(parent_layer, layer, descriptor.index);
        self.sync_layout(tag, descriptor.layout);
        true
    }

    fn remove(&mut self, tag: Tag) -> bool {
        let Some(layer) = self.layer_of(tag, MutationKind::Remove) else {
            return false;
        };
        if self.scene.parent(layer).is_none() {
            self.anomalies.push(Anomaly::NotAttached { tag });
            return false;
        }
        self.scene.remove_from_parent(layer);
        true
    }

    fn update(&mut self, old: &ComponentDescriptor, new: ComponentDescriptor) -> bool {
        let tag = new.tag;
        if self.layer_of(tag, MutationKind::Update).is_none() {
            return false;
        }
        if old.props == new.props && old.layout == new.layout {
            tracing::trace!(%tag, "update with identical descriptors");
        }
        self.sync_layout(tag, new.layout);
        self.sync_props(tag, new);
        true
    }

    // -- Helpers --

    fn layer_of(&mut self, tag: Tag, kind: MutationKind) -> Option<LayerId> {
        let layer = self.registry.get(tag).map(|c| c.layer);
        if layer.is_none() {
            self.anomalies.push(Anomaly::UnknownTag { kind, tag });
        }
        layer
    }

    fn new_layer(&mut self, tag: Tag, layout: LayoutMetrics) -> LayerId {
        let layer = self.scene.create_layer(tag);
        if layout.frame != kurbo::Rect::ZERO {
            self.scene.set_frame(layer, layout.frame);
        }
        if layout.hidden {
            self.scene.set_hidden(layer, true);
        }
        layer
    }

    /// Writes layout fields that differ from the held ones into the scene.
    fn sync_layout(&mut self, tag: Tag, layout: LayoutMetrics) {
        let Some(component) = self.registry.get_mut(tag) else {
            return;
        };
        if component.layout.frame != layout.frame {
            self.scene.set_frame(component.layer, layout.frame);
        }
        if component.layout.hidden != layout.hidden {
            self.scene.set_hidden(component.layer, layout.hidden);
        }
        component.layout = layout;
    }

    /// Hands new props to the delegate when they differ from the held ones
    /// (or always, when forced) and records the reported invalidation.
    fn sync_props(&mut self, tag: Tag, descriptor: ComponentDescriptor) {
        let force = self.force_prop_updates;
        let Some(component) = self.registry.get(tag) else {
            return;
        };
        if !force && component.props == descriptor.props {
            return;
        }
        let layer = component.layer;
        let level = self
            .registry
            .provider_of_mut(tag)
            .and_then(|provider| provider.update_props(tag, descriptor.props, force))
            .unwrap_or_default();
        self.scene.invalidate(layer, level);
    }

    /// Destroys a component and its layer without reporting anything.
    fn discard(&mut self, tag: Tag) {
        if let Some(component) = self.registry.destroy(tag) {
            let _ = self.scene.destroy_layer(component.layer);
        }
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: LayerId, node: LayerId) -> bool {
        let mut current = Some(node);
        while let Some(layer) = current {
            if layer == ancestor {
                return true;
            }
            current = self.scene.parent(layer);
        }
        false
    }
}
