// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component registry: component type → provider, provider → live instances.
//!
//! The registry is an explicit object assembled by whoever builds the render
//! pipeline and handed to the [`MountingManager`](crate::manager::MountingManager)
//! at construction. It has no concurrency logic of its own; only the active
//! transaction mutates it.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::component::{ComponentDelegate, CreateError, Invalidation, RetainedComponent};
use crate::descriptor::{ComponentDescriptor, Props};
use crate::id::{ComponentName, DrawableHandle, Tag};

/// Owns the live instances of one component type.
///
/// Keyed by tag: insert on Create, erase on Delete, lookup-only otherwise.
pub struct Provider {
    name: ComponentName,
    delegate: Box<dyn ComponentDelegate>,
    components: HashMap<Tag, RetainedComponent>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("components", &self.components.len())
            .finish_non_exhaustive()
    }
}

impl Provider {
    fn new(name: ComponentName, delegate: Box<dyn ComponentDelegate>) -> Self {
        Self {
            name,
            delegate,
            components: HashMap::new(),
        }
    }

    /// Returns the component type this provider serves.
    #[must_use]
    pub fn name(&self) -> &ComponentName {
        &self.name
    }

    /// Returns the live component for `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&RetainedComponent> {
        self.components.get(&tag)
    }

    /// Returns the number of live components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no component of this type is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterates over the tags of live components, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.components.keys().copied()
    }

    pub(crate) fn get_mut(&mut self, tag: Tag) -> Option<&mut RetainedComponent> {
        self.components.get_mut(&tag)
    }

    pub(crate) fn instantiate(
        &mut self,
        descriptor: &ComponentDescriptor,
    ) -> Result<DrawableHandle, CreateError> {
        self.delegate.create_instance(descriptor)
    }

    pub(crate) fn update_props(
        &mut self,
        tag: Tag,
        props: Props,
        force_update: bool,
    ) -> Option<Invalidation> {
        let component = self.components.get_mut(&tag)?;
        let level = self
            .delegate
            .update_props(component.handle, &props, force_update);
        component.props = props;
        Some(level)
    }

    pub(crate) fn dispatch_command(&mut self, tag: Tag, command: &str, args: &Value) -> bool {
        match self.components.get(&tag) {
            Some(component) => {
                self.delegate.dispatch_command(component.handle, command, args);
                true
            }
            None => false,
        }
    }

    fn release(&mut self, handle: DrawableHandle) {
        self.delegate.destroy_instance(handle);
    }
}

/// Maps component types to their [`Provider`]s.
///
/// Also keeps a tag → type index so that lookups by tag alone (parent
/// resolution, command dispatch) work, and so that a tag never has more than
/// one live component across all providers.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    providers: HashMap<ComponentName, Provider>,
    owners: HashMap<Tag, ComponentName>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the delegate for a component type and returns `self`.
    ///
    /// # Panics
    ///
    /// Panics if the type is already registered.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<ComponentName>,
        delegate: impl ComponentDelegate + 'static,
    ) -> Self {
        self.register(name, delegate);
        self
    }

    /// Registers the delegate for a component type.
    ///
    /// # Panics
    ///
    /// Panics if the type is already registered.
    pub fn register(
        &mut self,
        name: impl Into<ComponentName>,
        delegate: impl ComponentDelegate + 'static,
    ) {
        let name = name.into();
        assert!(
            !self.providers.contains_key(&name),
            "component type {name} registered twice"
        );
        let provider = Provider::new(name.clone(), Box::new(delegate));
        self.providers.insert(name, provider);
    }

    /// Returns the provider for a component type.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.get(name)
    }

    /// Returns the type of the live component tagged `tag`.
    #[must_use]
    pub fn owner(&self, tag: Tag) -> Option<&ComponentName> {
        self.owners.get(&tag)
    }

    /// Returns `true` if a component tagged `tag` is alive.
    #[must_use]
    pub fn contains(&self, tag: Tag) -> bool {
        self.owners.contains_key(&tag)
    }

    /// Returns the live component tagged `tag`, whatever its type.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&RetainedComponent> {
        let name = self.owners.get(&tag)?;
        self.providers.get(name)?.get(tag)
    }

    /// Returns the total number of live components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns `true` if no component is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub(crate) fn provider_mut(&mut self, name: &str) -> Option<&mut Provider> {
        self.providers.get_mut(name)
    }

    pub(crate) fn get_mut(&mut self, tag: Tag) -> Option<&mut RetainedComponent> {
        let name = self.owners.get(&tag)?;
        self.providers.get_mut(name)?.get_mut(tag)
    }

    /// Provider of the live component tagged `tag`.
    pub(crate) fn provider_of_mut(&mut self, tag: Tag) -> Option<&mut Provider> {
        let name = self.owners.get(&tag)?;
        self.providers.get_mut(name)
    }

    /// Registers a freshly created component with its provider.
    ///
    /// # Panics
    ///
    /// Panics if the tag is already live or the type is unregistered; the
    /// mounting manager checks both before instantiating.
    pub(crate) fn insert(&mut self, component: RetainedComponent) {
        assert!(
            !self.owners.contains_key(&component.tag),
            "tag {} already has a live component",
            component.tag
        );
        let provider = self
            .providers
            .get_mut(&component.name)
            .unwrap_or_else(|| panic!("component type {} is not registered", component.name));
        self.owners.insert(component.tag, component.name.clone());
        provider.components.insert(component.tag, component);
    }

    /// Erases the component tagged `tag` and releases its drawable instance.
    ///
    /// Returns the erased component so the caller can release its layer.
    pub(crate) fn destroy(&mut self, tag: Tag) -> Option<RetainedComponent> {
        let name = self.owners.remove(&tag)?;
        let provider = self.providers.get_mut(&name)?;
        let component = provider.components.remove(&tag)?;
        provider.release(component.handle);
        Some(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneStore;
    use crate::testing::{DelegateCall, RecordingDelegate};

    fn component(tag: Tag, name: &str, scene: &mut SceneStore) -> RetainedComponent {
        RetainedComponent {
            tag,
            name: ComponentName::new(name),
            handle: DrawableHandle(tag.0),
            layer: scene.create_layer(tag),
            props: Props::new(),
            layout: Default::default(),
            preliminary: false,
        }
    }

    #[test]
    fn insert_indexes_by_tag_and_type() {
        let mut scene = SceneStore::new(Tag(1));
        let (delegate, _log) = RecordingDelegate::new();
        let mut registry = ComponentRegistry::new().with("View", delegate);

        registry.insert(component(Tag(5), "View", &mut scene));

        assert!(registry.contains(Tag(5)));
        assert_eq!(registry.owner(Tag(5)).map(ComponentName::as_str), Some("View"));
        assert_eq!(registry.provider("View").map(Provider::len), Some(1));
        assert_eq!(registry.get(Tag(5)).map(|c| c.tag), Some(Tag(5)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn destroy_releases_the_drawable() {
        let mut scene = SceneStore::new(Tag(1));
        let (delegate, log) = RecordingDelegate::new();
        let mut registry = ComponentRegistry::new().with("View", delegate);
        registry.insert(component(Tag(5), "View", &mut scene));

        let erased = registry.destroy(Tag(5));
        assert_eq!(erased.map(|c| c.tag), Some(Tag(5)));
        assert!(!registry.contains(Tag(5)));
        assert!(registry.is_empty());
        assert_eq!(log.calls(), vec![DelegateCall::Destroy(DrawableHandle(5))]);

        assert!(registry.destroy(Tag(5)).is_none(), "second destroy is a no-op");
    }

    #[test]
    #[should_panic(expected = "already has a live component")]
    fn one_live_component_per_tag() {
        let mut scene = SceneStore::new(Tag(1));
        let (view, _) = RecordingDelegate::new();
        let (text, _) = RecordingDelegate::new();
        let mut registry = ComponentRegistry::new().with("View", view).with("Text", text);
        registry.insert(component(Tag(5), "View", &mut scene));
        registry.insert(component(Tag(5), "Text", &mut scene));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let (a, _) = RecordingDelegate::new();
        let (b, _) = RecordingDelegate::new();
        let _ = ComponentRegistry::new().with("View", a).with("View", b);
    }
}
