//! Component registry
//!
//! [`Components`] owns one [`ComponentDataBlock`] per [`ComponentType`] and is
//! the only place components are created, copied and destroyed. Pooled
//! components are addressed through [`ComponentHandle`]s; standalone
//! components are handed out as owned boxes that no block iteration sees.

use super::component::{
    load_component, save_component, Component, ComponentHandle, ComponentKind, ComponentType,
};
use super::components;
use super::entities::Entities;
use super::error::EcsError;
use super::storage::{ComponentDataBlock, ComponentStorage};
use crate::config::EngineConfig;
use crate::services::Services;

/// Occupancy snapshot of one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Block type
    pub component_type: ComponentType,
    /// Allocated slots
    pub capacity: usize,
    /// Live components
    pub len: usize,
    /// Highest occupied slot
    pub highest_index: Option<usize>,
}

/// Owner of every pooled component
pub struct Components {
    blocks: Vec<Box<dyn ComponentStorage>>,
    services: Services,
    defer_highest_index: bool,
    shut_down: bool,
}

impl Components {
    /// Allocate one block per component type using the configured capacities
    pub fn new(config: &EngineConfig, services: Services) -> Result<Self, EcsError> {
        let mut blocks = Vec::with_capacity(ComponentType::COUNT);

        for component_type in ComponentType::ALL {
            let capacity = config.block_capacity(component_type) as usize;
            blocks.push(components::new_block(component_type, capacity, config.block_growth)?);
        }

        log::info!("Component registry ready ({} blocks)", blocks.len());

        Ok(Self {
            blocks,
            services,
            defer_highest_index: false,
            shut_down: false,
        })
    }

    /// Shared collaborators handed to component hooks
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Run `on_setup` on every live pooled component
    pub fn setup(&mut self) {
        for block in &mut self.blocks {
            for index in block.occupied_indices() {
                if let Some(component) = block.get_dyn_mut(index) {
                    component.on_setup(&self.services);
                }
            }
        }
    }

    /// Tear down every block
    ///
    /// Live components are dropped without running `on_destroyed`; delete the
    /// entities first when their external resources matter. Afterwards every
    /// create fails and every destroy returns false.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        self.log_stats();
        self.blocks.clear();
        self.shut_down = true;

        log::info!("Component registry shut down");
    }

    /// Whether [`Self::shutdown`] has run
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Create a pooled component of `component_type`
    ///
    /// `on_created` runs before the caller assigns a parent entity; the
    /// scripting runtime is asked for a peer object right after.
    pub fn create(&mut self, component_type: ComponentType) -> Result<ComponentHandle, EcsError> {
        let block = self
            .blocks
            .get_mut(component_type.index())
            .ok_or(EcsError::RegistryShutdown)?;

        let index = block.allocate().inspect_err(|error| {
            log::error!("Failed to create {} component: {}", component_type, error);
        })?;

        let handle = block.handle(index).ok_or(EcsError::InvalidHandle(component_type))?;
        let component = block.get_dyn_mut(index).ok_or(EcsError::InvalidHandle(component_type))?;

        component.on_created(&self.services);

        let peer = self
            .services
            .scripts
            .create_component_object(component_type, handle.index());
        component.base_mut().set_script_handle(peer);

        Ok(handle)
    }

    /// Typed [`Self::create`]
    pub fn create_typed<T: ComponentKind>(&mut self) -> Result<ComponentHandle, EcsError> {
        self.create(T::TYPE)
    }

    /// Create a component outside the blocks
    ///
    /// The caller owns the box and releases it with [`Self::destroy_standalone`].
    /// Standalone components get no scripting peer.
    pub fn create_standalone(&self, component_type: ComponentType) -> Result<Box<dyn Component>, EcsError> {
        let block = self
            .blocks
            .get(component_type.index())
            .ok_or(EcsError::RegistryShutdown)?;

        let mut component = block.new_standalone();
        component.base_mut().set_standalone(true);
        component.on_created(&self.services);

        Ok(component)
    }

    /// Destroy a pooled component
    ///
    /// Returns false when the registry is shut down, the handle is stale or
    /// the slot is already free. A failing `on_destroyed` is logged and the
    /// slot is released anyway.
    pub fn destroy(&mut self, handle: ComponentHandle) -> bool {
        if self.shut_down {
            return false;
        }

        let Some(block) = self.blocks.get_mut(handle.component_type().index()) else {
            return false;
        };

        if !block.is_valid(handle) {
            return false;
        }

        let index = handle.index() as usize;
        if let Some(component) = block.get_dyn_mut(index) {
            release_component(component, &self.services);
        }

        block.release(index, self.defer_highest_index)
    }

    /// Destroy a standalone component
    ///
    /// Returns false, and drops nothing, when `component` is a pooled slot copy.
    pub fn destroy_standalone(&self, mut component: Box<dyn Component>) -> bool {
        if !component.base().standalone() {
            log::warn!(
                "Refusing to destroy non-standalone {} component as standalone",
                component.component_type()
            );
            return false;
        }

        release_component(component.as_mut(), &self.services);
        true
    }

    /// Data-level copy of a pooled component into a new pooled slot
    pub fn copy(&mut self, handle: ComponentHandle) -> Result<ComponentHandle, EcsError> {
        let data = {
            let source = self
                .get_dyn(handle)
                .ok_or(EcsError::InvalidHandle(handle.component_type()))?;
            save_component(source)?
        };

        self.create_loaded(handle.component_type(), &data)
    }

    /// Data-level copy of a pooled component into a standalone box
    pub fn copy_standalone(&self, handle: ComponentHandle) -> Result<Box<dyn Component>, EcsError> {
        let source = self
            .get_dyn(handle)
            .ok_or(EcsError::InvalidHandle(handle.component_type()))?;

        self.copy_standalone_from(source)
    }

    /// Data-level copy of any component (pooled or standalone) into a new pooled slot
    pub fn copy_from(&mut self, source: &dyn Component) -> Result<ComponentHandle, EcsError> {
        let data = save_component(source)?;
        self.create_loaded(source.component_type(), &data)
    }

    /// Data-level copy of any component into a standalone box
    pub fn copy_standalone_from(&self, source: &dyn Component) -> Result<Box<dyn Component>, EcsError> {
        let data = save_component(source)?;
        let mut copy = self.create_standalone(source.component_type())?;

        load_component(copy.as_mut(), &data)?;
        copy.on_copied();

        Ok(copy)
    }

    fn create_loaded(
        &mut self,
        component_type: ComponentType,
        data: &serde_json::Value,
    ) -> Result<ComponentHandle, EcsError> {
        let handle = self.create(component_type)?;
        let loaded = self
            .get_dyn_mut(handle)
            .ok_or(EcsError::InvalidHandle(component_type))
            .and_then(|copy| {
                load_component(copy, data)?;
                copy.on_copied();
                Ok(())
            });

        if let Err(error) = loaded {
            self.destroy(handle);
            return Err(error);
        }

        Ok(handle)
    }

    /// Whether `handle` resolves to a live component
    pub fn contains(&self, handle: ComponentHandle) -> bool {
        self.blocks
            .get(handle.component_type().index())
            .is_some_and(|block| block.is_valid(handle))
    }

    /// Resolve a handle to a type-erased component
    pub fn get_dyn(&self, handle: ComponentHandle) -> Option<&dyn Component> {
        let block = self.blocks.get(handle.component_type().index())?;
        if !block.is_valid(handle) {
            return None;
        }

        block.get_dyn(handle.index() as usize)
    }

    /// Resolve a handle to a type-erased component, mutable
    pub fn get_dyn_mut(&mut self, handle: ComponentHandle) -> Option<&mut dyn Component> {
        let block = self.blocks.get_mut(handle.component_type().index())?;
        if !block.is_valid(handle) {
            return None;
        }

        block.get_dyn_mut(handle.index() as usize)
    }

    /// Resolve a handle to a concrete component
    pub fn get<T: ComponentKind>(&self, handle: ComponentHandle) -> Option<&T> {
        let block = self.block::<T>()?;
        if !block.is_valid(handle) {
            return None;
        }

        block.get(handle.index() as usize)
    }

    /// Resolve a handle to a concrete component, mutable
    pub fn get_mut<T: ComponentKind>(&mut self, handle: ComponentHandle) -> Option<&mut T> {
        let block = self.block_mut::<T>()?;
        if !block.is_valid(handle) {
            return None;
        }

        block.get_mut(handle.index() as usize)
    }

    /// Slot lookup by internal id, used by the scripting bridge
    pub fn get_by_internal_id(&self, component_type: ComponentType, internal_id: u32) -> Option<&dyn Component> {
        self.blocks
            .get(component_type.index())?
            .get_dyn(internal_id as usize)
    }

    /// Slot lookup by internal id, mutable
    pub fn get_by_internal_id_mut(
        &mut self,
        component_type: ComponentType,
        internal_id: u32,
    ) -> Option<&mut dyn Component> {
        self.blocks
            .get_mut(component_type.index())?
            .get_dyn_mut(internal_id as usize)
    }

    /// Current handle of the live component in slot `internal_id`
    pub fn handle_of(&self, component_type: ComponentType, internal_id: u32) -> Option<ComponentHandle> {
        self.blocks
            .get(component_type.index())?
            .handle(internal_id as usize)
    }

    /// Typed block
    pub fn block<T: ComponentKind>(&self) -> Option<&ComponentDataBlock<T>> {
        self.blocks
            .get(T::TYPE.index())?
            .as_any()
            .downcast_ref::<ComponentDataBlock<T>>()
    }

    /// Typed block, mutable
    pub fn block_mut<T: ComponentKind>(&mut self) -> Option<&mut ComponentDataBlock<T>> {
        self.blocks
            .get_mut(T::TYPE.index())?
            .as_any_mut()
            .downcast_mut::<ComponentDataBlock<T>>()
    }

    /// Iterate live pooled components of type `T` in slot order
    ///
    /// Components that are not world-enabled are skipped unless
    /// `include_inactive` is set.
    pub fn iter<'a, T: ComponentKind>(
        &'a self,
        entities: &'a Entities,
        include_inactive: bool,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.block::<T>()
            .into_iter()
            .flat_map(move |block| block.iter(entities, include_inactive))
    }

    /// Mutable counterpart of [`Self::iter`]
    pub fn iter_mut<'a, T: ComponentKind>(
        &'a mut self,
        entities: &'a Entities,
        include_inactive: bool,
    ) -> impl Iterator<Item = &'a mut T> + 'a {
        self.block_mut::<T>()
            .into_iter()
            .flat_map(move |block| block.iter_mut(entities, include_inactive))
    }

    /// Handles of the live components of `component_type`, in slot order
    pub fn handles(
        &self,
        component_type: ComponentType,
        entities: &Entities,
        include_inactive: bool,
    ) -> Vec<ComponentHandle> {
        let Some(block) = self.blocks.get(component_type.index()) else {
            return Vec::new();
        };

        block
            .occupied_indices()
            .into_iter()
            .filter(|&index| {
                include_inactive
                    || block
                        .get_dyn(index)
                        .is_some_and(|component| component.base().is_world_enabled(entities))
            })
            .filter_map(|index| block.handle(index))
            .collect()
    }

    /// Run `f` on every live component of `component_type`, in slot order
    pub fn for_each_mut(
        &mut self,
        component_type: ComponentType,
        entities: &Entities,
        include_inactive: bool,
        mut f: impl FnMut(&mut dyn Component),
    ) {
        let Some(block) = self.blocks.get_mut(component_type.index()) else {
            return;
        };

        let end = block.highest_index().map_or(0, |highest| highest + 1);
        for index in 0..end {
            if let Some(component) = block.get_dyn_mut(index) {
                if include_inactive || component.base().is_world_enabled(entities) {
                    f(component);
                }
            }
        }
    }

    /// Leave the cached highest index stale on destroy
    ///
    /// Speeds up bulk deletes; call [`Self::recompute_highest_indices`] once
    /// the batch is done.
    pub fn set_defer_highest_index(&mut self, defer: bool) {
        self.defer_highest_index = defer;
    }

    /// Rescan every block for its highest occupied slot
    pub fn recompute_highest_indices(&mut self) {
        for block in &mut self.blocks {
            block.recompute_highest_index();
        }
    }

    /// Occupancy of every block
    pub fn stats(&self) -> Vec<BlockStats> {
        self.blocks
            .iter()
            .map(|block| BlockStats {
                component_type: block.component_type(),
                capacity: block.capacity(),
                len: block.len(),
                highest_index: block.highest_index(),
            })
            .collect()
    }

    /// Log occupancy of every non-empty block
    pub fn log_stats(&self) {
        for stats in self.stats().iter().filter(|stats| stats.len > 0) {
            log::debug!(
                "{} block: {}/{} slots in use",
                stats.component_type,
                stats.len,
                stats.capacity
            );
        }
    }
}

fn release_component(component: &mut dyn Component, services: &Services) {
    if let Err(error) = component.on_destroyed(services) {
        log::error!("Error destroying {} component: {}", component.component_type(), error);
    }

    if let Some(peer) = component.base_mut().take_script_handle() {
        services.scripts.dispose_object(peer);
    }

    component.base_mut().set_parent(None);
}
