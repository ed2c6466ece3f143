//! Slab storage for one component type
//!
//! A [`ComponentDataBlock`] owns a contiguous run of component slots, a
//! parallel occupancy bitmap and a generation counter per slot. Slots are
//! never moved or freed: destroying a component only clears its occupancy bit
//! so the slot can be reused, and growth appends slots at the end so every
//! component keeps its index for its whole lifetime.

use std::any::Any;
use std::iter::Enumerate;
use std::slice;

use bitvec::prelude::{BitSlice, BitVec};

use super::component::{Component, ComponentHandle, ComponentKind, ComponentType};
use super::entities::Entities;
use super::error::EcsError;
use crate::config::BlockGrowth;

/// Growable slab of components of type `T`
pub struct ComponentDataBlock<T: ComponentKind> {
    slots: Vec<T>,
    occupied: BitVec,
    generations: Vec<u32>,
    highest_index: Option<usize>,
    next_unique_id: u64,
    growth: BlockGrowth,
}

impl<T: ComponentKind> ComponentDataBlock<T> {
    /// Create a block with `capacity` default-initialized, unoccupied slots
    pub fn new(capacity: usize, growth: BlockGrowth) -> Result<Self, EcsError> {
        let mut block = Self {
            slots: Vec::new(),
            occupied: BitVec::new(),
            generations: Vec::new(),
            highest_index: None,
            next_unique_id: 0,
            growth,
        };

        block.resize(capacity)?;
        Ok(block)
    }

    /// Number of slots, occupied or not
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live components
    pub fn len(&self) -> usize {
        self.occupied.count_ones()
    }

    /// True when no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.occupied.not_any()
    }

    /// Highest occupied slot index, `None` when empty
    pub const fn highest_index(&self) -> Option<usize> {
        self.highest_index
    }

    /// Whether slot `index` holds a live component
    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).is_some_and(|bit| *bit)
    }

    /// Current generation of slot `index`
    pub fn generation(&self, index: usize) -> Option<u32> {
        self.generations.get(index).copied()
    }

    /// Handle for the live component in slot `index`
    pub fn handle(&self, index: usize) -> Option<ComponentHandle> {
        if !self.is_occupied(index) {
            return None;
        }

        let slot = u32::try_from(index).ok()?;
        Some(ComponentHandle::new(T::TYPE, slot, self.generations[index]))
    }

    /// Whether `handle` still refers to the component it was issued for
    pub fn is_valid(&self, handle: ComponentHandle) -> bool {
        let index = handle.index() as usize;
        handle.component_type() == T::TYPE
            && self.is_occupied(index)
            && self.generations[index] == handle.generation()
    }

    /// Live component in slot `index`
    pub fn get(&self, index: usize) -> Option<&T> {
        if self.is_occupied(index) {
            self.slots.get(index)
        } else {
            None
        }
    }

    /// Live component in slot `index`, mutable
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if self.is_occupied(index) {
            self.slots.get_mut(index)
        } else {
            None
        }
    }

    /// Claim the first free slot, growing the block when full
    ///
    /// The slot is reset to `T::default()` and stamped with its internal id
    /// (the slot index) and the next unique id. Returns the slot index.
    pub fn allocate(&mut self) -> Result<usize, EcsError> {
        let index = match self.occupied.first_zero() {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                self.grow()?;
                index
            }
        };

        let internal_id = u32::try_from(index).map_err(|_| EcsError::AllocationFailed {
            component: T::TYPE,
            requested: index + 1,
        })?;

        self.next_unique_id += 1;

        let slot = &mut self.slots[index];
        *slot = T::default();
        slot.base_mut().set_slot(internal_id, self.next_unique_id);

        self.occupied.set(index, true);
        self.highest_index = Some(self.highest_index.map_or(index, |highest| highest.max(index)));

        Ok(index)
    }

    /// Mark slot `index` free and invalidate handles to it
    ///
    /// Returns false when the slot was not occupied. With `defer_highest` the
    /// cached highest index is left alone until [`Self::recompute_highest_index`].
    pub fn release(&mut self, index: usize, defer_highest: bool) -> bool {
        if !self.is_occupied(index) {
            return false;
        }

        self.occupied.set(index, false);
        self.generations[index] = self.generations[index].wrapping_add(1);

        if !defer_highest && self.highest_index == Some(index) {
            self.highest_index = self.occupied[..index].last_one();
        }

        true
    }

    /// Rescan the occupancy bitmap for the highest occupied slot
    pub fn recompute_highest_index(&mut self) {
        self.highest_index = self.occupied.last_one();
    }

    /// Grow by one step of the configured policy
    pub fn grow(&mut self) -> Result<(), EcsError> {
        let current = self.slots.len();
        let target = self.growth.next_capacity(current);

        self.resize(target)?;
        log::info!("Grew {} block from {} to {} slots", T::TYPE, current, target);

        Ok(())
    }

    fn resize(&mut self, target: usize) -> Result<(), EcsError> {
        let additional = target.saturating_sub(self.slots.len());
        if additional == 0 {
            return Ok(());
        }

        let reserved = self
            .slots
            .try_reserve_exact(additional)
            .and_then(|()| self.generations.try_reserve_exact(additional));

        if let Err(error) = reserved {
            log::error!("Failure allocating data for {} block: {}", T::TYPE, error);
            return Err(EcsError::AllocationFailed { component: T::TYPE, requested: target });
        }

        self.slots.resize_with(target, T::default);
        self.generations.resize(target, 0);
        self.occupied.resize(target, false);

        Ok(())
    }

    /// Iterate live components in ascending slot order
    ///
    /// The upper bound is the highest occupied index at the time of the call.
    /// Components that are not world-enabled are skipped unless
    /// `include_inactive` is set.
    pub fn iter<'a>(&'a self, entities: &'a Entities, include_inactive: bool) -> ComponentDataBlockIter<'a, T> {
        let end = self.highest_index.map_or(0, |highest| highest + 1);

        ComponentDataBlockIter {
            slots: self.slots[..end].iter().enumerate(),
            occupied: &self.occupied,
            entities,
            include_inactive,
        }
    }

    /// Mutable counterpart of [`Self::iter`]
    pub fn iter_mut<'a>(
        &'a mut self,
        entities: &'a Entities,
        include_inactive: bool,
    ) -> ComponentDataBlockIterMut<'a, T> {
        let end = self.highest_index.map_or(0, |highest| highest + 1);

        ComponentDataBlockIterMut {
            slots: self.slots[..end].iter_mut().enumerate(),
            occupied: &self.occupied,
            entities,
            include_inactive,
        }
    }

    /// Handles of the components [`Self::iter`] would yield
    pub fn handles(&self, entities: &Entities, include_inactive: bool) -> Vec<ComponentHandle> {
        self.iter(entities, include_inactive)
            .filter_map(|component| self.handle(component.base().internal_id() as usize))
            .collect()
    }
}

/// Forward iterator over the live components of a block
pub struct ComponentDataBlockIter<'a, T> {
    slots: Enumerate<slice::Iter<'a, T>>,
    occupied: &'a BitSlice,
    entities: &'a Entities,
    include_inactive: bool,
}

impl<'a, T: ComponentKind> Iterator for ComponentDataBlockIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let occupied = self.occupied;
        let entities = self.entities;
        let include_inactive = self.include_inactive;

        self.slots.find_map(|(index, component)| {
            (occupied[index] && (include_inactive || component.base().is_world_enabled(entities)))
                .then_some(component)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.slots.size_hint().1)
    }
}

/// Forward iterator over the live components of a block, mutable
pub struct ComponentDataBlockIterMut<'a, T> {
    slots: Enumerate<slice::IterMut<'a, T>>,
    occupied: &'a BitSlice,
    entities: &'a Entities,
    include_inactive: bool,
}

impl<'a, T: ComponentKind> Iterator for ComponentDataBlockIterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let occupied = self.occupied;
        let entities = self.entities;
        let include_inactive = self.include_inactive;

        self.slots.find_map(|(index, component)| {
            (occupied[index] && (include_inactive || component.base().is_world_enabled(entities)))
                .then_some(component)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.slots.size_hint().1)
    }
}

/// Type-erased view of a [`ComponentDataBlock`]
///
/// The registry keeps one boxed block per [`ComponentType`] and dispatches on
/// the type tag; typed access goes through [`ComponentStorage::as_any`].
pub trait ComponentStorage {
    /// Type stored in this block
    fn component_type(&self) -> ComponentType;

    /// See [`ComponentDataBlock::allocate`]
    fn allocate(&mut self) -> Result<usize, EcsError>;

    /// See [`ComponentDataBlock::release`]
    fn release(&mut self, index: usize, defer_highest: bool) -> bool;

    /// Live component in slot `index`
    fn get_dyn(&self, index: usize) -> Option<&dyn Component>;

    /// Live component in slot `index`, mutable
    fn get_dyn_mut(&mut self, index: usize) -> Option<&mut dyn Component>;

    /// Handle for the live component in slot `index`
    fn handle(&self, index: usize) -> Option<ComponentHandle>;

    /// Whether `handle` still resolves
    fn is_valid(&self, handle: ComponentHandle) -> bool;

    /// Fresh default component outside the block
    fn new_standalone(&self) -> Box<dyn Component>;

    /// Number of slots
    fn capacity(&self) -> usize;

    /// Number of live components
    fn len(&self) -> usize;

    /// Highest occupied slot
    fn highest_index(&self) -> Option<usize>;

    /// See [`ComponentDataBlock::recompute_highest_index`]
    fn recompute_highest_index(&mut self);

    /// Indices of every occupied slot, ascending
    fn occupied_indices(&self) -> Vec<usize>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support, mutable
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ComponentKind> ComponentStorage for ComponentDataBlock<T> {
    fn component_type(&self) -> ComponentType {
        T::TYPE
    }

    fn allocate(&mut self) -> Result<usize, EcsError> {
        Self::allocate(self)
    }

    fn release(&mut self, index: usize, defer_highest: bool) -> bool {
        Self::release(self, index, defer_highest)
    }

    fn get_dyn(&self, index: usize) -> Option<&dyn Component> {
        self.get(index).map(|component| component as &dyn Component)
    }

    fn get_dyn_mut(&mut self, index: usize) -> Option<&mut dyn Component> {
        self.get_mut(index).map(|component| component as &mut dyn Component)
    }

    fn handle(&self, index: usize) -> Option<ComponentHandle> {
        Self::handle(self, index)
    }

    fn is_valid(&self, handle: ComponentHandle) -> bool {
        Self::is_valid(self, handle)
    }

    fn new_standalone(&self) -> Box<dyn Component> {
        Box::new(T::default())
    }

    fn capacity(&self) -> usize {
        Self::capacity(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn highest_index(&self) -> Option<usize> {
        self.highest_index
    }

    fn recompute_highest_index(&mut self) {
        Self::recompute_highest_index(self);
    }

    fn occupied_indices(&self) -> Vec<usize> {
        self.occupied.iter_ones().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
