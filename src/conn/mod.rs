//! Registry of logical-connection control blocks.
//!
//! [`ConnTable`] is a fixed-capacity arena. Blocks are addressed by a
//! generation-checked [`ConnHandle`] from the moment they are allocated, and
//! additionally by the [`ConnId`] the controller assigns once the create
//! response arrives. Freeing a block drains both of its queues, removes its id
//! mapping and bumps the slot generation so stale handles stop resolving.

mod control_block;
mod guard;

pub use control_block::{ConnCallback, ConnKind, ControlBlock, UNLIMITED_CREDITS};
use log::debug;

use crate::error::{NciError, Result};

/// Identifier assigned to a logical connection by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u8);

impl ConnId {
    /// The static RF connection.
    pub const RF: Self = Self(0x00);
    /// Placeholder held by a block whose create response is outstanding.
    pub const PENDING: Self = Self(0xFE);
    /// Highest id the four-bit header field can carry.
    pub const MAX: u8 = 0x0F;

    /// Create a new [`ConnId`] with the provided value.
    #[must_use]
    pub const fn new(id: u8) -> Self { Self(id) }

    /// Return the inner `u8` representation.
    #[must_use]
    pub const fn get(self) -> u8 { self.0 }

    /// Whether the id can appear in a data packet header.
    #[must_use]
    pub const fn is_assignable(self) -> bool { self.0 <= Self::MAX }
}

impl From<u8> for ConnId {
    fn from(value: u8) -> Self { Self(value) }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnId({})", self.0)
    }
}

/// Stable reference to an allocated control block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnHandle {
    slot: usize,
    generation: u32,
}

impl ConnHandle {
    /// Arena slot index.
    #[must_use]
    pub const fn slot(self) -> usize { self.slot }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    block: Option<ControlBlock>,
}

/// Fixed-capacity arena of control blocks.
#[derive(Debug)]
pub struct ConnTable {
    slots: Vec<Slot>,
    by_id: [Option<usize>; ConnId::MAX as usize + 1],
}

impl ConnTable {
    /// Create a table with room for `capacity` blocks.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| Slot::default()).collect(),
            by_id: [None; ConnId::MAX as usize + 1],
        }
    }

    /// Total number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize { self.slots.len() }

    /// Number of allocated blocks.
    #[must_use]
    pub fn len(&self) -> usize { self.slots.iter().filter(|s| s.block.is_some()).count() }

    /// Whether no block is allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Allocate a block holding [`ConnId::PENDING`].
    ///
    /// Slot 0 is kept for the RF connection and is only handed out by
    /// [`ConnTable::bind_rf`].
    ///
    /// # Errors
    ///
    /// Returns [`NciError::Busy`] if another block is still pending, or
    /// [`NciError::NoBuffers`] when every slot is taken.
    pub fn allocate(&mut self, kind: ConnKind, callback: Option<ConnCallback>) -> Result<ConnHandle> {
        if self.find_pending().is_some() {
            return Err(NciError::Busy);
        }
        let slot = self
            .slots
            .iter()
            .enumerate()
            .skip(1)
            .find_map(|(index, s)| s.block.is_none().then_some(index))
            .ok_or(NciError::NoBuffers("control block"))?;
        Ok(self.install(slot, ControlBlock::new(kind, callback)))
    }

    /// Allocate (or replace) the RF connection in slot 0 and bind it to
    /// [`ConnId::RF`].
    pub fn bind_rf(&mut self, callback: Option<ConnCallback>) -> ConnHandle {
        if let Some(handle) = self.find_by_id(ConnId::RF) {
            self.free(handle);
        }
        let handle = self.install(0, ControlBlock::new(ConnKind::Rf, callback));
        if let Some(block) = self.slots[0].block.as_mut() {
            block.id = ConnId::RF;
        }
        self.by_id[usize::from(ConnId::RF.get())] = Some(0);
        handle
    }

    fn install(&mut self, slot: usize, block: ControlBlock) -> ConnHandle {
        let entry = &mut self.slots[slot];
        entry.block = Some(block);
        ConnHandle {
            slot,
            generation: entry.generation,
        }
    }

    /// Bind the controller-assigned `id` to the block behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`NciError::BadHandle`] if the handle is stale,
    /// [`NciError::InvalidParam`] if `id` does not fit the header field, or
    /// [`NciError::Busy`] if another live block already holds `id`.
    pub fn assign_id(&mut self, handle: ConnHandle, id: ConnId) -> Result<()> {
        if !id.is_assignable() {
            return Err(NciError::InvalidParam("connection id"));
        }
        let index = usize::from(id.get());
        if let Some(owner) = self.by_id[index]
            && owner != handle.slot
        {
            return Err(NciError::Busy);
        }
        let block = self.get_mut(handle).ok_or(NciError::BadHandle)?;
        let previous = block.id;
        block.id = id;
        if previous.is_assignable() && previous != id {
            self.by_id[usize::from(previous.get())] = None;
        }
        self.by_id[index] = Some(handle.slot);
        Ok(())
    }

    /// Look up the block currently bound to `id`.
    #[must_use]
    pub fn find_by_id(&self, id: ConnId) -> Option<ConnHandle> {
        if !id.is_assignable() {
            return None;
        }
        let slot = self.by_id[usize::from(id.get())]?;
        let entry = &self.slots[slot];
        entry.block.as_ref().map(|_| ConnHandle {
            slot,
            generation: entry.generation,
        })
    }

    /// Look up the block still waiting for its create response.
    #[must_use]
    pub fn find_pending(&self) -> Option<ConnHandle> {
        self.slots.iter().enumerate().find_map(|(slot, entry)| {
            entry
                .block
                .as_ref()
                .filter(|block| block.id == ConnId::PENDING)
                .map(|_| ConnHandle {
                    slot,
                    generation: entry.generation,
                })
        })
    }

    /// Borrow the block behind `handle` if it is still live.
    #[must_use]
    pub fn get(&self, handle: ConnHandle) -> Option<&ControlBlock> {
        let entry = self.slots.get(handle.slot)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.block.as_ref()
    }

    /// Mutably borrow the block behind `handle` if it is still live.
    pub fn get_mut(&mut self, handle: ConnHandle) -> Option<&mut ControlBlock> {
        let entry = self.slots.get_mut(handle.slot)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.block.as_mut()
    }

    /// Mutably borrow the block bound to `id`.
    pub fn by_id_mut(&mut self, id: ConnId) -> Option<&mut ControlBlock> {
        let handle = self.find_by_id(id)?;
        self.get_mut(handle)
    }

    /// Release the block behind `handle`, discarding both queues.
    ///
    /// Returns the released block (already drained) so the caller can notify
    /// its owner; `None` if the handle was stale.
    pub fn free(&mut self, handle: ConnHandle) -> Option<ControlBlock> {
        let entry = self.slots.get_mut(handle.slot)?;
        if entry.generation != handle.generation {
            return None;
        }
        let mut block = entry.block.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        if block.id.is_assignable() && self.by_id[usize::from(block.id.get())] == Some(handle.slot) {
            self.by_id[usize::from(block.id.get())] = None;
        }
        let dropped = block.flush();
        if dropped > 0 {
            debug!("freed {} with {dropped} queued buffers discarded", block.id);
        }
        Some(block)
    }

    /// Handles of every allocated block, in slot order.
    #[must_use]
    pub fn handles(&self) -> Vec<ConnHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.block.is_some())
            .map(|(slot, entry)| ConnHandle {
                slot,
                generation: entry.generation,
            })
            .collect()
    }
}
