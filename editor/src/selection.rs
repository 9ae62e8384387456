use std::collections::HashMap;

use atomic_counter::{AtomicCounter, RelaxedCounter};
use log::warn;
use parking_lot::RwLock;

/// Pick-buffer name handed to the renderer. 0 is what an empty pick returns, so it is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionId(u32);

impl SelectionId {
    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn from_raw(raw: u32) -> Option<SelectionId> {
        if raw == 0 {
            None
        } else {
            Some(SelectionId(raw))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOwner {
    Wmo { unique_id: u32 },
}

/// Maps selection names back to the objects owning them. Shared between the scene and every
/// selectable object, which releases its name when dropped.
pub struct SelectionNames {
    names: RwLock<HashMap<SelectionId, SelectionOwner>>,
    next_id: RelaxedCounter,
}

impl SelectionNames {
    pub fn new() -> Self {
        Self {
            names: RwLock::new(HashMap::new()),
            next_id: RelaxedCounter::new(1),
        }
    }

    pub fn add(&self, owner: SelectionOwner) -> SelectionId {
        let mut names = self.names.write();

        loop {
            // Skips 0 and names still held when the counter wraps
            let raw = self.next_id.inc() as u32;
            if let Some(id) = SelectionId::from_raw(raw) {
                if !names.contains_key(&id) {
                    names.insert(id, owner);
                    return id;
                }
            }
        }
    }

    /// Releases `id`. Releasing a name that is not live does nothing and returns false.
    pub fn del(&self, id: SelectionId) -> bool {
        match self.names.write().remove(&id) {
            Some(_) => true,
            None => {
                warn!("Releasing selection name {} which is not in use", id.raw());
                false
            }
        }
    }

    pub fn owner(&self, id: SelectionId) -> Option<SelectionOwner> {
        self.names.read().get(&id).copied()
    }

    pub fn is_same(&self, id: SelectionId, candidate: Option<SelectionId>) -> bool {
        candidate == Some(id) && self.names.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

impl Default for SelectionNames {
    fn default() -> Self {
        Self::new()
    }
}
