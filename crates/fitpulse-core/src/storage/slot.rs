//! A single named, durable key-value pair.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;

/// One persisted blob. Stores read and write the whole value at once.
pub trait KvSlot: Send {
    /// Current value, or `None` if nothing has been written yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored value.
    fn write(&self, value: &str) -> Result<()>;

    /// Remove the stored value entirely.
    fn clear(&self) -> Result<()>;
}

/// In-memory slot. Clones share the same cell, so a test can keep one
/// handle to inspect or corrupt what a store wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    cell: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            cell: Arc::new(Mutex::new(Some(value.into()))),
        }
    }

    /// Peek at the raw stored value.
    pub fn contents(&self) -> Option<String> {
        self.cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KvSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn write(&self, value: &str) -> Result<()> {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.cell.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let slot = MemorySlot::new();
        let observer = slot.clone();
        assert!(slot.read().unwrap().is_none());

        slot.write("[]").unwrap();
        assert_eq!(observer.contents().as_deref(), Some("[]"));

        observer.clear().unwrap();
        assert!(slot.read().unwrap().is_none());
    }
}
