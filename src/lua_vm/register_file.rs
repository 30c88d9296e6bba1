// Sparse register slots for one activation

use crate::LuaValue;

/// Ordered slot array private to one activation. Writing past the end
/// extends the file; deleted slots leave holes that read as nil but are
/// distinct from a stored nil. The current length feeds the B=0/C=0
/// multi-value operand forms.
#[derive(Default)]
pub struct RegisterFile {
    slots: Vec<Option<LuaValue>>,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile { slots: Vec::new() }
    }

    /// Read register `i`; holes and out-of-range reads yield nil.
    pub fn get(&self, i: usize) -> LuaValue {
        self.slots
            .get(i)
            .and_then(|slot| slot.clone())
            .unwrap_or(LuaValue::Nil)
    }

    /// Write register `i`, extending the file with holes as needed.
    pub fn set(&mut self, i: usize, value: LuaValue) {
        if i >= self.slots.len() {
            self.slots.resize_with(i + 1, || None);
        }
        self.slots[i] = Some(value);
    }

    /// Remove every slot at index `i` and above.
    pub fn truncate(&mut self, i: usize) {
        self.slots.truncate(i);
    }

    /// Remove slot `i` specifically, leaving a hole; the length of the
    /// file does not change.
    pub fn delete(&mut self, i: usize) {
        if let Some(slot) = self.slots.get_mut(i) {
            *slot = None;
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
