//! Double-buffered field storage
//!
//! Each field owns two physical buffers and a selector naming the one that
//! was written last. A pass reads committed buffers and writes the other slot
//! of its output field; [`FieldStore::commit`] then flips that field's
//! selector. The store is generic so the CPU backend can hold [`FieldData`]
//! and the GPU backend `wgpu::Buffer`s under the same protocol.
//!
//! [`FieldData`]: super::FieldData

use super::fields::FieldId;

/// One of the two physical buffers of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    #[default]
    A,
    B,
}

impl Slot {
    /// The other slot
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Two buffers per field plus the per-field selector
#[derive(Debug)]
pub struct FieldStore<T> {
    buffers: [[T; 2]; FieldId::COUNT],
    current: [Slot; FieldId::COUNT],
}

impl<T> FieldStore<T> {
    /// Allocate both slots of every field with `alloc`
    ///
    /// Every selector starts on [`Slot::A`].
    pub fn new(mut alloc: impl FnMut(FieldId, Slot) -> T) -> Self {
        let buffers = std::array::from_fn(|i| {
            let field = FieldId::ALL[i];
            [alloc(field, Slot::A), alloc(field, Slot::B)]
        });
        Self {
            buffers,
            current: [Slot::A; FieldId::COUNT],
        }
    }

    /// Buffer holding the most recently committed write of `field`
    #[must_use]
    pub fn current_of(&self, field: FieldId) -> &T {
        &self.buffers[field.index()][self.current[field.index()].index()]
    }

    /// Stable input of the next pass that reads `field`
    ///
    /// Between passes this is the committed buffer, so it is the same buffer
    /// as [`current_of`](Self::current_of). It does not move while a pass
    /// writes [`target_of`](Self::target_of).
    #[must_use]
    pub fn previous_of(&self, field: FieldId) -> &T {
        self.current_of(field)
    }

    /// Buffer the next pass on `field` writes
    #[must_use]
    pub fn target_of(&self, field: FieldId) -> &T {
        &self.buffers[field.index()][self.current[field.index()].other().index()]
    }

    /// Slot currently selected for `field`
    #[must_use]
    pub fn current_slot(&self, field: FieldId) -> Slot {
        self.current[field.index()]
    }

    /// Make the target slot of `field` current
    pub fn commit(&mut self, field: FieldId) {
        let slot = &mut self.current[field.index()];
        *slot = slot.other();
    }

    /// Mutable committed buffer of `field`, for uploads
    pub fn current_mut(&mut self, field: FieldId) -> &mut T {
        &mut self.buffers[field.index()][self.current[field.index()].index()]
    }

    /// Both slots of `field`, for operations that touch the two buffers
    /// without a commit (clearing, uploads)
    pub fn slots_mut(&mut self, field: FieldId) -> &mut [T; 2] {
        &mut self.buffers[field.index()]
    }

    /// Run one write pass on `field` and commit it
    ///
    /// The target buffer is moved out for the duration of `pass`, which gets
    /// the store for reading committed buffers alongside it. Reading the
    /// target of `field` inside `pass` yields an empty placeholder.
    pub fn write_pass<F>(&mut self, field: FieldId, pass: F)
    where
        T: Default,
        F: FnOnce(&Self, &mut T),
    {
        let slot = self.current[field.index()].other().index();
        let mut target = std::mem::take(&mut self.buffers[field.index()][slot]);
        pass(self, &mut target);
        self.buffers[field.index()][slot] = target;
        self.commit(field);
    }
}
