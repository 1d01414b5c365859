//! Fixed-size table of oscillator slots.
//!
//! A slot holds at most one oscillator handle and the frequency it was tuned
//! to. Handles are replaced with explicit retire-then-install steps: the old
//! handle leaves the table only once the caller's retire callback (which
//! stops it on the backend) has succeeded, so a handle is never dropped while
//! it may still be sounding.

#[derive(Debug)]
pub struct Slot<O> {
    pub oscillator: O,
    pub frequency: f32,
}

#[derive(Debug)]
pub struct SlotTable<O> {
    slots: Box<[Option<Slot<O>>]>,
}

impl<O> SlotTable<O> {
    /// `len` empty slots. The length never changes afterwards.
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| None).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slot<O>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Slot<O>>> + '_ {
        self.slots.iter().map(Option::as_ref)
    }

    /// Retire the handle in `index` (if any). On error the handle stays put.
    pub fn retire<E>(
        &mut self,
        index: usize,
        mut retire: impl FnMut(&O) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Some(slot) = &self.slots[index] {
            retire(&slot.oscillator)?;
            self.slots[index] = None;
        }
        Ok(())
    }

    /// Install a handle into an empty slot.
    ///
    /// # Panics
    /// Panics in debug builds if the slot still holds a handle.
    pub fn install(&mut self, index: usize, oscillator: O, frequency: f32) {
        debug_assert!(self.slots[index].is_none(), "slot {index} was not retired");
        self.slots[index] = Some(Slot {
            oscillator,
            frequency,
        });
    }

    /// Run `stop` on every held handle without removing any of them.
    ///
    /// Every slot is visited even if one fails; the first error is returned.
    pub fn for_each_held<E>(&self, mut stop: impl FnMut(&O) -> Result<(), E>) -> Result<(), E> {
        let mut first_error = None;
        for slot in self.slots.iter().flatten() {
            if let Err(err) = stop(&slot.oscillator) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
