//! The customer's current selection.

use crate::error::CartError;
use crate::ledger::CapacityLedger;
use crate::types::{CartEntry, LessonId, Money};

/// Selected lessons, at most one entry per lesson, in selection order
///
/// Every mutation goes through the ledger as well so a lesson's spaces and
/// its presence in the cart change together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Select a lesson, taking one of its spaces
    ///
    /// The entry is a snapshot of the lesson taken just before the space is
    /// taken. Returns the lesson's remaining spaces.
    ///
    /// # Errors
    ///
    /// - [`CartError::AlreadyInCart`] if the lesson is already selected
    /// - [`CartError::NotFound`] if the ledger does not know the lesson
    /// - [`CartError::NoCapacity`] if the lesson is full
    ///
    /// Neither the cart nor the ledger change on error.
    pub fn add(&mut self, id: &LessonId, ledger: &mut CapacityLedger) -> Result<u32, CartError> {
        if self.contains(id) {
            return Err(CartError::AlreadyInCart(id.clone()));
        }
        let snapshot = ledger
            .get(id)
            .map(CartEntry::from)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        let remaining = ledger.decrement(id)?;
        self.entries.push(snapshot);
        Ok(remaining)
    }

    /// Deselect a lesson, giving its space back
    ///
    /// If the ledger no longer has the lesson (a search replaced it) the entry
    /// is still removed.
    ///
    /// # Errors
    ///
    /// [`CartError::NotFound`] if the lesson is not in the cart.
    pub fn remove(
        &mut self,
        id: &LessonId,
        ledger: &mut CapacityLedger,
    ) -> Result<CartEntry, CartError> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.id == id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        if let Err(error) = ledger.increment(id) {
            tracing::warn!(lesson_id = %id, %error, "Removed cart entry has no ledger counterpart");
        }
        Ok(self.entries.remove(index))
    }

    /// Drop every entry without touching the ledger
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of entry prices
    #[must_use]
    pub fn total(&self) -> Money {
        self.entries.iter().map(|entry| entry.price).sum()
    }

    /// Entries in selection order
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Whether the lesson is selected
    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
