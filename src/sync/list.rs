//! Interrupt-safe packet list.
//!
//! [`ProtectedList`] is the queue shared between the polled receive engine
//! and interrupt-context producers/consumers (packet acknowledge). Every add
//! and remove runs inside one short critical section, so neither side can
//! observe a half-updated list.

use heapless::Deque;

use super::primitives::CriticalSectionCell;

/// Fixed-capacity FIFO guarded by a critical section.
pub struct ProtectedList<T, const N: usize> {
    inner: CriticalSectionCell<Deque<T, N>>,
}

impl<T, const N: usize> ProtectedList<T, N> {
    /// Create an empty list (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(Deque::new()),
        }
    }

    /// Append at the tail. Gives the item back if the list is full.
    pub fn tail_add(&self, item: T) -> Result<(), T> {
        self.inner.with(|list| list.push_back(item))
    }

    /// Remove from the head.
    pub fn head_remove(&self) -> Option<T> {
        self.inner.with(|list| list.pop_front())
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.inner.with_ref(|list| list.len())
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.inner.with_ref(|list| list.is_empty())
    }
}

impl<T, const N: usize> Default for ProtectedList<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let list: ProtectedList<u8, 4> = ProtectedList::new();
        list.tail_add(1).unwrap();
        list.tail_add(2).unwrap();
        list.tail_add(3).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.head_remove(), Some(1));
        assert_eq!(list.head_remove(), Some(2));
        assert_eq!(list.head_remove(), Some(3));
        assert_eq!(list.head_remove(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn full_list_returns_item() {
        let list: ProtectedList<u8, 2> = ProtectedList::new();
        list.tail_add(1).unwrap();
        list.tail_add(2).unwrap();
        assert_eq!(list.tail_add(3), Err(3));
    }
}
