/// Fixed-capacity FIFO of observer values backed by a ring buffer.
///
/// Slots fill in insertion order until `capacity` is reached. From then on each
/// insertion overwrites the slot under `head`, which always holds the oldest value.
#[derive(Debug, Clone)]
pub struct ObserverSet {
    slots: Vec<f64>,
    head: usize,
    capacity: usize,
}

impl ObserverSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Appends `value`, returning the evicted oldest observer when at capacity.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.capacity == 0 {
            return Some(value);
        }

        if !self.is_full() {
            self.slots.push(value);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// Replaces the whole contents; values are installed oldest first.
    pub fn replace_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.clear();
        for value in values {
            self.push(value);
        }
    }

    /// Storage order, not FIFO order. Enough for order-independent computations.
    pub fn as_slice(&self) -> &[f64] {
        &self.slots
    }

    /// Iterates from the oldest observer to the newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.slots.get(self.head).copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_below_capacity() {
        let mut set = ObserverSet::new(3);
        assert!(set.is_empty());
        assert_eq!(set.push(1.0), None);
        assert_eq!(set.push(2.0), None);
        assert_eq!(set.len(), 2);
        assert!(!set.is_full());
        assert_eq!(set.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let mut set = ObserverSet::new(3);
        set.replace_all([1.0, 2.0, 3.0]);
        assert!(set.is_full());

        assert_eq!(set.push(4.0), Some(1.0));
        assert_eq!(set.push(5.0), Some(2.0));
        assert_eq!(set.len(), 3);
        assert_eq!(set.oldest(), Some(3.0));
        assert_eq!(set.to_vec(), vec![3.0, 4.0, 5.0]);

        assert_eq!(set.push(6.0), Some(3.0));
        assert_eq!(set.push(7.0), Some(4.0));
        assert_eq!(set.to_vec(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_replace_all_resets_head() {
        let mut set = ObserverSet::new(2);
        set.replace_all([1.0, 2.0]);
        set.push(3.0);
        set.replace_all([8.0, 9.0]);
        assert_eq!(set.to_vec(), vec![8.0, 9.0]);
        assert_eq!(set.oldest(), Some(8.0));
    }

    #[test]
    fn test_replace_all_truncates_to_capacity() {
        let mut set = ObserverSet::new(2);
        set.replace_all([1.0, 2.0, 3.0]);
        assert_eq!(set.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut set = ObserverSet::new(0);
        assert_eq!(set.push(1.0), Some(1.0));
        assert!(set.is_empty());
        assert_eq!(set.oldest(), None);
    }
}
