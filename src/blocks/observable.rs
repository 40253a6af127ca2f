// ObservableCollection - ordered collection that records its own changes
//
// Mutations queue a `CollectionChanged` record. The owner drains the queue
// right after mutating and reacts to each change before control returns to
// the caller, so subscriptions never outlive the owning instance.

/// Kind of structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionAction {
    Add,
    Remove,
    /// Bulk replacement of the whole collection
    Reset,
}

/// A recorded change, with the items it concerned
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionChanged<T> {
    pub action: CollectionAction,
    pub items: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct ObservableCollection<T> {
    items: Vec<T>,
    pending: Vec<CollectionChanged<T>>,
}

impl<T> Default for ObservableCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
        }
    }
}

// Equality is about content; undelivered notifications don't count.
impl<T: PartialEq> PartialEq for ObservableCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Clone + PartialEq> ObservableCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection without emitting any change
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            pending: Vec::new(),
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item.clone());
        self.pending.push(CollectionChanged {
            action: CollectionAction::Add,
            items: vec![item],
        });
    }

    /// Remove the first occurrence of `item`; returns false if absent
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(index) => {
                let removed = self.items.remove(index);
                self.pending.push(CollectionChanged {
                    action: CollectionAction::Remove,
                    items: vec![removed],
                });
                true
            }
            None => false,
        }
    }

    /// Replace the whole content
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.pending.push(CollectionChanged {
            action: CollectionAction::Reset,
            items: self.items.clone(),
        });
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain the queued change records, oldest first
    pub fn take_changes(&mut self) -> Vec<CollectionChanged<T>> {
        std::mem::take(&mut self.pending)
    }
}
