//! In-memory list of images fetched during this run
//!
//! Append-only, with a cursor used for previous/next navigation. Nothing here
//! is persisted.

/// Ordered, append-only sequence with a navigation cursor
///
/// The cursor is `None` exactly when the list is empty and otherwise always
/// points at a valid index.
#[derive(Debug, Clone)]
pub struct SessionList<T> {
    items: Vec<T>,
    cursor: Option<usize>,
}

impl<T> Default for SessionList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> SessionList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item to the end and move the cursor onto it
    pub fn append(&mut self, item: T) {
        self.items.push(item);
        self.cursor = Some(self.items.len() - 1);
    }

    /// Item under the cursor, `None` when nothing has been loaded
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// Move one step towards the newest item. Returns false at the end.
    pub fn advance(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.items.len() => {
                self.cursor = Some(i + 1);
                true
            }
            _ => false,
        }
    }

    /// Move one step towards the oldest item. Returns false at the start.
    pub fn retreat(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.cursor, Some(i) if i + 1 < self.items.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
