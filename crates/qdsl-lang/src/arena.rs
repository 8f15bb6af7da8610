use std::{marker::PhantomData, ops::Index};

/// A type-safe identifier for elements stored in an [`Arena`].
///
/// The tag type keeps an `ArenaId<A>` from indexing an arena tagged `B`. The
/// tag need not be the stored type, which lets ids outlive a borrowed payload.
#[derive(Debug)]
pub struct ArenaId<Tag> {
    id: u32,
    _phantom_data: PhantomData<fn() -> Tag>,
}

impl<Tag> Copy for ArenaId<Tag> {}

impl<Tag> Clone for ArenaId<Tag> {
    #[inline(always)]
    fn clone(&self) -> ArenaId<Tag> {
        *self
    }
}

impl<Tag> PartialEq for ArenaId<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Tag> Eq for ArenaId<Tag> {}

impl<Tag> PartialOrd for ArenaId<Tag> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<Tag> Ord for ArenaId<Tag> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<Tag> std::hash::Hash for ArenaId<Tag> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<Tag> From<u32> for ArenaId<Tag> {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl<Tag> From<usize> for ArenaId<Tag> {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}

impl<Tag> ArenaId<Tag> {
    /// Creates a new arena identifier from a raw `u32` index.
    pub const fn new(id: u32) -> ArenaId<Tag> {
        Self {
            id,
            _phantom_data: PhantomData,
        }
    }

    /// The raw position in the arena.
    pub const fn index(self) -> usize {
        self.id as usize
    }
}

/// An arena allocator for storing elements in allocation order.
///
/// Elements are addressed by [`ArenaId`]s handed out by [`Arena::alloc`].
#[derive(Debug, Clone)]
pub struct Arena<T, Tag = T> {
    items: Vec<T>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Default for Arena<T, Tag> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T, Tag> Arena<T, Tag> {
    /// Creates a new arena with the specified initial capacity.
    pub fn new(size: usize) -> Self {
        Arena {
            items: Vec::with_capacity(size),
            _tag: PhantomData,
        }
    }

    /// Allocates a value in the arena and returns its identifier.
    pub fn alloc(&mut self, value: T) -> ArenaId<Tag> {
        let arena_id = self.items.len() as u32;
        self.items.push(value);
        ArenaId::new(arena_id)
    }

    /// Returns the number of elements in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the element at the given `ArenaId`, or `None` if out of bounds.
    pub fn get(&self, id: ArenaId<Tag>) -> Option<&T> {
        self.items.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: ArenaId<Tag>) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    /// Iterates over elements in allocation order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterates over `(id, element)` pairs in allocation order.
    pub fn iter_with_ids(&self) -> impl Iterator<Item = (ArenaId<Tag>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ArenaId::from(i), item))
    }
}

impl<T, Tag> Index<ArenaId<Tag>> for Arena<T, Tag> {
    type Output = T;

    fn index(&self, index: ArenaId<Tag>) -> &Self::Output {
        &self.items[index.index()]
    }
}
