//! Generic parent/children relation
//!
//! Any tree-shaped structure (scene nodes, UI nodes, markup nodes) can be
//! built from two capabilities:
//!
//! - [`Leaf`]: a named entry that knows its parent through a weak
//!   back-reference (an id, never an owning pointer)
//! - [`Branch`]: an entry that owns an ordered list of children
//!
//! Branches hold their children in a [`ChildList`] field and implement the
//! trait by pointing at it; every list operation then comes for free. The
//! [`Branch::adopt`] and [`Branch::disown`] hooks let the implementor keep the
//! children's back-references in sync.
//!
//! Children are kept in insertion order and never duplicated. Indices are
//! stable only until the next insertion or removal at a lower index.

/// A named tree entry with a back-reference to its parent
pub trait Leaf {
    /// How a parent is referred to (an id, not ownership)
    type ParentRef: Copy + Eq;

    /// The entry's name
    fn name(&self) -> &str;

    /// The parent this entry is attached to, if any
    fn parent(&self) -> Option<Self::ParentRef>;
}

/// Ordered, duplicate-free list of owned children
#[derive(Debug)]
pub struct ChildList<C> {
    items: Vec<C>,
}

impl<C> Default for ChildList<C> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<C> ChildList<C> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Children in order
    pub fn as_slice(&self) -> &[C] {
        &self.items
    }

    /// Children in order, mutably
    pub fn as_mut_slice(&mut self) -> &mut [C] {
        &mut self.items
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no children
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the first child matching a predicate
    pub fn position(&self, predicate: impl FnMut(&C) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    /// Remove and return every child, in order
    pub fn drain(&mut self) -> Vec<C> {
        std::mem::take(&mut self.items)
    }
}

/// A tree entry owning an ordered list of children
///
/// Implementors provide access to their [`ChildList`]; every other method has
/// a default. Operations that hand a child back (`Err(child)`) do so when the
/// child is already present, so a rejected child is never silently dropped.
pub trait Branch {
    /// Type of the owned children
    type Child: PartialEq;

    /// The underlying list
    fn child_list(&self) -> &ChildList<Self::Child>;

    /// The underlying list, mutably
    fn child_list_mut(&mut self) -> &mut ChildList<Self::Child>;

    /// Called before a child enters the list
    fn adopt(&self, _child: &mut Self::Child) {}

    /// Called after a child leaves the list
    fn disown(&self, _child: &mut Self::Child) {}

    /// Insert a child at `index` (clamped to the end) and return its index
    ///
    /// Returns the child unchanged if it is already present.
    fn add_at(&mut self, index: usize, mut child: Self::Child) -> Result<usize, Self::Child> {
        if self.contains(&child) {
            return Err(child);
        }
        self.adopt(&mut child);
        let list = self.child_list_mut();
        let index = index.min(list.items.len());
        list.items.insert(index, child);
        Ok(index)
    }

    /// Append a child and return its index
    ///
    /// Returns the child unchanged if it is already present.
    fn add(&mut self, child: Self::Child) -> Result<usize, Self::Child> {
        let end = self.count();
        self.add_at(end, child)
    }

    /// Append a child and return a reference to it in place
    fn add_last(&mut self, child: Self::Child) -> Result<&mut Self::Child, Self::Child> {
        let index = self.add(child)?;
        Ok(&mut self.child_list_mut().items[index])
    }

    /// True if an equal child is present
    fn contains(&self, child: &Self::Child) -> bool {
        self.child_list().items.contains(child)
    }

    /// Remove and return the child equal to `child`
    fn remove(&mut self, child: &Self::Child) -> Option<Self::Child> {
        let index = self.index_of(child)?;
        self.remove_at(index)
    }

    /// Remove and return the child at `index`
    fn remove_at(&mut self, index: usize) -> Option<Self::Child> {
        let list = self.child_list_mut();
        if index >= list.items.len() {
            return None;
        }
        let mut child = list.items.remove(index);
        self.disown(&mut child);
        Some(child)
    }

    /// The child at `index`
    fn get(&self, index: usize) -> Option<&Self::Child> {
        self.child_list().items.get(index)
    }

    /// The child at `index`, mutably
    fn get_mut(&mut self, index: usize) -> Option<&mut Self::Child> {
        self.child_list_mut().items.get_mut(index)
    }

    /// Put `child` at `index`, returning the child previously there
    ///
    /// An index at or past the end appends. A child already present at
    /// another index is handed back; placing a child over itself is a
    /// replacement.
    fn set(&mut self, index: usize, mut child: Self::Child) -> Result<Option<Self::Child>, Self::Child> {
        match self.index_of(&child) {
            Some(existing) if existing != index => return Err(child),
            _ => {}
        }
        self.adopt(&mut child);
        let list = self.child_list_mut();
        if index >= list.items.len() {
            list.items.push(child);
            return Ok(None);
        }
        let mut previous = std::mem::replace(&mut list.items[index], child);
        self.disown(&mut previous);
        Ok(Some(previous))
    }

    /// Number of children
    fn count(&self) -> usize {
        self.child_list().items.len()
    }

    /// Children in insertion order
    fn children(&self) -> &[Self::Child] {
        self.child_list().as_slice()
    }

    /// Index of the child equal to `child`
    fn index_of(&self, child: &Self::Child) -> Option<usize> {
        self.child_list().items.iter().position(|c| c == child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        key: u32,
        name: String,
        parent: Option<u32>,
    }

    impl Item {
        fn new(key: u32) -> Self {
            Self { key, name: format!("item{}", key), parent: None }
        }
    }

    impl PartialEq for Item {
        fn eq(&self, other: &Self) -> bool {
            self.key == other.key
        }
    }

    impl Leaf for Item {
        type ParentRef = u32;

        fn name(&self) -> &str {
            &self.name
        }

        fn parent(&self) -> Option<u32> {
            self.parent
        }
    }

    struct Group {
        key: u32,
        items: ChildList<Item>,
    }

    impl Branch for Group {
        type Child = Item;

        fn child_list(&self) -> &ChildList<Item> {
            &self.items
        }

        fn child_list_mut(&mut self) -> &mut ChildList<Item> {
            &mut self.items
        }

        fn adopt(&self, child: &mut Item) {
            child.parent = Some(self.key);
        }

        fn disown(&self, child: &mut Item) {
            child.parent = None;
        }
    }

    fn group() -> Group {
        Group { key: 100, items: ChildList::new() }
    }

    #[test]
    fn test_add_appends_and_sets_parent() {
        let mut g = group();
        assert_eq!(g.add(Item::new(1)), Ok(0));
        assert_eq!(g.add(Item::new(2)), Ok(1));
        assert_eq!(g.count(), 2);
        assert_eq!(g.get(1).unwrap().parent(), Some(100));
        assert_eq!(g.get(0).unwrap().name(), "item1");
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut g = group();
        g.add(Item::new(1)).unwrap();
        let rejected = g.add(Item::new(1)).unwrap_err();
        assert_eq!(rejected.key, 1);
        assert_eq!(rejected.parent, None);
        assert_eq!(g.count(), 1);
    }

    #[test]
    fn test_add_at_inserts_and_clamps() {
        let mut g = group();
        g.add(Item::new(1)).unwrap();
        g.add(Item::new(2)).unwrap();
        assert_eq!(g.add_at(1, Item::new(3)), Ok(1));
        assert_eq!(g.add_at(99, Item::new(4)), Ok(3));

        let keys: Vec<u32> = g.children().iter().map(|i| i.key).collect();
        assert_eq!(keys, vec![1, 3, 2, 4]);
        assert_eq!(g.index_of(&Item::new(2)), Some(2));
    }

    #[test]
    fn test_remove_clears_parent() {
        let mut g = group();
        g.add(Item::new(1)).unwrap();
        g.add(Item::new(2)).unwrap();

        let removed = g.remove(&Item::new(1)).unwrap();
        assert_eq!(removed.parent, None);
        assert!(!g.contains(&Item::new(1)));
        assert!(g.remove(&Item::new(1)).is_none());
        assert!(g.remove_at(5).is_none());
        assert_eq!(g.index_of(&Item::new(2)), Some(0));
    }

    #[test]
    fn test_set_replaces_and_returns_previous() {
        let mut g = group();
        g.add(Item::new(1)).unwrap();
        g.add(Item::new(2)).unwrap();

        let previous = g.set(0, Item::new(3)).unwrap().unwrap();
        assert_eq!(previous.key, 1);
        assert_eq!(previous.parent, None);
        assert_eq!(g.get(0).unwrap().parent, Some(100));

        // Past the end appends
        assert!(g.set(10, Item::new(4)).unwrap().is_none());
        assert_eq!(g.count(), 3);

        // Already present elsewhere
        assert!(g.set(0, Item::new(2)).is_err());
    }

    #[test]
    fn test_add_last_returns_child_in_place() {
        let mut g = group();
        let child = g.add_last(Item::new(7)).unwrap();
        child.name = "renamed".to_string();
        assert_eq!(g.get(0).unwrap().name(), "renamed");
        assert!(g.get(1).is_none());
    }
}
