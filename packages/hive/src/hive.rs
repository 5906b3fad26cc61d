use std::any::type_name;
use std::fmt;
use std::mem;
use std::thread;

use tracing::{debug, trace};

use crate::builder::{DEFAULT_INITIAL_BLOCK_CAPACITY, DEFAULT_MAX_BLOCK_CAPACITY};
use crate::{
    Block, Coalesce, Cursor, Cursors, DropPolicy, Error, FreeList, HiveBuilder, Iter, IterMut,
    Result, SlotAddress,
};

/// A bucketed object pool of unbounded size whose elements never move.
///
/// Elements live in a chain of fixed-capacity blocks. Inserting never moves or reallocates an
/// existing block, and removing an element only marks its slot as vacant, so the address of an
/// element stays the same for as long as the element is in the hive, no matter what happens to
/// the other elements.
///
/// Removed slots are recycled before any new memory is allocated. When there is nothing to
/// recycle, the hive fills the unused tail of its newest block and, once that is full, appends a
/// new block twice the size of the previous one (up to a [configurable maximum][1]).
///
/// # Positions
///
/// Every insertion returns a [`Cursor`], a copyable position that remains valid until its own
/// element is removed or the hive is [cleared][Self::clear]. Cursors are used to access
/// ([`get()`][Self::get], [`get_mut()`][Self::get_mut]), remove ([`erase()`][Self::erase],
/// [`remove()`][Self::remove]) and walk ([`begin()`][Self::begin], [`advance()`][Self::advance],
/// [`end()`][Self::end]) the elements.
///
/// # Iteration
///
/// Elements are visited in block order and, within a block, in slot order. Every run of vacant
/// slots is stepped over in a single jump using a skipfield kept alongside the slots, so
/// iteration costs O(1) amortized per element regardless of how many elements were removed.
///
/// # Example
///
/// ```rust
/// use hive::Hive;
///
/// let mut hive = Hive::new();
///
/// let alice = hive.emplace("Alice".to_string());
/// let bob = hive.emplace("Bob".to_string());
/// hive.emplace("Charlie".to_string());
///
/// hive.erase(bob);
///
/// hive.get_mut(alice).unwrap().push_str(" Smith");
///
/// let names: Vec<&str> = hive.iter().map(String::as_str).collect();
/// assert_eq!(names, ["Alice Smith", "Charlie"]);
/// ```
///
/// # Thread safety
///
/// The hive is a single-owner collection without any internal synchronization. It is `Send` and
/// `Sync` whenever `T` is; wrap it in a `Mutex` to share it between threads.
///
/// [1]: HiveBuilder::max_block_capacity
pub struct Hive<T> {
    /// The block chain. A block's neighbours are the blocks at the adjacent indexes.
    blocks: Vec<Block<T>>,

    free_list: FreeList,

    /// Number of live elements across all blocks.
    len: usize,

    /// Sum of the capacities of all blocks.
    capacity: usize,

    /// Capacity of the block that the next growth step will allocate.
    next_block_capacity: usize,

    initial_block_capacity: usize,
    max_block_capacity: usize,

    drop_policy: DropPolicy,
}

impl<T> Hive<T> {
    #[must_use]
    pub(crate) fn new_inner(
        initial_block_capacity: usize,
        max_block_capacity: usize,
        drop_policy: DropPolicy,
    ) -> Self {
        Self {
            blocks: Vec::new(),
            free_list: FreeList::default(),
            len: 0,
            capacity: 0,
            next_block_capacity: initial_block_capacity,
            initial_block_capacity,
            max_block_capacity,
            drop_policy,
        }
    }

    /// Creates a new [`Hive`] with the default configuration.
    ///
    /// The hive starts empty and does not allocate until the first element is inserted.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let hive = Hive::<String>::new();
    ///
    /// assert_eq!(hive.len(), 0);
    /// assert_eq!(hive.capacity(), 0);
    /// assert!(hive.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::new_inner(
            DEFAULT_INITIAL_BLOCK_CAPACITY,
            DEFAULT_MAX_BLOCK_CAPACITY,
            DropPolicy::default(),
        )
    }

    /// Starts building a new [`Hive`].
    ///
    /// Use this when you want to customize the hive configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::{DropPolicy, Hive};
    ///
    /// let hive = Hive::<u32>::builder()
    ///     .initial_block_capacity(64)
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert!(hive.is_empty());
    /// ```
    pub fn builder() -> HiveBuilder<T> {
        HiveBuilder::new()
    }

    /// The number of elements in the hive.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let first = hive.emplace(1);
    /// hive.emplace(2);
    /// assert_eq!(hive.len(), 2);
    ///
    /// hive.erase(first);
    /// assert_eq!(hive.len(), 1);
    /// ```
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// The number of elements the hive can hold without allocating another block.
    ///
    /// This is the sum of the capacities of all blocks. It only grows, until the hive is
    /// cleared; removing elements never releases capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::builder().initial_block_capacity(4).build();
    /// assert_eq!(hive.capacity(), 0);
    ///
    /// for value in 0..5 {
    ///     hive.emplace(value);
    /// }
    ///
    /// // A block of 4 and a block of 8.
    /// assert_eq!(hive.capacity(), 12);
    /// ```
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the hive contains no elements.
    ///
    /// An empty hive may still be holding capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// assert!(hive.is_empty());
    ///
    /// let cursor = hive.emplace(123);
    /// assert!(!hive.is_empty());
    ///
    /// hive.erase(cursor);
    /// assert!(hive.is_empty());
    /// ```
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value into the hive and returns a cursor pointing at it.
    ///
    /// A slot freed by an earlier removal is reused if there is one. Otherwise the value goes
    /// into the newest block, which is grown first if it is full.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    ///
    /// let cursor = hive.emplace(42);
    /// assert_eq!(hive.get(cursor), Some(&42));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a new block is needed and its memory cannot be allocated. Use
    /// [`try_emplace()`][Self::try_emplace] to handle that case.
    pub fn emplace(&mut self, value: T) -> Cursor {
        self.emplace_with(|| value)
    }

    /// Inserts a value into the hive and returns a cursor pointing at it.
    ///
    /// This is the same as [`emplace()`][Self::emplace].
    ///
    /// # Panics
    ///
    /// Panics if a new block is needed and its memory cannot be allocated.
    pub fn insert(&mut self, value: T) -> Cursor {
        self.emplace(value)
    }

    /// Inserts the value returned by `construct` into the hive and returns a cursor pointing at
    /// it.
    ///
    /// `construct` is called only once a slot for the value has been secured, so it is not called
    /// at all if that fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    ///
    /// let cursor = hive.emplace_with(|| vec![0_u8; 16]);
    /// assert_eq!(hive.get(cursor).map(Vec::len), Some(16));
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a new block is needed and its memory cannot be allocated. Use
    /// [`try_emplace_with()`][Self::try_emplace_with] to handle that case.
    pub fn emplace_with<F>(&mut self, construct: F) -> Cursor
    where
        F: FnOnce() -> T,
    {
        self.try_emplace_with(construct)
            .unwrap_or_else(|error| panic!("{error} for hive of {}", type_name::<T>()))
    }

    /// Fallible form of [`emplace()`][Self::emplace].
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    ///
    /// let cursor = hive.try_emplace(7)?;
    /// assert_eq!(hive.get(cursor), Some(&7));
    /// # Ok::<(), hive::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockAllocation`] if a new block is needed and its memory cannot be
    /// allocated. The hive is left unchanged in that case and `value` is dropped.
    pub fn try_emplace(&mut self, value: T) -> Result<Cursor> {
        self.try_emplace_with(|| value)
    }

    /// Fallible form of [`emplace_with()`][Self::emplace_with].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockAllocation`] if a new block is needed and its memory cannot be
    /// allocated. The hive is left unchanged in that case and `construct` is not called.
    pub fn try_emplace_with<F>(&mut self, construct: F) -> Result<Cursor>
    where
        F: FnOnce() -> T,
    {
        let address = match self.free_list.head() {
            Some(address) => {
                // Construct first: if this panics, nothing has been touched yet.
                let value = construct();
                self.fill_free_slot(address, value);
                address
            }
            None => {
                let block_index = self.block_with_untouched_slot()?;
                let value = construct();

                let index = self.block_mut(block_index).occupy_untouched(value);
                SlotAddress::new(block_index, index)
            }
        };

        self.len = self
            .len
            .checked_add(1)
            .expect("cannot have more elements than slots in virtual memory");

        #[cfg(debug_assertions)]
        self.block(address.block).integrity_check();

        Ok(Cursor::at(address))
    }

    /// Fills the first slot of the erased run at the head of the free list.
    fn fill_free_slot(&mut self, address: SlotAddress, value: T) {
        let run_length = self.block(address.block).skip(address.index);

        trace!(
            block_index = address.block,
            slot_index = address.index,
            run_length,
            "reusing erased slot"
        );

        // The list entry moves before the slot is filled because filling discards the links.
        if run_length > 1 {
            self.free_list
                .replace(&mut self.blocks, address, address.successor());
        } else {
            self.free_list.unlink(&mut self.blocks, address);
        }

        self.block_mut(address.block).occupy(address.index, value);
    }

    /// Index of the tail block if it still has untouched slots, otherwise of a newly appended
    /// block.
    ///
    /// Only called when the free list is empty. At that point every touched slot in every block
    /// is live, so a tail block that is not full necessarily has untouched slots.
    fn block_with_untouched_slot(&mut self) -> Result<usize> {
        if let Some((index, tail)) = self.blocks.iter().enumerate().next_back() {
            if !tail.is_full() {
                debug_assert!(
                    tail.high_water_mark() < tail.capacity(),
                    "tail block has vacant touched slots but the free list is empty"
                );

                return Ok(index);
            }
        }

        self.grow()
    }

    /// Appends a new block to the chain and returns its index.
    ///
    /// All fallible allocation happens before any field is updated, so on failure the hive is
    /// exactly as it was.
    fn grow(&mut self) -> Result<usize> {
        let block_capacity = self.next_block_capacity;

        let block_allocation_failed = |source| Error::BlockAllocation {
            capacity: block_capacity,
            source,
        };

        let block = self
            .blocks
            .try_reserve(1)
            .and_then(|()| Block::try_new(block_capacity))
            .map_err(block_allocation_failed)
            .inspect_err(|error| debug!(%error, "hive block allocation failed"))?;

        let block_index = self.blocks.len();
        self.blocks.push(block);

        self.capacity = self
            .capacity
            .checked_add(block_capacity)
            .expect("total capacity cannot exceed virtual memory");

        self.next_block_capacity = block_capacity
            .saturating_mul(2)
            .min(self.max_block_capacity);

        debug!(
            block_index,
            block_capacity,
            hive_capacity = self.capacity,
            item_type = type_name::<T>(),
            "allocated hive block"
        );

        Ok(block_index)
    }

    /// Removes the element at `cursor`, dropping it, and returns a cursor to the next element.
    ///
    /// The returned cursor is exactly what a forward traversal needs to continue after the
    /// removed element, so erasing while walking the hive is straightforward. Cursors to other
    /// elements remain valid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive: Hive<u32> = (0..6).collect();
    ///
    /// // Remove the odd numbers while walking.
    /// let mut cursor = hive.begin();
    /// while let Some(&value) = hive.get(cursor) {
    ///     cursor = if value % 2 == 1 {
    ///         hive.erase(cursor)
    ///     } else {
    ///         hive.advance(cursor)
    ///     };
    /// }
    ///
    /// assert_eq!(hive.iter().copied().collect::<Vec<_>>(), [0, 2, 4]);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `cursor` does not point at a live element of this hive. The hive is not
    /// modified in that case.
    pub fn erase(&mut self, cursor: Cursor) -> Cursor {
        let address = self.live_address(cursor, "erase");
        let next = self.seek_after(address);

        drop(self.vacate(address));

        next
    }

    /// Removes the element at `cursor` and returns it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let cursor = hive.emplace("Hello".to_string());
    ///
    /// assert_eq!(hive.remove(cursor), "Hello");
    /// assert!(hive.is_empty());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `cursor` does not point at a live element of this hive. The hive is not
    /// modified in that case.
    #[must_use]
    pub fn remove(&mut self, cursor: Cursor) -> T {
        let address = self.live_address(cursor, "remove");

        self.vacate(address)
    }

    fn vacate(&mut self, address: SlotAddress) -> T {
        let (value, coalesce) = self.block_mut(address.block).vacate(address.index);

        match coalesce {
            Coalesce::Isolated => self.free_list.push_front(&mut self.blocks, address),
            Coalesce::ExtendsLeft => {}
            Coalesce::ExtendsRight => {
                self.free_list
                    .replace(&mut self.blocks, address.successor(), address);
            }
            Coalesce::Bridges => self.free_list.unlink(&mut self.blocks, address.successor()),
        }

        #[cfg(debug_assertions)]
        self.block(address.block).integrity_check();

        self.len = self
            .len
            .checked_sub(1)
            .expect("guarded by live element check in callers");

        value
    }

    /// Keeps only the elements for which `keep` returns `true`, removing the rest in one
    /// forward pass.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive: Hive<i32> = (1..=5).collect();
    ///
    /// hive.retain(|value| {
    ///     *value *= 10;
    ///     *value > 20
    /// });
    ///
    /// assert_eq!(hive.iter().copied().collect::<Vec<_>>(), [30, 40, 50]);
    /// ```
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut cursor = self.begin();

        while let Some(value) = self.get_mut(cursor) {
            cursor = if keep(value) {
                self.advance(cursor)
            } else {
                self.erase(cursor)
            };
        }
    }

    /// A cursor to the first element, or [`end()`][Self::end] if the hive is empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// assert_eq!(hive.begin(), hive.end());
    ///
    /// let first = hive.emplace('a');
    /// hive.emplace('b');
    /// assert_eq!(hive.begin(), first);
    /// ```
    #[must_use]
    pub fn begin(&self) -> Cursor {
        self.seek(0, 0)
    }

    /// The past-the-end cursor. Equal to [`Cursor::END`].
    #[must_use]
    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    /// A cursor to the element after the one at `cursor`.
    ///
    /// Returns [`end()`][Self::end] if there is no next element. Advancing the end cursor returns
    /// the end cursor.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let a = hive.emplace(1);
    /// let b = hive.emplace(2);
    /// let c = hive.emplace(3);
    ///
    /// hive.erase(b);
    ///
    /// assert_eq!(hive.advance(a), c);
    /// assert_eq!(hive.advance(c), hive.end());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `cursor` is neither the end cursor nor points at a live element of this hive.
    #[must_use]
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        if cursor.is_end() {
            return Cursor::END;
        }

        let address = self.live_address(cursor, "advance");
        self.seek_after(address)
    }

    /// Whether `cursor` points at a live element of this hive.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let cursor = hive.emplace(1);
    /// assert!(hive.contains(cursor));
    ///
    /// hive.erase(cursor);
    /// assert!(!hive.contains(cursor));
    /// assert!(!hive.contains(hive.end()));
    /// ```
    #[must_use]
    pub fn contains(&self, cursor: Cursor) -> bool {
        self.get(cursor).is_some()
    }

    /// A reference to the element at `cursor`.
    ///
    /// Returns `None` if the cursor does not point at a live element, including for the end
    /// cursor.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let cursor = hive.emplace("hello");
    ///
    /// assert_eq!(hive.get(cursor), Some(&"hello"));
    /// assert_eq!(hive.get(hive.end()), None);
    /// ```
    #[must_use]
    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        let address = cursor.address()?;

        self.blocks.get(address.block)?.get(address.index)
    }

    /// An exclusive reference to the element at `cursor`.
    ///
    /// Returns `None` if the cursor does not point at a live element, including for the end
    /// cursor.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let cursor = hive.emplace(String::from("Hello"));
    ///
    /// hive.get_mut(cursor).unwrap().push_str(", World!");
    /// assert_eq!(hive.get(cursor).map(String::as_str), Some("Hello, World!"));
    /// ```
    #[must_use]
    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        let address = cursor.address()?;

        self.blocks.get_mut(address.block)?.get_mut(address.index)
    }

    /// Removes all elements and releases all blocks.
    ///
    /// Capacity drops to zero and the next insertion starts a fresh block chain, beginning again
    /// with the initial block capacity. All cursors into the hive become invalid. This is
    /// permitted under every [`DropPolicy`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive: Hive<u32> = (0..100).collect();
    ///
    /// hive.clear();
    ///
    /// assert!(hive.is_empty());
    /// assert_eq!(hive.capacity(), 0);
    /// assert_eq!(hive.begin(), hive.end());
    /// ```
    pub fn clear(&mut self) {
        // Reset all bookkeeping before dropping any element, so a panicking destructor leaves
        // behind an empty but consistent hive.
        let blocks = mem::take(&mut self.blocks);
        let dropped = mem::replace(&mut self.len, 0);

        self.capacity = 0;
        self.free_list = FreeList::default();
        self.next_block_capacity = self.initial_block_capacity;

        debug!(
            block_count = blocks.len(),
            dropped,
            item_type = type_name::<T>(),
            "clearing hive"
        );

        drop(blocks);
    }

    /// Exchanges the contents of two hives in O(1).
    ///
    /// Elements do not move in memory. Cursors keep pointing at the same elements, which now
    /// belong to the other hive. Configuration (block capacities, drop policy) is exchanged too.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut a: Hive<u32> = [1, 2].into_iter().collect();
    /// let mut b = Hive::new();
    /// let three = b.emplace(3);
    ///
    /// a.swap(&mut b);
    ///
    /// assert_eq!(a.len(), 1);
    /// assert_eq!(a.get(three), Some(&3));
    /// assert_eq!(b.iter().copied().collect::<Vec<_>>(), [1, 2]);
    /// ```
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Iterates over shared references to all elements, in block and slot order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let hive: Hive<u32> = (1..=3).collect();
    ///
    /// assert_eq!(hive.iter().sum::<u32>(), 6);
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.blocks, self.len)
    }

    /// Iterates over exclusive references to all elements, in block and slot order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive: Hive<u32> = (1..=3).collect();
    ///
    /// for value in hive.iter_mut() {
    ///     *value *= 2;
    /// }
    ///
    /// assert_eq!(hive.iter().copied().collect::<Vec<_>>(), [2, 4, 6]);
    /// ```
    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&mut self.blocks, self.len)
    }

    /// Iterates over the cursors of all elements, in the same order as [`iter()`][Self::iter].
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::new();
    /// let a = hive.emplace('a');
    /// let b = hive.emplace('b');
    ///
    /// assert_eq!(hive.cursors().collect::<Vec<_>>(), [a, b]);
    /// ```
    #[must_use]
    pub fn cursors(&self) -> Cursors<'_, T> {
        Cursors::new(self)
    }

    /// First live slot at or after `index` in block `block_index`, continuing into later
    /// blocks as needed.
    ///
    /// `index` must be a position reachable by walking the skipfield (see [`Block::seek()`]).
    fn seek(&self, block_index: usize, index: usize) -> Cursor {
        let mut start = index;

        for (offset, block) in self.blocks.iter().enumerate().skip(block_index) {
            if let Some(found) = block.seek(start) {
                return Cursor::at(SlotAddress::new(offset, found));
            }

            start = 0;
        }

        Cursor::END
    }

    /// First live slot after the live slot at `address`.
    fn seek_after(&self, address: SlotAddress) -> Cursor {
        let next = address.successor();
        self.seek(next.block, next.index)
    }

    fn live_address(&self, cursor: Cursor, operation: &str) -> SlotAddress {
        cursor
            .address()
            .filter(|address| {
                self.blocks
                    .get(address.block)
                    .is_some_and(|block| block.is_occupied(address.index))
            })
            .unwrap_or_else(|| {
                panic!(
                    "{operation}({cursor:?}) does not point at a live element in hive of {}",
                    type_name::<T>()
                )
            })
    }

    fn block(&self, index: usize) -> &Block<T> {
        self.blocks
            .get(index)
            .expect("block indexes held by the hive always refer to existing blocks")
    }

    fn block_mut(&mut self, index: usize) -> &mut Block<T> {
        self.blocks
            .get_mut(index)
            .expect("block indexes held by the hive always refer to existing blocks")
    }

    /// Verifies that the skipfield of every block, the free list and the aggregate counters
    /// all agree with each other.
    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        let mut observed_len: usize = 0;
        let mut observed_capacity: usize = 0;
        let mut run_starts = Vec::new();

        let tail_index = self.blocks.len().saturating_sub(1);

        for (block_index, block) in self.blocks.iter().enumerate() {
            run_starts.extend(
                block
                    .integrity_check()
                    .into_iter()
                    .map(|index| SlotAddress::new(block_index, index)),
            );

            if block_index != tail_index {
                assert_eq!(
                    block.high_water_mark(),
                    block.capacity(),
                    "block {block_index} is not the tail block but has untouched slots"
                );
            }

            observed_len = observed_len
                .checked_add(block.active_count())
                .expect("bounded by virtual memory");
            observed_capacity = observed_capacity
                .checked_add(block.capacity())
                .expect("bounded by virtual memory");
        }

        assert_eq!(self.len, observed_len, "len does not match live slots");
        assert_eq!(
            self.capacity, observed_capacity,
            "capacity does not match the block capacities"
        );

        let mut listed = self.free_list.integrity_check(&self.blocks);
        listed.sort_unstable_by_key(|address| (address.block, address.index));

        assert_eq!(
            listed, run_starts,
            "free list does not contain exactly the first slot of every erased run"
        );
    }
}

impl<T> Default for Hive<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Hive<T> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropItems && !thread::panicking() {
            assert!(
                self.is_empty(),
                "dropped a hive of {} with {} elements - this is forbidden by DropPolicy::MustNotDropItems",
                type_name::<T>(),
                self.len
            );
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Hive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hive")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("block_count", &self.blocks.len())
            .field("next_block_capacity", &self.next_block_capacity)
            .field("drop_policy", &self.drop_policy)
            .field("items", &DebugItems(self))
            .finish_non_exhaustive()
    }
}

struct DebugItems<'h, T>(&'h Hive<T>);

impl<T: fmt::Debug> fmt::Debug for DebugItems<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T> Extend<T> for Hive<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.emplace(value);
        }
    }
}

impl<T> FromIterator<T> for Hive<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut hive = Self::new();
        hive.extend(iter);
        hive
    }
}

impl<'h, T> IntoIterator for &'h Hive<T> {
    type Item = &'h T;
    type IntoIter = Iter<'h, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'h, T> IntoIterator for &'h mut Hive<T> {
    type Item = &'h mut T;
    type IntoIter = IterMut<'h, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
