use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{DropPolicy, Hive};

/// Capacity of the first block a hive allocates, unless configured otherwise.
pub(crate) const DEFAULT_INITIAL_BLOCK_CAPACITY: usize = 4;

/// Upper bound on the capacity of any single block, unless configured otherwise. Block
/// capacities double with every new block, saturating at this value, so by default growth is
/// unbounded.
pub(crate) const DEFAULT_MAX_BLOCK_CAPACITY: usize = usize::MAX;

/// Builder for creating an instance of [`Hive`].
///
/// You only need to use this builder if you want to customize the hive configuration.
/// The default configuration used by [`Hive::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use hive::{DropPolicy, Hive};
///
/// let hive = Hive::<u32>::builder()
///     .initial_block_capacity(16)
///     .max_block_capacity(1024)
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
///
/// assert_eq!(hive.capacity(), 0);
/// ```
///
/// [1]: Hive::new
#[must_use]
pub struct HiveBuilder<T> {
    initial_block_capacity: usize,
    max_block_capacity: usize,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for HiveBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HiveBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("initial_block_capacity", &self.initial_block_capacity)
            .field("max_block_capacity", &self.max_block_capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> HiveBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            initial_block_capacity: DEFAULT_INITIAL_BLOCK_CAPACITY,
            max_block_capacity: DEFAULT_MAX_BLOCK_CAPACITY,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the capacity of the first block the hive allocates.
    ///
    /// Every following block is twice as large as the one before it, up to the
    /// [maximum block capacity][1].
    ///
    /// The hive returns to this capacity for its next block after [`Hive::clear()`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::<u32>::builder().initial_block_capacity(10).build();
    /// hive.emplace(1);
    ///
    /// assert_eq!(hive.capacity(), 10);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// [1]: Self::max_block_capacity
    pub fn initial_block_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "hive blocks must have non-zero capacity");

        self.initial_block_capacity = capacity;
        self
    }

    /// Sets the largest capacity any single block may have.
    ///
    /// Once block growth reaches this value, every further block has exactly this capacity. If
    /// the initial block capacity is larger, the initial block capacity wins. By default there
    /// is no maximum and every block is twice as large as the one before it.
    ///
    /// # Examples
    ///
    /// ```
    /// use hive::Hive;
    ///
    /// let mut hive = Hive::<u32>::builder()
    ///     .initial_block_capacity(4)
    ///     .max_block_capacity(6)
    ///     .build();
    ///
    /// for value in 0..11 {
    ///     hive.emplace(value);
    /// }
    ///
    /// // Blocks of 4, 6 and 6 slots.
    /// assert_eq!(hive.capacity(), 16);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn max_block_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "hive blocks must have non-zero capacity");

        self.max_block_capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the hive. This governs how
    /// to treat remaining elements in the hive when the hive is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use hive::{DropPolicy, Hive};
    ///
    /// let hive = Hive::<u32>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the hive with the specified configuration.
    ///
    /// No memory is allocated until the first element is inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use hive::Hive;
    ///
    /// let hive = Hive::<u32>::builder().build();
    ///
    /// assert!(hive.is_empty());
    /// ```
    #[must_use]
    pub fn build(self) -> Hive<T> {
        Hive::new_inner(
            self.initial_block_capacity,
            self.max_block_capacity.max(self.initial_block_capacity),
            self.drop_policy,
        )
    }
}
