use crate::SlotAddress;

/// A position in a [`Hive`][crate::Hive]: either a live element or the end of the hive.
///
/// Cursors are plain coordinates that borrow nothing, so they can be stored and copied freely
/// and used with [`Hive::get()`][1], [`Hive::get_mut()`][2], [`Hive::advance()`][3] and
/// [`Hive::erase()`][4]. A cursor stays valid across insertions and removals of *other*
/// elements and is only invalidated by removing its own element or by clearing the hive.
///
/// Two cursors are equal if they point at the same slot. All end cursors are equal to
/// [`Cursor::END`].
///
/// # Example
///
/// ```rust
/// use hive::Hive;
///
/// let mut hive = Hive::new();
/// hive.emplace(1);
/// hive.emplace(2);
///
/// let mut cursor = hive.begin();
/// let mut seen = Vec::new();
///
/// while cursor != hive.end() {
///     seen.push(*hive.get(cursor).unwrap());
///     cursor = hive.advance(cursor);
/// }
///
/// assert_eq!(seen, [1, 2]);
/// ```
///
/// [1]: crate::Hive::get
/// [2]: crate::Hive::get_mut
/// [3]: crate::Hive::advance
/// [4]: crate::Hive::erase
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cursor {
    block: Option<usize>,
    index: usize,
}

impl Cursor {
    /// The past-the-end position shared by every hive.
    pub const END: Self = Self {
        block: None,
        index: 0,
    };

    #[must_use]
    pub(crate) fn at(address: SlotAddress) -> Self {
        Self {
            block: Some(address.block),
            index: address.index,
        }
    }

    /// The slot this cursor points at, or `None` for the end position.
    #[must_use]
    pub(crate) fn address(self) -> Option<SlotAddress> {
        self.block.map(|block| SlotAddress::new(block, self.index))
    }

    /// Whether this is the past-the-end position.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hive::{Cursor, Hive};
    ///
    /// let mut hive = Hive::new();
    /// assert!(hive.begin().is_end());
    ///
    /// let cursor = hive.emplace("a");
    /// assert!(!cursor.is_end());
    /// assert!(Cursor::END.is_end());
    /// ```
    #[must_use]
    pub fn is_end(self) -> bool {
        self.block.is_none()
    }
}

impl Default for Cursor {
    /// The default cursor is [`Cursor::END`].
    fn default() -> Self {
        Self::END
    }
}
