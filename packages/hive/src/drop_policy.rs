/// Determines what happens when a hive is dropped while it still contains elements.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The hive drops any remaining elements when it is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The hive panics if it still contains elements when it is dropped.
    ///
    /// This may be valuable if every element must be explicitly erased, for example because
    /// removal triggers bookkeeping elsewhere that must not be skipped. An explicit
    /// [`clear()`][crate::Hive::clear] is always permitted.
    MustNotDropItems,
}
