use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur when inserting into a [`Hive`][crate::Hive].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The hive needed a new block to store the element but the memory for it could not be
    /// allocated. The hive is left exactly as it was before the insertion was attempted.
    #[error("failed to allocate a hive block of {capacity} slots")]
    BlockAllocation {
        /// Number of slots in the block that could not be allocated.
        capacity: usize,

        /// The underlying allocation failure.
        #[source]
        source: TryReserveError,
    },
}

/// A specialized `Result` type for hive operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::error::Error as _;
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    fn reserve_failure() -> TryReserveError {
        Vec::<u64>::new()
            .try_reserve_exact(usize::MAX)
            .expect_err("reserving usize::MAX elements of u64 must overflow")
    }

    #[test]
    fn block_allocation_message_names_capacity() {
        let error = Error::BlockAllocation {
            capacity: 64,
            source: reserve_failure(),
        };

        assert_eq!(
            error.to_string(),
            "failed to allocate a hive block of 64 slots"
        );
        assert!(error.source().is_some());
    }
}
