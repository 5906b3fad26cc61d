//! A bucketed object pool with stable element addresses and fast iteration over sparse contents.
//!
//! This crate provides [`Hive`], an unordered collection for workloads that insert and remove
//! elements at high frequency while other code keeps referring to the elements that remain.
//!
//! # Key Features
//!
//! - **Stable memory addresses**: Elements never move once inserted, whatever happens to the
//!   elements around them
//! - **Stable positions**: Every insertion returns a [`Cursor`] that stays valid until its own
//!   element is removed
//! - **O(1) insertion and removal**: Removed slots are recycled through an intrusive free list
//!   before new memory is allocated
//! - **Skipping iteration**: Runs of removed slots are stepped over in a single jump, so
//!   iteration cost does not depend on how many elements have been removed
//! - **Geometric growth**: Storage grows in blocks of increasing size up to a configurable
//!   maximum and existing blocks are never reallocated
//! - **Fallible insertion**: [`Hive::try_emplace()`] reports allocation failure as an
//!   [`Error`] and leaves the hive unchanged
//! - **Flexible drop policies**: Configure behavior when a hive is dropped with remaining
//!   elements
//!
//! # Example
//!
//! ```rust
//! use hive::Hive;
//!
//! let mut hive = Hive::new();
//!
//! let a = hive.emplace(10);
//! let b = hive.emplace(20);
//! let c = hive.emplace(30);
//!
//! // References to elements stay valid across removals of other elements.
//! let c_address = std::ptr::from_ref(hive.get(c).unwrap());
//! hive.erase(b);
//! assert!(std::ptr::eq(c_address, hive.get(c).unwrap()));
//!
//! // The freed slot is reused by the next insertion.
//! let d = hive.emplace(40);
//! assert_eq!(d, b);
//!
//! assert_eq!(hive.iter().copied().collect::<Vec<_>>(), [10, 40, 30]);
//! # _ = a;
//! ```
//!
//! # Erasing while iterating
//!
//! [`Hive::erase()`] returns a cursor to the element after the erased one, so a cursor loop can
//! remove elements as it goes. [`Hive::retain()`] wraps this pattern.
//!
//! ```rust
//! use hive::Hive;
//!
//! let mut hive: Hive<u32> = (1..=10).collect();
//!
//! let mut cursor = hive.begin();
//! while let Some(&value) = hive.get(cursor) {
//!     cursor = if value % 2 == 0 {
//!         hive.erase(cursor)
//!     } else {
//!         hive.advance(cursor)
//!     };
//! }
//!
//! assert_eq!(hive.len(), 5);
//! assert!(hive.iter().all(|value| value % 2 == 1));
//! ```
//!
//! # Logging
//!
//! Block allocations, allocation failures and clearing are reported through [`tracing`] at the
//! `debug` level, reuse of erased slots at the `trace` level. Install a subscriber to see them.
//!
//! [`tracing`]: https://docs.rs/tracing

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod block;
mod builder;
mod cursor;
mod drop_policy;
mod error;
mod free_list;
mod hive;
mod iter;
mod slot;

pub(crate) use block::*;
pub use builder::*;
pub use cursor::*;
pub use drop_policy::*;
pub use error::*;
pub(crate) use free_list::*;
pub use hive::*;
pub use iter::*;
pub(crate) use slot::*;
