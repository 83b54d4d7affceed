//! Fallible growth of the graph's bookkeeping collections.
//!
//! Every push into a link list and every new lookup entry goes through this
//! module, so that running out of memory is reported as
//! [`AllocError`] instead of aborting halfway through a mutation.
//!
//! In test builds a thread-local failpoint can make the *n*-th growth step
//! fail, which is how rollback paths are exercised.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::error::AllocError;

/// Append `item` to `items`, returning the position it landed at.
///
/// On failure `items` is untouched and `item` is dropped.
pub(crate) fn try_push<T>(items: &mut Vec<T>, item: T) -> Result<usize, AllocError> {
    failpoint::check()?;
    items.try_reserve(1)?;
    let position = items.len();
    items.push(item);
    Ok(position)
}

/// Make room for one more entry in `map`, so a following insert cannot fail.
pub(crate) fn try_reserve_entry<K, V>(map: &mut IndexMap<K, V>) -> Result<(), AllocError>
where
    K: Hash + Eq,
{
    failpoint::check()?;
    map.try_reserve(1)?;
    Ok(())
}

#[cfg(not(test))]
mod failpoint {
    use crate::error::AllocError;

    #[inline(always)]
    pub(super) fn check() -> Result<(), AllocError> {
        Ok(())
    }
}
