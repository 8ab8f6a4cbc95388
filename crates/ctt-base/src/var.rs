//! Identity-based variable handles.
//!
//! Binding in the kernel is resolved by identity, not by name: two variables
//! that print the same way are still distinct unless they are the *same*
//! `VarId`. This is what lets substitution avoid variable capture without
//! ever inspecting names.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A globally unique variable identity.
///
/// `VarId` is deliberately opaque and `Copy`; the only way to make one is
/// [`VarId::fresh`]. Two `VarId`s are equal iff they were produced by the
/// same call to `fresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u64);

impl VarId {
    /// Mints a variable identity that has never been returned before in this
    /// process.
    pub fn fresh() -> Self {
        VarId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_pairwise_distinct() {
        let a = VarId::fresh();
        let b = VarId::fresh();
        assert_ne!(a, b);
    }
}
