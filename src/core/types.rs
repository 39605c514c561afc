//! Identity types shared by the counter table, the reporter and the
//! identifier allocator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of a tracked stream: owner (application), group
/// (channel) and sub (sub-stream).
///
/// Ordering is field-by-field, which gives the report its stable
/// owner-then-group-then-sub layout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RateKey {
    pub owner: u64,
    pub group: u64,
    pub sub: u64,
}

impl RateKey {
    #[inline]
    pub const fn new(owner: u64, group: u64, sub: u64) -> Self {
        Self { owner, group, sub }
    }

    /// Same owner and group, ignoring the sub-stream.
    #[inline]
    pub fn same_group(&self, other: &RateKey) -> bool {
        self.owner == other.owner && self.group == other.group
    }
}

impl From<(u64, u64, u64)> for RateKey {
    fn from((owner, group, sub): (u64, u64, u64)) -> Self {
        Self::new(owner, group, sub)
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}.{:04}.{:04}", self.owner, self.group, self.sub)
    }
}
