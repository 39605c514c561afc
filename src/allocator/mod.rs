//! Recyclable numeric ids for string-keyed sessions.
//!
//! Callers that only know an opaque string (a peer address, a stream URL)
//! get a [`RateKey`] back. Repeated acquires of the same string share the
//! group and bump `sub`, the number of extra concurrent users. Releasing
//! the last user retires the binding instead of removing it, and the next
//! acquire of that string revives it with the same group.
//!
//! Bindings are never deleted, so memory grows with the number of
//! distinct strings ever seen.

use crate::core::RateKey;
use parking_lot::Mutex;
use std::collections::HashMap;

/// State of one string's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub key: RateKey,
    pub retired: bool,
}

#[derive(Debug)]
struct AllocatorState {
    by_name: HashMap<String, Binding>,
    /// `(owner, group)` back to the string that owns it
    by_group: HashMap<(u64, u64), String>,
    next_group: u64,
}

/// Hands out `(owner, group, sub)` triples for string keys.
#[derive(Debug)]
pub struct IdentifierAllocator {
    state: Mutex<AllocatorState>,
}

impl IdentifierAllocator {
    /// Group ids start at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Allocator whose first group id is `first_group`.
    pub fn starting_at(first_group: u64) -> Self {
        Self {
            state: Mutex::new(AllocatorState {
                by_name: HashMap::new(),
                by_group: HashMap::new(),
                next_group: first_group,
            }),
        }
    }

    /// Id for `name`.
    ///
    /// - unknown string: new group, `sub = 0`
    /// - active binding: same group, `sub + 1`
    /// - retired binding: same group, `sub` reset to 0
    pub fn acquire(&self, name: &str) -> RateKey {
        let mut state = self.state.lock();

        if let Some(binding) = state.by_name.get_mut(name) {
            if binding.retired {
                binding.retired = false;
                binding.key.sub = 0;
            } else {
                binding.key.sub += 1;
            }
            return binding.key;
        }

        let key = RateKey::new(0, state.next_group, 0);
        state.next_group += 1;
        state.by_group.insert((key.owner, key.group), name.to_string());
        state.by_name.insert(
            name.to_string(),
            Binding {
                key,
                retired: false,
            },
        );
        tracing::debug!(name, %key, "Allocated stream id");
        key
    }

    /// Give back one use of the binding owning `key`'s `(owner, group)`.
    ///
    /// `key.sub` is ignored; unknown ids are silently accepted.
    pub fn release(&self, key: RateKey) {
        let mut state = self.state.lock();
        let AllocatorState {
            by_name, by_group, ..
        } = &mut *state;

        let Some(binding) = by_group
            .get(&(key.owner, key.group))
            .and_then(|name| by_name.get_mut(name))
        else {
            return;
        };

        if binding.key.sub > 0 {
            binding.key.sub -= 1;
        } else {
            binding.retired = true;
        }
    }

    /// Current binding for `name`, if it was ever acquired.
    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.state.lock().by_name.get(name).copied()
    }

    /// Number of bindings, retired ones included.
    pub fn len(&self) -> usize {
        self.state.lock().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().by_name.is_empty()
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new()
    }
}
