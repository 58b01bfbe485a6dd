//! Group number allocation.
//!
//! Group numbers are positive, strictly increasing and never reused. One
//! reservation is made per scheduling call and covers every batch of that
//! call, so a call's groups form a contiguous run.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::candidate::Candidate;
use crate::error::ScheduleError;
use crate::store::CandidateStore;

/// `1 + max(group_number)`, or 1 when no candidate has a group.
///
/// `None` once `u32::MAX` is taken.
pub fn next_group_number<'a>(
    candidates: impl IntoIterator<Item = &'a Candidate>,
) -> Option<u32> {
    candidates
        .into_iter()
        .filter_map(|c| c.group_number)
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

fn exhausted() -> ScheduleError {
    ScheduleError::InvalidInput("group number space exhausted".to_string())
}

pub trait GroupNumberAllocator {
    /// Reserve `count` consecutive group numbers and return the first.
    fn reserve(&self, count: u32) -> Result<u32, ScheduleError>;
}

/// Reads the current maximum from the store on every reservation.
///
/// Two calls racing on the same store can observe the same maximum and hand
/// out overlapping numbers. Use `MonotonicAllocator` when calls may overlap.
pub struct ScanAllocator<'a, S: CandidateStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CandidateStore + ?Sized> ScanAllocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: CandidateStore + ?Sized> GroupNumberAllocator for ScanAllocator<'_, S> {
    fn reserve(&self, count: u32) -> Result<u32, ScheduleError> {
        let all = self.store.find_all()?;
        let first = next_group_number(&all).ok_or_else(exhausted)?;
        first.checked_add(count).ok_or_else(exhausted)?;
        Ok(first)
    }
}

/// Process-wide counter seeded from the store once.
///
/// Reservations are a single atomic update, so concurrent calls in one process
/// never overlap. A reservation that would run past `u32::MAX` fails and
/// leaves the counter untouched. Writers in other processes are not seen
/// after seeding.
#[derive(Debug)]
pub struct MonotonicAllocator {
    next: AtomicU32,
}

impl MonotonicAllocator {
    pub fn starting_at(next: u32) -> Self {
        Self {
            next: AtomicU32::new(next.max(1)),
        }
    }

    pub fn seeded_from<S: CandidateStore + ?Sized>(store: &S) -> Result<Self, ScheduleError> {
        let all = store.find_all()?;
        let next = next_group_number(&all).ok_or_else(exhausted)?;
        Ok(Self::starting_at(next))
    }

    /// Make sure future reservations start above `group`.
    pub fn observe(&self, group: u32) {
        self.next.fetch_max(group.saturating_add(1), Ordering::SeqCst);
    }

    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::SeqCst)
    }
}

impl GroupNumberAllocator for MonotonicAllocator {
    fn reserve(&self, count: u32) -> Result<u32, ScheduleError> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                next.checked_add(count)
            })
            .map_err(|_| exhausted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    #[test]
    fn next_group_number_defaults_to_one() {
        let none: Vec<Candidate> = vec![Candidate::new("c1", "A", "a@x.com")];
        assert_eq!(next_group_number(&none), Some(1));

        let some = vec![
            Candidate::new("c1", "A", "a@x.com").with_group(4),
            Candidate::new("c2", "B", "b@x.com").with_group(9),
            Candidate::new("c3", "C", "c@x.com"),
        ];
        assert_eq!(next_group_number(&some), Some(10));
    }

    #[test]
    fn next_group_number_is_none_at_the_top() {
        let top = vec![Candidate::new("c1", "A", "a@x.com").with_group(u32::MAX)];
        assert_eq!(next_group_number(&top), None);

        let store = InMemoryStore::from_candidates(top).unwrap();
        assert!(matches!(
            ScanAllocator::new(&store).reserve(1),
            Err(ScheduleError::InvalidInput(_))
        ));
        assert!(matches!(
            MonotonicAllocator::seeded_from(&store),
            Err(ScheduleError::InvalidInput(_))
        ));
    }

    #[test]
    fn failed_reservation_leaves_counter_untouched() {
        let alloc = MonotonicAllocator::starting_at(u32::MAX - 1);
        assert!(matches!(alloc.reserve(5), Err(ScheduleError::InvalidInput(_))));
        assert_eq!(alloc.peek(), u32::MAX - 1);
        // A retry must not be handed a number below the failed start.
        assert!(alloc.reserve(5).is_err());
        assert_eq!(alloc.reserve(1).unwrap(), u32::MAX - 1);
        assert_eq!(alloc.peek(), u32::MAX);
        assert!(alloc.reserve(1).is_err());
        assert_eq!(alloc.peek(), u32::MAX);
    }

    #[test]
    fn scan_allocator_reads_store_max() {
        let store = InMemoryStore::from_candidates([
            Candidate::new("c1", "A", "a@x.com").with_group(2),
            Candidate::new("c2", "B", "b@x.com").with_group(7),
        ])
        .unwrap();
        let alloc = ScanAllocator::new(&store);
        assert_eq!(alloc.reserve(3).unwrap(), 8);
    }

    #[test]
    fn monotonic_reservations_are_contiguous_and_disjoint() {
        let store =
            InMemoryStore::from_candidates([Candidate::new("c1", "A", "a@x.com").with_group(5)])
                .unwrap();
        let alloc = MonotonicAllocator::seeded_from(&store).unwrap();
        assert_eq!(alloc.reserve(3).unwrap(), 6);
        assert_eq!(alloc.reserve(2).unwrap(), 9);
        assert_eq!(alloc.peek(), 11);

        alloc.observe(20);
        assert_eq!(alloc.reserve(1).unwrap(), 21);
        alloc.observe(3);
        assert_eq!(alloc.peek(), 22);
    }

    #[test]
    fn monotonic_reservations_do_not_overlap_across_threads() {
        let alloc = Arc::new(MonotonicAllocator::starting_at(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let a = Arc::clone(&alloc);
                std::thread::spawn(move || a.reserve(4).unwrap())
            })
            .collect();
        let mut firsts: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        firsts.sort_unstable();
        for pair in firsts.windows(2) {
            assert!(pair[1] - pair[0] >= 4);
        }
        assert_eq!(alloc.peek(), 33);
    }
}
