//! refs::instructor
//!
//! Per-reference decisions during a walk, and the pagination decorator.

use crate::core::types::ObjectType;

use super::{ReferenceField, WalkEntry, WalkError};

/// What the walk should do with the current reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkInstruction {
    /// Pass the reference to the handler.
    Handle,
    /// Drop it and keep walking.
    Skip,
    /// End the walk without handling it.
    Stop,
}

/// Decides, reference by reference, how a walk proceeds.
///
/// Closures of type `FnMut(&WalkEntry) -> WalkInstruction` are instructors.
pub trait Instructor {
    fn instruct(&mut self, entry: &WalkEntry) -> WalkInstruction;
}

impl<F> Instructor for F
where
    F: FnMut(&WalkEntry) -> WalkInstruction,
{
    fn instruct(&mut self, entry: &WalkEntry) -> WalkInstruction {
        self(entry)
    }
}

/// Handles every reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleAll;

impl Instructor for HandleAll {
    fn instruct(&mut self, _entry: &WalkEntry) -> WalkInstruction {
        WalkInstruction::Handle
    }
}

/// Handles references whose target is of one object type, skips the rest.
///
/// Requires [`ReferenceField::ObjectType`] in the walk's fields; entries
/// without it are skipped.
#[derive(Debug, Clone, Copy)]
pub struct ObjectTypeFilter(pub ObjectType);

impl Instructor for ObjectTypeFilter {
    fn instruct(&mut self, entry: &WalkEntry) -> WalkInstruction {
        match entry
            .get(ReferenceField::ObjectType)
            .and_then(|t| t.parse::<ObjectType>().ok())
        {
            Some(t) if t == self.0 => WalkInstruction::Handle,
            _ => WalkInstruction::Skip,
        }
    }
}

/// Wraps an instructor to return one page of what it would handle.
///
/// Only references the inner instructor handles are counted. Those before
/// the page are skipped, the walk stops at the first one after it.
///
/// # Example
///
/// ```
/// use gitweave::refs::{HandleAll, Instructor, Paginated, WalkEntry, WalkInstruction};
///
/// let mut pager = Paginated::new(HandleAll, 2, 3).unwrap();
/// let entry = WalkEntry::default();
/// let decisions: Vec<_> = (0..7).map(|_| pager.instruct(&entry)).collect();
/// assert_eq!(decisions[..3], [WalkInstruction::Skip; 3]);
/// assert_eq!(decisions[3..6], [WalkInstruction::Handle; 3]);
/// assert_eq!(decisions[6], WalkInstruction::Stop);
/// ```
#[derive(Debug, Clone)]
pub struct Paginated<I> {
    inner: I,
    /// `(start_after, end_after)`; `None` passes everything through.
    bounds: Option<(usize, usize)>,
    count: usize,
}

impl<I: Instructor> Paginated<I> {
    /// Paginate `inner`. Pages start at 1; page 0 is treated as 1. A
    /// `page_size` of 0 disables pagination.
    ///
    /// # Errors
    ///
    /// [`WalkError::InvalidPagination`] if the page bounds overflow.
    pub fn new(inner: I, page: usize, page_size: usize) -> Result<Self, WalkError> {
        if page_size == 0 {
            return Ok(Self {
                inner,
                bounds: None,
                count: 0,
            });
        }
        let page = page.max(1);
        let overflow = || WalkError::InvalidPagination(format!(
            "page {page} of size {page_size} is out of range"
        ));
        let start_after = (page - 1).checked_mul(page_size).ok_or_else(overflow)?;
        let end_after = page.checked_mul(page_size).ok_or_else(overflow)?;
        Ok(Self {
            inner,
            bounds: Some((start_after, end_after)),
            count: 0,
        })
    }

    /// Furthest a walk needs to go to fill this page, `0` for unbounded.
    ///
    /// Only a tight bound when the inner instructor handles every reference.
    pub fn max_walk_distance(&self) -> usize {
        self.bounds.map_or(0, |(_, end_after)| end_after)
    }

    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I: Instructor> Instructor for Paginated<I> {
    fn instruct(&mut self, entry: &WalkEntry) -> WalkInstruction {
        let decision = self.inner.instruct(entry);
        let Some((start_after, end_after)) = self.bounds else {
            return decision;
        };
        if decision != WalkInstruction::Handle {
            return decision;
        }
        self.count += 1;
        if self.count <= start_after {
            WalkInstruction::Skip
        } else if self.count > end_after {
            WalkInstruction::Stop
        } else {
            WalkInstruction::Handle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_of_type(t: &str) -> WalkEntry {
        let mut entry = WalkEntry::default();
        entry.insert(ReferenceField::ObjectType, t.to_string());
        entry
    }

    #[test]
    fn handle_all() {
        assert_eq!(
            HandleAll.instruct(&WalkEntry::default()),
            WalkInstruction::Handle
        );
    }

    #[test]
    fn closures_are_instructors() {
        let mut seen = 0;
        let mut stop_after_two = |_: &WalkEntry| {
            seen += 1;
            if seen > 2 {
                WalkInstruction::Stop
            } else {
                WalkInstruction::Handle
            }
        };
        let entry = WalkEntry::default();
        assert_eq!(stop_after_two.instruct(&entry), WalkInstruction::Handle);
        assert_eq!(stop_after_two.instruct(&entry), WalkInstruction::Handle);
        assert_eq!(stop_after_two.instruct(&entry), WalkInstruction::Stop);
    }

    #[test]
    fn object_type_filter() {
        let mut filter = ObjectTypeFilter(ObjectType::Tag);
        assert_eq!(filter.instruct(&entry_of_type("tag")), WalkInstruction::Handle);
        assert_eq!(filter.instruct(&entry_of_type("commit")), WalkInstruction::Skip);
        assert_eq!(filter.instruct(&WalkEntry::default()), WalkInstruction::Skip);
    }

    mod pagination {
        use super::*;

        #[test]
        fn zero_page_size_passes_through() {
            let mut pager = Paginated::new(HandleAll, 3, 0).unwrap();
            assert_eq!(pager.max_walk_distance(), 0);
            for _ in 0..100 {
                assert_eq!(
                    pager.instruct(&WalkEntry::default()),
                    WalkInstruction::Handle
                );
            }
        }

        #[test]
        fn page_zero_is_first_page() {
            let mut pager = Paginated::new(HandleAll, 0, 2).unwrap();
            assert_eq!(pager.max_walk_distance(), 2);
            let entry = WalkEntry::default();
            assert_eq!(pager.instruct(&entry), WalkInstruction::Handle);
            assert_eq!(pager.instruct(&entry), WalkInstruction::Handle);
            assert_eq!(pager.instruct(&entry), WalkInstruction::Stop);
        }

        #[test]
        fn overflow_rejected() {
            let err = Paginated::new(HandleAll, usize::MAX, 2).unwrap_err();
            assert!(matches!(err, WalkError::InvalidPagination(_)));
        }

        #[test]
        fn counts_only_inner_handles() {
            // inner skips commits; page 1 of size 1 over [commit, tag, tag]
            let mut pager = Paginated::new(ObjectTypeFilter(ObjectType::Tag), 1, 1).unwrap();
            assert_eq!(pager.instruct(&entry_of_type("commit")), WalkInstruction::Skip);
            assert_eq!(pager.instruct(&entry_of_type("tag")), WalkInstruction::Handle);
            assert_eq!(pager.instruct(&entry_of_type("tag")), WalkInstruction::Stop);
        }

        #[test]
        fn inner_stop_is_respected() {
            let inner = |_: &WalkEntry| WalkInstruction::Stop;
            let mut pager = Paginated::new(inner, 1, 5).unwrap();
            assert_eq!(pager.instruct(&WalkEntry::default()), WalkInstruction::Stop);
        }
    }
}
