//! Track allocation statistics of a list's allocator.

use super::{AllocError, Allocator, Global, ListAllocator};
use std::alloc::Layout;
use std::cell::Cell;
use std::fmt;
use std::ptr::{self, NonNull};
use std::rc::Rc;

/// Allocation statistics recorded by [`Counting`].
///
/// # Example
///
/// ```
/// use sentinel_list::alloc::Counting;
/// use sentinel_list::List;
///
/// let alloc = Counting::new();
/// let list = List::from_iter_in([1, 2, 3], alloc.clone());
/// // one block for the ghost node, one per element
/// assert_eq!(alloc.counters().allocation_count, 4);
///
/// drop(list);
/// assert_eq!(alloc.counters().allocation_count, 0);
/// eprintln!("{}", alloc.counters());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Counters {
    /// Number of active allocations.
    pub allocation_count: usize,
    /// Total number of allocations.
    pub total_allocation_count: u64,

    /// Sum of active allocations' layouts' size.
    pub allocated_bytes: usize,
    /// Sum of all allocations' layouts' size.
    pub total_allocated_bytes: u64,

    /// Number of allocation requests that were refused.
    pub failed_allocation_count: u64,

    /// Number of values successfully constructed in place.
    pub total_construct_count: u64,
    /// Number of values destroyed in place.
    ///
    /// Values moved out of a list by a pop are not destroyed in place and are
    /// not counted, so this can stay below `total_construct_count`.
    pub total_destroy_count: u64,
}

impl Counters {
    /// Returns the total number of allocations that have been freed.
    #[inline]
    pub const fn total_freed_count(&self) -> u64 {
        self.total_allocation_count - self.allocation_count as u64
    }

    /// Returns the total number of allocated bytes that have been freed.
    #[inline]
    pub const fn total_freed_bytes(&self) -> u64 {
        self.total_allocated_bytes - self.allocated_bytes as u64
    }

    #[inline]
    fn account_alloc(&mut self, size: usize) {
        self.allocation_count += 1;
        self.allocated_bytes += size;

        self.total_allocation_count += 1;
        self.total_allocated_bytes += size as u64;
    }

    #[inline]
    fn account_dealloc(&mut self, size: usize) {
        self.allocation_count -= 1;
        self.allocated_bytes -= size;
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"Stat                 | Current Total       | Accumulative Total
---------------------|---------------------|--------------------
# of Allocations     | {:>19} | {:>19}
# of Allocated Bytes | {:>19} | {:>19}
# of Failed Allocs   |                 N/A | {:>19}
# of Constructions   |                 N/A | {:>19}
# of Destructions    |                 N/A | {:>19}"#,
            self.allocation_count,
            self.total_allocation_count,
            self.allocated_bytes,
            self.total_allocated_bytes,
            self.failed_allocation_count,
            self.total_construct_count,
            self.total_destroy_count,
        )
    }
}

#[derive(Debug, Default)]
struct State {
    counters: Cell<Counters>,
    /// Number of allocations still granted before refusing, if limited.
    budget: Cell<Option<usize>>,
}

impl State {
    fn update(&self, f: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.get();
        f(&mut counters);
        self.counters.set(counters);
    }

    /// Consume one unit of the allocation budget, if there is one.
    fn admit(&self) -> bool {
        match self.budget.get() {
            Some(0) => false,
            Some(n) => {
                self.budget.set(Some(n - 1));
                true
            }
            None => true,
        }
    }
}

/// An allocator that records [`Counters`] for another allocator.
///
/// Clones share their statistics, so a clone handed to a [`List`] can be
/// inspected through the original. It can also be told to refuse
/// allocations, to drive a list through its failure paths.
///
/// [`List`]: crate::List
///
/// # Example
///
/// ```
/// use sentinel_list::alloc::Counting;
/// use sentinel_list::List;
///
/// let alloc = Counting::new();
/// let mut list = List::from_iter_in([1, 2], alloc.clone());
///
/// alloc.fail_after(0);
/// assert!(list.try_push_back(3).is_err());
/// assert_eq!(list.len(), 2);
/// assert_eq!(alloc.counters().failed_allocation_count, 1);
///
/// alloc.clear_failure();
/// assert!(list.try_push_back(3).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Counting<A = Global> {
    inner: A,
    state: Rc<State>,
}

impl Counting {
    /// Count allocations of the [`Global`] allocator.
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl Default for Counting {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Counting<A> {
    /// Count allocations of `inner`.
    pub fn new_in(inner: A) -> Self {
        Self { inner, state: Rc::default() }
    }

    /// Returns a snapshot of the statistics shared by this allocator and its clones.
    pub fn counters(&self) -> Counters {
        self.state.counters.get()
    }

    /// Grant `count` more allocations, then refuse every following one.
    pub fn fail_after(&self, count: usize) {
        self.state.budget.set(Some(count));
    }

    /// Stop refusing allocations.
    pub fn clear_failure(&self) {
        self.state.budget.set(None);
    }

    /// Returns `true` if `other` shares its statistics with `self`.
    pub fn shares_counters_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

unsafe impl<A: Allocator> Allocator for Counting<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if !self.state.admit() {
            self.state.update(|c| c.failed_allocation_count += 1);
            return Err(AllocError);
        }
        let block = self.inner.allocate(layout).map_err(|err| {
            self.state.update(|c| c.failed_allocation_count += 1);
            err
        })?;
        self.state.update(|c| c.account_alloc(layout.size()));
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.inner.deallocate(ptr, layout);
        self.state.update(|c| c.account_dealloc(layout.size()));
    }
}

unsafe impl<A: Allocator + Clone> ListAllocator for Counting<A> {
    unsafe fn construct<U, E, F>(&self, slot: NonNull<U>, init: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<U, E>,
    {
        slot.as_ptr().write(init()?);
        self.state.update(|c| c.total_construct_count += 1);
        Ok(())
    }

    unsafe fn destroy<U>(&self, value: NonNull<U>) {
        self.state.update(|c| c.total_destroy_count += 1);
        ptr::drop_in_place(value.as_ptr());
    }
}

#[cfg(test)]
mod tests {
    use super::Counting;
    use crate::alloc::Allocator;
    use std::alloc::Layout;

    #[test]
    fn counting_shares_state_between_clones() {
        let alloc = Counting::new();
        let clone = alloc.clone();
        assert!(alloc.shares_counters_with(&clone));
        assert!(!alloc.shares_counters_with(&Counting::new()));

        let layout = Layout::new::<[u32; 4]>();
        let block = clone.allocate(layout).unwrap();
        assert_eq!(alloc.counters().allocation_count, 1);
        assert_eq!(alloc.counters().allocated_bytes, 16);

        unsafe { alloc.deallocate(block.cast(), layout) };
        let counters = clone.counters();
        assert_eq!(counters.allocation_count, 0);
        assert_eq!(counters.total_freed_count(), 1);
        assert_eq!(counters.total_freed_bytes(), 16);
    }

    #[test]
    fn counting_refuses_past_budget() {
        let alloc = Counting::new();
        let layout = Layout::new::<u64>();
        alloc.fail_after(2);
        let a = alloc.allocate(layout).unwrap();
        let b = alloc.allocate(layout).unwrap();
        assert!(alloc.allocate(layout).is_err());
        assert!(alloc.allocate(layout).is_err());
        assert_eq!(alloc.counters().failed_allocation_count, 2);
        assert_eq!(alloc.counters().allocation_count, 2);

        alloc.clear_failure();
        let c = alloc.allocate(layout).unwrap();
        unsafe {
            alloc.deallocate(a.cast(), layout);
            alloc.deallocate(b.cast(), layout);
            alloc.deallocate(c.cast(), layout);
        }
        assert_eq!(alloc.counters().allocation_count, 0);
        assert_eq!(alloc.counters().total_allocation_count, 3);
    }

    #[test]
    fn counters_display() {
        let alloc = Counting::new();
        let text = alloc.counters().to_string();
        assert!(text.contains("# of Allocations"));
        assert!(text.contains("# of Failed Allocs"));
    }
}
