//! Allocation strategies for [`List`](crate::List).
//!
//! A [`List`](crate::List) never touches memory on its own. Every node is
//! obtained from, constructed by, destroyed by and returned to the
//! [`ListAllocator`] the list was created with.

use std::alloc::Layout;
use std::ptr::{self, NonNull};

#[doc(no_inline)]
pub use allocator_api2::alloc::{AllocError, Allocator, Global};

pub use self::counting::{Counters, Counting};

mod counting;

/// An allocation strategy for list nodes.
///
/// On top of raw memory management (inherited from [`Allocator`]), the
/// strategy decides how elements are constructed and destroyed in that
/// memory, and how the allocator instance travels when a list is copied.
///
/// Clones of a strategy must behave like the same allocator: memory
/// allocated through one clone may be released through another.
///
/// # Safety
///
/// A list trusts its strategy with the state of every node:
/// - when [`construct`](ListAllocator::construct) returns `Ok`, `slot` must
///   hold the value produced by `init`; when it returns `Err` (or unwinds),
///   `slot` must hold no value;
/// - [`destroy`](ListAllocator::destroy) must drop the value exactly once
///   and leave the storage allocated;
/// - the [`Allocator`] contract must hold across clones, including the one
///   returned by [`select_on_copy_construction`](ListAllocator::select_on_copy_construction)
///   for the memory it allocates itself.
///
/// A strategy cannot be implemented without `unsafe`:
///
/// ```compile_fail
/// use sentinel_list::alloc::{AllocError, Allocator, Global, ListAllocator};
/// use std::alloc::Layout;
/// use std::ptr::NonNull;
///
/// #[derive(Clone)]
/// struct Lazy(Global);
///
/// unsafe impl Allocator for Lazy {
///     fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
///         self.0.allocate(layout)
///     }
///     unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
///         self.0.deallocate(ptr, layout)
///     }
/// }
///
/// // never writes the slot
/// impl ListAllocator for Lazy {
///     unsafe fn construct<U, E, F>(&self, _: NonNull<U>, _: F) -> Result<(), E>
///     where
///         F: FnOnce() -> Result<U, E>,
///     {
///         Ok(())
///     }
/// }
/// ```
///
/// # Examples
///
/// A strategy that makes copy-assignment adopt the source list's allocator:
///
/// ```
/// use sentinel_list::alloc::{AllocError, Allocator, Global, ListAllocator};
/// use sentinel_list::List;
/// use std::alloc::Layout;
/// use std::ptr::NonNull;
///
/// #[derive(Clone, Default)]
/// struct Adopted(Global);
///
/// unsafe impl Allocator for Adopted {
///     fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
///         self.0.allocate(layout)
///     }
///     unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
///         self.0.deallocate(ptr, layout)
///     }
/// }
///
/// unsafe impl ListAllocator for Adopted {
///     const PROPAGATE_ON_COPY_ASSIGNMENT: bool = true;
/// }
///
/// let source = List::from_iter_in([1, 2, 3], Adopted::default());
/// let mut target = List::new_in(Adopted::default());
/// target.clone_from(&source);
/// assert_eq!(target, source);
/// ```
pub unsafe trait ListAllocator: Allocator + Clone {
    /// Whether a list being copy-assigned adopts the source's allocator.
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;

    /// Returns the allocator a copy of a list using `self` should use.
    fn select_on_copy_construction(&self) -> Self {
        self.clone()
    }

    /// Initialize `slot` with the value produced by `init`.
    ///
    /// On failure `slot` is left uninitialized, and still allocated.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and properly aligned for `U`.
    unsafe fn construct<U, E, F>(&self, slot: NonNull<U>, init: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<U, E>,
    {
        slot.as_ptr().write(init()?);
        Ok(())
    }

    /// Run the teardown of the value at `value` without releasing its storage.
    ///
    /// Values moved out of a list (by `pop_front`, `pop_back` or its owning
    /// iterator) are handed to the caller, so `destroy` is not called for them.
    ///
    /// # Safety
    ///
    /// `value` must point to an initialized `U` which is not used afterwards.
    unsafe fn destroy<U>(&self, value: NonNull<U>) {
        ptr::drop_in_place(value.as_ptr());
    }
}

unsafe impl ListAllocator for Global {}

/// A borrowed allocator is shared by every list holding it, so copies
/// keep it and assignments adopt it.
unsafe impl<A: Allocator + ?Sized> ListAllocator for &A {
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = true;
}

/// Reserve storage for `count` values of `U`.
pub(crate) fn allocate<U, A: Allocator>(alloc: &A, count: usize) -> Result<NonNull<U>, AllocError> {
    let layout = Layout::array::<U>(count).map_err(|_| AllocError)?;
    Ok(alloc.allocate(layout)?.cast())
}

/// Release storage obtained from [`allocate`] with the same `count`.
///
/// # Safety
///
/// `ptr` must come from `allocate::<U>(alloc, count)` with an allocator
/// equivalent to `alloc`, and must not be used afterwards.
pub(crate) unsafe fn deallocate<U, A: Allocator>(alloc: &A, ptr: NonNull<U>, count: usize) {
    // The layout was valid when the storage was allocated.
    let layout = Layout::from_size_align_unchecked(
        std::mem::size_of::<U>() * count,
        std::mem::align_of::<U>(),
    );
    alloc.deallocate(ptr.cast(), layout);
}
