//! Building lists: fixed-size, from elements, copies and copy-assignment.
//!
//! Every builder here is all-or-nothing. Nodes are appended one at a time
//! under an [`UnwindGuard`]; if an allocation or an element constructor fails
//! (or panics), the nodes built so far are released from the back to the
//! front before the failure reaches the caller.

use std::alloc::{handle_alloc_error, Layout};
use std::convert::Infallible;
use std::mem;

use crate::alloc::{AllocError, Global, ListAllocator};
use crate::error::Error;
use crate::list::{List, Node};

/// Tears a partially built list down unless it is forgotten.
struct UnwindGuard<'a, T, A: ListAllocator> {
    list: &'a mut List<T, A>,
}

impl<'a, T, A: ListAllocator> Drop for UnwindGuard<'a, T, A> {
    fn drop(&mut self) {
        self.list.unwind();
    }
}

fn infallible<T>(elt: T) -> Result<T, Infallible> {
    Ok(elt)
}

fn node_layout<T>() -> Layout {
    Layout::new::<Node<T>>()
}

impl<T> List<T> {
    /// Create an empty `List` on the [`Global`] allocator.
    ///
    /// # Examples
    /// ```
    /// use sentinel_list::List;
    /// let list: List<u32> = List::new();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Create a `List` of `len` default elements on the [`Global`] allocator.
    ///
    /// # Examples
    /// ```
    /// use sentinel_list::List;
    /// let list: List<u32> = List::with_len(3);
    /// assert_eq!(list, List::from([0, 0, 0]));
    /// ```
    pub fn with_len(len: usize) -> Self
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    /// Create a `List` of `len` clones of `elem` on the [`Global`] allocator.
    ///
    /// # Examples
    /// ```
    /// use sentinel_list::List;
    /// let list = List::from_elem(5, &42);
    /// assert_eq!(list.len(), 5);
    /// assert!(list.iter().all(|&x| x == 42));
    /// ```
    pub fn from_elem(len: usize, elem: &T) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(len, elem, Global)
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: ListAllocator> List<T, A> {
    /// Append one node per item of `items` to a new list on `alloc`, the
    /// element of each being constructed by `f` once its node is allocated.
    fn try_build_in<I, E, F>(alloc: A, items: I, mut f: F) -> Result<Self, Error<E>>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Result<T, E>,
    {
        let mut list = Self::try_new_in(alloc)?;
        let mut guard = UnwindGuard { list: &mut list };
        for item in items {
            guard.list.try_push_back_with(|| f(item))?;
        }
        mem::forget(guard);
        Ok(list)
    }

    /// Create a `List` of `len` elements on `alloc`, the element at `index`
    /// being `f(index)`.
    ///
    /// # Errors
    ///
    /// If an allocation or a call to `f` fails, the elements already built are
    /// destroyed in reverse order, their nodes are released, and the failure is
    /// returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::alloc::Counting;
    /// use sentinel_list::{Error, List};
    ///
    /// let alloc = Counting::new();
    /// let squares = List::try_from_fn_in(4, alloc.clone(), |i| Ok::<_, ()>(i * i));
    /// assert_eq!(squares.unwrap(), List::from([0, 1, 4, 9]));
    ///
    /// let failed = List::try_from_fn_in(4, alloc.clone(), |i| if i < 2 { Ok(i) } else { Err(i) });
    /// assert_eq!(failed.unwrap_err(), Error::Construct(2));
    /// assert_eq!(alloc.counters().allocation_count, 0);
    /// ```
    pub fn try_from_fn_in<E, F>(len: usize, alloc: A, f: F) -> Result<Self, Error<E>>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        Self::try_build_in(alloc, 0..len, f)
    }

    /// Create a `List` of `len` default elements on `alloc`, or return an
    /// error if a node cannot be allocated.
    pub fn try_with_len_in(len: usize, alloc: A) -> Result<Self, AllocError>
    where
        T: Default,
    {
        Self::try_from_fn_in(len, alloc, |_| infallible(T::default())).map_err(Error::into_alloc_error)
    }

    /// Create a `List` of `len` default elements on `alloc`.
    pub fn with_len_in(len: usize, alloc: A) -> Self
    where
        T: Default,
    {
        match Self::try_with_len_in(len, alloc) {
            Ok(list) => list,
            Err(_) => handle_alloc_error(node_layout::<T>()),
        }
    }

    /// Create a `List` of `len` clones of `elem` on `alloc`, or return an
    /// error if a node cannot be allocated.
    pub fn try_from_elem_in(len: usize, elem: &T, alloc: A) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        Self::try_from_fn_in(len, alloc, |_| infallible(elem.clone())).map_err(Error::into_alloc_error)
    }

    /// Create a `List` of `len` clones of `elem` on `alloc`.
    pub fn from_elem_in(len: usize, elem: &T, alloc: A) -> Self
    where
        T: Clone,
    {
        match Self::try_from_elem_in(len, elem, alloc) {
            Ok(list) => list,
            Err(_) => handle_alloc_error(node_layout::<T>()),
        }
    }

    /// Create a `List` holding the items of `iter` in order on `alloc`, or
    /// return an error if a node cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::alloc::Counting;
    /// use sentinel_list::List;
    ///
    /// let alloc = Counting::new();
    /// alloc.fail_after(3);
    /// assert!(List::try_from_iter_in([1, 2, 3, 4], alloc.clone()).is_err());
    /// assert_eq!(alloc.counters().allocation_count, 0);
    /// ```
    pub fn try_from_iter_in<I>(iter: I, alloc: A) -> Result<Self, AllocError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::try_build_in(alloc, iter, infallible).map_err(Error::into_alloc_error)
    }

    /// Create a `List` holding the items of `iter` in order on `alloc`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::alloc::Global;
    /// use sentinel_list::List;
    ///
    /// let list = List::from_iter_in(1..=3, Global);
    /// assert_eq!(list, List::from([1, 2, 3]));
    /// ```
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        match Self::try_from_iter_in(iter, alloc) {
            Ok(list) => list,
            Err(_) => handle_alloc_error(node_layout::<T>()),
        }
    }

    /// Returns an independent copy of the list, or an error if a node cannot
    /// be allocated.
    ///
    /// The copy uses the allocator chosen by
    /// [`ListAllocator::select_on_copy_construction`].
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        T: Clone,
    {
        self.try_clone_with(|elt| infallible(elt.clone())).map_err(Error::into_alloc_error)
    }

    /// Returns an independent copy of the list, each element being copied by `f`.
    ///
    /// # Errors
    ///
    /// If an allocation or a call to `f` fails, the partial copy is torn down
    /// before the failure is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::{Error, List};
    ///
    /// let list = List::from([1, 2, 3]);
    /// let doubled = list.try_clone_with(|x| Ok::<_, ()>(x * 2));
    /// assert_eq!(doubled.unwrap(), List::from([2, 4, 6]));
    ///
    /// let failed = list.try_clone_with(|&x| if x < 3 { Ok(x) } else { Err("too big") });
    /// assert_eq!(failed.unwrap_err(), Error::Construct("too big"));
    /// ```
    pub fn try_clone_with<E, F>(&self, f: F) -> Result<Self, Error<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        Self::try_build_in(self.alloc.select_on_copy_construction(), self.iter(), f)
    }

    /// Replace the contents of the list with a copy of `source`, or return an
    /// error if a node cannot be allocated. The list is unchanged on error.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), AllocError>
    where
        T: Clone,
    {
        self.try_clone_from_with(source, |elt| infallible(elt.clone()))
            .map_err(Error::into_alloc_error)
    }

    /// Replace the contents of the list with a copy of `source`, each element
    /// being copied by `f`.
    ///
    /// The new contents are built first, on the allocator of `source` if
    /// [`ListAllocator::PROPAGATE_ON_COPY_ASSIGNMENT`] holds, on the allocator
    /// of `self` otherwise. The old nodes are then released by the allocator
    /// that created them.
    ///
    /// # Errors
    ///
    /// If an allocation or a call to `f` fails, everything built for the new
    /// contents is torn down, and the list keeps its original contents and
    /// allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::{Error, List};
    ///
    /// let mut list = List::from([7, 8]);
    /// let source = List::from([1, 2, 3]);
    ///
    /// let failed = list.try_clone_from_with(&source, |&x| if x < 3 { Ok(x) } else { Err(x) });
    /// assert_eq!(failed, Err(Error::Construct(3)));
    /// assert_eq!(list, List::from([7, 8]));
    ///
    /// assert_eq!(list.try_clone_from_with(&source, |&x| Ok::<_, ()>(x)), Ok(()));
    /// assert_eq!(list, source);
    /// ```
    pub fn try_clone_from_with<E, F>(&mut self, source: &Self, f: F) -> Result<(), Error<E>>
    where
        F: FnMut(&T) -> Result<T, E>,
    {
        let alloc = if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            source.alloc.clone()
        } else {
            self.alloc.clone()
        };
        let mut fresh = Self::try_build_in(alloc, source.iter(), f)?;
        if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            mem::swap(self, &mut fresh);
        } else {
            self.swap_nodes(&mut fresh);
        }
        // `fresh` now holds the old nodes, along with the allocator that
        // created them.
        drop(fresh);
        Ok(())
    }
}

impl<T, const N: usize> From<[T; N]> for List<T> {
    /// Converts a `[T; N]` into a `List<T>`.
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let list1 = List::from([1, 2, 3, 4]);
    /// let list2: List<_> = [1, 2, 3, 4].into();
    /// assert_eq!(list1, list2);
    /// ```
    fn from(arr: [T; N]) -> Self {
        Self::from_iter_in(arr, Global)
    }
}

#[cfg(test)]
mod tests {
    use crate::alloc::{AllocError, Allocator, Counting, Global, ListAllocator};
    use crate::error::Error;
    use crate::list::List;
    use std::alloc::Layout;
    use std::cell::RefCell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::ptr::NonNull;

    /// Records the order in which elements are dropped.
    #[derive(Debug)]
    struct Tracked<'a> {
        value: i32,
        dropped: &'a RefCell<Vec<i32>>,
    }

    impl<'a> Drop for Tracked<'a> {
        fn drop(&mut self) {
            self.dropped.borrow_mut().push(self.value);
        }
    }

    /// Panics when the clone counter runs out.
    #[derive(Debug, PartialEq)]
    struct Brittle<'a> {
        value: i32,
        budget: &'a RefCell<usize>,
    }

    impl<'a> Clone for Brittle<'a> {
        fn clone(&self) -> Self {
            let mut budget = self.budget.borrow_mut();
            if *budget == 0 {
                panic!("clone budget exhausted");
            }
            *budget -= 1;
            Self {
                value: self.value,
                budget: self.budget,
            }
        }
    }

    /// A counting strategy that makes copy-assignment adopt the source's allocator.
    #[derive(Clone, Default)]
    struct Adopted(Counting);

    unsafe impl Allocator for Adopted {
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            self.0.allocate(layout)
        }
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.0.deallocate(ptr, layout)
        }
    }

    unsafe impl ListAllocator for Adopted {
        const PROPAGATE_ON_COPY_ASSIGNMENT: bool = true;
    }

    /// A counting strategy whose copies start with fresh statistics.
    #[derive(Clone, Default)]
    struct Fresh(Counting);

    unsafe impl Allocator for Fresh {
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            self.0.allocate(layout)
        }
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.0.deallocate(ptr, layout)
        }
    }

    unsafe impl ListAllocator for Fresh {
        fn select_on_copy_construction(&self) -> Self {
            Fresh::default()
        }
    }

    #[test]
    fn list_from_literal() {
        let list = List::from([1, 2, 3]);
        assert_eq!(list.len(), 3);
        assert!(list.iter().eq(&[1, 2, 3]));
        assert!(list.iter().rev().eq(&[3, 2, 1]));
    }

    #[test]
    fn list_fixed_size() {
        let list = List::from_elem(5, &42);
        assert_eq!(list.len(), 5);
        assert!(list.iter().all(|&x| x == 42));

        let list: List<String> = List::with_len(3);
        assert_eq!(list.len(), 3);
        assert!(list.iter().all(String::is_empty));

        let empty = List::from_elem(0, &1);
        assert!(empty.is_empty());
    }

    #[test]
    fn list_fixed_size_failure_unwinds_in_reverse() {
        let alloc = Counting::new();
        let dropped = RefCell::new(Vec::new());

        let res = List::try_from_fn_in(6, alloc.clone(), |i| {
            if i < 4 {
                Ok(Tracked { value: i as i32, dropped: &dropped })
            } else {
                Err(i)
            }
        });
        assert_eq!(res.unwrap_err(), Error::Construct(4));
        assert_eq!(dropped.borrow().as_slice(), &[3, 2, 1, 0]);

        let counters = alloc.counters();
        assert_eq!(counters.allocation_count, 0);
        assert_eq!(counters.total_construct_count, 4);
        assert_eq!(counters.total_destroy_count, 4);
    }

    #[test]
    fn list_fixed_size_alloc_failure_leaks_nothing() {
        let alloc = Counting::new();
        // the ghost and two nodes
        alloc.fail_after(3);
        assert_eq!(List::try_from_elem_in(5, &7, alloc.clone()).unwrap_err(), AllocError);
        assert_eq!(alloc.counters().allocation_count, 0);
        assert_eq!(alloc.counters().failed_allocation_count, 1);

        alloc.fail_after(0);
        assert!(List::<u8, _>::try_with_len_in(5, alloc.clone()).is_err());
        assert_eq!(alloc.counters().allocation_count, 0);
    }

    #[test]
    fn list_fixed_size_panic_leaks_nothing() {
        let alloc = Counting::new();
        let budget = RefCell::new(2);
        let elem = Brittle { value: 1, budget: &budget };

        let res = catch_unwind(AssertUnwindSafe(|| {
            List::from_elem_in(4, &elem, alloc.clone());
        }));
        assert!(res.is_err());
        assert_eq!(alloc.counters().allocation_count, 0);
    }

    #[test]
    fn list_from_iter_in_allocator() {
        let alloc = Counting::new();
        let list = List::from_iter_in((1..=3).map(|x| x * 10), alloc.clone());
        assert!(list.iter().eq(&[10, 20, 30]));
        assert_eq!(alloc.counters().allocation_count, 4);
        drop(list);
        assert_eq!(alloc.counters().allocation_count, 0);
    }

    #[test]
    fn list_clone_is_independent() {
        let source = List::from([1, 2, 3]);
        let mut copy = source.clone();
        assert_eq!(copy, source);

        assert_eq!(copy.pop_back(), Some(3));
        *copy.front_mut().unwrap() = 10;
        assert_eq!(source.len(), 3);
        assert!(source.iter().eq(&[1, 2, 3]));
        assert!(copy.iter().eq(&[10, 2]));
    }

    #[test]
    fn list_clone_selects_allocator() {
        let source = List::from_iter_in([1, 2, 3], Counting::new());
        let copy = source.try_clone().unwrap();
        assert!(copy.allocator().shares_counters_with(source.allocator()));
        assert_eq!(source.allocator().counters().allocation_count, 8);

        let source = List::from_iter_in([1, 2, 3], Fresh::default());
        let copy = source.clone();
        assert!(!copy.allocator().0.shares_counters_with(&source.allocator().0));
        assert_eq!(source.allocator().0.counters().allocation_count, 4);
        assert_eq!(copy.allocator().0.counters().allocation_count, 4);
    }

    #[test]
    fn list_clone_failure_leaks_nothing() {
        let alloc = Counting::new();
        let source = List::from_iter_in(0..5, alloc.clone());

        let res = source.try_clone_with(|&x| if x < 3 { Ok(x) } else { Err(x) });
        assert_eq!(res.unwrap_err(), Error::Construct(3));
        assert_eq!(alloc.counters().allocation_count, 6);

        alloc.fail_after(2);
        assert!(source.try_clone().is_err());
        assert_eq!(alloc.counters().allocation_count, 6);
        alloc.clear_failure();

        let budget = RefCell::new(2);
        let brittle = List::from_iter_in(
            (0..4).map(|value| Brittle { value, budget: &budget }),
            alloc.clone(),
        );
        let res = catch_unwind(AssertUnwindSafe(|| brittle.clone()));
        assert!(res.is_err());
        assert_eq!(alloc.counters().allocation_count, 6 + 5);
    }

    #[test]
    fn list_clone_from_failure_keeps_original() {
        let alloc = Counting::new();
        let mut target = List::from_iter_in([7, 8, 9], alloc.clone());
        let source = List::from_iter_in(0..5, alloc.clone());
        let before: Vec<_> = target.iter().copied().collect();

        let res = target.try_clone_from_with(&source, |&x| if x < 4 { Ok(x) } else { Err(x) });
        assert_eq!(res, Err(Error::Construct(4)));
        assert_eq!(target.len(), 3);
        assert!(target.iter().eq(before.iter()));
        assert_eq!(alloc.counters().allocation_count, 4 + 6);

        alloc.fail_after(1);
        assert_eq!(target.try_clone_from(&source), Err(AllocError));
        assert!(target.iter().eq(before.iter()));
        assert_eq!(alloc.counters().allocation_count, 4 + 6);
        alloc.clear_failure();

        target.clone_from(&source);
        assert_eq!(target, source);
        assert_eq!(alloc.counters().allocation_count, 6 + 6);
    }

    #[test]
    fn list_clone_from_panic_keeps_original() {
        let budget = RefCell::new(1);
        let mut target = List::from([Brittle { value: 9, budget: &budget }]);
        let source = List::from_iter((0..3).map(|value| Brittle { value, budget: &budget }));

        let res = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
        assert!(res.is_err());
        assert_eq!(target.len(), 1);
        assert_eq!(target.front().map(|b| b.value), Some(9));
    }

    #[test]
    fn list_clone_from_keeps_own_allocator() {
        let target_alloc = Counting::new();
        let source_alloc = Counting::new();
        let mut target = List::from_iter_in([1, 2], target_alloc.clone());
        let source = List::from_iter_in([3, 4, 5], source_alloc.clone());

        target.clone_from(&source);
        assert_eq!(target, source);
        assert!(target.allocator().shares_counters_with(&target_alloc));
        assert_eq!(target_alloc.counters().allocation_count, 4);
        assert_eq!(source_alloc.counters().allocation_count, 4);
    }

    #[test]
    fn list_clone_from_adopts_source_allocator() {
        let target_alloc = Adopted::default();
        let source_alloc = Adopted::default();
        let mut target = List::from_iter_in([1, 2], target_alloc.clone());
        let source = List::from_iter_in([3, 4, 5], source_alloc.clone());

        target.clone_from(&source);
        assert_eq!(target, source);
        assert!(target.allocator().0.shares_counters_with(&source_alloc.0));
        // the old nodes went back to the allocator that created them
        assert_eq!(target_alloc.0.counters().allocation_count, 0);
        assert_eq!(target_alloc.0.counters().total_freed_count(), 3);
        assert_eq!(source_alloc.0.counters().allocation_count, 8);

        drop(target);
        assert_eq!(source_alloc.0.counters().allocation_count, 4);
    }

    #[test]
    fn list_clone_from_adopt_failure_keeps_allocator() {
        let target_alloc = Adopted::default();
        let source_alloc = Adopted::default();
        let mut target = List::from_iter_in([1, 2], target_alloc.clone());
        let source = List::from_iter_in([3, 4, 5], source_alloc.clone());

        source_alloc.0.fail_after(2);
        assert!(target.try_clone_from(&source).is_err());
        assert!(target.allocator().0.shares_counters_with(&target_alloc.0));
        assert!(target.iter().eq(&[1, 2]));
        assert_eq!(source_alloc.0.counters().allocation_count, 4);
    }

    #[test]
    fn list_default_is_empty() {
        let list: List<i32> = Default::default();
        assert!(list.is_empty());
        let list: List<i32, Global> = List::new_in(Global);
        assert!(list.is_empty());
    }
}
