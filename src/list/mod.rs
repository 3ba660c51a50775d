use std::alloc::{handle_alloc_error, Layout};
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::alloc::{self, AllocError, Global, ListAllocator};
use crate::error::Error;
use crate::list::cursor::{Cursor, CursorMut, Rev};
use crate::{Iter, IterMut};

pub mod cursor;
pub mod iterator;

mod algorithms;
mod construct;

/// The `List` is a doubly-linked list whose nodes are managed by an allocation
/// strategy `A`, implemented as a cyclic list closed by a ghost node.
/// It allows inserting and removing elements at both ends in constant time.
///
/// The `List` contains:
/// - a pointer `ghost` that points to the ghost node, which carries no element;
/// - a length field `len` indicating the length of the list;
/// - the allocator `alloc` every node (the ghost included) is obtained from.
///
/// # Naming Conventions
///
/// - `front..=back`: a closed range of list nodes, both inclusive;
/// - `start..end`: a half-open range of list nodes, left inclusive and right
///   exclusive (probably the ghost node).
pub struct List<T, A: ListAllocator = Global> {
    ghost: NonNull<Links>,
    /// the length of the list
    len: usize,
    alloc: A,
    _marker: PhantomData<Node<T>>,
}

/// The link shape shared by the ghost node and the data nodes.
pub(crate) struct Links {
    pub(crate) next: NonNull<Links>,
    pub(crate) prev: NonNull<Links>,
}

/// A data node. `links` comes first, so a node can be viewed as its `Links`.
#[repr(C)]
pub(crate) struct Node<T> {
    pub(crate) links: Links,
    pub(crate) element: T,
}

/// Deallocates a node slot whose construction did not complete.
struct SlotGuard<'a, T, A: ListAllocator> {
    alloc: &'a A,
    slot: NonNull<Node<T>>,
}

impl<'a, T, A: ListAllocator> Drop for SlotGuard<'a, T, A> {
    fn drop(&mut self) {
        // SAFETY: the slot was allocated by `alloc` and holds no value.
        unsafe { alloc::deallocate(self.alloc, self.slot, 1) }
    }
}

/// Make `prev` and `next` adjacent.
///
/// # Safety
///
/// Both nodes must be live nodes of the same ring.
pub(crate) unsafe fn connect(prev: NonNull<Links>, next: NonNull<Links>) {
    (*prev.as_ptr()).next = next;
    (*next.as_ptr()).prev = prev;
}

/// # Safety
///
/// `node` must be a live node of a ring.
#[inline]
pub(crate) unsafe fn next_of(node: NonNull<Links>) -> NonNull<Links> {
    (*node.as_ptr()).next
}

/// # Safety
///
/// `node` must be a live node of a ring.
#[inline]
pub(crate) unsafe fn prev_of(node: NonNull<Links>) -> NonNull<Links> {
    (*node.as_ptr()).prev
}

/// # Safety
///
/// `node` must be a data node (not a ghost) holding a `T`, alive for `'a`.
#[inline]
pub(crate) unsafe fn element<'a, T>(node: NonNull<Links>) -> &'a T {
    &(*node.cast::<Node<T>>().as_ptr()).element
}

/// # Safety
///
/// Same as [`element`], and no other reference to the element may exist during `'a`.
#[inline]
pub(crate) unsafe fn element_mut<'a, T>(node: NonNull<Links>) -> &'a mut T {
    &mut (*node.cast::<Node<T>>().as_ptr()).element
}

// private methods
impl<T, A: ListAllocator> List<T, A> {
    pub(crate) fn ghost_node(&self) -> NonNull<Links> {
        self.ghost
    }
    pub(crate) fn front_node(&self) -> NonNull<Links> {
        // SAFETY: `ghost.next` is always valid (either `ghost` itself, or the first element
        // in the list).
        unsafe { next_of(self.ghost) }
    }
    pub(crate) fn back_node(&self) -> NonNull<Links> {
        // SAFETY: `ghost.prev` is always valid (either `ghost` itself, or the last element
        // in the list).
        unsafe { prev_of(self.ghost) }
    }

    /// Allocate a node and construct its element with `init`.
    ///
    /// If `init` fails or panics, the slot is released before the failure
    /// propagates.
    fn create_node<E, F>(&self, init: F) -> Result<NonNull<Node<T>>, Error<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let slot = alloc::allocate::<Node<T>, A>(&self.alloc, 1)?;
        let guard = SlotGuard { alloc: &self.alloc, slot };
        // SAFETY: `slot` is freshly allocated for one `Node<T>`.
        let constructed = unsafe { self.alloc.construct(slot, || init().map(Node::new)) };
        constructed.map_err(Error::Construct)?;
        mem::forget(guard);
        Ok(slot)
    }

    /// Destroy the element of a detached node and release the node.
    ///
    /// # Safety
    ///
    /// `node` must be detached, and must have been created by this list.
    unsafe fn release_node(&self, node: NonNull<Node<T>>) {
        self.alloc.destroy(node);
        alloc::deallocate(&self.alloc, node, 1);
    }

    /// Move the element out of a detached node and release the node.
    ///
    /// # Safety
    ///
    /// Same as [`List::release_node`].
    unsafe fn take_node(&self, node: NonNull<Node<T>>) -> T {
        let element = ptr::read(ptr::addr_of!((*node.as_ptr()).element));
        alloc::deallocate(&self.alloc, node, 1);
        element
    }

    /// Attach a single node `node` to the list, between `prev` and `next`.
    ///
    /// It is unsafe because it does not check whether `prev` and `next` belongs
    /// to the list, or whether the `prev` and `next` is adjacent (only in
    /// `#[cfg(debug_assertions)]`).
    unsafe fn attach_node(&mut self, prev: NonNull<Links>, next: NonNull<Links>, node: NonNull<Node<T>>) {
        debug_assert!(next_of(prev) == next && prev_of(next) == prev);
        let node = node.cast::<Links>();
        connect(prev, node);
        connect(node, next);
        self.len += 1;
    }

    /// Detach a single data node `node` from the list.
    ///
    /// It is unsafe because it does not check whether `node` belongs to the list,
    /// or whether it is the ghost node.
    unsafe fn detach_node(&mut self, node: NonNull<Links>) -> NonNull<Node<T>> {
        debug_assert!(node != self.ghost);
        connect(prev_of(node), next_of(node));
        self.len -= 1;
        node.cast()
    }

    fn detach_front(&mut self) -> Option<NonNull<Node<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the front node is a data node.
        Some(unsafe { self.detach_node(self.front_node()) })
    }

    fn detach_back(&mut self) -> Option<NonNull<Node<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the back node is a data node.
        Some(unsafe { self.detach_node(self.back_node()) })
    }

    /// Release every node from the back to the front.
    ///
    /// Used to tear down a list that failed to be fully built.
    pub(crate) fn unwind(&mut self) {
        while let Some(node) = self.detach_back() {
            // SAFETY: `node` was just detached from this list.
            unsafe { self.release_node(node) }
        }
    }

    /// Exchange the nodes of two lists, leaving the allocators in place.
    ///
    /// The allocators must be equivalent.
    fn swap_nodes(&mut self, other: &mut Self) {
        mem::swap(&mut self.ghost, &mut other.ghost);
        mem::swap(&mut self.len, &mut other.len);
    }
}

impl<T, A: ListAllocator> List<T, A> {
    /// Create an empty `List` with its ghost node obtained from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if the ghost node cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::alloc::Counting;
    /// use sentinel_list::List;
    ///
    /// let alloc = Counting::new();
    /// alloc.fail_after(0);
    /// assert!(List::<u32, _>::try_new_in(alloc.clone()).is_err());
    ///
    /// alloc.clear_failure();
    /// let list = List::<u32, _>::try_new_in(alloc).unwrap();
    /// assert!(list.is_empty());
    /// ```
    pub fn try_new_in(alloc: A) -> Result<Self, AllocError> {
        let ghost = alloc::allocate::<Links, A>(&alloc, 1)?;
        // SAFETY: `ghost` is freshly allocated; an empty ring points to itself.
        unsafe { ghost.as_ptr().write(Links { next: ghost, prev: ghost }) };
        Ok(Self {
            ghost,
            len: 0,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Create an empty `List` with its ghost node obtained from `alloc`.
    ///
    /// Allocation failure is reported through [`handle_alloc_error`].
    ///
    /// # Examples
    /// ```
    /// use sentinel_list::alloc::Global;
    /// use sentinel_list::List;
    /// let list: List<u32> = List::new_in(Global);
    /// ```
    pub fn new_in(alloc: A) -> Self {
        match Self::try_new_in(alloc) {
            Ok(list) => list,
            Err(_) => handle_alloc_error(Layout::new::<Links>()),
        }
    }

    /// Returns the allocator of the `List`.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns `true` if the `List` is empty.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    /// assert!(list.is_empty());
    ///
    /// list.push_front("foo");
    /// assert!(!list.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the length of the `List`.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// assert_eq!(list.len(), 1);
    ///
    /// list.push_front(1);
    /// assert_eq!(list.len(), 2);
    ///
    /// list.push_back(3);
    /// assert_eq!(list.len(), 3);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Removes all elements from the `List`, front to back.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(*n*) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::from([1, 2]);
    /// assert_eq!(list.front(), Some(&1));
    ///
    /// list.clear();
    /// assert_eq!(list.len(), 0);
    /// assert_eq!(list.front(), None);
    /// ```
    pub fn clear(&mut self) {
        while let Some(node) = self.detach_front() {
            // SAFETY: `node` was just detached from this list.
            unsafe { self.release_node(node) }
        }
    }

    /// Provides a reference to the front element, or `None` if the list is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.front(), None);
    ///
    /// list.push_front(1);
    /// assert_eq!(list.front(), Some(&1));
    /// ```
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.cursor_start().current()
    }

    /// Provides a mutable reference to the front element, or `None` if the list
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::from([1]);
    /// if let Some(x) = list.front_mut() {
    ///     *x = 5;
    /// }
    /// assert_eq!(list.front(), Some(&5));
    /// ```
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the front node of a non-empty list is a data node, and
        // `self` is borrowed mutably.
        Some(unsafe { element_mut(self.front_node()) })
    }

    /// Provides a reference to the back element, or `None` if the list is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.back(), None);
    ///
    /// list.push_back(1);
    /// assert_eq!(list.back(), Some(&1));
    /// ```
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.cursor_rstart().current()
    }

    /// Provides a mutable reference to the back element, or `None` if the list
    /// is empty.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the back node of a non-empty list is a data node, and
        // `self` is borrowed mutably.
        Some(unsafe { element_mut(self.back_node()) })
    }

    /// Adds an element first in the list.
    ///
    /// Allocation failure is reported through [`handle_alloc_error`], see
    /// [`List::try_push_front`] for the fallible version.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// assert_eq!(list.front().unwrap(), &2);
    ///
    /// list.push_front(1);
    /// assert_eq!(list.front().unwrap(), &1);
    /// ```
    pub fn push_front(&mut self, elt: T) {
        if self.try_push_front(elt).is_err() {
            handle_alloc_error(Layout::new::<Node<T>>())
        }
    }

    /// Adds an element first in the list, or returns an error if its node
    /// cannot be allocated. The list is unchanged on error.
    pub fn try_push_front(&mut self, elt: T) -> Result<(), AllocError> {
        self.try_push_front_with(|| Ok::<_, Infallible>(elt))
            .map_err(Error::into_alloc_error)
    }

    /// Allocates a node first in the list and constructs its element with `f`.
    ///
    /// If the allocation or `f` fails, the node is released and the list is
    /// left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::{Error, List};
    ///
    /// let mut list = List::from([2, 3]);
    /// assert_eq!(list.try_push_front_with(|| "1".parse::<i32>()), Ok(()));
    /// assert!(matches!(
    ///     list.try_push_front_with(|| "x".parse::<i32>()),
    ///     Err(Error::Construct(_))
    /// ));
    /// assert_eq!(list, List::from([1, 2, 3]));
    /// ```
    pub fn try_push_front_with<E, F>(&mut self, f: F) -> Result<(), Error<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let node = self.create_node(f)?;
        let (prev, next) = (self.ghost, self.front_node());
        // SAFETY: `ghost` and the front node are adjacent nodes of this list.
        unsafe { self.attach_node(prev, next, node) };
        Ok(())
    }

    /// Removes the first element and returns it, or `None` if the list is
    /// empty.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut d = List::new();
    /// assert_eq!(d.pop_front(), None);
    ///
    /// d.push_front(1);
    /// d.push_front(3);
    /// assert_eq!(d.pop_front(), Some(3));
    /// assert_eq!(d.pop_front(), Some(1));
    /// assert_eq!(d.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        let node = self.detach_front()?;
        // SAFETY: `node` was just detached from this list.
        Some(unsafe { self.take_node(node) })
    }

    /// Appends an element to the back of a list.
    ///
    /// Allocation failure is reported through [`handle_alloc_error`], see
    /// [`List::try_push_back`] for the fallible version.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut d = List::new();
    /// d.push_back(1);
    /// d.push_back(3);
    /// assert_eq!(3, *d.back().unwrap());
    /// ```
    pub fn push_back(&mut self, elt: T) {
        if self.try_push_back(elt).is_err() {
            handle_alloc_error(Layout::new::<Node<T>>())
        }
    }

    /// Appends an element to the back of a list, or returns an error if its
    /// node cannot be allocated. The list is unchanged on error.
    pub fn try_push_back(&mut self, elt: T) -> Result<(), AllocError> {
        self.try_push_back_with(|| Ok::<_, Infallible>(elt))
            .map_err(Error::into_alloc_error)
    }

    /// Allocates a node at the back of the list and constructs its element
    /// with `f`.
    ///
    /// If the allocation or `f` fails, the node is released and the list is
    /// left unchanged.
    pub fn try_push_back_with<E, F>(&mut self, f: F) -> Result<(), Error<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let node = self.create_node(f)?;
        let (prev, next) = (self.back_node(), self.ghost);
        // SAFETY: the back node and `ghost` are adjacent nodes of this list.
        unsafe { self.attach_node(prev, next, node) };
        Ok(())
    }

    /// Removes the last element from a list and returns it, or `None` if
    /// it is empty.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut d = List::new();
    /// assert_eq!(d.pop_back(), None);
    /// d.push_back(1);
    /// d.push_back(3);
    /// assert_eq!(d.pop_back(), Some(3));
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        let node = self.detach_back()?;
        // SAFETY: `node` was just detached from this list.
        Some(unsafe { self.take_node(node) })
    }

    /// Provides a cursor at the first element, or at the ghost node if the
    /// list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let list = List::from([1, 2, 3]);
    /// let mut cursor = list.cursor_start();
    /// assert_eq!(cursor.current(), Some(&1));
    ///
    /// cursor.move_prev();
    /// assert_eq!(cursor, list.cursor_end());
    /// ```
    #[inline]
    pub fn cursor_start(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.front_node())
    }

    /// Provides a cursor at the ghost node, one past the last element.
    #[inline]
    pub fn cursor_end(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.ghost)
    }

    /// Provides a reversed cursor at the last element, or at the ghost node
    /// if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let list = List::from([1, 2, 3]);
    /// let mut cursor = list.cursor_rstart();
    /// let mut seen = Vec::new();
    /// while cursor != list.cursor_rend() {
    ///     seen.push(*cursor.current().unwrap());
    ///     cursor.move_next();
    /// }
    /// assert_eq!(seen, vec![3, 2, 1]);
    /// ```
    #[inline]
    pub fn cursor_rstart(&self) -> Rev<Cursor<'_, T, A>> {
        Rev::new(Cursor::new(self, self.back_node()))
    }

    /// Provides a reversed cursor at the ghost node, one before the first
    /// element.
    #[inline]
    pub fn cursor_rend(&self) -> Rev<Cursor<'_, T, A>> {
        Rev::new(self.cursor_end())
    }

    /// Provides a cursor with editing operations at the first element,
    /// or at the ghost node if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::from([1, 2, 3]);
    /// let mut cursor = list.cursor_start_mut();
    /// while let Some(x) = cursor.current_mut() {
    ///     *x *= 10;
    ///     cursor.move_next();
    /// }
    /// assert_eq!(list, List::from([10, 20, 30]));
    /// ```
    #[inline]
    pub fn cursor_start_mut(&mut self) -> CursorMut<'_, T, A> {
        let front = self.front_node();
        CursorMut::new(self, front)
    }

    /// Provides a cursor with editing operations at the ghost node.
    #[inline]
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, T, A> {
        let ghost = self.ghost;
        CursorMut::new(self, ghost)
    }

    /// Provides a reversed cursor with editing operations at the last element.
    #[inline]
    pub fn cursor_rstart_mut(&mut self) -> Rev<CursorMut<'_, T, A>> {
        let back = self.back_node();
        Rev::new(CursorMut::new(self, back))
    }

    /// Provides a reversed cursor with editing operations at the ghost node.
    #[inline]
    pub fn cursor_rend_mut(&mut self) -> Rev<CursorMut<'_, T, A>> {
        Rev::new(self.cursor_end_mut())
    }

    /// Provides a forward iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let list = List::from([0, 1, 2]);
    /// let mut iter = list.iter();
    /// assert_eq!(iter.next(), Some(&0));
    /// assert_eq!(iter.next_back(), Some(&2));
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), None);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Provides a forward iterator with mutable references.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::from([0, 1, 2]);
    /// for element in list.iter_mut() {
    ///     *element += 10;
    /// }
    /// assert_eq!(list, List::from([10, 11, 12]));
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }
}

impl<T: Debug, A: ListAllocator> Debug for List<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Node<T> {
    fn new(element: T) -> Self {
        let links = Links {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
        };
        Self { links, element }
    }
}

impl<T, A: ListAllocator> Drop for List<T, A> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the ghost was allocated by `alloc` in `try_new_in` (or came
        // from an equivalent allocator through `swap_nodes`).
        unsafe { alloc::deallocate(&self.alloc, self.ghost, 1) }
    }
}
