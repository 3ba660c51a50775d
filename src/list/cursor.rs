use crate::alloc::{Global, ListAllocator};
use crate::list::{element, element_mut, next_of, prev_of, Links, List};
use std::fmt;
use std::fmt::Formatter;
use std::ptr::{self, NonNull};

/// The traversal shared by every cursor flavor, so that adapters such as
/// [`Rev`] can be written once.
pub trait BidiCursor {
    /// The element type of the list.
    type Item;

    /// Move to the successor of the current node.
    fn move_next(&mut self);

    /// Move to the predecessor of the current node.
    fn move_prev(&mut self);

    /// Returns the current element, or `None` at the ghost node.
    fn current(&self) -> Option<&Self::Item>;

    /// Returns `true` if the cursor sits on the ghost node.
    fn is_end(&self) -> bool;
}

/// A cursor over a `List`.
///
/// A `Cursor` is like an iterator, except that it can freely seek back-and-forth.
///
/// In a list with length *n*, there are *n* + 1 valid locations for the cursor:
/// the *n* elements and the ghost node, which stands both one past the last
/// element and one before the first. Moving never fails: stepping forward from
/// the ghost node reaches the first element, and stepping backward from the
/// first element reaches the ghost node.
///
/// # Examples
///
/// Here is a simple example showing how the cursors work. (The ghost node of the
/// list is denoted by `#`).
/// ```
/// use sentinel_list::List;
///
/// // Create a list: [ A B C D #]
/// let list = List::from(['A', 'B', 'C', 'D']);
///
/// // Create a cursor at start: [|A B C D #]
/// let mut cursor = list.cursor_start();
/// assert_eq!(cursor.current(), Some(&'A'));
///
/// // Move cursor forward: [ A|B C D #]
/// cursor.move_next();
/// assert_eq!(cursor.current(), Some(&'B'));
///
/// // Create a cursor in the end: [ A B C D|#]
/// let mut cursor = list.cursor_end();
/// assert_eq!(cursor.current(), None);
///
/// // Move cursor backward: [ A B C|D #]
/// cursor.move_prev();
/// assert_eq!(cursor.current(), Some(&'D'));
///
/// // Move cursor forward twice, passing the ghost node: [|A B C D #]
/// cursor.move_next();
/// cursor.move_next();
/// assert_eq!(cursor.current(), Some(&'A'));
/// ```
pub struct Cursor<'a, T: 'a, A: ListAllocator = Global> {
    pub(crate) current: NonNull<Links>,
    pub(crate) list: &'a List<T, A>,
}

impl<'a, T: 'a, A: ListAllocator> Clone for Cursor<'a, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: 'a, A: ListAllocator> Copy for Cursor<'a, T, A> {}

/// A cursor over a `List` with mutable access to the elements.
///
/// The lifetime of the yielded references is tied to the cursor itself, so
/// a `CursorMut` cannot yield multiple mutable elements at once. The linked
/// structure of the list cannot be changed through a cursor.
///
/// # Examples
///
/// ```compile_fail
/// use sentinel_list::List;
///
/// let mut list = List::from([1, 2, 3]);
/// let mut cursor = list.cursor_start_mut();
/// println!("{:?}", list.back());
/// println!("{:?}", cursor.current());
/// ```
pub struct CursorMut<'a, T: 'a, A: ListAllocator = Global> {
    pub(crate) current: NonNull<Links>,
    pub(crate) list: &'a mut List<T, A>,
}

macro_rules! impl_cursor {
    ($CURSOR:ident) => {
        impl<'a, T: 'a, A: ListAllocator> $CURSOR<'a, T, A> {
            fn same_list_with(&self, other: &Self) -> bool {
                ptr::eq(&*self.list, &*other.list)
            }

            /// Returns `true` if the cursor is at the ghost node, i.e. the end
            /// of the list.
            #[inline]
            pub fn is_end(&self) -> bool {
                self.current == self.list.ghost_node()
            }

            /// Returns `true` if the `List` is empty. See [`List::is_empty`].
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.list.is_empty()
            }

            /// Returns the length of the `List`. See [`List::len`].
            #[inline]
            pub fn len(&self) -> usize {
                self.list.len()
            }

            /// Move the cursor to the next position, where passing
            /// through the ghost node is allowed.
            ///
            /// This operation should compute in *O*(*1*) time.
            #[inline]
            pub fn move_next(&mut self) {
                // SAFETY: `current.next` is always valid since it is a cyclic list.
                self.current = unsafe { next_of(self.current) };
            }

            /// Move the cursor to the previous position, where passing
            /// through the ghost node is allowed.
            ///
            /// This operation should compute in *O*(*1*) time.
            #[inline]
            pub fn move_prev(&mut self) {
                // SAFETY: `current.prev` is always valid since it is a cyclic list.
                self.current = unsafe { prev_of(self.current) };
            }

            /// Set the cursor to the start of the list (i.e. the first node).
            #[inline]
            pub fn move_to_start(&mut self) {
                self.current = self.list.front_node();
            }

            /// Set the cursor to the end of the list (i.e. the ghost node).
            #[inline]
            pub fn move_to_end(&mut self) {
                self.current = self.list.ghost_node();
            }
        }

        /// Compare cursors by their positions.
        ///
        /// Only cursors of the same list at the same node are equal.
        impl<'a, T: 'a, A: ListAllocator> PartialEq for $CURSOR<'a, T, A> {
            fn eq(&self, other: &Self) -> bool {
                self.same_list_with(other) && self.current == other.current
            }
        }

        impl<'a, T: 'a, A: ListAllocator> Eq for $CURSOR<'a, T, A> {}

        impl<'a, T: fmt::Debug + 'a, A: ListAllocator> fmt::Debug for $CURSOR<'a, T, A> {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($CURSOR))
                    .field("list", &self.list)
                    .field("current", &self.current())
                    .finish()
            }
        }

        impl<'a, T: 'a, A: ListAllocator> BidiCursor for $CURSOR<'a, T, A> {
            type Item = T;

            fn move_next(&mut self) {
                $CURSOR::move_next(self)
            }

            fn move_prev(&mut self) {
                $CURSOR::move_prev(self)
            }

            fn current(&self) -> Option<&T> {
                $CURSOR::current(self)
            }

            fn is_end(&self) -> bool {
                $CURSOR::is_end(self)
            }
        }
    };
}

impl_cursor!(Cursor);
impl_cursor!(CursorMut);

impl<'a, T: 'a, A: ListAllocator> Cursor<'a, T, A> {
    pub(crate) fn new(list: &'a List<T, A>, current: NonNull<Links>) -> Self {
        Self { current, list }
    }

    /// Return an immutable reference of current node of the cursor,
    /// or return `None` if it is located at the ghost node.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let list = List::from([1, 2]);
    /// let mut cursor = list.cursor_start();
    /// assert_eq!(cursor.current(), Some(&1));
    /// cursor.move_next();
    /// assert_eq!(cursor.current(), Some(&2));
    /// cursor.move_next();
    /// assert_eq!(cursor.current(), None);
    /// ```
    pub fn current(&self) -> Option<&'a T> {
        if self.is_end() {
            return None;
        }
        // SAFETY: it is safe because non-ghost nodes must hold a
        // valid element, and the list is borrowed for `'a`.
        Some(unsafe { element(self.current) })
    }
}

impl<'a, T: 'a, A: ListAllocator> CursorMut<'a, T, A> {
    pub(crate) fn new(list: &'a mut List<T, A>, current: NonNull<Links>) -> Self {
        Self { current, list }
    }

    /// Return an immutable reference of current node of the cursor,
    /// or return `None` if it is located at the ghost node.
    pub fn current(&self) -> Option<&T> {
        if self.is_end() {
            return None;
        }
        // SAFETY: non-ghost nodes hold a valid element.
        Some(unsafe { element(self.current) })
    }

    /// Return a mutable reference of current node of the cursor,
    /// or return `None` if it is located at the ghost node.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::from([1, 2, 3]);
    /// let mut cursor = list.cursor_end_mut();
    /// assert_eq!(cursor.current_mut(), None);
    ///
    /// cursor.move_prev();
    /// *cursor.current_mut().unwrap() = 4;
    /// assert_eq!(list, List::from([1, 2, 4]));
    /// ```
    pub fn current_mut(&mut self) -> Option<&mut T> {
        if self.is_end() {
            return None;
        }
        // SAFETY: non-ghost nodes hold a valid element, and the cursor is
        // borrowed mutably for the lifetime of the reference.
        Some(unsafe { element_mut(self.current) })
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The returned cursor borrows this one, so it cannot outlive it.
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(&*self.list, self.current)
    }

    /// Turns the cursor into a read-only cursor at the same position.
    pub fn into_cursor(self) -> Cursor<'a, T, A> {
        let list: &'a List<T, A> = self.list;
        Cursor::new(list, self.current)
    }
}

/// A cursor that walks the list backward.
///
/// `Rev` swaps [`move_next`](BidiCursor::move_next) and
/// [`move_prev`](BidiCursor::move_prev) of the cursor it wraps, for either
/// cursor flavor. A reversed traversal starts at
/// [`List::cursor_rstart`] (the last element) and ends at
/// [`List::cursor_rend`] (the ghost node).
///
/// # Examples
///
/// ```
/// use sentinel_list::{List, Rev};
///
/// let list = List::from([1, 2, 3]);
/// let mut cursor = Rev::new(list.cursor_end());
/// cursor.move_next();
/// assert_eq!(cursor.current(), Some(&3));
/// assert_eq!(cursor, list.cursor_rstart());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rev<C> {
    inner: C,
}

impl<C: BidiCursor> Rev<C> {
    /// Reverse the moving direction of `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Returns the wrapped cursor, which moves forward again.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Move to the predecessor of the current node.
    #[inline]
    pub fn move_next(&mut self) {
        self.inner.move_prev()
    }

    /// Move to the successor of the current node.
    #[inline]
    pub fn move_prev(&mut self) {
        self.inner.move_next()
    }

    /// Returns `true` if the cursor sits on the ghost node.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.inner.is_end()
    }
}

impl<'a, T: 'a, A: ListAllocator> Rev<Cursor<'a, T, A>> {
    /// See [`Cursor::current`].
    pub fn current(&self) -> Option<&'a T> {
        self.inner.current()
    }
}

impl<'a, T: 'a, A: ListAllocator> Rev<CursorMut<'a, T, A>> {
    /// See [`CursorMut::current`].
    pub fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    /// See [`CursorMut::current_mut`].
    pub fn current_mut(&mut self) -> Option<&mut T> {
        self.inner.current_mut()
    }
}

impl<C: BidiCursor> BidiCursor for Rev<C> {
    type Item = C::Item;

    fn move_next(&mut self) {
        self.inner.move_prev()
    }

    fn move_prev(&mut self) {
        self.inner.move_next()
    }

    fn current(&self) -> Option<&C::Item> {
        self.inner.current()
    }

    fn is_end(&self) -> bool {
        self.inner.is_end()
    }
}

unsafe impl<T: Sync, A: ListAllocator + Sync> Send for Cursor<'_, T, A> {}

unsafe impl<T: Sync, A: ListAllocator + Sync> Sync for Cursor<'_, T, A> {}

unsafe impl<T: Send, A: ListAllocator + Send> Send for CursorMut<'_, T, A> {}

unsafe impl<T: Sync, A: ListAllocator + Sync> Sync for CursorMut<'_, T, A> {}

#[cfg(test)]
mod tests {
    use super::{BidiCursor, Rev};
    use crate::list::List;

    /// Collect the elements from `cursor` until it reaches the ghost node.
    fn walk<C: BidiCursor>(mut cursor: C) -> Vec<C::Item>
    where
        C::Item: Clone,
    {
        let mut out = Vec::new();
        while let Some(x) = cursor.current() {
            out.push(x.clone());
            cursor.move_next();
        }
        out
    }

    #[test]
    fn cursor_same_position_is_equal() {
        let list = List::from([1, 2, 3]);
        let a = list.cursor_start();
        let mut b = a;
        assert_eq!(a, b);
        b.move_next();
        assert_ne!(a, b);
        b.move_prev();
        assert_eq!(a, b);

        let other = list.clone();
        assert_ne!(list.cursor_end(), other.cursor_end());
    }

    #[test]
    fn cursor_reaches_end_after_len_steps() {
        let list = List::from_iter(0..7);
        let end = list.cursor_end();
        let mut cursor = list.cursor_start();
        for step in 0..list.len() {
            assert_ne!(cursor, end, "reached the end after {} steps", step);
            assert_eq!(cursor.current(), Some(&(step as i32)));
            cursor.move_next();
        }
        assert_eq!(cursor, end);
        assert!(cursor.is_end());

        // wrap-around
        cursor.move_next();
        assert_eq!(cursor, list.cursor_start());
        cursor.move_prev();
        cursor.move_prev();
        assert_eq!(cursor.current(), list.back());
    }

    #[test]
    fn cursor_on_empty_list() {
        let list = List::<i32>::new();
        let mut cursor = list.cursor_start();
        assert_eq!(cursor, list.cursor_end());
        assert_eq!(cursor.current(), None);
        cursor.move_next();
        assert_eq!(cursor, list.cursor_end());
        cursor.move_prev();
        assert!(cursor.is_end());
        assert!(cursor.is_empty());
        assert_eq!(list.cursor_rstart(), list.cursor_rend());
    }

    #[test]
    fn cursor_walks_both_ways() {
        let list = List::from([1, 2, 3]);
        assert_eq!(walk(list.cursor_start()), vec![1, 2, 3]);
        assert_eq!(walk(list.cursor_rstart()), vec![3, 2, 1]);
        assert_eq!(walk(Rev::new(list.cursor_rstart())), vec![3]);

        let mut cursor = list.cursor_end();
        let mut backward = Vec::new();
        loop {
            cursor.move_prev();
            match cursor.current() {
                Some(&x) => backward.push(x),
                None => break,
            }
        }
        assert_eq!(backward, vec![3, 2, 1]);
    }

    #[test]
    fn cursor_rev_anchors() {
        let list = List::from([1, 2, 3]);

        let mut rstart = list.cursor_end();
        rstart.move_prev();
        assert_eq!(list.cursor_rstart().into_inner(), rstart);

        let mut rend = list.cursor_start();
        rend.move_prev();
        assert_eq!(list.cursor_rend().into_inner(), rend);

        let mut cursor = list.cursor_rstart();
        for _ in 0..list.len() {
            cursor.move_next();
        }
        assert_eq!(cursor, list.cursor_rend());
        cursor.move_next();
        assert_eq!(cursor, list.cursor_rstart());
    }

    #[test]
    fn cursor_mut_edits_elements() {
        let mut list = List::from([1, 2, 3]);
        let mut cursor = list.cursor_start_mut();
        while let Some(x) = cursor.current_mut() {
            *x *= 2;
            cursor.move_next();
        }
        assert!(cursor.is_end());
        cursor.move_next();
        assert_eq!(cursor.as_cursor().current(), Some(&2));
        assert_eq!(cursor.len(), 3);

        let mut rev = list.cursor_rstart_mut();
        *rev.current_mut().unwrap() += 1;
        rev.move_next();
        assert_eq!(rev.current(), Some(&4));
        assert_eq!(list, List::from([2, 4, 7]));

        let mut rend = list.cursor_rend_mut();
        assert_eq!(rend.current_mut(), None);
        rend.move_prev();
        assert_eq!(rend.into_inner().into_cursor().current(), Some(&2));
    }

    #[test]
    fn cursor_seek_to_ends() {
        let list = List::from([1, 2, 3]);
        let mut cursor = list.cursor_start();
        cursor.move_to_end();
        assert!(cursor.is_end());
        cursor.move_to_start();
        assert_eq!(cursor.current(), Some(&1));
    }
}
