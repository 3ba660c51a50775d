use crate::alloc::ListAllocator;
use crate::list::{List, Node};
use std::alloc::{handle_alloc_error, Layout};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

impl<T: PartialEq, A1: ListAllocator, A2: ListAllocator> PartialEq<List<T, A2>> for List<T, A1> {
    fn eq(&self, other: &List<T, A2>) -> bool {
        self.len() == other.len() && self.iter().eq(other)
    }
}

impl<T: Eq, A: ListAllocator> Eq for List<T, A> {}

impl<T: PartialOrd, A: ListAllocator> PartialOrd for List<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other)
    }
}

impl<T: Ord, A: ListAllocator> Ord for List<T, A> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other)
    }
}

impl<T: Clone, A: ListAllocator> Clone for List<T, A> {
    /// Copy the list onto the allocator chosen by
    /// [`ListAllocator::select_on_copy_construction`].
    ///
    /// See [`List::try_clone`] for the fallible version.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(list) => list,
            Err(_) => handle_alloc_error(Layout::new::<Node<T>>()),
        }
    }

    /// Replace the contents with a copy of `source`.
    ///
    /// See [`List::try_clone_from`] for the fallible version.
    fn clone_from(&mut self, source: &Self) {
        if self.try_clone_from(source).is_err() {
            handle_alloc_error(Layout::new::<Node<T>>())
        }
    }
}

impl<T: Hash, A: ListAllocator> Hash for List<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for elt in self {
            elt.hash(state);
        }
    }
}

impl<T, A: ListAllocator> List<T, A> {
    /// Returns `true` if the `List` contains an element equal to the given value.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_back(0);
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// assert_eq!(list.contains(&0), true);
    /// assert_eq!(list.contains(&10), false);
    /// ```
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq<T>,
    {
        self.iter().any(|e| e == x)
    }
}

unsafe impl<T: Send, A: ListAllocator + Send> Send for List<T, A> {}

unsafe impl<T: Sync, A: ListAllocator + Sync> Sync for List<T, A> {}

#[cfg(test)]
mod tests {
    use crate::alloc::Counting;
    use crate::List;
    use std::cmp::Ordering;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<H: Hash>(value: &H) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn list_eq_across_allocators() {
        let list = List::from([1, 2, 3]);
        let counted = List::from_iter_in([1, 2, 3], Counting::new());
        assert_eq!(list, counted);
        assert_eq!(counted, list);

        let shorter = List::from_iter_in([1, 2], Counting::new());
        assert_ne!(list, shorter);
        assert_ne!(List::<i32>::new(), list);
    }

    #[test]
    fn list_ordering() {
        let a = List::from([1, 2, 3]);
        let b = List::from([1, 2, 4]);
        let c = List::from([1, 2]);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(a.cmp(&c), Ordering::Greater);
        assert_eq!(c.cmp(&c.clone()), Ordering::Equal);
        assert_eq!(List::from([f64::NAN]).partial_cmp(&List::from([1.0])), None);
    }

    #[test]
    fn list_hash() {
        let a = List::from([1, 2, 3]);
        let b = List::from_iter_in([1, 2, 3], Counting::new());
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(hash_of(&a), hash_of(&List::from([1, 2])));
    }

    #[test]
    fn list_contains() {
        let list = List::from(["a", "b"]);
        assert!(list.contains(&"b"));
        assert!(!list.contains(&"c"));
        assert!(!List::<&str>::new().contains(&"a"));
    }

    #[test]
    fn list_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<List<String>>();
        assert_send_sync::<crate::Iter<'_, String>>();
        assert_send_sync::<crate::IterMut<'_, String>>();
        assert_send_sync::<crate::Cursor<'_, String>>();
    }
}
