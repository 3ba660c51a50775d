//! This crate provides a doubly-linked list whose nodes are managed by a
//! pluggable allocation strategy, implemented as a cyclic list closed by a
//! ghost node.
//!
//! The [`List`] allows inserting and removing elements at both ends in
//! constant time, and walking the elements in both directions with cursors
//! and iterators. Every node is allocated, constructed, destroyed and released
//! through the list's [`ListAllocator`].
//!
//! Here is a quick example showing how the list works.
//!
//! ```
//! use sentinel_list::List;
//!
//! let mut list = List::from([2, 3]);
//!
//! list.push_front(1);
//! list.push_back(4);
//! assert_eq!(list, List::from([1, 2, 3, 4]));
//!
//! assert_eq!(list.pop_front(), Some(1));
//! assert_eq!(list.pop_back(), Some(4));
//! assert_eq!(list.front(), Some(&2));
//! assert_eq!(list.back(), Some(&3));
//! assert_eq!(list.len(), 2);
//! ```
//!
//! # Memory Layout
//!
//! The memory layout of the list is like the following graph:
//! ```text
//!          ┌─────────────────────────────────────────────────────────────────────┐
//!          ↓                                                        Ghost Node   │
//!    ╔═══════════╗           ╔═══════════╗                        ┌───────────┐  │
//!    ║   next    ║ ────────→ ║   next    ║ ────────→ ┄┄ ────────→ │   next    │ ─┘
//!    ╟───────────╢           ╟───────────╢     Node 2, 3, ...     ├───────────┤
//! ┌─ ║   prev    ║ ←──────── ║   prev    ║ ←──────── ┄┄ ←──────── │   prev    │
//! │  ╟───────────╢           ╟───────────╢                        └───────────┘
//! │  ║ element T ║           ║ element T ║                            ↑   ↑
//! │  ╚═══════════╝           ╚═══════════╝                            │   │
//! │      Node 0                  Node 1                               │   │
//! └───────────────────────────────────────────────────────────────────┘   │
//! ╔═══════════╗                                                           │
//! ║   ghost   ║ ──────────────────────────────────────────────────────────┘
//! ╟───────────╢
//! ║    len    ║
//! ╟───────────╢
//! ║   alloc   ║
//! ╚═══════════╝
//!     List
//! ```
//! The `List` contains:
//! - a pointer `ghost` that points to the ghost node;
//! - a length field `len` indicating the length of the list;
//! - the allocator `alloc`, which owns the memory of every node.
//!
//! Each node of the list `List<T, A>` is obtained from `alloc`, and contains:
//! - the `next` pointer that points to the next element (or the ghost node if it
//!   is the last element in the list);
//! - the `prev` pointer that points to the previous element (or the ghost node if
//!   it is the first element in the list);
//! - the element `T`, except the ghost node.
//!
//! The ghost node has *NO* element. It lives in its own block, obtained from
//! the same allocator, so the list itself can be moved freely.
//!
//! Initially, there is a ghost node in an empty list, of which the `next` and `prev`
//! pointer point to itself.
//!
//! As elements are inserted into the list, `ghost.next` points to the first element,
//! and `ghost.prev` points to the last element of the list.
//!
//! # Allocation Strategies
//!
//! A [`ListAllocator`] is an [`Allocator`] that also decides how elements are
//! constructed and destroyed, and which allocator a copy of a list uses. The
//! [`Counting`] strategy records statistics and can be told to refuse
//! allocations.
//!
//! Every operation that allocates comes in two flavors: an infallible one that
//! reports exhausted memory through [`std::alloc::handle_alloc_error`], and a
//! `try_` one that returns the failure. Fallible operations are
//! all-or-nothing: on failure the list is left as it was and nothing is leaked.
//!
//! ## Examples
//!
//! ```
//! use sentinel_list::alloc::Counting;
//! use sentinel_list::{Error, List};
//!
//! let alloc = Counting::new();
//! let mut list = List::from_iter_in([1, 2, 3], alloc.clone());
//!
//! let failed = list.try_push_back_with(|| Err("busy"));
//! assert_eq!(failed, Err(Error::Construct("busy")));
//! assert_eq!(list, List::from([1, 2, 3]));
//!
//! let copy = list.try_clone().unwrap();
//! assert!(copy.allocator().shares_counters_with(&alloc));
//!
//! drop(list);
//! drop(copy);
//! assert_eq!(alloc.counters().allocation_count, 0);
//! ```
//!
//! # Iteration
//!
//! Iterating over a list is by the [`Iter`] and [`IterMut`] iterators. These are
//! double-ended iterators and iterate the list like an array (fused and non-cyclic).
//! [`IterMut`] provides mutability of the elements (but not the linked structure of
//! the list).
//!
//! ## Examples
//!
//! ```
//! use sentinel_list::List;
//!
//! let mut list = List::from_iter([1, 2, 3]);
//! let mut iter = list.iter();
//! assert_eq!(iter.next(), Some(&1));
//! assert_eq!(iter.next(), Some(&2));
//! assert_eq!(iter.next(), Some(&3));
//! assert_eq!(iter.next(), None);
//! assert_eq!(iter.next(), None); // Fused and non-cyclic
//!
//! list.iter_mut().for_each(|item| *item *= 2);
//! assert_eq!(Vec::from_iter(list), vec![2, 4, 6]);
//! ```
//!
//! # Cursor Views
//!
//! Beside iteration, the cursors [`Cursor`] and [`CursorMut`] provide more
//! flexible ways of viewing a list.
//!
//! As the names suggest, they are like cursors and can move forward or backward
//! over the list. In a list with length *n*, there are *n* + 1 valid locations
//! for the cursor: the *n* elements and the ghost node.
//!
//! Cursors are cyclic: moving past the ghost node wraps around to the other
//! end of the list. [`Rev`] reverses the moving direction of a cursor.
//!
//! ## Examples
//!
//! ```
//! use sentinel_list::List;
//!
//! let list = List::from_iter([1, 2, 3]);
//! let mut cursor = list.cursor_start();
//! assert_eq!(cursor.current(), Some(&1));
//! cursor.move_next();
//! cursor.move_next();
//! assert_eq!(cursor.current(), Some(&3));
//! cursor.move_next();
//! assert_eq!(cursor.current(), None); // Reaches the ghost node
//! cursor.move_next();
//! assert_eq!(cursor.current(), Some(&1)); // Not fused and cyclic
//!
//! let mut cursor = list.cursor_rstart();
//! assert_eq!(cursor.current(), Some(&3));
//! cursor.move_next(); // Move in reversed direction
//! assert_eq!(cursor.current(), Some(&2));
//! ```
//!
//! [`List`]: crate::List
//! [`Iter`]: crate::Iter
//! [`IterMut`]: crate::IterMut
//! [`Cursor`]: crate::Cursor
//! [`CursorMut`]: crate::CursorMut
//! [`Rev`]: crate::Rev
//! [`ListAllocator`]: crate::alloc::ListAllocator
//! [`Allocator`]: crate::alloc::Allocator
//! [`Counting`]: crate::alloc::Counting

pub use error::Error;
#[doc(inline)]
pub use list::cursor::{BidiCursor, Cursor, CursorMut, Rev};
#[doc(inline)]
pub use list::iterator::{IntoIter, Iter, IterMut};
#[doc(inline)]
pub use list::List;

pub mod alloc;
pub mod list;

mod error;
