//! Abstractions for numbered pagination over a forward-only store.
//!
//! Stores behind this crate accept a limit but no offset, so reaching page
//! `N` requires knowing where page `N - 1` ended. A [`CursorCache`] remembers
//! those positions for a single [`Scope`].

use std::{collections::BTreeMap, num::NonZeroUsize};

use derive_more::Display;

/// A page of `I`tems along with its [`PageInfo`].
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// [`PageInfo`] describing this [`Page`].
    pub info: PageInfo,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] out of the provided `items`.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = I>, info: PageInfo) -> Self {
        Self {
            items: items.into_iter().collect(),
            info,
        }
    }

    /// Returns the last item of this [`Page`], if any.
    #[must_use]
    pub fn last(&self) -> Option<&I> {
        self.items.last()
    }
}

/// Information about a numbered page.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("page {page} of {} ({total_count} total)", self.total_pages())]
pub struct PageInfo {
    /// Number of the page, starting from `1`.
    pub page: usize,

    /// Maximum number of items on a page.
    pub page_size: NonZeroUsize,

    /// Total number of items across all pages.
    pub total_count: usize,
}

impl PageInfo {
    /// Creates a new [`PageInfo`].
    #[must_use]
    pub const fn new(
        page: usize,
        page_size: NonZeroUsize,
        total_count: usize,
    ) -> Self {
        Self {
            page,
            page_size,
            total_count,
        }
    }

    /// Returns the total number of pages.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size.get())
    }

    /// Indicates whether a page after this one exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Indicates whether a page before this one exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Indicates whether the provided `page` may be requested.
    ///
    /// The first page is always reachable, even for an empty result.
    #[must_use]
    pub const fn is_reachable(&self, page: usize) -> bool {
        page == 1 || (page > 1 && page <= self.total_pages())
    }
}

/// What the positions of a [`CursorCache`] were computed under.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Scope<F> {
    /// Filter applied to the listing.
    pub filter: F,

    /// Page size the listing was split by.
    pub page_size: Option<NonZeroUsize>,
}

impl<F> Scope<F> {
    /// Creates a new [`Scope`].
    #[must_use]
    pub const fn new(filter: F, page_size: NonZeroUsize) -> Self {
        Self {
            filter,
            page_size: Some(page_size),
        }
    }
}

/// Mapping from a page number to the cursor of the last item on that page.
///
/// Every entry belongs to the current [`Scope`]: switching to another one
/// drops all of them, and entries recorded under a stale [`Scope`] are
/// rejected.
#[derive(Clone, Debug)]
pub struct CursorCache<C, F> {
    /// [`Scope`] the cursors were computed under.
    scope: Scope<F>,

    /// Cursors by page number.
    cursors: BTreeMap<usize, C>,
}

impl<C, F: Default> Default for CursorCache<C, F> {
    fn default() -> Self {
        Self {
            scope: Scope::default(),
            cursors: BTreeMap::new(),
        }
    }
}

impl<C, F> CursorCache<C, F> {
    /// Returns the current [`Scope`] of this [`CursorCache`].
    #[must_use]
    pub fn scope(&self) -> &Scope<F> {
        &self.scope
    }

    /// Switches this [`CursorCache`] to the provided [`Scope`].
    ///
    /// Returns `true` if the [`Scope`] has changed, meaning that all the
    /// recorded cursors were dropped.
    pub fn rescope(&mut self, scope: Scope<F>) -> bool
    where
        F: PartialEq,
    {
        if self.scope == scope {
            return false;
        }
        self.scope = scope;
        self.cursors.clear();
        true
    }

    /// Drops all the recorded cursors, keeping the current [`Scope`].
    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    /// Returns the cursor recorded for the end of the provided `page`.
    #[must_use]
    pub fn get(&self, page: usize) -> Option<&C> {
        self.cursors.get(&page)
    }

    /// Records the `cursor` ending the provided `page`.
    ///
    /// Returns `false` and records nothing if the `scope` the `cursor` was
    /// computed under is not the current one.
    pub fn insert(&mut self, scope: &Scope<F>, page: usize, cursor: C) -> bool
    where
        F: PartialEq,
    {
        if &self.scope != scope {
            return false;
        }
        _ = self.cursors.insert(page, cursor);
        true
    }

    /// Returns the closest page before the provided one having a recorded
    /// cursor, along with that cursor.
    #[must_use]
    pub fn nearest_before(&self, page: usize) -> Option<(usize, &C)> {
        self.cursors.range(..page).next_back().map(|(p, c)| (*p, c))
    }

    /// Returns the number of recorded cursors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Indicates whether no cursors are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Order of a sort key.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    #[default]
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    #[cfg(feature = "postgres")]
    /// Returns SQL keyword representing this [`Order`].
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Returns `$orderby` keyword representing this [`Order`].
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of [`Node`]s."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "An information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo;

        #[doc = "[`Scope`] of the [`Cursors`]."]
        pub type Scope = $crate::pagination::Scope<$filter>;

        #[doc = "Recorded [`Cursor`]s of the listing."]
        pub type Cursors = $crate::pagination::CursorCache<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use std::num::NonZeroUsize;

    use super::{CursorCache, PageInfo, Scope};

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn computes_total_pages() {
        for page_size in 1..=12 {
            for total in 0..=100 {
                let info = PageInfo::new(1, size(page_size), total);
                let expected = (total + page_size - 1) / page_size;
                assert_eq!(info.total_pages(), expected, "{total}/{page_size}");
            }
        }
    }

    #[test]
    fn reports_boundaries() {
        let last = PageInfo::new(99, size(5), 495);
        assert_eq!(last.total_pages(), 99);
        assert!(!last.has_next_page());
        assert!(last.has_previous_page());

        let first = PageInfo::new(1, size(5), 495);
        assert!(first.has_next_page());
        assert!(!first.has_previous_page());

        let single = PageInfo::new(1, size(5), 5);
        assert!(!single.has_next_page());
        assert!(!single.has_previous_page());
    }

    #[test]
    fn first_page_is_always_reachable() {
        let empty = PageInfo::new(1, size(5), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(empty.is_reachable(1));
        assert!(!empty.is_reachable(2));
        assert!(!empty.is_reachable(0));

        let info = PageInfo::new(1, size(5), 11);
        assert!(info.is_reachable(3));
        assert!(!info.is_reachable(4));
    }

    #[test]
    fn rescoping_drops_cursors() {
        let mut cache = CursorCache::<u32, Option<String>>::default();
        let john = Scope::new(Some("john".to_owned()), size(5));
        assert!(cache.rescope(john.clone()));
        assert!(cache.insert(&john, 1, 10));
        assert!(cache.insert(&john, 2, 20));
        assert!(!cache.rescope(john.clone()));
        assert_eq!(cache.len(), 2);

        assert!(cache.rescope(Scope::new(Some("john".to_owned()), size(10))));
        assert!(cache.is_empty());
    }

    #[test]
    fn rejects_cursors_of_stale_scope() {
        let mut cache = CursorCache::<u32, Option<String>>::default();
        let a = Scope::new(Some("a".to_owned()), size(5));
        let ab = Scope::new(Some("ab".to_owned()), size(5));
        _ = cache.rescope(ab.clone());

        assert!(!cache.insert(&a, 1, 10));
        assert!(cache.get(1).is_none());
        assert!(cache.insert(&ab, 1, 11));
        assert_eq!(cache.get(1), Some(&11));
    }

    #[test]
    fn finds_nearest_recorded_page() {
        let mut cache = CursorCache::<u32, ()>::default();
        let scope = Scope::default();
        _ = cache.insert(&scope, 1, 10);
        _ = cache.insert(&scope, 4, 40);

        assert_eq!(cache.nearest_before(1), None);
        assert_eq!(cache.nearest_before(3), Some((1, &10)));
        assert_eq!(cache.nearest_before(9), Some((4, &40)));
    }
}
