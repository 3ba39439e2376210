//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

pub mod list {
    //! [`User`]s list definitions.

    use std::num::NonZeroUsize;

    use common::define_pagination;
    use derive_more::{Display, From, Into};

    use crate::domain::{user, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Page`].
    pub type Node = User;

    /// Cursor pointing to a specific [`User`] in a list.
    pub type Cursor = user::SortKey;

    /// Filter narrowing the list.
    #[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Filter {
        /// Search term matched against [`User`] names and email addresses.
        pub search: Option<String>,
    }

    impl Filter {
        /// Creates a new [`Filter`] out of the provided `search` term.
        ///
        /// Blank terms are treated as no search at all.
        #[must_use]
        pub fn new(search: Option<&str>) -> Self {
            Self {
                search: search
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned),
            }
        }
    }

    /// Selector of a single [`Page`].
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct Selector {
        /// Number of the [`Page`], starting from `1`.
        pub page: usize,

        /// Maximum number of [`User`]s on a [`Page`].
        pub page_size: NonZeroUsize,

        /// [`Filter`] of the list.
        pub filter: Filter,
    }

    impl Selector {
        /// Returns [`Scope`] the cursors of this [`Selector`] belong to.
        #[must_use]
        pub fn scope(&self) -> Scope {
            Scope::new(self.filter.clone(), self.page_size)
        }
    }

    /// Total count of [`User`]s in a list.
    #[derive(
        Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq,
    )]
    pub struct TotalCount(usize);
}
