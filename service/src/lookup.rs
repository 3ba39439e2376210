//! Paginated [`Lookup`] of [`User`]s.

use std::{cell::RefCell, num::NonZeroUsize};

use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::database,
    query::{self, users},
    read::user::list,
    statement, Query, Service,
};

/// Numbered pagination over the eligible [`User`]s, narrowed by an optional
/// search term.
///
/// Remembers where every visited page ended, so moving to an adjacent page
/// costs a single request. Reaching a page not adjacent to a remembered one
/// costs one more request for the sort keys in between.
///
/// Not thread-safe: a [`Lookup`] belongs to a single control.
#[derive(Debug)]
pub struct Lookup<Db> {
    /// [`Service`] executing queries of this [`Lookup`].
    service: Service<Db>,

    /// Mutable state of this [`Lookup`].
    state: RefCell<State>,
}

/// Mutable state of a [`Lookup`].
#[derive(Debug)]
struct State {
    /// Current page size.
    page_size: NonZeroUsize,

    /// Ends of the already visited pages.
    cursors: list::Cursors,

    /// Total count of [`User`]s in the current [`list::Scope`], if known.
    total_count: Option<usize>,
}

impl<Db> Lookup<Db> {
    /// Creates a new [`Lookup`] using the page size configured for the
    /// provided [`Service`].
    #[must_use]
    pub fn new(service: Service<Db>) -> Self {
        let page_size = service.config().page_size;
        Self {
            service,
            state: RefCell::new(State {
                page_size,
                cursors: list::Cursors::default(),
                total_count: None,
            }),
        }
    }

    /// Returns the current page size.
    #[must_use]
    pub fn page_size(&self) -> NonZeroUsize {
        self.state.borrow().page_size
    }

    /// Changes the page size, forgetting all the remembered page ends.
    pub fn set_page_size(&self, size: NonZeroUsize) {
        let mut state = self.state.borrow_mut();
        if state.page_size != size {
            tracing::debug!(%size, "`Lookup` page size changed");
        }
        state.page_size = size;
        state.cursors.clear();
        state.total_count = None;
    }

    /// Forgets all the remembered page ends and the total count.
    pub fn clear_cache(&self) {
        let mut state = self.state.borrow_mut();
        state.cursors.clear();
        state.total_count = None;
    }

    /// Returns the number of pages which ends are remembered.
    #[must_use]
    pub fn cached_pages(&self) -> usize {
        self.state.borrow().cursors.len()
    }
}

impl<Db> Lookup<Db>
where
    Service<Db>: Query<users::Select, Ok = Vec<User>, Err = Traced<database::Error>>
        + Query<
            users::TotalCount,
            Ok = list::TotalCount,
            Err = Traced<database::Error>,
        > + Query<users::ByIds, Ok = Vec<User>, Err = Traced<database::Error>>
        + Query<
            query::user::ById,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    /// Fetches the `page` (starting from `1`) of [`User`]s matching the
    /// provided `search` term.
    ///
    /// A `search` term differing from the previous one (blank ones meaning
    /// no search) forgets all the remembered page ends.
    ///
    /// # Errors
    ///
    /// - If the `page` is beyond the last one.
    /// - If the store fails. Remembered page ends are kept intact then.
    pub async fn fetch_page(
        &self,
        page: usize,
        search: Option<&str>,
    ) -> Result<list::Page, Traced<Error>> {
        use Error as E;

        let selector = list::Selector {
            page,
            page_size: self.page_size(),
            filter: list::Filter::new(search),
        };
        let scope = selector.scope();
        {
            let mut state = self.state.borrow_mut();
            if state.cursors.rescope(scope.clone()) {
                tracing::debug!(
                    search = ?scope.filter.search,
                    "`Lookup` rescoped",
                );
                state.total_count = None;
            }
        }

        let total_count = self.total_count(&scope).await?;
        let info =
            list::PageInfo::new(page, selector.page_size, total_count);
        if !info.is_reachable(page) {
            return Err(tracerr::new!(E::PageOutOfRange {
                page,
                total_pages: info.total_pages(),
            }));
        }

        let stmt = self.statement(&selector).await?;
        let users = self
            .service
            .execute(users::Select::by(stmt))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(last) = users.last() {
            _ = self.state.borrow_mut().cursors.insert(
                &scope,
                page,
                last.sort_key(),
            );
        }
        tracing::debug!(%info, found = users.len(), "`User`s page fetched");

        Ok(list::Page::new(users, info))
    }

    /// Fetches the [`User`] with the provided [`user::Id`], if it exists.
    ///
    /// An empty [`user::Id`] is never looked up remotely.
    ///
    /// # Errors
    ///
    /// If the store fails.
    pub async fn fetch_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Traced<Error>> {
        self.service
            .execute(query::user::ById(id))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }

    /// Fetches the [`User`]s with the provided [`user::Id`]s, skipping
    /// unknown ones.
    ///
    /// No remote request is made if there are no non-empty [`user::Id`]s.
    ///
    /// # Errors
    ///
    /// If the store fails.
    pub async fn fetch_by_ids(
        &self,
        ids: impl IntoIterator<Item = user::Id>,
    ) -> Result<Vec<User>, Traced<Error>> {
        self.service
            .execute(users::ByIds(ids.into_iter().collect()))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }

    /// Returns the total count of [`User`]s in the provided [`list::Scope`],
    /// requesting it from the store only once per [`list::Scope`].
    async fn total_count(
        &self,
        scope: &list::Scope,
    ) -> Result<usize, Traced<Error>> {
        if let Some(count) = self.state.borrow().total_count {
            return Ok(count);
        }

        let count = self
            .service
            .execute(users::TotalCount::by(statement::user::listing(
                &scope.filter,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> Error))?
            .into();

        let mut state = self.state.borrow_mut();
        if state.cursors.scope() == scope {
            state.total_count = Some(count);
        }
        Ok(count)
    }

    /// Builds the [`statement::Statement`] for the page described by the
    /// provided [`list::Selector`], seeking the end of the previous page if
    /// it isn't remembered.
    async fn statement(
        &self,
        selector: &list::Selector,
    ) -> Result<statement::Statement, Traced<Error>> {
        if let Some(stmt) =
            statement::user::page(selector, &self.state.borrow().cursors)
        {
            return Ok(stmt);
        }

        self.seek(selector).await?;

        statement::user::page(selector, &self.state.borrow().cursors)
            .ok_or_else(|| {
                tracerr::new!(Error::PageOutOfRange {
                    page: selector.page,
                    total_pages: selector.page - 1,
                })
            })
    }

    /// Remembers ends of all the pages between the nearest remembered one and
    /// the one preceding the page described by the provided
    /// [`list::Selector`].
    ///
    /// Makes a single request selecting only the sort keys, reading
    /// `(page - 1 - nearest) * page_size` rows of them, where `nearest` is
    /// the nearest remembered page (or `0`). Jumping far ahead on a large
    /// listing (e.g. to its last page) therefore reads the sort keys of
    /// nearly the whole listing.
    async fn seek(&self, selector: &list::Selector) -> Result<(), Traced<Error>> {
        let size = selector.page_size.get();
        let (start, from) = self
            .state
            .borrow()
            .cursors
            .nearest_before(selector.page)
            .map_or((0, None), |(p, c)| (p, Some(c.clone())));
        let count = (selector.page - 1 - start).saturating_mul(size);

        tracing::debug!(
            page = selector.page,
            from = start,
            count,
            "seeking `User`s page start",
        );
        let keys = self
            .service
            .execute(users::Select::by(statement::user::seek(
                &selector.filter,
                from.as_ref(),
                count,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> Error))?;

        let scope = selector.scope();
        let mut state = self.state.borrow_mut();
        for (i, chunk) in keys.chunks_exact(size).enumerate() {
            if let Some(last) = chunk.last() {
                _ = state.cursors.insert(&scope, start + i + 1, last.sort_key());
            }
        }
        Ok(())
    }
}

/// Error of a [`Lookup`] operation.
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Store error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requested page doesn't exist.
    #[display("page {page} is out of range of {total_pages} pages")]
    #[from(ignore)]
    PageOutOfRange {
        /// Requested page.
        page: usize,

        /// Total number of pages.
        total_pages: usize,
    },
}

#[cfg(test)]
mod spec {
    use std::num::NonZeroUsize;

    use futures::executor::block_on;

    use crate::{
        domain::{user, User},
        infra::Memory,
        Config, Service,
    };

    use super::{Error, Lookup};

    const FIRST: [&str; 4] = ["Ann", "Bob", "John", "Zoe"];
    const LAST: [&str; 3] = ["Doe", "Lee", "Smith"];

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// Generates `n` eligible [`User`]s with many name collisions and IDs
    /// unrelated to the insertion order, plus a few ineligible ones.
    fn users(n: usize) -> Vec<User> {
        let eligible = (0..n).map(|i| User {
            id: format!("{:04}", (i * 37) % 9973).into(),
            first_name: FIRST[i % FIRST.len()].to_owned(),
            last_name: LAST[(i / FIRST.len()) % LAST.len()].to_owned(),
            email: format!("u{i}@corp.io"),
            disabled: Some(false),
            domain: Some(format!("corp\\u{i}")),
            title: Some("Clerk".to_owned()),
        });
        let ineligible = [
            User {
                disabled: Some(true),
                ..User::provisional("off@corp.io")
            },
            User {
                disabled: Some(false),
                title: None,
                ..User::provisional("untitled@corp.io")
            },
        ]
        .into_iter()
        .enumerate()
        .map(|(i, u)| User {
            id: format!("x{i}").into(),
            first_name: "Ann".to_owned(),
            domain: Some("corp".to_owned()),
            ..u
        });
        eligible.chain(ineligible).collect()
    }

    fn sorted(mut users: Vec<User>) -> Vec<User> {
        users.retain(|u| {
            u.disabled == Some(false) && u.domain.is_some() && u.title.is_some()
        });
        users.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        users
    }

    fn lookup(db: &Memory) -> Lookup<Memory> {
        Service::new(Config::default(), db.clone()).lookup()
    }

    #[test]
    fn walks_forward_without_gaps_or_duplicates() {
        let all = users(23);
        let db = Memory::new(all.clone());
        let lookup = lookup(&db);

        let mut walked = Vec::new();
        for page in 1..=5 {
            let p = block_on(lookup.fetch_page(page, None)).unwrap();
            assert_eq!(p.info.total_count, 23);
            assert_eq!(p.info.has_next_page(), page < 5);
            walked.extend(p.items);
        }
        assert_eq!(walked, sorted(all));
        assert_eq!(lookup.cached_pages(), 5);
        // One count and one page request per page.
        assert_eq!(db.requests(), 6);
    }

    #[test]
    fn reports_last_page_of_large_listing() {
        let db = Memory::new(users(495));
        let lookup = lookup(&db);

        let first = block_on(lookup.fetch_page(1, None)).unwrap();
        assert_eq!(first.info.total_pages(), 99);

        let last = block_on(lookup.fetch_page(99, None)).unwrap();
        assert!(!last.info.has_next_page());
        assert!(last.info.has_previous_page());
        assert_eq!(last.items.len(), 5);
        assert!(matches!(
            block_on(lookup.fetch_page(100, None)).unwrap_err().into_inner(),
            Error::PageOutOfRange {
                page: 100,
                total_pages: 99,
            },
        ));
    }

    #[test]
    fn jumps_to_distant_page_exactly() {
        let all = users(60);
        let db = Memory::new(all.clone());
        let lookup = lookup(&db);
        let expected = sorted(all);

        let p7 = block_on(lookup.fetch_page(7, None)).unwrap();
        assert_eq!(p7.items, expected[30..35]);
        // Count, seek and page itself.
        assert_eq!(db.requests(), 3);
        assert_eq!(lookup.cached_pages(), 7);

        let p3 = block_on(lookup.fetch_page(3, None)).unwrap();
        assert_eq!(p3.items, expected[10..15]);
        assert_eq!(db.requests(), 4);

        let p10 = block_on(lookup.fetch_page(10, None)).unwrap();
        assert_eq!(p10.items, expected[45..50]);
        // Seeks from the nearest remembered page only.
        assert_eq!(db.requests(), 6);
        assert_eq!(lookup.cached_pages(), 10);
    }

    #[test]
    fn search_change_forgets_cursors() {
        let db = Memory::new(users(40));
        let lookup = lookup(&db);

        for page in 1..=3 {
            _ = block_on(lookup.fetch_page(page, None)).unwrap();
        }
        assert_eq!(lookup.cached_pages(), 3);

        let found = block_on(lookup.fetch_page(1, Some("jo"))).unwrap();
        assert_eq!(lookup.cached_pages(), 1);
        assert_eq!(found.info.total_count, 10);
        assert!(found.items.iter().all(|u| u.first_name == "John"));

        // Blank search is the same as no search at all.
        _ = block_on(lookup.fetch_page(1, Some("  "))).unwrap();
        let requests = db.requests();
        _ = block_on(lookup.fetch_page(1, None)).unwrap();
        assert_eq!(db.requests(), requests + 1);
    }

    #[test]
    fn matches_full_name_in_both_orders() {
        let person = |id: &str, first: &str, last: &str| User {
            id: id.into(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            email: format!("{id}@corp.io"),
            disabled: Some(false),
            domain: Some("corp".to_owned()),
            title: Some("Clerk".to_owned()),
        };
        let db = Memory::new([
            person("1", "John", "Doe"),
            person("2", "Doe", "John"),
            person("3", "Johnny", "Doerr"),
            person("4", "Jane", "Doe"),
        ]);
        let lookup = lookup(&db);

        let found = block_on(lookup.fetch_page(1, Some("John Doe"))).unwrap();
        let ids = found
            .items
            .iter()
            .map(|u| u.id.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["2", "1", "3"]);
    }

    #[test]
    fn page_size_change_forgets_cursors() {
        let db = Memory::new(users(30));
        let lookup = lookup(&db);
        _ = block_on(lookup.fetch_page(1, None)).unwrap();
        _ = block_on(lookup.fetch_page(2, None)).unwrap();

        lookup.set_page_size(size(10));
        assert_eq!(lookup.cached_pages(), 0);

        let p = block_on(lookup.fetch_page(2, None)).unwrap();
        assert_eq!(p.items.len(), 10);
        assert_eq!(p.info.total_pages(), 3);
    }

    #[test]
    fn keeps_cursors_on_failure() {
        let db = Memory::new(users(30));
        let lookup = lookup(&db);
        _ = block_on(lookup.fetch_page(1, None)).unwrap();

        db.set_available(false);
        let err = block_on(lookup.fetch_page(2, None)).unwrap_err();
        assert!(matches!(err.into_inner(), Error::Db(_)));
        assert_eq!(lookup.cached_pages(), 1);

        db.set_available(true);
        let p = block_on(lookup.fetch_page(2, None)).unwrap();
        assert_eq!(p.items.len(), 5);
    }

    #[test]
    fn clear_cache_refetches_count() {
        let db = Memory::new(users(12));
        let lookup = lookup(&db);
        _ = block_on(lookup.fetch_page(1, None)).unwrap();
        assert_eq!(db.requests(), 2);

        lookup.clear_cache();
        assert_eq!(lookup.cached_pages(), 0);
        _ = block_on(lookup.fetch_page(1, None)).unwrap();
        assert_eq!(db.requests(), 4);
    }

    #[test]
    fn empty_listing_has_single_page() {
        let db = Memory::new(users(10));
        let lookup = lookup(&db);

        let p = block_on(lookup.fetch_page(1, Some("nobody"))).unwrap();
        assert!(p.items.is_empty());
        assert_eq!(p.info.total_pages(), 0);
        assert!(!p.info.has_next_page());
        assert!(matches!(
            block_on(lookup.fetch_page(0, None)).unwrap_err().into_inner(),
            Error::PageOutOfRange { page: 0, .. },
        ));
    }

    #[test]
    fn reports_store_failure_as_error_source() {
        let db = Memory::new(users(3));
        db.set_available(false);
        let lookup = lookup(&db);

        let err = block_on(lookup.fetch_page(1, None))
            .unwrap_err()
            .into_inner();
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("`Memory` store is unavailable"));
    }

    #[test]
    fn fetches_by_ids() {
        let all = users(10);
        let db = Memory::new(all.clone());
        let lookup = lookup(&db);

        let found = block_on(lookup.fetch_by_ids([
            all[3].id.clone(),
            user::Id::from("missing"),
            all[1].id.clone(),
        ]))
        .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&all[1]));
        assert!(found.contains(&all[3]));

        assert_eq!(
            block_on(lookup.fetch_by_id(all[2].id.clone())).unwrap(),
            Some(all[2].clone()),
        );
        assert_eq!(
            block_on(lookup.fetch_by_id("missing".into())).unwrap(),
            None,
        );
    }

    #[test]
    fn skips_request_for_no_ids() {
        let db = Memory::new(users(3));
        let lookup = lookup(&db);

        assert!(block_on(lookup.fetch_by_ids([])).unwrap().is_empty());
        assert!(block_on(lookup.fetch_by_ids([user::Id::from("")]))
            .unwrap()
            .is_empty());
        assert_eq!(block_on(lookup.fetch_by_id("".into())).unwrap(), None);
        assert_eq!(db.requests(), 0);
    }
}
