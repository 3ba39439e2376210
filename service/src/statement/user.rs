//! [`Statement`]s over the [`User`]s collection.

use std::iter;

use common::pagination::Order;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{self, Field, SortKey},
    read::user::list,
};

use super::{Filter, Literal, Statement};

/// Returns the [`Filter`] of [`User`]s allowed to be picked: enabled ones
/// having both a domain name and a title.
#[must_use]
pub fn eligible() -> Filter {
    Filter::All(vec![
        Filter::Eq(Field::Disabled, false.into()),
        Filter::NotNull(Field::Domain),
        Filter::NotNull(Field::Title),
    ])
}

/// Returns the [`Filter`] of [`User`]s matching the provided search `term`,
/// if it's not blank.
///
/// The `term` is matched as a prefix of the first name, the last name or the
/// email address. A `term` of exactly two words additionally matches the
/// "First Last" and "Last First" spellings of a full name.
#[must_use]
pub fn search(term: &str) -> Option<Filter> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let mut any = vec![
        Filter::StartsWith(Field::FirstName, term.to_owned()),
        Filter::StartsWith(Field::LastName, term.to_owned()),
        Filter::StartsWith(Field::Email, term.to_owned()),
    ];
    let words = term.split_whitespace().collect::<Vec<_>>();
    if let [one, two] = words[..] {
        for (first, last) in [(one, two), (two, one)] {
            any.push(Filter::All(vec![
                Filter::StartsWith(Field::FirstName, first.to_owned()),
                Filter::StartsWith(Field::LastName, last.to_owned()),
            ]));
        }
    }
    Some(Filter::Any(any))
}

/// Returns the [`Filter`] of [`User`]s going strictly after the provided
/// [`SortKey`] in the listing [`order()`].
#[must_use]
pub fn after(cursor: &SortKey) -> Filter {
    let keys = cursor.fields();
    Filter::Any(
        (0..keys.len())
            .map(|i| {
                let (field, value) = keys[i];
                Filter::All(
                    keys[..i]
                        .iter()
                        .map(|&(f, v)| Filter::Eq(f, v.into()))
                        .chain(iter::once(Filter::Gt(field, value.into())))
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Returns the listing order: by first name, then last name, then ID.
#[must_use]
pub fn order() -> Vec<(Field, Order)> {
    Field::SORT_KEY
        .into_iter()
        .map(|f| (f, Order::Ascending))
        .collect()
}

/// Returns the [`Filter`] of the whole listing described by the provided
/// [`list::Filter`], regardless of any page.
#[must_use]
pub fn listing(filter: &list::Filter) -> Filter {
    let base = eligible();
    match filter.search.as_deref().and_then(search) {
        Some(search) => base.and(search),
        None => base,
    }
}

/// Builds the [`Statement`] selecting the page described by the provided
/// [`list::Selector`].
///
/// Returns [`None`] if the page isn't the first one and the end of the
/// previous page is unknown to the provided [`list::Cursors`].
#[must_use]
pub fn page(
    selector: &list::Selector,
    cursors: &list::Cursors,
) -> Option<Statement> {
    let mut filter = listing(&selector.filter);
    if selector.page > 1 {
        filter = filter.and(after(cursors.get(selector.page - 1)?));
    }
    Some(Statement {
        fields: Field::ALL.to_vec(),
        filter,
        order: order(),
        limit: Some(selector.page_size.get()),
    })
}

/// Builds the [`Statement`] selecting [`SortKey`]s of the `count` [`User`]s
/// of the listing following the `from` one (or from the very beginning).
#[must_use]
pub fn seek(
    filter: &list::Filter,
    from: Option<&SortKey>,
    count: usize,
) -> Statement {
    let filter = listing(filter);
    Statement {
        fields: Field::SORT_KEY.to_vec(),
        filter: match from {
            Some(cursor) => filter.and(after(cursor)),
            None => filter,
        },
        order: order(),
        limit: Some(count),
    }
}

/// Builds the [`Statement`] selecting [`User`]s by their [`user::Id`]s.
#[must_use]
pub fn by_ids(ids: &[user::Id]) -> Statement {
    Statement {
        fields: Field::ALL.to_vec(),
        filter: Filter::Any(
            ids.iter()
                .map(|id| Filter::Eq(Field::Id, Literal::from(id.as_ref())))
                .collect(),
        ),
        order: order(),
        limit: Some(ids.len()),
    }
}

#[cfg(test)]
mod spec {
    use std::num::NonZeroUsize;

    use crate::{
        domain::user::{Field, SortKey},
        read::user::list,
        statement::{Filter, Literal},
    };

    use super::{after, page, search, seek};

    fn selector(page: usize, search: Option<&str>) -> list::Selector {
        list::Selector {
            page,
            page_size: NonZeroUsize::new(5).unwrap(),
            filter: list::Filter::new(search),
        }
    }

    #[test]
    fn searches_single_word_by_prefix() {
        let filter = search("  jo ").unwrap();
        assert_eq!(
            filter,
            Filter::Any(vec![
                Filter::StartsWith(Field::FirstName, "jo".into()),
                Filter::StartsWith(Field::LastName, "jo".into()),
                Filter::StartsWith(Field::Email, "jo".into()),
            ]),
        );
        assert_eq!(search("   "), None);
    }

    #[test]
    fn searches_two_words_in_both_orders() {
        let Filter::Any(any) = search("John Doe").unwrap() else {
            panic!("expected disjunction");
        };
        assert_eq!(any.len(), 5);
        assert!(any.contains(&Filter::StartsWith(
            Field::FirstName,
            "John Doe".into(),
        )));
        assert!(any.contains(&Filter::All(vec![
            Filter::StartsWith(Field::FirstName, "John".into()),
            Filter::StartsWith(Field::LastName, "Doe".into()),
        ])));
        assert!(any.contains(&Filter::All(vec![
            Filter::StartsWith(Field::FirstName, "Doe".into()),
            Filter::StartsWith(Field::LastName, "John".into()),
        ])));

        let Filter::Any(three) = search("John Q Doe").unwrap() else {
            panic!("expected disjunction");
        };
        assert_eq!(three.len(), 3);
    }

    #[test]
    fn escapes_quotes_when_rendered() {
        let rendered = search("O'Neil").unwrap().to_string();
        assert!(rendered.contains("startswith(lastname,'O''Neil')"));
        assert!(!rendered.contains("'O'N"));
    }

    #[test]
    fn compares_whole_sort_key() {
        let cursor = SortKey {
            first_name: "John".into(),
            last_name: "Doe".into(),
            id: "7".into(),
        };
        assert_eq!(
            after(&cursor),
            Filter::Any(vec![
                Filter::All(vec![Filter::Gt(
                    Field::FirstName,
                    Literal::from("John"),
                )]),
                Filter::All(vec![
                    Filter::Eq(Field::FirstName, "John".into()),
                    Filter::Gt(Field::LastName, "Doe".into()),
                ]),
                Filter::All(vec![
                    Filter::Eq(Field::FirstName, "John".into()),
                    Filter::Eq(Field::LastName, "Doe".into()),
                    Filter::Gt(Field::Id, "7".into()),
                ]),
            ]),
        );
    }

    #[test]
    fn first_page_needs_no_cursor() {
        let stmt = page(&selector(1, None), &list::Cursors::default()).unwrap();
        assert_eq!(stmt.limit, Some(5));
        assert!(!stmt.to_string().contains(" gt "));
        assert!(stmt.to_string().contains("isdisabled eq false"));
    }

    #[test]
    fn further_page_needs_previous_cursor() {
        let sel = selector(3, Some("jo"));
        let mut cursors = list::Cursors::default();
        _ = cursors.rescope(sel.scope());
        assert!(page(&sel, &cursors).is_none());

        let key = SortKey {
            first_name: "Jo".into(),
            last_name: "B".into(),
            id: "2".into(),
        };
        assert!(cursors.insert(&sel.scope(), 2, key));
        let stmt = page(&sel, &cursors).unwrap();
        assert!(stmt.to_string().contains("systemuserid gt '2'"));
    }

    #[test]
    fn seek_selects_sort_keys_only() {
        let stmt = seek(&list::Filter::default(), None, 15);
        assert_eq!(stmt.fields, Field::SORT_KEY.to_vec());
        assert_eq!(stmt.limit, Some(15));
    }
}
