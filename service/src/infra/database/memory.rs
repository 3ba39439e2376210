//! In-memory [`Database`] implementation.

use std::{
    cmp::Ordering,
    sync::{
        atomic::{self, AtomicBool, AtomicUsize},
        Arc,
    },
};

use common::{
    operations::{By, Select},
    pagination::Order,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        user::{Field, Value},
        User,
    },
    infra::database,
    read,
    statement::{Filter, Literal, Statement},
};

use super::Database;

/// [`Database`] keeping a fixed set of [`User`]s in memory.
///
/// Evaluates [`Statement`]s the way a remote store does: prefix matching is
/// case-insensitive, comparisons and ordering are by raw bytes.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored [`User`]s.
    users: Arc<Vec<User>>,

    /// Number of executed requests.
    requests: Arc<AtomicUsize>,

    /// Indicator whether requests fail with [`Error::Unavailable`].
    unavailable: Arc<AtomicBool>,
}

impl Memory {
    /// Creates a new [`Memory`] store holding the provided [`User`]s.
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: Arc::new(users.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Returns the number of requests executed so far, failed ones included.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(atomic::Ordering::SeqCst)
    }

    /// Makes all further requests fail (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, atomic::Ordering::SeqCst);
    }

    /// Accounts a new request, failing if this [`Memory`] is unavailable.
    fn request(&self) -> Result<(), Traced<database::Error>> {
        _ = self.requests.fetch_add(1, atomic::Ordering::SeqCst);
        if self.unavailable.load(atomic::Ordering::SeqCst) {
            return Err(tracerr::new!(database::Error::Memory(
                Error::Unavailable
            )));
        }
        Ok(())
    }
}

impl Database<Select<By<Vec<User>, Statement>>> for Memory {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, Statement>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.request().map_err(tracerr::wrap!())?;

        let Statement {
            fields,
            filter,
            order,
            limit,
        } = by.into_inner();

        let mut found = self
            .users
            .iter()
            .filter(|u| matches(&filter, u))
            .collect::<Vec<_>>();
        found.sort_by(|a, b| {
            order
                .iter()
                .map(|&(field, ord)| {
                    let cmp = compare(a.get(field), b.get(field));
                    match ord {
                        Order::Ascending => cmp,
                        Order::Descending => cmp.reverse(),
                    }
                })
                .find(|c| c.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        Ok(found
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|u| project(u, &fields))
            .collect())
    }
}

impl Database<Select<By<read::user::list::TotalCount, Filter>>> for Memory {
    type Ok = read::user::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::user::list::TotalCount, Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.request().map_err(tracerr::wrap!())?;

        let filter = by.into_inner();
        Ok(self.users.iter().filter(|u| matches(&filter, u)).count().into())
    }
}

/// Evaluates the provided [`Filter`] against the provided [`User`].
///
/// Missing values never satisfy a comparison.
fn matches(filter: &Filter, user: &User) -> bool {
    match filter {
        Filter::All(all) => all.iter().all(|f| matches(f, user)),
        Filter::Any(any) => any.iter().any(|f| matches(f, user)),
        Filter::Eq(field, lit) => {
            compare_literal(user.get(*field), lit) == Some(Ordering::Equal)
        }
        Filter::Ne(field, lit) => compare_literal(user.get(*field), lit)
            .is_some_and(Ordering::is_ne),
        Filter::Gt(field, lit) => {
            compare_literal(user.get(*field), lit) == Some(Ordering::Greater)
        }
        Filter::StartsWith(field, prefix) => match user.get(*field) {
            Some(Value::Text(text)) => {
                text.to_lowercase().starts_with(&prefix.to_lowercase())
            }
            Some(Value::Bool(_)) | None => false,
        },
        Filter::NotNull(field) => user.get(*field).is_some(),
    }
}

/// Compares the provided [`Value`] with the provided [`Literal`], if they are
/// comparable.
fn compare_literal(value: Option<Value<'_>>, lit: &Literal) -> Option<Ordering> {
    match (value?, lit) {
        (Value::Text(v), Literal::Text(l)) => Some(v.cmp(l.as_str())),
        (Value::Bool(v), Literal::Bool(l)) => Some(v.cmp(l)),
        (Value::Text(_), Literal::Bool(_))
        | (Value::Bool(_), Literal::Text(_)) => None,
    }
}

/// Compares the provided [`Value`]s for ordering, placing missing ones first.
fn compare(a: Option<Value<'_>>, b: Option<Value<'_>>) -> Ordering {
    match (a, b) {
        (Some(Value::Text(a)), Some(Value::Text(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(&b),
        (Some(Value::Text(_)), Some(Value::Bool(_))) => Ordering::Greater,
        (Some(Value::Bool(_)), Some(Value::Text(_))) => Ordering::Less,
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Copies the provided [`User`] keeping only the provided [`Field`]s.
fn project(user: &User, fields: &[Field]) -> User {
    let has = |f| fields.contains(&f);
    User {
        id: if has(Field::Id) { user.id.clone() } else { Default::default() },
        first_name: if has(Field::FirstName) {
            user.first_name.clone()
        } else {
            String::new()
        },
        last_name: if has(Field::LastName) {
            user.last_name.clone()
        } else {
            String::new()
        },
        email: if has(Field::Email) {
            user.email.clone()
        } else {
            String::new()
        },
        disabled: user.disabled.filter(|_| has(Field::Disabled)),
        domain: user.domain.clone().filter(|_| has(Field::Domain)),
        title: user.title.clone().filter(|_| has(Field::Title)),
    }
}

/// [`Memory`] store error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Memory`] store was made unavailable.
    #[display("`Memory` store is unavailable")]
    Unavailable,
}
