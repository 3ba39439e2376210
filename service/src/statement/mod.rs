//! Store-agnostic description of a read over the [`User`]s collection.
//!
//! A [`Statement`] carries a projection, a [`Filter`], an ordering and a
//! limit. There is no offset: stores are only expected to support
//! filtering, ordering and limiting.

pub mod user;

use std::fmt;

use common::pagination::Order;
use itertools::Itertools as _;

use crate::domain::user::Field;
#[cfg(doc)]
use crate::domain::User;

/// Read over the [`User`]s collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Statement {
    /// [`Field`]s to be returned.
    pub fields: Vec<Field>,

    /// [`Filter`] the returned [`User`]s must satisfy.
    pub filter: Filter,

    /// Sort keys, from the most significant one.
    pub order: Vec<(Field, Order)>,

    /// Maximum number of [`User`]s to return, if any.
    pub limit: Option<usize>,
}

/// Literal compared against a [`Field`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Literal {
    /// Textual literal.
    Text(String),

    /// Boolean literal.
    Bool(bool),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Predicate over a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    /// Every inner [`Filter`] holds. Empty one always holds.
    All(Vec<Filter>),

    /// Any inner [`Filter`] holds. Empty one never holds.
    Any(Vec<Filter>),

    /// [`Field`] equals the [`Literal`].
    Eq(Field, Literal),

    /// [`Field`] doesn't equal the [`Literal`].
    Ne(Field, Literal),

    /// [`Field`] is strictly greater than the [`Literal`].
    Gt(Field, Literal),

    /// [`Field`] starts with the prefix.
    StartsWith(Field, String),

    /// [`Field`] has a value.
    NotNull(Field),
}

impl Filter {
    /// Returns a [`Filter`] holding for all the [`User`]s.
    #[must_use]
    pub const fn always() -> Self {
        Self::All(Vec::new())
    }

    /// Combines this [`Filter`] with the `other` one via conjunction.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All(mut all) => {
                all.push(other);
                Self::All(all)
            }
            this @ (Self::Any(_)
            | Self::Eq(..)
            | Self::Ne(..)
            | Self::Gt(..)
            | Self::StartsWith(..)
            | Self::NotNull(_)) => Self::All(vec![this, other]),
        }
    }
}

impl fmt::Display for Filter {
    /// Renders this [`Filter`] in `$filter` syntax, with quotes of textual
    /// [`Literal`]s escaped by doubling.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All(all) if all.is_empty() => write!(f, "true"),
            Self::Any(any) if any.is_empty() => write!(f, "false"),
            Self::All(all) => {
                write!(f, "({})", all.iter().format(" and "))
            }
            Self::Any(any) => write!(f, "({})", any.iter().format(" or ")),
            Self::Eq(field, lit) => write!(f, "{field} eq {lit}"),
            Self::Ne(field, lit) => write!(f, "{field} ne {lit}"),
            Self::Gt(field, lit) => write!(f, "{field} gt {lit}"),
            Self::StartsWith(field, prefix) => write!(
                f,
                "startswith({field},{})",
                Literal::Text(prefix.clone()),
            ),
            Self::NotNull(field) => write!(f, "{field} ne null"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "$select={}&$filter={}&$orderby={}",
            self.fields.iter().format(","),
            self.filter,
            self.order.iter().format_with(",", |(field, order), f| {
                f(&format_args!("{field} {}", order.keyword()))
            }),
        )?;
        if let Some(limit) = self.limit {
            write!(f, "&$top={limit}")?;
        }
        Ok(())
    }
}
