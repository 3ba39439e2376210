//! Email address definitions.

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display};
use itertools::Itertools as _;
use regex::Regex;

/// Separator of email addresses in a persisted field value.
pub const SEPARATOR: char = ';';

/// Validated email address of a [`User`].
///
/// [`User`]: super::User
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Raw value of a field holding email addresses.
///
/// Hosts hand the same field over either as a list or as a single
/// [`SEPARATOR`]-delimited string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// Addresses as separate entries.
    List(Vec<String>),

    /// Addresses joined with [`SEPARATOR`].
    Delimited(String),
}

impl Default for Value {
    fn default() -> Self {
        Self::Delimited(String::new())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Delimited(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Delimited(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl Value {
    /// Returns trimmed non-empty addresses of this [`Value`] in their
    /// original order.
    #[must_use]
    pub fn normalize(&self) -> Vec<String> {
        let entries: Box<dyn Iterator<Item = &str>> = match self {
            Self::List(list) => Box::new(
                list.iter().flat_map(|entry| entry.split(SEPARATOR)),
            ),
            Self::Delimited(s) => Box::new(s.split(SEPARATOR)),
        };
        entries
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Indicates whether this [`Value`] holds no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.normalize().is_empty()
    }
}

/// Joins the provided `addresses` into a persisted field value, skipping
/// blank ones.
#[must_use]
pub fn join<'a>(addresses: impl IntoIterator<Item = &'a str>) -> String {
    addresses
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .join(&SEPARATOR.to_string())
}
