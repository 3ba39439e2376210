//! [`User`] definitions.

pub mod email;

use derive_more::{AsRef, Display, From, Into};

pub use self::email::Email;

/// User eligible to be picked in a lookup.
///
/// A [`User`] is a snapshot of the store at the moment it was fetched: a
/// later fetch of the same [`Id`] may return different data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct User {
    /// ID of this [`User`].
    ///
    /// Empty for provisional [`User`]s known by their email address only.
    pub id: Id,

    /// First name of this [`User`].
    pub first_name: String,

    /// Last name of this [`User`].
    pub last_name: String,

    /// Email address of this [`User`].
    ///
    /// Kept as-is from the store, so may be empty or malformed.
    pub email: String,

    /// Indicator whether this [`User`] is disabled, if known.
    pub disabled: Option<bool>,

    /// Domain name of this [`User`].
    pub domain: Option<String>,

    /// Job title of this [`User`].
    pub title: Option<String>,
}

impl User {
    /// Creates a provisional [`User`] known only by its email `address`.
    #[must_use]
    pub fn provisional(address: impl Into<String>) -> Self {
        Self {
            email: address.into(),
            ..Self::default()
        }
    }

    /// Indicates whether this [`User`] is provisional.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.id.is_empty()
    }

    /// Returns the full name of this [`User`].
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Returns the [`SortKey`] of this [`User`].
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            id: self.id.clone(),
        }
    }

    /// Indicates whether this [`User`] and the `other` one denote the same
    /// person.
    ///
    /// IDs are compared when both are known, email addresses otherwise.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        if !self.id.is_empty() && !other.id.is_empty() {
            return self.id == other.id;
        }
        let (a, b) = (self.email.trim(), other.email.trim());
        !a.is_empty() && a.eq_ignore_ascii_case(b)
    }

    /// Returns the value of the provided [`Field`] of this [`User`].
    #[must_use]
    pub fn get(&self, field: Field) -> Option<Value<'_>> {
        Some(match field {
            Field::Id => Value::Text(self.id.as_ref()),
            Field::FirstName => Value::Text(&self.first_name),
            Field::LastName => Value::Text(&self.last_name),
            Field::Email => Value::Text(&self.email),
            Field::Disabled => Value::Bool(self.disabled?),
            Field::Domain => Value::Text(self.domain.as_deref()?),
            Field::Title => Value::Text(self.title.as_deref()?),
        })
    }
}

/// ID of a [`User`].
///
/// Opaque to this crate: only compared and passed back to the store.
#[derive(
    AsRef,
    Clone,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[as_ref(str)]
#[from(String, &str)]
pub struct Id(String);

impl Id {
    /// Indicates whether this [`Id`] is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Position of a [`User`] in the listing order.
///
/// The trailing [`Id`] makes every [`SortKey`] unique.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SortKey {
    /// First name of the [`User`].
    pub first_name: String,

    /// Last name of the [`User`].
    pub last_name: String,

    /// ID of the [`User`].
    pub id: Id,
}

impl SortKey {
    /// Returns [`Field`]s of a [`SortKey`] along with their values.
    #[must_use]
    pub fn fields(&self) -> [(Field, &str); 3] {
        [
            (Field::FirstName, &self.first_name),
            (Field::LastName, &self.last_name),
            (Field::Id, self.id.as_ref()),
        ]
    }
}

/// Attribute of a [`User`] known to the store.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Field {
    /// [`User::id`].
    #[display("systemuserid")]
    Id,

    /// [`User::first_name`].
    #[display("firstname")]
    FirstName,

    /// [`User::last_name`].
    #[display("lastname")]
    LastName,

    /// [`User::email`].
    #[display("internalemailaddress")]
    Email,

    /// [`User::disabled`].
    #[display("isdisabled")]
    Disabled,

    /// [`User::domain`].
    #[display("domainname")]
    Domain,

    /// [`User::title`].
    #[display("title")]
    Title,
}

impl Field {
    /// All the [`Field`]s of a [`User`].
    pub const ALL: [Self; 7] = [
        Self::Id,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Disabled,
        Self::Domain,
        Self::Title,
    ];

    /// [`Field`]s making up a [`SortKey`].
    pub const SORT_KEY: [Self; 3] = [Self::FirstName, Self::LastName, Self::Id];
}

/// Value of a [`Field`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Value<'v> {
    /// Textual value.
    Text(&'v str),

    /// Boolean value.
    Bool(bool),
}
