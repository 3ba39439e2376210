//! [`Selection`] definitions.

use serde::Deserialize;

use super::user::{email, User};

/// Mode of picking [`User`]s into a [`Selection`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only a single [`User`] may be picked at a time.
    Single,

    /// Any number of [`User`]s may be picked.
    #[default]
    Multi,
}

/// [`User`]s picked by a person, in the order of picking.
///
/// Membership doesn't depend on which page is displayed: a [`Selection`] is
/// never touched by paging or searching.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    /// [`Mode`] of this [`Selection`].
    mode: Mode,

    /// Picked [`User`]s, no two of them being [`User::is_same()`].
    users: Vec<User>,
}

impl Selection {
    /// Creates a new empty [`Selection`].
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            users: Vec::new(),
        }
    }

    /// Restores a [`Selection`] out of a previously persisted field value.
    ///
    /// The restored [`User`]s are provisional until [`Selection::refresh()`]
    /// meets their full records.
    #[must_use]
    pub fn seed(mode: Mode, saved: impl Into<email::Value>) -> Self {
        let mut this = Self::new(mode);
        for address in saved.into().normalize() {
            let user = User::provisional(address);
            if !this.is_selected(&user) {
                this.users.push(user);
            }
        }
        if mode == Mode::Single {
            this.users.truncate(1);
        }
        this
    }

    /// Returns the picked [`User`]s.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Returns the number of picked [`User`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Indicates whether nothing is picked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Indicates whether the provided [`User`] is picked.
    #[must_use]
    pub fn is_selected(&self, user: &User) -> bool {
        self.users.iter().any(|u| u.is_same(user))
    }

    /// Unpicks the provided [`User`] if picked, or picks it otherwise.
    ///
    /// Returns whether the [`User`] is picked afterwards.
    pub fn toggle(&mut self, user: User) -> bool {
        if let Some(pos) = self.users.iter().position(|u| u.is_same(&user)) {
            drop(self.users.remove(pos));
            return false;
        }
        match self.mode {
            Mode::Single => self.users = vec![user],
            Mode::Multi => self.users.push(user),
        }
        true
    }

    /// Replaces provisional [`User`]s with their full records found among
    /// the provided ones.
    pub fn refresh<'u>(&mut self, fetched: impl IntoIterator<Item = &'u User>) {
        for user in fetched {
            if let Some(picked) = self
                .users
                .iter_mut()
                .find(|u| u.is_provisional() && u.is_same(user))
            {
                *picked = user.clone();
            }
        }
    }

    /// Renders this [`Selection`] into a persisted field value.
    #[must_use]
    pub fn serialize(&self) -> String {
        email::join(self.users.iter().map(|u| u.email.as_str()))
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use crate::domain::user::{Id, User};

    use super::{Mode, Selection};

    fn user(id: &str, email: &str) -> User {
        User {
            id: Id::from(id),
            first_name: id.to_uppercase(),
            email: email.to_owned(),
            ..User::default()
        }
    }

    #[test]
    fn toggles_membership() {
        let mut sel = Selection::new(Mode::Multi);
        assert!(sel.toggle(user("1", "a@x.io")));
        assert!(sel.toggle(user("2", "b@x.io")));
        assert!(sel.is_selected(&user("1", "a@x.io")));

        assert!(!sel.toggle(user("1", "a@x.io")));
        assert!(!sel.is_selected(&user("1", "a@x.io")));
        assert_eq!(sel.len(), 1);

        assert!(sel.toggle(user("1", "a@x.io")));
        let ids = sel
            .users()
            .iter()
            .map(|u| u.id.clone())
            .collect::<HashSet<_>>();
        assert_eq!(ids, HashSet::from([Id::from("1"), Id::from("2")]));
    }

    #[test]
    fn single_mode_keeps_one() {
        let mut sel = Selection::new(Mode::Single);
        assert!(sel.toggle(user("1", "a@x.io")));
        assert!(sel.toggle(user("2", "b@x.io")));
        assert_eq!(sel.users(), &[user("2", "b@x.io")]);
        assert!(!sel.toggle(user("2", "b@x.io")));
        assert!(sel.is_empty());
    }

    #[test]
    fn matches_by_id_before_email() {
        let mut sel = Selection::new(Mode::Multi);
        _ = sel.toggle(user("1", "shared@x.io"));
        assert!(!sel.is_selected(&user("2", "shared@x.io")));
        assert!(sel.is_selected(&User::provisional("SHARED@x.io")));
    }

    #[test]
    fn serializes_skipping_blank_emails() {
        let mut sel = Selection::new(Mode::Multi);
        _ = sel.toggle(user("1", "a@x.io"));
        _ = sel.toggle(user("2", "  "));
        _ = sel.toggle(user("3", "c@x.io"));
        assert_eq!(sel.serialize(), "a@x.io;c@x.io");
    }

    #[test]
    fn seed_round_trips_serialized_emails() {
        let mut sel = Selection::new(Mode::Multi);
        _ = sel.toggle(user("1", "a@x.io"));
        _ = sel.toggle(user("2", "b@x.io"));

        let seeded = Selection::seed(Mode::Multi, sel.serialize());
        let emails = |s: &Selection| {
            s.users().iter().map(|u| u.email.clone()).collect::<HashSet<_>>()
        };
        assert_eq!(emails(&seeded), emails(&sel));
        assert!(seeded.users().iter().all(User::is_provisional));
        assert!(seeded.is_selected(&user("1", "a@x.io")));
    }

    #[test]
    fn seed_drops_blanks_and_duplicates() {
        let sel = Selection::seed(Mode::Multi, " a@x.io ; ;a@x.io;b@x.io ");
        assert_eq!(sel.serialize(), "a@x.io;b@x.io");

        let single = Selection::seed(Mode::Single, "a@x.io;b@x.io");
        assert_eq!(single.serialize(), "a@x.io");
    }

    #[test]
    fn refresh_replaces_provisional_records() {
        let mut sel = Selection::seed(Mode::Multi, "a@x.io;z@x.io");
        sel.refresh(&[user("1", "a@x.io"), user("2", "b@x.io")]);

        assert_eq!(sel.users()[0], user("1", "a@x.io"));
        assert!(sel.users()[1].is_provisional());
        assert_eq!(sel.len(), 2);
    }
}
