//! Service contains the business logic of picking [`User`]s in a lookup.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod domain;
pub mod infra;
pub mod lookup;
pub mod query;
pub mod read;
pub mod statement;

use std::num::NonZeroUsize;

use smart_default::SmartDefault;

#[cfg(doc)]
use domain::User;
#[cfg(doc)]
use infra::Database;

pub use self::{lookup::Lookup, query::Query};

/// Default number of [`User`]s on a page.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(size) => size,
    None => unreachable!(),
};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Number of [`User`]s on a page of a newly created [`Lookup`].
    #[default(DEFAULT_PAGE_SIZE)]
    pub page_size: NonZeroUsize,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Creates a new [`Lookup`] backed by this [`Service`].
    ///
    /// Every lookup control owns its own [`Lookup`].
    #[must_use]
    pub fn lookup(&self) -> Lookup<Db>
    where
        Db: Clone,
    {
        Lookup::new(self.clone())
    }
}
