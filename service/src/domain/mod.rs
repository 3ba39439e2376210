//! Domain definitions.

pub mod selection;
pub mod user;

pub use self::{selection::Selection, user::User};
