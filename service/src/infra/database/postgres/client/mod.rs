//! Postgres clients.

mod non_tx;

pub use self::non_tx::NonTx;
