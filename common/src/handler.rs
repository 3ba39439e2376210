//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// Queries, store operations and host-provided triggers are all expressed as
/// a [`Handler`] over the operation they accept.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
