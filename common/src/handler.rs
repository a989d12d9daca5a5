//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// Returned futures are [`Send`], so a [`Handler`] may be driven from any
/// worker thread of a multi-threaded runtime.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>> + Send;
}
