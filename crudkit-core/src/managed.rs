//! Acquire/release lifecycle for scoped resources.
//!
//! A [`ManagedResource`] is obtained from some shared state, used for one
//! unit of work, and then released with the outcome of that work. Database
//! sessions are the main implementor: `release(true)` commits and
//! `release(false)` rolls back.
//!
//! [`run_managed`] drives the whole cycle so the release step cannot be
//! forgotten on an early return.

use std::future::Future;

/// A resource with a managed lifecycle (acquire, use, release).
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ManagedResource<{S}>`",
    label = "this type cannot be acquired from `{S}`",
    note = "implement `ManagedResource<S>` with `acquire()` and `release()` for your type"
)]
pub trait ManagedResource<S>: Sized {
    type Error;

    /// Obtain the resource from shared state.
    fn acquire(state: &S) -> impl Future<Output = Result<Self, Self::Error>> + Send;

    /// Finish the resource.
    ///
    /// - `success: true`: the unit of work completed (commit / flush)
    /// - `success: false`: the unit of work failed (rollback / discard)
    fn release(self, success: bool) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Acquire `R` from `state`, run `work` with it and release it with the
/// outcome of `work`.
///
/// The work's own error wins over a release error; a release error is only
/// reported when the work succeeded.
pub async fn run_managed<S, R, T, E, F>(state: &S, work: F) -> Result<T, E>
where
    R: ManagedResource<S>,
    R::Error: std::fmt::Display,
    E: From<R::Error>,
    F: for<'r> FnOnce(&'r mut R) -> std::pin::Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'r>>,
{
    let mut resource = R::acquire(state).await?;
    let result = work(&mut resource).await;
    match result {
        Ok(value) => {
            resource.release(true).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(release_err) = resource.release(false).await {
                tracing::warn!(error = %release_err, "Release after failed unit of work also failed");
            }
            Err(err)
        }
    }
}
