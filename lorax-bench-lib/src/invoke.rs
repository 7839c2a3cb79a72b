use rama::error::BoxError;

use crate::TargetId;

/// Issues a single blocking request against the benchmarked service.
///
/// Latency is measured by the calling worker around [`Invoke::invoke`],
/// implementations only report whether the request succeeded.
/// Timeouts and retries, if any, are the responsibility of the implementation.
pub trait Invoke: Send + Sync {
    fn invoke(&self, target: &TargetId) -> Result<(), BoxError>;
}

impl<F, E> Invoke for F
where
    F: Fn(&TargetId) -> Result<(), E> + Send + Sync,
    E: Into<BoxError>,
{
    fn invoke(&self, target: &TargetId) -> Result<(), BoxError> {
        (self)(target).map_err(Into::into)
    }
}
