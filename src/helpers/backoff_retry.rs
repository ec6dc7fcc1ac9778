use std::fmt::Display;
use std::time::Duration;

use backoff::{retry_notify, Error, ExponentialBackoffBuilder};

/// Retry `fn_to_try` with exponential backoff until it succeeds, returns a
/// permanent error, or `max_elapsed` has passed
pub fn backoff_retry<F, T, E>(
    initial_interval: Duration,
    max_elapsed: Duration,
    fn_to_try: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, Error<E>>,
    E: Display,
{
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(initial_interval)
        .with_max_elapsed_time(Some(max_elapsed))
        .build();

    let notify = |err, dur: Duration| {
        log::warn!(
            "Temporary error after {:.1}s: {}",
            dur.as_secs_f32(),
            err
        );
    };

    retry_notify(policy, fn_to_try, notify).map_err(|e| match e {
        Error::Permanent(err) => err,
        Error::Transient { err, .. } => err,
    })
}
