//! Running blocking HTTP calls from any calling context

use std::panic;
use std::thread;

use tokio::runtime::Handle;

/// Run `f`, which uses the blocking `reqwest` client, where it may block
///
/// The blocking client panics when built, used or dropped on a thread that
/// is driving a tokio runtime. On such a thread `f` runs on a scoped helper
/// thread instead and the caller waits for it; elsewhere it runs inline.
pub(crate) fn off_runtime<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    if Handle::try_current().is_err() {
        return f();
    }
    thread::scope(|scope| match scope.spawn(f).join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    })
}
