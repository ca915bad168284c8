//! The blocking bridge.
//!
//! The shell runs as a plain synchronous loop; every remote call crosses this
//! bridge to execute on one shared Tokio runtime. Commands run one at a time,
//! so the calling thread is never inside the runtime when it blocks.

use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Global shared Tokio runtime.
static RUNTIME: Lazy<Arc<Runtime>> =
    Lazy::new(|| Arc::new(Runtime::new().expect("Failed to create global Tokio runtime")));

/// Run a future to completion on the shared runtime, blocking the calling
/// thread until it finishes.
///
/// No timeout or retry is layered on top; the future's own output, error
/// included, comes back unchanged.
pub fn wait<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_the_future_output() {
        assert_eq!(wait(async { 41 + 1 }), 42);
    }

    #[test]
    fn wait_propagates_errors_unchanged() {
        let res: Result<(), &str> = wait(async { Err("boom") });
        assert_eq!(res, Err("boom"));
    }

    #[test]
    fn wait_is_reusable_across_calls() {
        for i in 0..3i64 {
            assert_eq!(wait(async move { i * 2 }), i * 2);
        }
    }
}
