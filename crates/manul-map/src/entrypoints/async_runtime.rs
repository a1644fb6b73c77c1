//! Spawning background tasks on either platform
//!
//! Native tasks run on the tokio runtime entered by the native entry point.
//! In the browser there is a single thread, so tasks run on the JavaScript
//! event loop and need not be `Send`.

use std::future::Future;

/// Spawn a fire-and-forget task
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    #[cfg(feature = "profiling")]
    {
        tokio::spawn(async move {
            profiling::scope!("async_runtime::spawn");
            future.await
        });
    }
    #[cfg(not(feature = "profiling"))]
    {
        tokio::spawn(future);
    }
}

/// Spawn a fire-and-forget task
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_spawn_runs_on_current_runtime() {
        let (tx, rx) = oneshot::channel();
        spawn(async move {
            let _ = tx.send(42);
        });
        assert_eq!(rx.await.unwrap(), 42);
    }
}
