//! One lazily loaded guest instance, shared between callers
//!
//! Instantiating a guest module is expensive, so it happens once, on first use.
//! Concurrent first callers wait for the same load instead of racing each other.
//! Since guest allocators are not re-entrant, every user holds a lock on the
//! instance for the duration of its whole allocate/call/free cycle.

use std::future::Future;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, MutexGuard, OnceCell};

use crate::GuestError;

type Loader<M> = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<M>> + Send + Sync>;

pub struct SharedGuest<M> {
    instance: OnceCell<Mutex<M>>,
    loader: Loader<M>,
}

impl<M: Send + 'static> SharedGuest<M> {
    /// Defer loading to the first call of [Self::lock]. A failed load is not
    /// remembered; the next caller tries again.
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<M>> + Send + 'static,
    {
        Self {
            instance: OnceCell::new(),
            loader: Box::new(move || Box::pin(loader())),
        }
    }

    /// Wrap an instance that is already loaded
    pub fn ready(module: M) -> Self {
        Self {
            instance: OnceCell::new_with(Some(Mutex::new(module))),
            loader: Box::new(|| Box::pin(async { anyhow::bail!("guest module was preloaded") })),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.initialized()
    }

    /// Exclusive access to the instance, loading it first if necessary
    pub async fn lock(&self) -> Result<MutexGuard<'_, M>, GuestError> {
        let instance = self
            .instance
            .get_or_try_init(|| async {
                log::debug!("loading guest module");
                match (self.loader)().await {
                    Ok(module) => Ok(Mutex::new(module)),
                    Err(e) => {
                        log::warn!("loading guest module failed: {e:#}");
                        Err(GuestError::Instantiation(e))
                    }
                }
            })
            .await?;
        Ok(instance.lock().await)
    }
}
