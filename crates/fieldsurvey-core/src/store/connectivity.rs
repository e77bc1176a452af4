use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::{self, BoxFuture};

use super::error::StoreError;

/// "Are we online?" as reported by the hosting environment.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A connectivity flag the host flips by hand.
#[derive(Debug, Default)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Confirms pending records against the external system of record.
pub trait SyncConfirmer: Send + Sync {
    fn confirm(&self, pending: usize) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Accepts every sync immediately; the backend is assumed to converge.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalConfirmer;

impl SyncConfirmer for LocalConfirmer {
    fn confirm(&self, _pending: usize) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(future::ready(Ok(())))
    }
}
