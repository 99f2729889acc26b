use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::cookies::CookieJar;
use crate::error::BoxError;

/// Where the auth cookies come from and where rotated ones go.
pub trait CredentialStore: Send + Sync {
    /// Stored cookies; an empty jar when nothing is configured.
    fn credentials(&self) -> Result<CookieJar, BoxError>;

    /// Persist the full jar after the service rotated a cookie.
    ///
    /// Called from the blocking thread pool, so file I/O here is fine.
    fn persist(&self, cookies: &CookieJar) -> Result<(), BoxError>;
}

/// Process-local [`CredentialStore`], for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    cookies: Mutex<CookieJar>,
    persist_count: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new(cookies: CookieJar) -> Self {
        Self {
            cookies: Mutex::new(cookies),
            persist_count: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> CookieJar {
        lock_unpoisoned(&self.cookies).clone()
    }

    /// Number of successful [`CredentialStore::persist`] calls.
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::Acquire)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn credentials(&self) -> Result<CookieJar, BoxError> {
        Ok(self.snapshot())
    }

    fn persist(&self, cookies: &CookieJar) -> Result<(), BoxError> {
        *lock_unpoisoned(&self.cookies) = cookies.clone();
        self.persist_count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
