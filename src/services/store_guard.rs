//! Acceso acotado al store
//!
//! Toda llamada al `FleetStore` desde los servicios pasa por aquí: se
//! limita en tiempo (`Unavailable` al vencer) y los fallos transitorios se
//! reintentan un número acotado de veces. Conflict, NotFound y el resto de
//! errores de dominio nunca se reintentan.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::repositories::FleetStore;
use crate::utils::errors::{AppError, AppResult};

const BASE_BACKOFF_MS: u64 = 50;

/// Límites de acceso al store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorePolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 2,
        }
    }
}

#[derive(Clone)]
pub struct GuardedStore {
    store: Arc<dyn FleetStore>,
    policy: StorePolicy,
}

impl GuardedStore {
    pub fn new(store: Arc<dyn FleetStore>, policy: StorePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> StorePolicy {
        self.policy
    }

    /// Ejecutar una operación del store con timeout y reintentos.
    ///
    /// Un timeout no se reintenta: la operación pudo haberse confirmado.
    pub async fn call<T, F, Fut>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Fn(Arc<dyn FleetStore>) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;

        loop {
            let outcome =
                match tokio::time::timeout(self.policy.timeout, call(Arc::clone(&self.store))).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        return Err(AppError::Unavailable(format!(
                            "{} did not complete within {} ms",
                            operation,
                            self.policy.timeout.as_millis()
                        )));
                    }
                };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    warn!(
                        "⚠️ {} falló de forma transitoria (intento {}): {}. Reintentando en {:?}",
                        operation, attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    return Err(AppError::Unavailable(format!(
                        "{} failed after {} retries: {}",
                        operation, attempt, e
                    )));
                }
                other => return other,
            }
        }
    }
}

/// Backoff exponencial con jitter
fn backoff(attempt: u32) -> Duration {
    let base = BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.min(6));
    let jitter = rand::thread_rng().gen_range(0..=base / 2);
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryFleetStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn guarded(max_retries: u32, timeout: Duration) -> GuardedStore {
        GuardedStore::new(
            Arc::new(InMemoryFleetStore::new()),
            StorePolicy {
                timeout,
                max_retries,
            },
        )
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_then_surface_unavailable() {
        let store = guarded(2, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = store
            .call("probe", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Database(sqlx::Error::PoolTimedOut)) }
            })
            .await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_conflicts_are_not_retried() {
        let store = guarded(5, Duration::from_secs(1));
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = store
            .call("probe", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Conflict("taken".into())) }
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = guarded(0, Duration::from_millis(20));

        let result: AppResult<()> = store
            .call("probe", |_| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
    }

    #[test]
    fn test_backoff_grows() {
        assert!(backoff(1) >= Duration::from_millis(100));
        assert!(backoff(3) >= Duration::from_millis(400));
    }
}
