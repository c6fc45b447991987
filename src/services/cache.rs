// src/services/cache.rs

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::common::error::AppError;

/// Cache de leitura por loja. Toda escrita na tabela de origem chama
/// `invalidate` depois do commit. Cada invalidação incrementa a geração da
/// loja; uma carga que começou antes dela não é gravada.
pub struct StoreCache<V> {
    entries: DashMap<Uuid, Arc<V>>,
    generations: DashMap<Uuid, u64>,
}

impl<V> Default for StoreCache<V> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
        }
    }
}

impl<V: Send + Sync> StoreCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load<F, Fut>(&self, store_id: Uuid, load: F) -> Result<Arc<V>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        if let Some(hit) = self.entries.get(&store_id) {
            return Ok(Arc::clone(hit.value()));
        }

        let started_at = self.generation(store_id);
        let value = Arc::new(load().await?);

        // Compara e grava segurando a entrada da geração: `invalidate` espera.
        let generation = self.generations.entry(store_id).or_insert(0);
        if *generation == started_at {
            self.entries.insert(store_id, Arc::clone(&value));
        } else {
            tracing::debug!(%store_id, "Carga descartada: cache invalidado durante a leitura");
        }
        drop(generation);

        Ok(value)
    }

    pub fn invalidate(&self, store_id: Uuid) {
        let mut generation = self.generations.entry(store_id).or_insert(0);
        *generation += 1;
        self.entries.remove(&store_id);
    }

    fn generation(&self, store_id: Uuid) -> u64 {
        self.generations.get(&store_id).map(|g| *g).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache: StoreCache<Vec<i32>> = StoreCache::new();
        let loads = AtomicUsize::new(0);
        let store = Uuid::new_v4();

        for _ in 0..3 {
            let v = cache
                .get_or_load(store, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .expect("load");
            assert_eq!(*v, vec![1, 2, 3]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_reload_only_for_that_store() {
        let cache: StoreCache<u32> = StoreCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        cache.get_or_load(a, || async { Ok(1) }).await.expect("a");
        cache.get_or_load(b, || async { Ok(10) }).await.expect("b");
        cache.invalidate(a);

        assert_eq!(*cache.get_or_load(a, || async { Ok(2) }).await.expect("a"), 2);
        assert_eq!(*cache.get_or_load(b, || async { Ok(99) }).await.expect("b"), 10);
    }

    #[tokio::test]
    async fn load_racing_an_invalidation_is_not_stored() {
        let cache: StoreCache<u32> = StoreCache::new();
        let store = Uuid::new_v4();

        let stale = cache
            .get_or_load(store, || async {
                // Escrita concorrente durante a leitura
                cache.invalidate(store);
                Ok(1)
            })
            .await
            .expect("load");
        assert_eq!(*stale, 1);

        let fresh = cache.get_or_load(store, || async { Ok(2) }).await.expect("load");
        assert_eq!(*fresh, 2);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache: StoreCache<u32> = StoreCache::new();
        let store = Uuid::new_v4();

        let err = cache
            .get_or_load(store, || async { Err(AppError::ResourceNotFound("x".into())) })
            .await;
        assert!(err.is_err());
        assert_eq!(*cache.get_or_load(store, || async { Ok(7) }).await.expect("load"), 7);
    }
}
