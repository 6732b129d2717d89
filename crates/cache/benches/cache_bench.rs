use cache::{Cache, CacheExt, CacheKey, EntryOptions, InMemoryCache};
use criterion::{Criterion, criterion_group, criterion_main};
use tokio_util::sync::CancellationToken;

fn bench_set_get(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = InMemoryCache::new();
    let cancel = CancellationToken::new();
    let key = CacheKey::entity("Property", uuid::Uuid::new_v4());

    c.bench_function("cache/set_get_json", |b| {
        b.iter(|| {
            rt.block_on(async {
                cache
                    .set_json(&key, &"Casa Azul", EntryOptions::default(), &cancel)
                    .await
                    .unwrap();
                let _: Option<String> = cache.get_json(&key, &cancel).await.unwrap();
            });
        });
    });
}

fn bench_remove_absent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = InMemoryCache::new();
    let cancel = CancellationToken::new();

    c.bench_function("cache/remove_absent", |b| {
        b.iter(|| {
            rt.block_on(async {
                let key = CacheKey::entity("Property", uuid::Uuid::new_v4());
                cache.remove(&key, &cancel).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_set_get, bench_remove_absent);
criterion_main!(benches);
