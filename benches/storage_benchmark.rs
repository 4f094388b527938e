use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use storefront_engine::{
    storage::CART_KEY, CartStore, GameRecord, KeyValueStore, MemoryStore, SourceKind, SqliteStore,
};

fn game(i: usize) -> GameRecord {
    let mut game = GameRecord::new(SourceKind::Static, i.to_string(), format!("Game {}", i));
    game.price = Some(19.99);
    game
}

fn bench_sqlite_kv(c: &mut Criterion) {
    let store = SqliteStore::open(":memory:").unwrap();
    store.set("bench", "{\"value\":1}").unwrap();

    c.bench_function("sqlite_get_hit", |b| {
        b.iter(|| black_box(store.get("bench").unwrap()));
    });

    c.bench_function("sqlite_get_miss", |b| {
        b.iter(|| black_box(store.get("nonexistent").unwrap()));
    });

    c.bench_function("sqlite_set", |b| {
        b.iter(|| black_box(store.set("bench", "{\"value\":2}").unwrap()));
    });
}

fn bench_cart_persistence(c: &mut Criterion) {
    let sqlite: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(":memory:").unwrap());
    let memory: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    for (label, storage) in [("sqlite", sqlite), ("memory", memory)] {
        let mut cart = CartStore::load(Arc::clone(&storage));
        for i in 0..20 {
            cart.add_to_cart(game(i));
        }

        c.bench_function(&format!("cart_add_20_lines_{}", label), |b| {
            b.iter(|| black_box(cart.add_to_cart(game(7)).item_count()));
        });

        c.bench_function(&format!("cart_load_{}", label), |b| {
            b.iter(|| black_box(CartStore::load(Arc::clone(&storage)).cart_total()));
        });

        storage.remove(CART_KEY).unwrap();
    }
}

criterion_group!(benches, bench_sqlite_kv, bench_cart_persistence);
criterion_main!(benches);
