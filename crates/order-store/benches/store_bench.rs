use chrono::{Duration, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use order_store::{
    InMemoryOrderStore, NewOrder, OrderStatus, OrderStore, OrderTx, ProductId, UserId,
};

fn make_order(user: i64, product: i64) -> NewOrder {
    NewOrder {
        product_id: ProductId::new(product),
        quantity: 3,
        user_id: UserId::new(user),
        status: OrderStatus::WaitingPayment,
        expires_at: Utc::now() + Duration::minutes(15),
    }
}

fn bench_create_commit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("order_store/create_commit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryOrderStore::new();
                let mut tx = store.begin().await.unwrap();
                tx.create(make_order(1, 42)).await.unwrap();
                tx.commit().await.unwrap();
            });
        });
    });
}

fn bench_status_transition(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();

    let order_id = rt.block_on(async {
        let mut tx = store.begin().await.unwrap();
        let order = tx.create(make_order(1, 42)).await.unwrap();
        tx.commit().await.unwrap();
        order.id
    });

    c.bench_function("order_store/conditional_status_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut tx = store.begin().await.unwrap();
                // Never committed, so the committed row stays WaitingPayment.
                tx.update_status(order_id, OrderStatus::WaitingPayment, OrderStatus::Paid)
                    .await
                    .unwrap();
                tx.rollback().await.unwrap();
            });
        });
    });
}

fn bench_list_by_user_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();

    rt.block_on(async {
        let mut tx = store.begin().await.unwrap();
        for i in 0..100 {
            tx.create(make_order(1, i)).await.unwrap();
        }
        tx.commit().await.unwrap();
    });

    c.bench_function("order_store/list_by_user_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let orders = store.list_by_user(UserId::new(1)).await.unwrap();
                assert_eq!(orders.len(), 100);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_commit,
    bench_status_transition,
    bench_list_by_user_100,
);
criterion_main!(benches);
