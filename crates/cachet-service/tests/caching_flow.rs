//! End-to-end flows over the in-memory store: wrap, hit, invalidate, miss.

use cachet_core::{CachetError, EventHandler, Model, ModelType, Principal};
use cachet_service::{
    CacheGateway, CacheOptions, CacheStatus, CacheWrapper, HandlerIdentity,
    InvalidationService, InvalidationServiceComponent, KeyBuilder, MemoryCacheService,
    ModelChanged, MutationListener, NormalizedResult, RequestContext,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Widget;

impl Model for Widget {
    const NAMESPACE: &'static str = "shop";
    const NAME: &'static str = "Widget";
}

struct WidgetCategory;

impl Model for WidgetCategory {
    const NAMESPACE: &'static str = "shop";
    const NAME: &'static str = "WidgetCategory";
}

struct Fixture {
    store: Arc<MemoryCacheService>,
    invalidation: Arc<InvalidationServiceComponent>,
    calls: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryCacheService::new());
        let invalidation = Arc::new(InvalidationServiceComponent::new(store.clone()));
        Self {
            store,
            invalidation,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn wrapper(&self, name: &'static str, options: CacheOptions) -> CacheWrapper {
        CacheWrapper::new(
            HandlerIdentity::new("shop.views", name),
            options,
            KeyBuilder::default(),
            self.store.clone(),
        )
    }

    async fn call(&self, wrapper: &CacheWrapper, request: &RequestContext) -> CacheStatus {
        let calls = self.calls.clone();
        let outcome = wrapper
            .call(request, || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, CachetError>(NormalizedResult::ok(format!("render {n}")))
            })
            .await
            .unwrap();
        outcome.status
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_model_invalidation_forces_recompute() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("list_widgets", CacheOptions::new().depends_on_model::<Widget>());
    let request = RequestContext::get();

    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Miss);
    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Hit);
    assert_eq!(fx.calls(), 1);

    let deleted = fx.invalidation.invalidate_model(&Widget::model_type()).await.unwrap();
    assert_eq!(deleted, 1);

    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Miss);
    assert_eq!(fx.calls(), 2);
}

#[tokio::test]
async fn test_invalidation_reaches_every_variant() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("list_widgets", CacheOptions::new().depends_on_model::<Widget>());

    let variants = [
        RequestContext::get(),
        RequestContext::get().with_accept_language("de"),
        RequestContext::get().with_query_param("page", "2"),
        RequestContext::get().with_principal(Principal::user(3_u64)),
    ];
    for request in &variants {
        fx.call(&wrapper, request).await;
    }
    assert_eq!(fx.store.len(), 4);

    fx.invalidation.invalidate_model(&Widget::model_type()).await.unwrap();

    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn test_user_invalidation_is_scoped() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("profile", CacheOptions::new());
    let alice = RequestContext::get().with_principal(Principal::user(1_u64));
    let bob = RequestContext::get().with_principal(Principal::user(2_u64));

    fx.call(&wrapper, &alice).await;
    fx.call(&wrapper, &bob).await;

    fx.invalidation.invalidate_user(&Principal::user(1_u64)).await.unwrap();

    assert_eq!(fx.call(&wrapper, &alice).await, CacheStatus::Miss);
    assert_eq!(fx.call(&wrapper, &bob).await, CacheStatus::Hit);
}

#[tokio::test]
async fn test_user_query_param_does_not_reach_user_entry() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("profile", CacheOptions::new());
    let owner = RequestContext::get().with_principal(Principal::user(42_u64));
    let anonymous = RequestContext::get().with_query_param("user", "42");

    assert_eq!(fx.call(&wrapper, &owner).await, CacheStatus::Miss);
    assert_eq!(fx.call(&wrapper, &anonymous).await, CacheStatus::Miss);
    assert_ne!(
        wrapper.cache_key(&owner).unwrap(),
        wrapper.cache_key(&anonymous).unwrap()
    );

    let deleted = fx.invalidation.invalidate_user(&Principal::user(42_u64)).await.unwrap();

    assert_eq!(deleted, 1);
    assert_eq!(fx.call(&wrapper, &anonymous).await, CacheStatus::Hit);
}

#[tokio::test]
async fn test_prefix_named_model_is_collateral() {
    let fx = Fixture::new();
    let categories = fx.wrapper(
        "list_categories",
        CacheOptions::new().depends_on_model::<WidgetCategory>(),
    );
    let orders = fx.wrapper(
        "list_orders",
        CacheOptions::new().depends_on(ModelType::new("shop", "Order")),
    );
    let request = RequestContext::get();

    fx.call(&categories, &request).await;
    fx.call(&orders, &request).await;

    fx.invalidation.invalidate_model(&Widget::model_type()).await.unwrap();

    assert_eq!(fx.call(&categories, &request).await, CacheStatus::Miss);
    assert_eq!(fx.call(&orders, &request).await, CacheStatus::Hit);
}

#[tokio::test]
async fn test_listener_drives_invalidation() {
    let fx = Fixture::new();
    let listener = MutationListener::new(fx.invalidation.clone())
        .with_user_model(ModelType::new("auth", "User"));
    let widgets = fx.wrapper("list_widgets", CacheOptions::new().depends_on_model::<Widget>());
    let request = RequestContext::get();

    fx.call(&widgets, &request).await;
    listener
        .handle(&ModelChanged::saved(Widget::model_type(), "10", true))
        .await
        .unwrap();

    assert_eq!(fx.call(&widgets, &request).await, CacheStatus::Miss);
}

#[tokio::test]
async fn test_unbounded_ttl_is_stored() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("list_widgets", CacheOptions::new().ttl_seconds(u64::MAX));
    let request = RequestContext::get();

    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Miss);
    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Hit);
}

#[tokio::test]
async fn test_entries_expire() {
    let fx = Fixture::new();
    let wrapper = fx.wrapper("list_widgets", CacheOptions::new().ttl_seconds(1));
    let request = RequestContext::get();

    fx.call(&wrapper, &request).await;
    let key = wrapper.cache_key(&request).unwrap();
    assert!(fx.store.get_raw(key.as_str()).await.unwrap().is_some());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert!(fx.store.get_raw(key.as_str()).await.unwrap().is_none());
    assert_eq!(fx.call(&wrapper, &request).await, CacheStatus::Miss);
}
