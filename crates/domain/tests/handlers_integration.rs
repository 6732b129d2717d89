//! End-to-end handler tests through the mediator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cache::{Cache, CacheKey, EntryOptions, InMemoryCache};
use common::{AggregateId, CurrentUser, PageRequest, RequestContext, ResourceLocalizer};
use domain::cart::{AddCartItem, CreateCart, GetCartById, RemoveCartItem};
use domain::customer::{CustomerDetails, GetAllCustomers, RegisterCustomer, UpdateCustomer};
use domain::persistence::{ChangeSet, Predicate};
use domain::property::{
    GetAllProperties, GetPropertyById, Property, PropertyDetails, RegisterProperty,
    RemoveProperty, UpdateProperty,
};
use domain::{
    Aggregate, AppError, CodeGenerator, Failure, InMemoryRepository, Mediator, PersistenceError,
    RegistrationError, Repository, Services, build_mediator, register_handlers,
};
use event_log::{EventLog, InMemoryEventLog};
use tokio_util::sync::CancellationToken;

type Timeline = Arc<Mutex<Vec<String>>>;

struct Harness {
    mediator: Mediator,
    properties: InMemoryRepository<Property>,
    cache: InMemoryCache,
    events: InMemoryEventLog,
}

fn services(events: &InMemoryEventLog, cache: &InMemoryCache) -> Services {
    Services::in_memory(
        Arc::new(events.clone()),
        Arc::new(cache.clone()),
        Arc::new(ResourceLocalizer::default()),
    )
}

fn setup() -> Harness {
    let events = InMemoryEventLog::new();
    let cache = InMemoryCache::new();
    let properties = InMemoryRepository::<Property>::new(Arc::new(events.clone()));
    let mut services = services(&events, &cache);
    services.properties = Arc::new(properties.clone());

    Harness {
        mediator: build_mediator(&services).unwrap(),
        properties,
        cache,
        events,
    }
}

fn details(name: &str) -> PropertyDetails {
    PropertyDetails {
        name: name.to_string(),
        description: "Sea view".to_string(),
        property_type: "Apartment".to_string(),
        owner_id: None,
        address: "1 Beach Road".to_string(),
        price: 180_000.0,
        area: 75.0,
        rooms: 2,
        bathrooms: 1,
        published: true,
    }
}

fn customer(email: &str) -> CustomerDetails {
    CustomerDetails {
        name: "Ana".to_string(),
        surname: "Lopez".to_string(),
        email: email.to_string(),
        phone_number: "555-0101".to_string(),
        gender: "F".to_string(),
        group: "Gold".to_string(),
    }
}

fn signed_in() -> RequestContext {
    RequestContext::new(CurrentUser::new(
        Some(uuid::Uuid::new_v4()),
        Some("agent@example.com".to_string()),
    ))
}

fn typed(result: Result<impl std::fmt::Debug, Failure>) -> AppError {
    match result {
        Err(Failure::Typed(error)) => error,
        other => panic!("expected typed failure, got {other:?}"),
    }
}

async fn register(mediator: &Mediator, name: &str) -> AggregateId {
    mediator
        .send(
            RegisterProperty {
                details: details(name),
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap()
        .into_data()
        .unwrap()
}

struct FixedCode;

impl CodeGenerator for FixedCode {
    fn generate(&self) -> String {
        "INMO000001".to_string()
    }
}

/// Records successful commits into a shared timeline.
struct RecordingRepository<E: Aggregate> {
    inner: Arc<dyn Repository<E>>,
    timeline: Timeline,
}

#[async_trait]
impl<E: Aggregate> Repository<E> for RecordingRepository<E> {
    async fn find(
        &self,
        id: AggregateId,
        cancel: &CancellationToken,
    ) -> Result<Option<E>, PersistenceError> {
        self.inner.find(id, cancel).await
    }

    async fn any(
        &self,
        predicate: Predicate<'_, E>,
        cancel: &CancellationToken,
    ) -> Result<bool, PersistenceError> {
        self.inner.any(predicate, cancel).await
    }

    async fn list(
        &self,
        predicate: Predicate<'_, E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>, PersistenceError> {
        self.inner.list(predicate, cancel).await
    }

    async fn count(&self, cancel: &CancellationToken) -> Result<usize, PersistenceError> {
        self.inner.count(cancel).await
    }

    async fn save_changes(
        &self,
        changes: ChangeSet<E>,
        ctx: &RequestContext,
    ) -> Result<usize, PersistenceError> {
        let written = self.inner.save_changes(changes, ctx).await?;
        self.timeline.lock().unwrap().push("commit".to_string());
        Ok(written)
    }
}

/// Records removals into a shared timeline.
struct RecordingCache {
    inner: InMemoryCache,
    timeline: Timeline,
}

#[async_trait]
impl Cache for RecordingCache {
    async fn get(
        &self,
        key: &CacheKey,
        cancel: &CancellationToken,
    ) -> cache::Result<Option<Vec<u8>>> {
        self.inner.get(key, cancel).await
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: Vec<u8>,
        options: EntryOptions,
        cancel: &CancellationToken,
    ) -> cache::Result<()> {
        self.inner.set(key, value, options, cancel).await
    }

    async fn remove(&self, key: &CacheKey, cancel: &CancellationToken) -> cache::Result<()> {
        self.inner.remove(key, cancel).await?;
        self.timeline.lock().unwrap().push(format!("remove:{key}"));
        Ok(())
    }
}

#[tokio::test]
async fn register_then_read_through_cache() {
    let h = setup();
    let ctx = RequestContext::anonymous();
    let id = register(&h.mediator, "Loft").await;

    let first = h
        .mediator
        .send(GetPropertyById { id }, &ctx)
        .await
        .unwrap();
    let key = CacheKey::entity("Property", id);

    assert_eq!(first.data().unwrap().details.name, "Loft");
    assert_eq!(first.data().unwrap().code.len(), 10);
    assert!(h.cache.contains(&key).await);

    let second = h
        .mediator
        .send(GetPropertyById { id }, &ctx)
        .await
        .unwrap();
    assert_eq!(first.data(), second.data());
}

#[tokio::test]
async fn register_success_carries_id_and_message() {
    let h = setup();
    let envelope = h
        .mediator
        .send(
            RegisterProperty {
                details: details("Loft"),
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap();

    assert!(envelope.succeeded());
    assert_eq!(envelope.message(), Some("Property Saved"));
    let stored = h
        .properties
        .find(*envelope.data().unwrap(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn update_invalidates_after_commit_and_before_return() {
    let timeline: Timeline = Arc::new(Mutex::new(Vec::new()));
    let events = InMemoryEventLog::new();
    let cache = InMemoryCache::new();
    let mut services = services(&events, &cache);
    services.properties = Arc::new(RecordingRepository {
        inner: Arc::new(InMemoryRepository::<Property>::new(Arc::new(events.clone()))),
        timeline: Arc::clone(&timeline),
    });
    services.cache = Arc::new(RecordingCache {
        inner: cache.clone(),
        timeline: Arc::clone(&timeline),
    });
    let mediator = build_mediator(&services).unwrap();
    let ctx = RequestContext::anonymous();

    let id = register(&mediator, "Loft").await;
    mediator.send(GetPropertyById { id }, &ctx).await.unwrap();
    timeline.lock().unwrap().clear();

    mediator
        .send(
            UpdateProperty {
                id,
                details: details("Penthouse"),
            },
            &ctx,
        )
        .await
        .unwrap();
    timeline.lock().unwrap().push("returned".to_string());

    assert_eq!(
        *timeline.lock().unwrap(),
        vec![
            "commit".to_string(),
            format!("remove:Property-{id}"),
            "returned".to_string()
        ]
    );
    let fresh = mediator.send(GetPropertyById { id }, &ctx).await.unwrap();
    assert_eq!(fresh.data().unwrap().details.name, "Penthouse");
}

#[tokio::test]
async fn update_or_remove_missing_is_not_found_without_write() {
    let h = setup();
    let ctx = RequestContext::anonymous();
    let missing = AggregateId::new();

    let update = h
        .mediator
        .send(
            UpdateProperty {
                id: missing,
                details: details("Ghost"),
            },
            &ctx,
        )
        .await;
    let remove = h.mediator.send(RemoveProperty { id: missing }, &ctx).await;

    let update = typed(update);
    assert_eq!(update.status_code(), 404);
    assert!(matches!(update, AppError::NotFound { entity: "Property" }));
    assert_eq!(typed(remove).status_code(), 404);
    assert_eq!(h.properties.commits(), 0);
    assert_eq!(h.events.count().await.unwrap(), 0);
}

#[tokio::test]
async fn colliding_code_is_rejected_and_count_unchanged() {
    let events = InMemoryEventLog::new();
    let cache = InMemoryCache::new();
    let services = services(&events, &cache).with_code_generator(Arc::new(FixedCode));
    let mediator = build_mediator(&services).unwrap();
    let cancel = CancellationToken::new();

    register(&mediator, "First").await;
    let before = services.properties.count(&cancel).await.unwrap();

    let second = mediator
        .send(
            RegisterProperty {
                details: details("Second"),
            },
            &RequestContext::anonymous(),
        )
        .await;

    let error = typed(second);
    assert_eq!(error.status_code(), 409);
    assert!(matches!(error, AppError::AlreadyExists { entity: "Property" }));
    assert_eq!(services.properties.count(&cancel).await.unwrap(), before);
}

#[tokio::test]
async fn remove_returns_id_and_invalidates_cache() {
    let h = setup();
    let ctx = RequestContext::anonymous();
    let id = register(&h.mediator, "Loft").await;
    h.mediator.send(GetPropertyById { id }, &ctx).await.unwrap();
    let key = CacheKey::entity("Property", id);
    assert!(h.cache.contains(&key).await);

    let removed = h.mediator.send(RemoveProperty { id }, &ctx).await.unwrap();

    assert!(removed.succeeded());
    assert_eq!(removed.data(), Some(&id));
    assert_eq!(removed.message(), Some("Property Deleted"));
    assert!(!h.cache.contains(&key).await);
    let read = h.mediator.send(GetPropertyById { id }, &ctx).await;
    assert_eq!(typed(read).status_code(), 404);
}

#[tokio::test]
async fn committed_events_reach_the_log() {
    let h = setup();
    let ctx = signed_in();
    let id = register(&h.mediator, "Loft").await;
    h.mediator
        .send(
            UpdateProperty {
                id,
                details: details("Loft 2"),
            },
            &ctx,
        )
        .await
        .unwrap();
    h.mediator.send(RemoveProperty { id }, &ctx).await.unwrap();

    let types: Vec<String> = h
        .events
        .events_for_aggregate(id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.event_type)
        .collect();
    assert_eq!(
        types,
        vec!["PropertyRegistered", "PropertyUpdated", "PropertyRemoved"]
    );

    let updated = &h.events.events_by_type("PropertyUpdated").await.unwrap()[0];
    assert_eq!(updated.payload["data"]["property"]["name"], "Loft 2");
    assert_eq!(updated.metadata["user"], "agent@example.com");
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let h = setup();
    for name in ["Casa Azul", "Casa Verde", "Loft", "Casa Roja"] {
        register(&h.mediator, name).await;
    }

    let page = h
        .mediator
        .send(
            GetAllProperties {
                search: Some("casa".to_string()),
                page: PageRequest::new(2, 2),
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap();

    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].details.name, "Casa Roja");
    assert!(page.has_previous_page);
    assert!(!page.has_next_page);

    let empty = h
        .mediator
        .send(
            GetAllProperties {
                search: Some("castle".to_string()),
                page: PageRequest::default(),
            },
            &RequestContext::anonymous(),
        )
        .await
        .unwrap();
    assert!(empty.succeeded);
    assert!(empty.data.is_empty());
}

#[tokio::test]
async fn customer_email_is_unique() {
    let h = setup();
    let ctx = RequestContext::anonymous();
    let first = h
        .mediator
        .send(
            RegisterCustomer {
                details: customer("ana@example.com"),
            },
            &ctx,
        )
        .await
        .unwrap()
        .into_data()
        .unwrap();
    let other = h
        .mediator
        .send(
            RegisterCustomer {
                details: customer("bea@example.com"),
            },
            &ctx,
        )
        .await
        .unwrap()
        .into_data()
        .unwrap();

    let duplicate = h
        .mediator
        .send(
            RegisterCustomer {
                details: customer("ANA@example.com"),
            },
            &ctx,
        )
        .await;
    assert_eq!(typed(duplicate).status_code(), 409);

    let steal = h
        .mediator
        .send(
            UpdateCustomer {
                id: other,
                details: customer("ana@example.com"),
            },
            &ctx,
        )
        .await;
    assert_eq!(typed(steal).status_code(), 409);

    let keep = h
        .mediator
        .send(
            UpdateCustomer {
                id: first,
                details: customer("ana@example.com"),
            },
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(keep.message(), Some("Customer Updated"));
}

#[tokio::test]
async fn customer_listing_skips_missing_email() {
    let h = setup();
    let ctx = RequestContext::anonymous();
    for email in ["ana@example.com", " "] {
        h.mediator
            .send(
                RegisterCustomer {
                    details: customer(email),
                },
                &ctx,
            )
            .await
            .unwrap();
    }

    let page = h
        .mediator
        .send(GetAllCustomers::default(), &ctx)
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].details.email, "ana@example.com");
}

#[tokio::test]
async fn cart_flow() {
    let h = setup();
    let ctx = signed_in();
    let property = register(&h.mediator, "Loft").await;
    let customer_id = h
        .mediator
        .send(
            RegisterCustomer {
                details: customer("ana@example.com"),
            },
            &ctx,
        )
        .await
        .unwrap()
        .into_data()
        .unwrap();

    let cart = h
        .mediator
        .send(CreateCart { customer_id }, &ctx)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    let second = h.mediator.send(CreateCart { customer_id }, &ctx).await;
    assert!(matches!(typed(second), AppError::Conflict { .. }));

    // Prime the cache, then mutate through the item commands.
    let before = h.mediator.send(GetCartById { id: cart }, &ctx).await.unwrap();
    assert!(before.data().unwrap().items.is_empty());

    h.mediator
        .send(
            AddCartItem {
                cart_id: cart,
                property_id: property,
            },
            &ctx,
        )
        .await
        .unwrap();
    let again = h
        .mediator
        .send(
            AddCartItem {
                cart_id: cart,
                property_id: property,
            },
            &ctx,
        )
        .await;
    assert_eq!(typed(again).status_code(), 409);

    let after = h.mediator.send(GetCartById { id: cart }, &ctx).await.unwrap();
    assert_eq!(after.data().unwrap().items[0].property_id, property);

    let unknown = h
        .mediator
        .send(
            AddCartItem {
                cart_id: cart,
                property_id: AggregateId::new(),
            },
            &ctx,
        )
        .await;
    assert!(matches!(
        typed(unknown),
        AppError::NotFound { entity: "Property" }
    ));

    let removed = h
        .mediator
        .send(
            RemoveCartItem {
                cart_id: cart,
                property_id: property,
            },
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(removed.message(), Some("Cart Item Removed"));
    let emptied = h.mediator.send(GetCartById { id: cart }, &ctx).await.unwrap();
    assert!(emptied.data().unwrap().items.is_empty());
}

#[tokio::test]
async fn carts_require_identified_caller() {
    let h = setup();
    let result = h
        .mediator
        .send(
            CreateCart {
                customer_id: AggregateId::new(),
            },
            &RequestContext::anonymous(),
        )
        .await;

    let error = typed(result);
    assert!(matches!(error, AppError::Unauthorized));
    assert_eq!(error.status_code(), 401);
}

#[tokio::test]
async fn cart_for_unknown_customer_is_not_found() {
    let h = setup();
    let result = h
        .mediator
        .send(
            CreateCart {
                customer_id: AggregateId::new(),
            },
            &signed_in(),
        )
        .await;

    assert!(matches!(
        typed(result),
        AppError::NotFound { entity: "Customer" }
    ));
}

#[tokio::test]
async fn infrastructure_failures_in_queries_stay_unhandled() {
    let h = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = RequestContext::anonymous().with_cancellation(cancel);

    let result = h
        .mediator
        .send(GetAllProperties::default(), &ctx)
        .await;

    match result {
        Err(Failure::Unhandled(error)) => {
            assert!(matches!(
                error.downcast_ref::<PersistenceError>(),
                Some(PersistenceError::Cancelled)
            ));
        }
        other => panic!("expected unhandled failure, got {other:?}"),
    }
}

#[test]
fn registering_a_module_twice_fails_at_startup() {
    let services = services(&InMemoryEventLog::new(), &InMemoryCache::new());
    let builder = register_handlers(Mediator::builder(), &services);

    let result = register_handlers(builder, &services).build();

    assert!(matches!(
        result.err(),
        Some(RegistrationError::Duplicate { request: "RegisterProperty" })
    ));
}

#[test]
fn every_request_has_a_handler() {
    let services = services(&InMemoryEventLog::new(), &InMemoryCache::new());
    let mediator = build_mediator(&services).unwrap();

    assert!(mediator.handles::<RegisterProperty>());
    assert!(mediator.handles::<GetAllCustomers>());
    assert!(mediator.handles::<RemoveCartItem>());
    assert_eq!(mediator.len(), 21);
}
