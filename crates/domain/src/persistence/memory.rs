use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::{AggregateId, RequestContext};
use event_log::EventLog;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    Change, ChangeSet, PersistenceError, Predicate, Repository, Result, ensure_not_cancelled,
};
use crate::aggregate::{Aggregate, DomainEvent};

/// In-memory repository that publishes committed events to an [`EventLog`].
///
/// Entities keep insertion order, so listings page deterministically.
pub struct InMemoryRepository<E> {
    entities: Arc<RwLock<Vec<E>>>,
    events: Arc<dyn EventLog>,
    commits: Arc<AtomicU64>,
}

impl<E> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            events: Arc::clone(&self.events),
            commits: Arc::clone(&self.commits),
        }
    }
}

impl<E: Aggregate> InMemoryRepository<E> {
    pub fn new(events: Arc<dyn EventLog>) -> Self {
        Self {
            entities: Arc::new(RwLock::new(Vec::new())),
            events,
            commits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of change sets committed so far.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Checks every staged change against the stored ids without mutating.
    fn validate(stored: &[E], changes: &[Change<E>]) -> Result<()> {
        let mut present: HashSet<AggregateId> = stored.iter().map(|e| e.id()).collect();
        for change in changes {
            let id = change.entity().id();
            let ok = match change {
                Change::Add(_) => present.insert(id),
                Change::Update(_) => present.contains(&id),
                Change::Remove(_) => present.remove(&id),
            };
            if !ok {
                let entity = E::entity_type();
                return Err(match change {
                    Change::Add(_) => PersistenceError::Duplicate { entity, id },
                    _ => PersistenceError::NotFound { entity, id },
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Aggregate> Repository<E> for InMemoryRepository<E> {
    async fn find(&self, id: AggregateId, cancel: &CancellationToken) -> Result<Option<E>> {
        ensure_not_cancelled(cancel)?;
        let entities = self.entities.read().await;
        Ok(entities.iter().find(|e| e.id() == id).cloned())
    }

    async fn any(&self, predicate: Predicate<'_, E>, cancel: &CancellationToken) -> Result<bool> {
        ensure_not_cancelled(cancel)?;
        let entities = self.entities.read().await;
        Ok(entities.iter().any(predicate))
    }

    async fn list(
        &self,
        predicate: Predicate<'_, E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>> {
        ensure_not_cancelled(cancel)?;
        let entities = self.entities.read().await;
        Ok(entities.iter().filter(|&e| predicate(e)).cloned().collect())
    }

    async fn count(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_not_cancelled(cancel)?;
        Ok(self.entities.read().await.len())
    }

    async fn save_changes(&self, changes: ChangeSet<E>, ctx: &RequestContext) -> Result<usize> {
        ensure_not_cancelled(ctx.cancellation())?;
        let mut changes = changes.into_changes();
        if changes.is_empty() {
            return Ok(0);
        }

        let mut entities = self.entities.write().await;
        Self::validate(&entities, &changes)?;

        let mut records = Vec::new();
        for change in &mut changes {
            for event in change.entity_mut().take_events() {
                records.push(event.to_record(E::entity_type(), ctx)?);
            }
        }

        // Last point at which the commit can be abandoned cleanly.
        ensure_not_cancelled(ctx.cancellation())?;

        let events = records.len();
        if !records.is_empty() {
            self.events.publish(records).await?;
        }

        let written = changes.len();
        for change in changes {
            match change {
                Change::Add(entity) => entities.push(entity),
                Change::Update(entity) => {
                    let id = entity.id();
                    if let Some(slot) = entities.iter_mut().find(|e| e.id() == id) {
                        *slot = entity;
                    }
                }
                Change::Remove(entity) => {
                    let id = entity.id();
                    entities.retain(|e| e.id() != id);
                }
            }
        }
        drop(entities);

        self.commits.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("change_sets_committed_total", "entity" => E::entity_type())
            .increment(1);
        debug!(
            entity = E::entity_type(),
            written,
            events,
            "Change set committed"
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{EventMeta, PendingEvents};
    use event_log::InMemoryEventLog;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Touched {
        meta: EventMeta,
    }

    impl DomainEvent for Touched {
        fn event_type(&self) -> &'static str {
            "WidgetTouched"
        }

        fn meta(&self) -> &EventMeta {
            &self.meta
        }
    }

    #[derive(Debug, Clone)]
    struct Widget {
        id: AggregateId,
        label: String,
        events: PendingEvents<Touched>,
    }

    impl Widget {
        fn new(label: &str) -> Self {
            Self {
                id: AggregateId::new(),
                label: label.to_string(),
                events: PendingEvents::default(),
            }
        }

        fn touched(mut self) -> Self {
            let meta = EventMeta::new(self.id, &["Widget"], "touched");
            self.raise(Touched { meta });
            self
        }
    }

    impl Aggregate for Widget {
        type Event = Touched;

        fn entity_type() -> &'static str {
            "Widget"
        }

        fn id(&self) -> AggregateId {
            self.id
        }

        fn pending_events(&self) -> &PendingEvents<Touched> {
            &self.events
        }

        fn pending_events_mut(&mut self) -> &mut PendingEvents<Touched> {
            &mut self.events
        }
    }

    fn setup() -> (InMemoryRepository<Widget>, InMemoryEventLog, RequestContext) {
        let log = InMemoryEventLog::new();
        let repo = InMemoryRepository::new(Arc::new(log.clone()));
        (repo, log, RequestContext::anonymous())
    }

    #[tokio::test]
    async fn add_then_find() {
        let (repo, _, ctx) = setup();
        let widget = Widget::new("a");
        let id = widget.id;

        let written = repo
            .save_changes(ChangeSet::new().add(widget), &ctx)
            .await
            .unwrap();

        assert_eq!(written, 1);
        let found = repo.find(id, ctx.cancellation()).await.unwrap().unwrap();
        assert_eq!(found.label, "a");
        assert_eq!(repo.commits(), 1);
    }

    #[tokio::test]
    async fn events_are_drained_and_published_once() {
        let (repo, log, ctx) = setup();
        let widget = Widget::new("a").touched();
        let id = widget.id;

        repo.save_changes(ChangeSet::new().add(widget), &ctx)
            .await
            .unwrap();

        let stored = repo.find(id, ctx.cancellation()).await.unwrap().unwrap();
        assert!(stored.pending_events().is_empty());
        assert_eq!(log.count().await.unwrap(), 1);

        repo.save_changes(ChangeSet::new().update(stored), &ctx)
            .await
            .unwrap();
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[test]
    fn each_event_is_counted_once() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let (repo, _, ctx) = setup();
                repo.save_changes(
                    ChangeSet::new()
                        .add(Widget::new("a").touched())
                        .add(Widget::new("b").touched()),
                    &ctx,
                )
                .await
                .unwrap();
            })
        });

        let rendered = handle.render();
        let published = rendered
            .lines()
            .find(|line| {
                line.starts_with("domain_events_published_total")
                    && line.contains("event_type=\"WidgetTouched\"")
            })
            .unwrap();
        assert!(published.ends_with(" 2"), "{published}");
        assert!(
            rendered
                .lines()
                .any(|line| line.starts_with("change_sets_committed_total")
                    && line.contains("entity=\"Widget\"")
                    && line.ends_with(" 1")),
            "{rendered}"
        );
    }

    #[tokio::test]
    async fn failing_change_rolls_back_whole_set() {
        let (repo, log, ctx) = setup();
        let ghost = Widget::new("ghost");
        let ghost_id = ghost.id;

        let result = repo
            .save_changes(
                ChangeSet::new()
                    .add(Widget::new("real").touched())
                    .update(ghost),
                &ctx,
            )
            .await;

        assert!(matches!(
            result,
            Err(PersistenceError::NotFound { id, .. }) if id == ghost_id
        ));
        assert_eq!(repo.count(ctx.cancellation()).await.unwrap(), 0);
        assert_eq!(log.count().await.unwrap(), 0);
        assert_eq!(repo.commits(), 0);
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected() {
        let (repo, _, ctx) = setup();
        let widget = Widget::new("a");

        repo.save_changes(ChangeSet::new().add(widget.clone()), &ctx)
            .await
            .unwrap();
        let result = repo.save_changes(ChangeSet::new().add(widget), &ctx).await;

        assert!(matches!(result, Err(PersistenceError::Duplicate { .. })));
        assert_eq!(repo.count(ctx.cancellation()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_deletes_entity() {
        let (repo, _, ctx) = setup();
        let widget = Widget::new("a");
        let id = widget.id;
        repo.save_changes(ChangeSet::new().add(widget.clone()), &ctx)
            .await
            .unwrap();

        repo.save_changes(ChangeSet::new().remove(widget), &ctx)
            .await
            .unwrap();

        assert!(repo.find(id, ctx.cancellation()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelled_commit_changes_nothing() {
        let (repo, log, _) = setup();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = RequestContext::anonymous().with_cancellation(cancel);

        let result = repo
            .save_changes(ChangeSet::new().add(Widget::new("a").touched()), &ctx)
            .await;

        assert!(matches!(result, Err(PersistenceError::Cancelled)));
        assert_eq!(repo.count(&CancellationToken::new()).await.unwrap(), 0);
        assert_eq!(log.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_filters_in_insertion_order() {
        let (repo, _, ctx) = setup();
        repo.save_changes(
            ChangeSet::new()
                .add(Widget::new("b"))
                .add(Widget::new("a"))
                .add(Widget::new("bb")),
            &ctx,
        )
        .await
        .unwrap();

        let labels: Vec<String> = repo
            .list(&|w: &Widget| w.label.starts_with('b'), ctx.cancellation())
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.label)
            .collect();

        assert_eq!(labels, vec!["b", "bb"]);
        assert!(
            repo.any(&|w: &Widget| w.label == "a", ctx.cancellation())
                .await
                .unwrap()
        );
    }
}
