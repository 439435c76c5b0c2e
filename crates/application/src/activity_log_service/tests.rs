use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use uuid::Uuid;

use domaris_core::{AppError, AppResult, Principal, Role};
use domaris_domain::{
    AuditActionKind, NewAuditEntry, RequestMeta, ResourceRef, ResourceType, Severity,
};

use crate::test_support::{FakeAuditEntryRepository, principal};
use crate::{ActivityAuditRecorder, AuditEntryQuery, RawAuditInput};

use super::{ActivityLogService, ActivityLogSettings};

fn service() -> (Arc<FakeAuditEntryRepository>, ActivityLogService) {
    let repository = Arc::new(FakeAuditEntryRepository::default());
    let recorder = ActivityAuditRecorder::new(repository.clone());
    let service = ActivityLogService::new(
        repository.clone(),
        recorder,
        ActivityLogSettings::default(),
    );
    (repository, service)
}

fn written_by(actor: &Principal, action: AuditActionKind, description: &str) -> NewAuditEntry {
    NewAuditEntry::new(action, description)
        .with_actor(actor.id(), actor.display_name())
        .with_severity(Severity::for_action(action))
}

#[tokio::test]
async fn non_admins_only_list_their_own_entries() -> AppResult<()> {
    let (repository, service) = service();
    let admin = principal(1, Role::Admin);
    let agent = principal(2, Role::Agent);
    let client = principal(3, Role::Client);
    let now = Utc::now();

    repository
        .seed(now, written_by(&agent, AuditActionKind::Create, "agent create"))
        .await;
    repository
        .seed(now, written_by(&client, AuditActionKind::Update, "client update"))
        .await;

    let agent_view = service
        .list(
            &agent,
            AuditEntryQuery {
                actor_id: Some(client.id()),
                ..AuditEntryQuery::default()
            },
        )
        .await?;
    assert_eq!(agent_view.len(), 1);
    assert_eq!(agent_view[0].actor_id(), Some(agent.id()));

    let admin_view = service.list(&admin, AuditEntryQuery::default()).await?;
    assert_eq!(admin_view.len(), 2);
    Ok(())
}

#[tokio::test]
async fn foreign_entry_is_reported_missing() -> AppResult<()> {
    let (repository, service) = service();
    let agent = principal(2, Role::Agent);
    let client = principal(3, Role::Client);
    let entry = repository
        .seed(Utc::now(), written_by(&agent, AuditActionKind::Delete, "removed"))
        .await;

    let own = service.get(&agent, entry.entry_id()).await?;
    assert_eq!(own.entry_id(), entry.entry_id());

    let foreign = service.get(&client, entry.entry_id()).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let unknown = service.get(&agent, Uuid::new_v4()).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn mine_is_capped_and_newest_first() -> AppResult<()> {
    let (repository, service) = service();
    let agent = principal(2, Role::Agent);
    let start = Utc::now() - TimeDelta::hours(2);

    for minute in 0..60 {
        repository
            .seed(
                start + TimeDelta::minutes(minute),
                written_by(&agent, AuditActionKind::View, &format!("view {minute}")),
            )
            .await;
    }

    let mine = service.mine(&agent).await?;
    assert_eq!(mine.len(), ActivityLogService::MINE_LIMIT);
    assert_eq!(mine[0].description(), "view 59");
    assert!(
        mine.windows(2)
            .all(|pair| pair[0].created_at() >= pair[1].created_at())
    );
    Ok(())
}

#[tokio::test]
async fn critical_only_returns_critical_entries() -> AppResult<()> {
    let (repository, service) = service();
    let admin = principal(1, Role::Admin);
    let now = Utc::now();

    repository
        .seed(
            now,
            written_by(&admin, AuditActionKind::Other, "breach").with_severity(Severity::Critical),
        )
        .await;
    repository
        .seed(now, written_by(&admin, AuditActionKind::Update, "routine"))
        .await;

    let critical = service.critical(&admin, AuditEntryQuery::default()).await?;
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].severity(), Severity::Critical);
    Ok(())
}

#[tokio::test]
async fn stats_group_counts_and_zero_fill_timeline() -> AppResult<()> {
    let (repository, service) = service();
    let admin = principal(1, Role::Admin);
    let agent = principal(2, Role::Agent);
    let now = Utc::now();

    for _ in 0..3 {
        repository
            .seed(
                now,
                written_by(&agent, AuditActionKind::Create, "created")
                    .with_resource(ResourceRef::new(ResourceType::Property, 1, "Loft")),
            )
            .await;
    }
    repository
        .seed(
            now - TimeDelta::days(2),
            written_by(&admin, AuditActionKind::Delete, "deleted")
                .with_resource(ResourceRef::new(ResourceType::Document, 4, "Deed")),
        )
        .await;
    repository
        .seed(
            now - TimeDelta::days(45),
            written_by(&admin, AuditActionKind::Update, "outside window"),
        )
        .await;

    let stats = service.stats(&admin, Some(7)).await?;
    assert_eq!(stats.window_days, 7);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_action[0].action, AuditActionKind::Create);
    assert_eq!(stats.by_action[0].count, 3);
    assert_eq!(stats.top_actors[0].actor_id, Some(agent.id()));
    assert_eq!(stats.top_resource_types[0].resource_type, ResourceType::Property);
    assert_eq!(stats.timeline.len(), 7);
    assert_eq!(stats.timeline.last().map(|bucket| bucket.count), Some(3));
    assert_eq!(
        stats.timeline.iter().map(|bucket| bucket.count).sum::<u64>(),
        4
    );
    assert!(stats.timeline.windows(2).all(|pair| pair[0].day < pair[1].day));

    let agent_stats = service.stats(&agent, None).await?;
    assert_eq!(agent_stats.window_days, 30);
    assert_eq!(agent_stats.total, 3);
    Ok(())
}

#[tokio::test]
async fn stats_reject_empty_window() {
    let (_, service) = service();

    let stats = service.stats(&principal(1, Role::Admin), Some(0)).await;

    assert!(matches!(stats, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn stats_keep_older_critical_entries_visible() -> AppResult<()> {
    let (repository, service) = service();
    let admin = principal(1, Role::Admin);
    let agent = principal(2, Role::Agent);
    let now = Utc::now();

    repository
        .seed(
            now - TimeDelta::days(45),
            written_by(&agent, AuditActionKind::Other, "old breach")
                .with_severity(Severity::Critical),
        )
        .await;
    repository
        .seed(now, written_by(&agent, AuditActionKind::Update, "routine"))
        .await;

    let stats = service.stats(&admin, Some(7)).await?;
    assert_eq!(stats.total, 1);
    assert_eq!(stats.recent_critical.len(), 1);
    assert_eq!(stats.recent_critical[0].description(), "old breach");

    let other = principal(3, Role::Client);
    let other_stats = service.stats(&other, Some(7)).await?;
    assert!(other_stats.recent_critical.is_empty());
    Ok(())
}

#[tokio::test]
async fn cleanup_uses_default_window_and_requires_admin() -> AppResult<()> {
    let (repository, service) = service();
    let admin = principal(1, Role::Admin);
    repository
        .seed(
            Utc::now() - TimeDelta::days(91),
            written_by(&admin, AuditActionKind::Update, "ancient"),
        )
        .await;
    repository
        .seed(
            Utc::now() - TimeDelta::days(60),
            written_by(&admin, AuditActionKind::Update, "recent enough"),
        )
        .await;

    let denied = service.cleanup(&principal(2, Role::Agent), None).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let purged = service.cleanup(&admin, None).await?;
    assert_eq!(purged.older_than_days, 90);
    assert_eq!(purged.deleted_count, 1);
    Ok(())
}

#[tokio::test]
async fn create_records_manual_entry_for_caller() -> AppResult<()> {
    let (_, service) = service();
    let investor = principal(5, Role::Investor);

    let entry = service
        .create(
            &investor,
            RawAuditInput {
                action: "export".to_owned(),
                description: "exported portfolio report".to_owned(),
                ..RawAuditInput::default()
            },
            RequestMeta::default(),
        )
        .await?;

    assert_eq!(entry.actor_id(), Some(investor.id()));
    assert_eq!(service.mine(&investor).await?.len(), 1);
    Ok(())
}
