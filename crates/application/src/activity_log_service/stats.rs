use std::cmp::Reverse;

use chrono::{Days, TimeDelta, Utc};

use domaris_core::{AppError, AppResult, Principal};
use domaris_domain::Severity;

use crate::{AuditEntryQuery, AuditEntryRepository, AuditStats, TimelineBucket};

const TOP_GROUPS: usize = 10;
const RECENT_CRITICAL: usize = 10;
const MAX_WINDOW_DAYS: u32 = 3650;

pub(super) async fn compute(
    repository: &dyn AuditEntryRepository,
    actor: &Principal,
    days: u32,
) -> AppResult<AuditStats> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        )));
    }

    let now = Utc::now();
    let since = now
        .checked_sub_signed(TimeDelta::days(i64::from(days)))
        .ok_or_else(|| AppError::Internal("stats window start is out of range".to_owned()))?;
    let actor_scope = (!actor.is_admin()).then_some(actor.id());

    let summary = repository.summarize(since, actor_scope).await?;
    let recent_critical = repository
        .list(&AuditEntryQuery {
            actor_id: actor_scope,
            severity: Some(Severity::Critical),
            limit: RECENT_CRITICAL,
            ..AuditEntryQuery::default()
        })
        .await?;

    let mut by_action = summary.by_action;
    by_action.sort_by_key(|group| (Reverse(group.count), group.action.as_str()));

    let mut by_severity = summary.by_severity;
    by_severity.sort_by_key(|group| (Reverse(group.count), group.severity));

    let mut top_actors = summary.by_actor;
    top_actors.sort_by_key(|group| (Reverse(group.count), group.actor_id));
    top_actors.truncate(TOP_GROUPS);

    let mut top_resource_types = summary.by_resource_type;
    top_resource_types.sort_by_key(|group| (Reverse(group.count), group.resource_type));
    top_resource_types.truncate(TOP_GROUPS);

    // One bucket per calendar day ending today, oldest first.
    let today = now.date_naive();
    let timeline = (0..u64::from(days))
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|day| TimelineBucket {
            day,
            count: summary
                .by_day
                .iter()
                .find(|bucket| bucket.day == day)
                .map_or(0, |bucket| bucket.count),
        })
        .collect();

    Ok(AuditStats {
        window_days: days,
        since,
        total: summary.total,
        by_action,
        by_severity,
        top_actors,
        top_resource_types,
        recent_critical,
        timeline,
    })
}
