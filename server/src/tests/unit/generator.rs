use std::sync::Arc;

use uuid::Uuid;

use crate::jobs::preventive::{PreventiveMaintenanceJob, SYSTEM_REQUESTER};
use crate::store::memory::MemStore;
use crate::tests::fixtures;

struct Scenario {
    store: Arc<MemStore>,
    org_a: Uuid,
    plan_id: Uuid,
}

/// One active desktop plan in org A with a two-step task list, two active
/// desktops in org A, one active desktop in org B.
fn fan_out_scenario() -> Scenario {
    let store = Arc::new(MemStore::new());
    let org_a = fixtures::org();
    let org_b = fixtures::org();
    let plan = fixtures::plan(
        org_a.id,
        Some("desktop"),
        vec![
            fixtures::task("Check disk health"),
            fixtures::task("Install OS updates"),
        ],
    );

    store.insert_asset(fixtures::asset(org_a.id, "A-PC-01", "desktop", "active"));
    store.insert_asset(fixtures::asset(org_a.id, "A-PC-02", "desktop", "active"));
    store.insert_asset(fixtures::asset(org_b.id, "B-PC-01", "desktop", "active"));
    store.insert_plan(plan.clone());
    store.insert_organization(org_a.clone());
    store.insert_organization(org_b);

    Scenario {
        store,
        org_a: org_a.id,
        plan_id: plan.id,
    }
}

#[tokio::test]
async fn test_fans_out_one_ticket_per_eligible_asset() {
    let s = fan_out_scenario();
    let job = PreventiveMaintenanceJob::new(s.store.clone());

    let result = job.run_cycle("2026-08").await.unwrap();
    assert_eq!(result.cycle, "2026-08");
    assert_eq!(result.plans_processed, 1);
    assert_eq!(result.assets_matched, 2);
    assert_eq!(result.tickets_created, 2);
    assert_eq!(result.tickets_skipped, 0);

    let tickets = s.store.tickets();
    assert_eq!(tickets.len(), 2);
    for ticket in &tickets {
        assert_eq!(ticket.org_id, s.org_a);
        assert_eq!(ticket.status, "open");
        assert_eq!(ticket.ticket_type, "preventive");
        assert_eq!(ticket.requester_name, SYSTEM_REQUESTER);
        assert!(ticket.asset_id.is_some());
        assert!(ticket.description.contains("Monthly preventive maintenance"));
        assert_eq!(ticket.checklist.len(), 2);
        assert_eq!(ticket.checklist[0].title, "Check disk health");
        assert!(ticket.dedup_key.as_deref().unwrap().ends_with(":2026-08"));
    }
}

#[tokio::test]
async fn test_inactive_plan_generates_nothing() {
    let store = Arc::new(MemStore::new());
    let org = fixtures::org();
    let mut plan = fixtures::plan(org.id, Some("desktop"), vec![fixtures::task("Dust out fans")]);
    plan.status = "inactive".to_string();

    store.insert_asset(fixtures::asset(org.id, "PC-01", "desktop", "active"));
    store.insert_plan(plan);
    store.insert_organization(org);

    let result = PreventiveMaintenanceJob::new(store.clone())
        .run_cycle("2026-08")
        .await
        .unwrap();

    assert_eq!(result.plans_processed, 0);
    assert_eq!(result.tickets_created, 0);
    assert!(store.tickets().is_empty());
}

#[tokio::test]
async fn test_plan_without_target_type_matches_nothing() {
    let store = Arc::new(MemStore::new());
    let org = fixtures::org();
    store.insert_asset(fixtures::asset(org.id, "PC-01", "desktop", "active"));
    store.insert_plan(fixtures::plan(org.id, None, vec![fixtures::task("Walk the site")]));
    store.insert_organization(org);

    let result = PreventiveMaintenanceJob::new(store.clone())
        .run_cycle("2026-08")
        .await
        .unwrap();

    assert_eq!(result.plans_processed, 1);
    assert_eq!(result.assets_matched, 0);
    assert_eq!(result.tickets_created, 0);
    assert!(store.tickets().is_empty());
}

#[tokio::test]
async fn test_only_active_assets_of_target_type_match() {
    let store = Arc::new(MemStore::new());
    let org = fixtures::org();
    store.insert_asset(fixtures::asset(org.id, "PC-01", "desktop", "active"));
    store.insert_asset(fixtures::asset(org.id, "PC-02", "desktop", "inactive"));
    store.insert_asset(fixtures::asset(org.id, "PC-03", "desktop", "retired"));
    store.insert_asset(fixtures::asset(org.id, "NB-01", "notebook", "active"));
    store.insert_plan(fixtures::plan(org.id, Some("desktop"), vec![]));
    store.insert_organization(org);

    let result = PreventiveMaintenanceJob::new(store.clone())
        .run_cycle("2026-08")
        .await
        .unwrap();

    assert_eq!(result.tickets_created, 1);
    let tickets = store.tickets();
    assert_eq!(tickets[0].asset_name.as_deref(), Some("PC-01"));
}

#[tokio::test]
async fn test_zero_match_plan_leaves_sibling_plans_unaffected() {
    let store = Arc::new(MemStore::new());
    let org = fixtures::org();
    let server_plan = fixtures::plan(org.id, Some("server"), vec![fixtures::task("Rotate backups")]);
    let desktop_plan = fixtures::plan(
        org.id,
        Some("desktop"),
        vec![fixtures::task("Check disk health")],
    );

    store.insert_asset(fixtures::asset(org.id, "PC-01", "desktop", "active"));
    store.insert_asset(fixtures::asset(org.id, "PC-02", "desktop", "active"));
    // Zero-match plan first, so it runs before the matching one.
    store.insert_plan(server_plan);
    store.insert_plan(desktop_plan.clone());
    store.insert_organization(org);

    let result = PreventiveMaintenanceJob::new(store.clone())
        .run_cycle("2026-08")
        .await
        .unwrap();

    assert_eq!(result.plans_processed, 2);
    assert_eq!(result.assets_matched, 2);
    assert_eq!(result.tickets_created, 2);
    assert_eq!(result.tickets_skipped, 0);

    let tickets = store.tickets();
    assert_eq!(tickets.len(), 2);
    for ticket in &tickets {
        assert_eq!(ticket.checklist.len(), 1);
        assert_eq!(ticket.checklist[0].title, "Check disk health");
        assert_eq!(
            ticket.dedup_key.as_deref().unwrap(),
            format!("{}:{}:2026-08", desktop_plan.id, ticket.asset_id.unwrap())
        );
    }
}

#[tokio::test]
async fn test_plan_without_tasks_yields_empty_checklist() {
    let store = Arc::new(MemStore::new());
    let org = fixtures::org();
    store.insert_asset(fixtures::asset(org.id, "PC-01", "desktop", "active"));
    store.insert_plan(fixtures::plan(org.id, Some("desktop"), vec![]));
    store.insert_organization(org);

    let result = PreventiveMaintenanceJob::new(store.clone())
        .run_cycle("2026-08")
        .await
        .unwrap();

    assert_eq!(result.tickets_created, 1);
    assert!(store.tickets()[0].checklist.is_empty());
}

#[tokio::test]
async fn test_rerun_within_cycle_creates_nothing_new() {
    let s = fan_out_scenario();
    let job = PreventiveMaintenanceJob::new(s.store.clone());

    let first = job.run_cycle("2026-08").await.unwrap();
    assert_eq!(first.tickets_created, 2);

    let second = job.run_cycle("2026-08").await.unwrap();
    assert_eq!(second.assets_matched, 2);
    assert_eq!(second.tickets_created, 0);
    assert_eq!(second.tickets_skipped, 2);
    assert_eq!(s.store.tickets().len(), 2);
}

#[tokio::test]
async fn test_next_cycle_issues_a_fresh_set() {
    let s = fan_out_scenario();
    let job = PreventiveMaintenanceJob::new(s.store.clone());

    job.run_cycle("2026-08").await.unwrap();
    let next = job.run_cycle("2026-09").await.unwrap();

    assert_eq!(next.tickets_created, 2);
    let tickets = s.store.tickets();
    assert_eq!(tickets.len(), 4);
    let september = tickets
        .iter()
        .filter(|t| t.dedup_key.as_deref().unwrap().ends_with(":2026-09"))
        .count();
    assert_eq!(september, 2);
}

#[tokio::test]
async fn test_issued_checklists_survive_plan_edits() {
    let s = fan_out_scenario();
    let job = PreventiveMaintenanceJob::new(s.store.clone());

    job.run_cycle("2026-08").await.unwrap();
    s.store
        .set_plan_tasks(s.plan_id, vec![fixtures::task("Replace thermal paste")]);

    for ticket in s.store.tickets() {
        assert_eq!(ticket.checklist.len(), 2);
        assert_eq!(ticket.checklist[0].title, "Check disk health");
    }

    // The edited plan applies from the next cycle on.
    job.run_cycle("2026-09").await.unwrap();
    let new_cycle: Vec<_> = s
        .store
        .tickets()
        .into_iter()
        .filter(|t| t.dedup_key.as_deref().unwrap().ends_with(":2026-09"))
        .collect();
    assert!(new_cycle.iter().all(|t| t.checklist.len() == 1));
    assert_eq!(new_cycle[0].checklist[0].title, "Replace thermal paste");
}

#[tokio::test]
async fn test_commit_failure_propagates_and_writes_nothing() {
    let s = fan_out_scenario();
    s.store.fail_next_commit();

    let result = PreventiveMaintenanceJob::new(s.store.clone())
        .run_cycle("2026-08")
        .await;

    assert!(result.is_err());
    assert!(s.store.tickets().is_empty());
}
