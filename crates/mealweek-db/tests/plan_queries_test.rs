//! Integration tests for the plan, plan day, meal, and audit queries.
//!
//! Each test creates an isolated temporary database with migrations applied
//! and drops it on completion.

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use mealweek_db::models::AuditAction;
use mealweek_db::queries::audit_events::{self, NewAuditEvent};
use mealweek_db::queries::plans::InsertPlanError;
use mealweek_db::queries::{meals, plan_days, plans};
use mealweek_test_utils::{create_test_db, drop_test_db, seed_household};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn week_of(monday: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|i| monday + chrono::Days::new(i)).collect()
}

// -----------------------------------------------------------------------
// plans
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_and_find_plan() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let actor = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), actor)
        .await
        .expect("insert_plan should succeed");

    assert_eq!(plan.household_id, household.id);
    assert_eq!(plan.week_start, date("2024-02-12"));
    assert_eq!(plan.created_by, actor);
    assert_eq!(plan.updated_by, actor);

    let found = plans::find_plan_for_week(&pool, household.id, date("2024-02-12"))
        .await
        .unwrap()
        .expect("plan should exist");
    assert_eq!(found.id, plan.id);

    let missing = plans::find_plan_for_week(&pool, household.id, date("2024-02-19"))
        .await
        .unwrap();
    assert!(missing.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_week_is_reported_as_conflict() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let actor = Uuid::new_v4();

    plans::insert_plan(&pool, household.id, date("2024-02-12"), actor)
        .await
        .unwrap();
    let err = plans::insert_plan(&pool, household.id, date("2024-02-12"), actor)
        .await
        .expect_err("second insert must fail");

    assert!(
        matches!(err, InsertPlanError::Conflict { week_start, .. } if week_start == date("2024-02-12")),
        "expected conflict, got: {err:?}"
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn non_monday_week_start_is_not_a_conflict() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;

    let err = plans::insert_plan(&pool, household.id, date("2024-02-14"), Uuid::new_v4())
        .await
        .expect_err("check constraint must reject a Wednesday");

    assert!(matches!(err, InsertPlanError::Other(_)), "got: {err:?}");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn touch_plan_bumps_updated_by() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let creator = Uuid::new_v4();
    let editor = Uuid::new_v4();

    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), creator)
        .await
        .unwrap();
    plans::touch_plan(&pool, plan.id, editor).await.unwrap();

    let reloaded = plans::get_plan(&pool, plan.id).await.unwrap().unwrap();
    assert_eq!(reloaded.created_by, creator);
    assert_eq!(reloaded.updated_by, editor);
    assert!(reloaded.updated_at >= plan.updated_at);

    let err = plans::touch_plan(&pool, Uuid::new_v4(), editor).await;
    assert!(err.is_err(), "touching a missing plan should fail");

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// plan_days
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_missing_days_is_idempotent() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();
    let dates = week_of(plan.week_start);

    let first = plan_days::insert_missing_days(&pool, plan.id, household.id, &dates[..3])
        .await
        .unwrap();
    assert_eq!(first, 3);

    let second = plan_days::insert_missing_days(&pool, plan.id, household.id, &dates)
        .await
        .unwrap();
    assert_eq!(second, 4, "only the four absent dates should be inserted");

    let days = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap();
    let listed: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
    assert_eq!(listed, dates);
    assert!(days.iter().all(|d| d.meal_id.is_none() && !d.locked));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn assign_meal_skips_locked_days() {
    let (pool, db_name) = create_test_db().await;
    let (household, meals) = seed_household(&pool, &["Curry"]).await;
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();
    plan_days::insert_missing_days(&pool, plan.id, household.id, &week_of(plan.week_start))
        .await
        .unwrap();
    let days = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap();

    plan_days::update_day(&pool, household.id, days[0].id, None, None, true)
        .await
        .unwrap()
        .expect("day should exist");

    let locked = plan_days::assign_meal(&pool, plan.id, days[0].id, meals[0].id)
        .await
        .unwrap();
    let unlocked = plan_days::assign_meal(&pool, plan.id, days[1].id, meals[0].id)
        .await
        .unwrap();

    assert!(!locked);
    assert!(unlocked);

    let reloaded = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap();
    assert_eq!(reloaded[0].meal_id, None);
    assert_eq!(reloaded[1].meal_id, Some(meals[0].id));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn self_leftover_rejected_by_schema() {
    let (pool, db_name) = create_test_db().await;
    let (household, meals) = seed_household(&pool, &["Soup"]).await;
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();
    plan_days::insert_missing_days(&pool, plan.id, household.id, &week_of(plan.week_start))
        .await
        .unwrap();
    let day = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap()[0].clone();

    let result = plan_days::update_day(
        &pool,
        household.id,
        day.id,
        Some(meals[0].id),
        Some(day.id),
        false,
    )
    .await;
    assert!(result.is_err(), "check constraint should reject a self-reference");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn get_day_is_scoped_to_household() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let (other, _) = seed_household(&pool, &[]).await;
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();
    plan_days::insert_missing_days(&pool, plan.id, household.id, &week_of(plan.week_start))
        .await
        .unwrap();
    let day = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap()[0].clone();

    assert!(plan_days::get_day(&pool, household.id, day.id).await.unwrap().is_some());
    assert!(plan_days::get_day(&pool, other.id, day.id).await.unwrap().is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// meals
// -----------------------------------------------------------------------

#[tokio::test]
async fn meal_refs_are_ordered_by_name() {
    let (pool, db_name) = create_test_db().await;
    let (household, inserted) = seed_household(&pool, &["Tacos", "Lasagne", "Chili"]).await;

    let refs = meals::list_meal_refs(&pool, household.id).await.unwrap();
    let names: Vec<&str> = refs.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Chili", "Lasagne", "Tacos"]);

    let found = meals::find_meal_ref(&pool, household.id, inserted[0].id)
        .await
        .unwrap();
    assert_eq!(found.map(|m| m.name), Some("Tacos".to_string()));

    let (other, _) = seed_household(&pool, &[]).await;
    let foreign = meals::find_meal_ref(&pool, other.id, inserted[0].id).await.unwrap();
    assert!(foreign.is_none(), "meals must not leak across households");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn meal_order_is_bytewise() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &["apple pie", "Banana bread", "Ziti"]).await;

    let names: Vec<String> = meals::list_meals(&pool, household.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, ["Banana bread", "Ziti", "apple pie"]);

    let refs = meals::list_meal_refs(&pool, household.id).await.unwrap();
    let ref_names: Vec<&str> = refs.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(ref_names, names);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_meal_is_scoped_to_household() {
    let (pool, db_name) = create_test_db().await;
    let (household, seeded) = seed_household(&pool, &["Chili"]).await;
    let (other, _) = seed_household(&pool, &[]).await;
    let chili = &seeded[0];

    let foreign = meals::update_meal(&pool, other.id, chili.id, "Stolen", None)
        .await
        .unwrap();
    assert!(foreign.is_none());

    let renamed = meals::update_meal(&pool, household.id, chili.id, "Chili con carne", None)
        .await
        .unwrap()
        .expect("meal should be renamed");
    assert_eq!(renamed.name, "Chili con carne");
    assert_eq!(renamed.notes, "");
    assert_eq!(renamed.created_at, chili.created_at);

    let noted = meals::update_meal(&pool, household.id, chili.id, "Chili", Some("mild"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(noted.name, "Chili");
    assert_eq!(noted.notes, "mild");

    let missing = meals::update_meal(&pool, household.id, Uuid::new_v4(), "Ghost", None)
        .await
        .unwrap();
    assert!(missing.is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_meal_is_scoped_to_household() {
    let (pool, db_name) = create_test_db().await;
    let (household, seeded) = seed_household(&pool, &["Soup"]).await;
    let (other, _) = seed_household(&pool, &[]).await;
    let soup = seeded[0].id;

    assert!(!meals::delete_meal(&pool, other.id, soup).await.unwrap());
    assert!(meals::find_meal_ref(&pool, household.id, soup).await.unwrap().is_some());

    assert!(meals::delete_meal(&pool, household.id, soup).await.unwrap());
    assert!(meals::find_meal_ref(&pool, household.id, soup).await.unwrap().is_none());
    assert!(!meals::delete_meal(&pool, household.id, soup).await.unwrap());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_meal_clears_days_serving_it() {
    let (pool, db_name) = create_test_db().await;
    let (household, seeded) = seed_household(&pool, &["Roast", "Salad"]).await;
    let (roast, salad) = (seeded[0].id, seeded[1].id);
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();
    plan_days::insert_missing_days(&pool, plan.id, household.id, &week_of(plan.week_start))
        .await
        .unwrap();
    let days = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap();
    let (sun, mon, tue) = (&days[6], &days[0], &days[1]);

    plan_days::update_day(&pool, household.id, sun.id, Some(roast), None, true)
        .await
        .unwrap();
    plan_days::update_day(&pool, household.id, mon.id, Some(roast), Some(sun.id), false)
        .await
        .unwrap();
    plan_days::update_day(&pool, household.id, tue.id, Some(salad), None, false)
        .await
        .unwrap();

    assert!(meals::delete_meal(&pool, household.id, roast).await.unwrap());

    let days = plan_days::list_days_for_plan(&pool, plan.id).await.unwrap();
    assert_eq!(days[6].meal_id, None);
    assert!(days[6].locked, "deleting a meal must not unlock its days");
    assert_eq!(days[0].meal_id, None);
    assert_eq!(days[0].leftover_from_plan_day_id, None);
    assert_eq!(days[1].meal_id, Some(salad));

    pool.close().await;
    drop_test_db(&db_name).await;
}

// -----------------------------------------------------------------------
// audit_events
// -----------------------------------------------------------------------

#[tokio::test]
async fn audit_events_are_listed_per_plan() {
    let (pool, db_name) = create_test_db().await;
    let (household, _) = seed_household(&pool, &[]).await;
    let plan = plans::insert_plan(&pool, household.id, date("2024-02-12"), Uuid::new_v4())
        .await
        .unwrap();

    let new = NewAuditEvent {
        household_id: household.id,
        actor_id: Uuid::new_v4(),
        action: AuditAction::DayLocked,
        plan_id: Some(plan.id),
        plan_day_id: None,
        payload: json!({ "locked": true }),
    };
    let inserted = audit_events::insert_audit_event(&pool, &new).await.unwrap();
    assert_eq!(inserted.action, AuditAction::DayLocked);

    let events = audit_events::list_events_for_plan(&pool, plan.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["locked"], true);

    pool.close().await;
    drop_test_db(&db_name).await;
}
