use campus_core::{
  ErrorKind,
  academic::{AcademicTriple, UnitKind},
  community::CommunityKind,
  membership::Principal,
  store::CommunityStore,
};
use uuid::Uuid;

use super::support::{Campus, FlakyStore};
use crate::{CommunityEngine, LevelOutcome, SkipReason};

#[tokio::test]
async fn first_assignment_joins_every_level() {
  let campus = Campus::new().await;
  let engine = campus.engine();
  let user = campus.user("Grace", "Hopper").await;
  let new = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_one.unit_id),
    Some(campus.group_a.unit_id),
  );

  let report = engine
    .reconciler
    .reconcile(user, AcademicTriple::default(), new)
    .await;
  assert!(!report.has_failures());

  for kind in UnitKind::ALL {
    let community = campus
      .store
      .find_active_for_unit(CommunityKind::from(kind), new.get(kind).unwrap())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(
      report.level(kind),
      &LevelOutcome::Joined { community_id: community.community_id }
    );
    let membership = campus
      .store
      .find_membership(community.community_id, Principal::User(user))
      .await
      .unwrap()
      .unwrap();
    assert!(membership.active);
  }
}

#[tokio::test]
async fn failing_level_does_not_affect_the_others() {
  let campus = Campus::new().await;
  let flaky = FlakyStore::new(campus.store.clone()).failing([campus.year_two.unit_id]);
  let engine = CommunityEngine::new(flaky);
  let user = campus.user("Grace", "Hopper").await;

  let old = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_one.unit_id),
    Some(campus.group_a.unit_id),
  );
  let new = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_two.unit_id),
    Some(campus.group_b.unit_id),
  );

  let report = engine.reconciler.reconcile(user, old, new).await;

  assert_eq!(report.faculty, LevelOutcome::Skipped { reason: SkipReason::Unchanged });
  assert!(matches!(
    report.course,
    LevelOutcome::Failed { kind: ErrorKind::Infrastructure, .. }
  ));
  assert!(matches!(report.group, LevelOutcome::Joined { .. }));
  assert!(report.has_failures());

  let group = campus
    .store
    .find_active_for_unit(CommunityKind::Group, campus.group_b.unit_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(group.name, "IS-21 - Year 2");
  assert!(
    campus
      .store
      .find_membership(group.community_id, Principal::User(user))
      .await
      .unwrap()
      .is_some_and(|m| m.active)
  );
}

#[tokio::test]
async fn unchanged_and_cleared_levels_are_skipped() {
  let campus = Campus::new().await;
  let engine = campus.engine();
  let user = campus.user("Grace", "Hopper").await;

  let old = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_one.unit_id),
    Some(campus.group_a.unit_id),
  );
  let new = AcademicTriple::new(Some(campus.engineering.unit_id), None, None);

  let report = engine.reconciler.reconcile(user, old, new).await;
  assert_eq!(report.faculty, LevelOutcome::Skipped { reason: SkipReason::Unchanged });
  assert_eq!(report.course, LevelOutcome::Skipped { reason: SkipReason::Cleared });
  assert_eq!(report.group, LevelOutcome::Skipped { reason: SkipReason::Cleared });

  // Nothing was provisioned.
  assert!(
    campus
      .store
      .find_active_for_unit(CommunityKind::Faculty, campus.engineering.unit_id)
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn existing_membership_is_reported_not_failed() {
  let campus = Campus::new().await;
  let engine = campus.engine();
  let user = campus.user("Grace", "Hopper").await;
  let faculty = engine
    .provisioner
    .provision_for_unit(UnitKind::Faculty, campus.medicine.unit_id)
    .await
    .unwrap();
  engine.ledger.join(faculty.community_id, user).await.unwrap();

  let new = AcademicTriple::new(Some(campus.medicine.unit_id), None, None);
  let report = engine
    .reconciler
    .reconcile(user, AcademicTriple::default(), new)
    .await;
  assert_eq!(
    report.faculty,
    LevelOutcome::AlreadyMember { community_id: faculty.community_id }
  );
  assert!(!report.has_failures());
}

#[tokio::test]
async fn unknown_units_fail_only_their_level() {
  let campus = Campus::new().await;
  let engine = campus.engine();
  let user = campus.user("Grace", "Hopper").await;
  let new = AcademicTriple::new(Some(campus.medicine.unit_id), Some(Uuid::new_v4()), None);

  let report = engine
    .reconciler
    .reconcile(user, AcademicTriple::default(), new)
    .await;
  assert!(matches!(report.faculty, LevelOutcome::Joined { .. }));
  assert!(matches!(
    report.course,
    LevelOutcome::Failed { kind: ErrorKind::NotFound, .. }
  ));
}

#[tokio::test]
async fn report_serialises_with_outcome_tags() {
  let campus = Campus::new().await;
  let flaky = FlakyStore::new(campus.store.clone()).failing([campus.anatomy.unit_id]);
  let engine = CommunityEngine::new(flaky);
  let user = campus.user("Grace", "Hopper").await;
  let new = AcademicTriple::new(None, Some(campus.anatomy.unit_id), None);

  let report = engine
    .reconciler
    .reconcile(user, AcademicTriple::default(), new)
    .await;
  let json = serde_json::to_value(&report).unwrap();

  assert_eq!(json["user_id"], user.to_string());
  assert_eq!(json["faculty"], serde_json::json!({ "outcome": "skipped", "reason": "cleared" }));
  assert_eq!(json["course"]["outcome"], "failed");
  assert_eq!(json["course"]["kind"], "infrastructure");
}

#[tokio::test]
async fn valid_assignments_pass() {
  let campus = Campus::new().await;
  let engine = campus.engine();

  let full = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_one.unit_id),
    Some(campus.group_a.unit_id),
  );
  engine.reconciler.validate_assignment(full).await.unwrap();
  engine
    .reconciler
    .validate_assignment(AcademicTriple::default())
    .await
    .unwrap();

  // A group alone, or a group under the right faculty without a course.
  let group_only = AcademicTriple::new(None, None, Some(campus.group_b.unit_id));
  engine.reconciler.validate_assignment(group_only).await.unwrap();
  let skip_course = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    None,
    Some(campus.group_b.unit_id),
  );
  engine.reconciler.validate_assignment(skip_course).await.unwrap();
}

#[tokio::test]
async fn mismatched_assignments_are_rejected() {
  let campus = Campus::new().await;
  let engine = campus.engine();

  let wrong_group = AcademicTriple::new(
    Some(campus.engineering.unit_id),
    Some(campus.year_one.unit_id),
    Some(campus.group_b.unit_id),
  );
  let err = engine.reconciler.validate_assignment(wrong_group).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvariantViolation);

  let wrong_faculty = AcademicTriple::new(
    Some(campus.medicine.unit_id),
    Some(campus.year_one.unit_id),
    None,
  );
  let err = engine.reconciler.validate_assignment(wrong_faculty).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvariantViolation);

  let wrong_faculty_no_course = AcademicTriple::new(
    Some(campus.medicine.unit_id),
    None,
    Some(campus.group_a.unit_id),
  );
  let err = engine
    .reconciler
    .validate_assignment(wrong_faculty_no_course)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvariantViolation);

  campus.store.set_unit_active(campus.year_two.unit_id, false).await.unwrap();
  let inactive = AcademicTriple::new(None, Some(campus.year_two.unit_id), None);
  let err = engine.reconciler.validate_assignment(inactive).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
