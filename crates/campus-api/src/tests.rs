//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use campus_core::academic::{AcademicUnit, UnitKind};
use campus_store_sqlite::SqliteStore;
use campus_sync::CommunityEngine;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

struct Fixture {
  store:   SqliteStore,
  faculty: AcademicUnit,
  course:  AcademicUnit,
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let faculty = store.add_unit(UnitKind::Faculty, "F-ENG", None).await.unwrap();
  let course = store
    .add_unit(UnitKind::Course, "Year 1", Some(faculty.unit_id))
    .await
    .unwrap();
  Fixture { store, faculty, course }
}

fn router(store: &SqliteStore) -> Router {
  api_router(CommunityEngine::new(store.clone()))
}

async fn send(
  store: &SqliteStore,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = router(store).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

// ── Units ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn provisioning_is_idempotent_over_http() {
  let f = fixture().await;
  let uri = format!("/units/course/{}/community", f.course.unit_id);

  let (status, first) = send(&f.store, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["name"], "Year 1 - F-ENG");
  assert_eq!(first["kind"], "course");

  let (status, second) = send(&f.store, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["community_id"], second["community_id"]);
}

#[tokio::test]
async fn unknown_unit_is_404() {
  let f = fixture().await;
  let uri = format!("/units/group/{}/community", Uuid::new_v4());
  let (status, body) = send(&f.store, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("group"));
}

#[tokio::test]
async fn active_unit_community_cannot_be_retired() {
  let f = fixture().await;
  let uri = format!("/units/faculty/{}/community", f.faculty.unit_id);
  send(&f.store, "POST", &uri, None).await;

  let (status, _) = send(&f.store, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  f.store.set_unit_active(f.faculty.unit_id, false).await.unwrap();
  let (status, _) = send(&f.store, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

// ── Communities and members ──────────────────────────────────────────────────

#[tokio::test]
async fn department_lifecycle() {
  let f = fixture().await;
  let creator = f.store.add_user("Ada", "Lovelace").await.unwrap();
  let member = f.store.add_user("Grace", "Hopper").await.unwrap();

  let (status, created) = send(
    &f.store,
    "POST",
    "/communities",
    Some(json!({ "creator_id": creator, "name": "Library" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["kind"], "department");
  assert_eq!(created["auto_join"], false);
  let id = created["community_id"].as_str().unwrap().to_owned();

  let (status, patched) = send(
    &f.store,
    "PATCH",
    &format!("/communities/{id}"),
    Some(json!({ "description": "Quiet please" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(patched["description"], "Quiet please");

  let members_uri = format!("/communities/{id}/members");
  let (status, _) =
    send(&f.store, "POST", &members_uri, Some(json!({ "user_id": member }))).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) =
    send(&f.store, "POST", &members_uri, Some(json!({ "user_id": member }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("already a member"));

  let (status, members) = send(&f.store, "GET", &members_uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(members[0]["display_name"], "Ada Lovelace");
  assert_eq!(members[0]["membership"]["role"], "admin");
  assert_eq!(members[1]["display_name"], "Grace Hopper");

  let (status, _) = send(&f.store, "DELETE", &format!("{members_uri}/{creator}"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&f.store, "DELETE", &format!("/communities/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&f.store, "GET", &format!("/communities/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn academic_community_cannot_be_deleted() {
  let f = fixture().await;
  let (_, community) = send(
    &f.store,
    "POST",
    &format!("/units/faculty/{}/community", f.faculty.unit_id),
    None,
  )
  .await;
  let id = community["community_id"].as_str().unwrap();

  let (status, _) = send(&f.store, "DELETE", &format!("/communities/{id}"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Users ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_then_list_user_communities() {
  let f = fixture().await;
  let user = f.store.add_user("Grace", "Hopper").await.unwrap();

  let (status, report) = send(
    &f.store,
    "POST",
    &format!("/users/{user}/reconcile"),
    Some(json!({
      "new": { "faculty_id": f.faculty.unit_id, "course_id": f.course.unit_id }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["faculty"]["outcome"], "joined");
  assert_eq!(report["course"]["outcome"], "joined");
  assert_eq!(report["group"], json!({ "outcome": "skipped", "reason": "cleared" }));

  let (status, communities) =
    send(&f.store, "GET", &format!("/users/{user}/communities"), None).await;
  assert_eq!(status, StatusCode::OK);
  let kinds: Vec<_> = communities
    .as_array()
    .unwrap()
    .iter()
    .map(|c| c["community"]["kind"].as_str().unwrap())
    .collect();
  assert_eq!(kinds, ["faculty", "course"]);
}

#[tokio::test]
async fn assignment_validation() {
  let f = fixture().await;
  let other = f.store.add_unit(UnitKind::Faculty, "F-MED", None).await.unwrap();

  let (status, _) = send(
    &f.store,
    "POST",
    "/assignments/validate",
    Some(json!({ "faculty_id": f.faculty.unit_id, "course_id": f.course.unit_id })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = send(
    &f.store,
    "POST",
    "/assignments/validate",
    Some(json!({ "faculty_id": other.unit_id, "course_id": f.course.unit_id })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("mismatched academic hierarchy"));

  let (status, _) = send(
    &f.store,
    "GET",
    &format!("/users/{}/communities", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
