mod common;
mod http_helpers;

use axum::http::StatusCode;
use common::{read_json, seed_institution, seed_membership, seed_user, test_app};
use http_helpers::{bare_request, json_request, login};
use ppda_api::model::{now_epoch_seconds, Ppda, Role};
use ppda_api::store::BackendStore;
use tower::ServiceExt;

async fn seed_ppda(store: &ppda_api::store::memory::InMemoryStore, id: &str, institution: &str) {
    let now = now_epoch_seconds();
    store
        .create_ppda(Ppda {
            id_ppda: id.to_string(),
            id_institution: institution.to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed ppda");
}

#[tokio::test]
async fn viewer_can_list_but_not_create() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    seed_ppda(&store, "p1", "inst-a").await;
    let viewer = seed_user(&store, "viewer", "viewerpass", false).await;
    seed_membership(&store, &viewer, "inst-a", Role::Viewer).await;
    let (access, _) = login(&app, "viewer", "viewerpass").await;

    let list = app
        .clone()
        .oneshot(bare_request("GET", "/v1/ppdas?institution_id=inst-a", &access))
        .await
        .expect("list");
    assert_eq!(list.status(), StatusCode::OK);
    let body = read_json(list).await;
    assert_eq!(body.as_array().expect("array").len(), 1);

    let create = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/ppdas",
            &access,
            serde_json::json!({"id_institution": "inst-a"}),
        ))
        .await
        .expect("create");
    assert_eq!(create.status(), StatusCode::FORBIDDEN);
    let body = read_json(create).await;
    assert_eq!(
        body["message"],
        "Insufficient role for this action in this institution."
    );
}

#[tokio::test]
async fn editor_can_create_in_their_institution() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    let editor = seed_user(&store, "editor", "editorpass", false).await;
    seed_membership(&store, &editor, "inst-a", Role::Editor).await;
    let (access, _) = login(&app, "editor", "editorpass").await;

    let create = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/ppdas",
            &access,
            serde_json::json!({"id_institution": "inst-a"}),
        ))
        .await
        .expect("create");
    assert_eq!(create.status(), StatusCode::CREATED);
    let body = read_json(create).await;
    assert_eq!(body["id_institution"], "inst-a");
}

#[tokio::test]
async fn non_member_is_forbidden_even_to_read() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    seed_user(&store, "outsider", "outsiderpass", false).await;
    let (access, _) = login(&app, "outsider", "outsiderpass").await;

    let list = app
        .clone()
        .oneshot(bare_request("GET", "/v1/ppdas?institution_id=inst-a", &access))
        .await
        .expect("list");
    assert_eq!(list.status(), StatusCode::FORBIDDEN);
    let body = read_json(list).await;
    assert_eq!(
        body["message"],
        "User doesn't have access to resources of this institution."
    );
}

#[tokio::test]
async fn moving_a_ppda_requires_editor_in_both_institutions() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    seed_institution(&store, "inst-b", "Institution B").await;
    seed_ppda(&store, "p1", "inst-a").await;

    let partial = seed_user(&store, "partial", "partialpass", false).await;
    seed_membership(&store, &partial, "inst-a", Role::Editor).await;
    let (partial_access, _) = login(&app, "partial", "partialpass").await;

    // Editor of the source institution only: move is forbidden.
    let denied = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/v1/ppdas/p1",
            &partial_access,
            serde_json::json!({"id_institution": "inst-b"}),
        ))
        .await
        .expect("patch");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let both = seed_user(&store, "both", "bothpass", false).await;
    seed_membership(&store, &both, "inst-a", Role::Editor).await;
    seed_membership(&store, &both, "inst-b", Role::Editor).await;
    let (both_access, _) = login(&app, "both", "bothpass").await;

    let moved = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/v1/ppdas/p1",
            &both_access,
            serde_json::json!({"id_institution": "inst-b"}),
        ))
        .await
        .expect("patch");
    assert_eq!(moved.status(), StatusCode::OK);
    let body = read_json(moved).await;
    assert_eq!(body["id_institution"], "inst-b");

    let stored = store.get_ppda("p1").await.expect("ppda");
    assert_eq!(stored.id_institution, "inst-b");
}

#[tokio::test]
async fn viewer_in_target_institution_cannot_receive_a_move() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    seed_institution(&store, "inst-b", "Institution B").await;
    seed_ppda(&store, "p1", "inst-a").await;

    let mixed = seed_user(&store, "mixed", "mixedpass", false).await;
    seed_membership(&store, &mixed, "inst-a", Role::Editor).await;
    seed_membership(&store, &mixed, "inst-b", Role::Viewer).await;
    let (access, _) = login(&app, "mixed", "mixedpass").await;

    let denied = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/v1/ppdas/p1",
            &access,
            serde_json::json!({"id_institution": "inst-b"}),
        ))
        .await
        .expect("patch");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let stored = store.get_ppda("p1").await.expect("ppda");
    assert_eq!(stored.id_institution, "inst-a");
}

#[tokio::test]
async fn admin_bypasses_membership_checks() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    seed_user(&store, "root", "rootpassword", true).await;
    let (access, _) = login(&app, "root", "rootpassword").await;

    let create = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/ppdas",
            &access,
            serde_json::json!({"id_institution": "inst-a"}),
        ))
        .await
        .expect("create");
    assert_eq!(create.status(), StatusCode::CREATED);

    let list = app
        .clone()
        .oneshot(bare_request("GET", "/v1/ppdas?institution_id=inst-a", &access))
        .await
        .expect("list");
    assert_eq!(list.status(), StatusCode::OK);
}

#[tokio::test]
async fn deactivated_membership_loses_access() {
    let (app, store) = test_app();
    seed_institution(&store, "inst-a", "Institution A").await;
    let editor = seed_user(&store, "editor", "editorpass", false).await;
    seed_membership(&store, &editor, "inst-a", Role::Editor).await;
    let (access, _) = login(&app, "editor", "editorpass").await;

    store
        .upsert_membership(ppda_api::model::UserInstitution {
            id_user: editor.id_user.clone(),
            id_institution: "inst-a".to_string(),
            role: Role::Editor,
            is_active: false,
        })
        .await
        .expect("deactivate");

    let list = app
        .clone()
        .oneshot(bare_request("GET", "/v1/ppdas?institution_id=inst-a", &access))
        .await
        .expect("list");
    assert_eq!(list.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn creating_a_ppda_in_an_unknown_institution_fails() {
    let (app, store) = test_app();
    seed_user(&store, "root", "rootpassword", true).await;
    let (access, _) = login(&app, "root", "rootpassword").await;

    let create = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/ppdas",
            &access,
            serde_json::json!({"id_institution": "ghost"}),
        ))
        .await
        .expect("create");
    assert_eq!(create.status(), StatusCode::NOT_FOUND);
}
