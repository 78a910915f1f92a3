//! End-to-end tests over the router with the in-memory store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use db::{
    CreateInviteParams, InviteStore, MembershipStore,
    mem::MemStore,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::{Value, json};
use server::{config::Config, state::AppState};
use services::{InviteService, JoinService, UsageLogger};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        port: 0,
        database_url: String::new(),
        service_database_url: None,
        public_base_url: "https://app.example.com".to_string(),
        jwt_secret: SECRET.to_string(),
    })
}

fn app_with(store: &Arc<MemStore>) -> Router {
    let invites = Arc::new(InviteService::new(
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let join = Arc::new(JoinService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        UsageLogger::new(store.clone()),
    ));
    server::app(AppState {
        config: test_config(),
        invites,
        join,
    })
}

#[derive(Serialize)]
struct Claims {
    sub: Uuid,
    exp: usize,
}

fn bearer(user: Uuid) -> String {
    let claims = Claims {
        sub: user,
        exp: 4102444800, // 2100-01-01
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn post_json(uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_invite(store: &Arc<MemStore>, team_id: Uuid, created_by: Uuid, code: &str) {
    store
        .create_invite(&CreateInviteParams {
            team_id,
            created_by,
            code: code.to_string(),
            uses_remaining: None,
            expires_at: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn create_invite_requires_auth_and_membership() {
    let store = Arc::new(MemStore::new());
    let owner = store.add_user("owner");
    let team = store.add_team("Maple Grove", owner);
    let member = store.add_user("member");
    store.insert_membership(team.id, member).await.unwrap();
    let app = app_with(&store);

    let body = json!({"team_id": team.id, "uses_remaining": 5, "expires_in_days": 7});

    let response = app
        .clone()
        .oneshot(post_json("/v1/invites", None, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let outsider = store.add_user("outsider");
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/invites",
            Some(&bearer(outsider)),
            body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(post_json("/v1/invites", Some(&bearer(member)), body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let code = created["invite"]["code"].as_str().unwrap().to_string();
    assert_eq!(
        created["share_url"],
        format!("https://app.example.com/join/{code}")
    );

    // A second active invite for the same (team, creator) conflicts.
    let response = app
        .clone()
        .oneshot(post_json("/v1/invites", Some(&bearer(member)), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "invite_already_exists");
}

#[tokio::test]
async fn list_returns_only_the_callers_invites() {
    let store = Arc::new(MemStore::new());
    let owner = store.add_user("owner");
    let team = store.add_team("Maple Grove", owner);
    let member = store.add_user("member");
    store.insert_membership(team.id, member).await.unwrap();
    seed_invite(&store, team.id, member, "minecode01").await;
    seed_invite(&store, team.id, owner, "ownercode1").await;
    let app = app_with(&store);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/invites?team_id={}", team.id))
        .header(header::AUTHORIZATION, bearer(member))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let listings = body.as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["invite"]["code"], "minecode01");
}

#[tokio::test]
async fn delete_is_creator_only() {
    let store = Arc::new(MemStore::new());
    let owner = store.add_user("owner");
    let team = store.add_team("Maple Grove", owner);
    let member = store.add_user("member");
    store.insert_membership(team.id, member).await.unwrap();
    seed_invite(&store, team.id, member, "minecode01").await;
    let invite_id = store.find_by_code("minecode01").await.unwrap().unwrap().id;
    let app = app_with(&store);

    let stranger = store.add_user("stranger");
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/invites/{invite_id}"))
        .header(header::AUTHORIZATION, bearer(stranger))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/invites/{invite_id}"))
        .header(header::AUTHORIZATION, bearer(member))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.invite_count(), 0);
}

#[tokio::test]
async fn join_maps_every_protocol_branch() {
    let store = Arc::new(MemStore::new());
    let founder = store.add_user("founder");
    let team = store.add_team("Maple Grove", founder);
    let old_team = store.add_team("Old Pines", founder);
    seed_invite(&store, team.id, founder, "jointarget").await;
    let app = app_with(&store);

    // Unknown code.
    let user = store.add_user("ada");
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(user)),
            json!({"invite_code": "nosuchcode"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Fresh join succeeds.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(user)),
            json!({"invite_code": "jointarget"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "joined");
    assert_eq!(body["team_name"], "Maple Grove");

    // Joining again: already a member.
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(user)),
            json!({"invite_code": "jointarget"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["outcome"], "already_member");

    // A member of another team needs confirmation first.
    let switcher = store.add_user("switcher");
    store.insert_membership(old_team.id, switcher).await.unwrap();
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(switcher)),
            json!({"invite_code": "jointarget"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "requires_confirmation");
    assert_eq!(body["current_team_name"], "Old Pines");

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(switcher)),
            json!({"invite_code": "jointarget", "confirm_switch": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The owner of a team can never switch away from it.
    store.insert_membership(old_team.id, founder).await.unwrap();
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(founder)),
            json!({"invite_code": "jointarget", "confirm_switch": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["outcome"], "owner_cannot_switch");
}

#[tokio::test]
async fn join_distinguishes_expired_from_exhausted() {
    let store = Arc::new(MemStore::new());
    let founder = store.add_user("founder");
    let team = store.add_team("Maple Grove", founder);
    store
        .create_invite(&CreateInviteParams {
            team_id: team.id,
            created_by: founder,
            code: "expired001".to_string(),
            uses_remaining: None,
            expires_at: Some(Utc::now() - Duration::hours(1)),
        })
        .await
        .unwrap();
    store
        .create_invite(&CreateInviteParams {
            team_id: team.id,
            created_by: founder,
            code: "usedup0001".to_string(),
            uses_remaining: Some(0),
            expires_at: None,
        })
        .await
        .unwrap();
    let app = app_with(&store);
    let user = store.add_user("ada");

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(user)),
            json!({"invite_code": "expired001"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(body_json(response).await["error"], "invite_expired");

    let response = app
        .oneshot(post_json(
            "/v1/join",
            Some(&bearer(user)),
            json!({"invite_code": "usedup0001"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(body_json(response).await["error"], "invite_exhausted");
}

#[tokio::test]
async fn preview_is_public() {
    let store = Arc::new(MemStore::new());
    let owner = store.add_user("Fern");
    let team = store.add_team("Maple Grove", owner);
    store.insert_membership(team.id, owner).await.unwrap();
    seed_invite(&store, team.id, owner, "jointarget").await;
    let app = app_with(&store);

    let request = Request::builder()
        .method("GET")
        .uri("/v1/join/jointarget")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["team_name"], "Maple Grove");
    assert_eq!(body["member_count"], 1);
    assert_eq!(body["inviter_name"], "Fern");
}

#[tokio::test]
async fn rejects_garbage_tokens() {
    let store = Arc::new(MemStore::new());
    let app = app_with(&store);

    let response = app
        .oneshot(post_json(
            "/v1/join",
            Some("Bearer not-a-jwt"),
            json!({"invite_code": "whatever00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
