use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use quill_core::Requester;
use quill_core::domain::{PostDraft, User};
use quill_core::ports::{BaseRepository, PasswordService, TokenService};
use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;

fn token_service() -> Arc<dyn TokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "handler-test-secret".to_string(),
        expiration_hours: 1,
        issuer: "quill-api".to_string(),
    }))
}

fn password_service() -> Arc<dyn PasswordService> {
    Arc::new(Argon2PasswordService::new())
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new(token_service()))
                .app_data(web::Data::new(password_service()))
                .configure(configure_routes),
        )
        .await
    };
}

async fn seed_user(state: &AppState, username: &str) -> (User, String) {
    let user = state
        .users
        .insert(User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "unused-hash".to_string(),
        ))
        .await
        .unwrap();
    let token = token_service()
        .generate_token(user.id, &user.username)
        .unwrap();
    (user, token)
}

async fn seed_post(state: &AppState, user: &User, title: &str) -> Uuid {
    let requester = Requester::new(user.id, user.username.clone());
    state
        .posts
        .create(Some(&requester), PostDraft::new(title, "Some content"))
        .await
        .unwrap()
        .id
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn location(res: &actix_web::dev::ServiceResponse) -> String {
    res.headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[actix_web::test]
async fn test_empty_listing_is_page_one() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["posts"], json!([]));
    assert_eq!(body["page"]["number"], 1);
    assert_eq!(body["page"]["num_pages"], 1);
    assert_eq!(body["page"]["has_next"], false);
}

#[actix_web::test]
async fn test_listing_pages_and_last() {
    let state = AppState::in_memory();
    let (alice, _) = seed_user(&state, "alice").await;
    for i in 0..9 {
        seed_post(&state, &alice, &format!("Post {}", i)).await;
    }
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 4);
    assert_eq!(body["posts"][0]["title"], "Post 8");
    assert_eq!(body["posts"][0]["author"], "alice");
    assert_eq!(body["page"]["num_pages"], 3);

    let req = test::TestRequest::get().uri("/api/posts/?page=last").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"]["number"], 3);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["title"], "Post 0");

    for uri in ["/api/posts/?page=4", "/api/posts/?page=0", "/api/posts/?page=abc"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn test_user_listing() {
    let state = AppState::in_memory();
    let (alice, _) = seed_user(&state, "alice").await;
    let (bob, _) = seed_user(&state, "bob").await;
    seed_post(&state, &alice, "From alice").await;
    seed_post(&state, &bob, "From bob").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/users/bob/posts/")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "From bob");

    let req = test::TestRequest::get()
        .uri("/api/users/nobody/posts/")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_detail_not_found_and_malformed_id() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let uri = format!("/api/posts/{}/", Uuid::new_v4());
    let req = test::TestRequest::get().uri(&uri).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/posts/not-a-uuid/")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_requires_login() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .set_json(json!({"title": "Hello", "content": "World"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["login_url"], "/api/auth/login");

    let req = test::TestRequest::get().uri("/api/posts/new/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/posts/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["page"]["total_items"], 0);
}

#[actix_web::test]
async fn test_create_ignores_submitted_author() {
    let state = AppState::in_memory();
    let (alice, token) = seed_user(&state, "alice").await;
    let (bob, _) = seed_user(&state, "bob").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Hello", "content": "World", "author": bob.id}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let target = location(&res);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(target, format!("/api/posts/{}/", body["id"].as_str().unwrap()));
    assert_eq!(body["author_id"], json!(alice.id));

    let req = test::TestRequest::get().uri(&target).to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["author"], "alice");
    assert_eq!(detail["title"], "Hello");
}

#[actix_web::test]
async fn test_create_from_urlencoded_form() {
    let state = AppState::in_memory();
    let (_, token) = seed_user(&state, "alice").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header(bearer(&token))
        .set_form([("title", "Form post"), ("content", "Sent as a form")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_create_validation_errors() {
    let state = AppState::in_memory();
    let (_, token) = seed_user(&state, "alice").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "   ", "content": ""}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header(bearer(&token))
        .set_json(json!({"title": "x".repeat(101), "content": "Body"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_malformed_body_checks_login_first() {
    let state = AppState::in_memory();
    let (_, token) = seed_user(&state, "alice").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/posts/new/")
        .insert_header(bearer(&token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_non_author_cannot_edit_or_delete() {
    let state = AppState::in_memory();
    let (alice, _) = seed_user(&state, "alice").await;
    let (_, mallory) = seed_user(&state, "mallory").await;
    let post_id = seed_post(&state, &alice, "Original").await;
    let app = init_app!(state);

    for uri in [
        format!("/api/posts/{}/edit/", post_id),
        format!("/api/posts/{}/delete/", post_id),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer(&mallory))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/edit/", post_id))
        .insert_header(bearer(&mallory))
        .set_json(json!({"title": "Hijacked", "content": "Nope"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/delete/", post_id))
        .insert_header(bearer(&mallory))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/", post_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["title"], "Original");
    assert_eq!(detail["author"], "alice");
}

#[actix_web::test]
async fn test_mutating_missing_post() {
    let state = AppState::in_memory();
    let (_, token) = seed_user(&state, "alice").await;
    let app = init_app!(state);
    let uri = format!("/api/posts/{}/edit/", Uuid::new_v4());

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_json(json!({"title": "T", "content": "C"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({"title": "T", "content": "C"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_author_edits_and_deletes() {
    let state = AppState::in_memory();
    let (alice, token) = seed_user(&state, "alice").await;
    let post_id = seed_post(&state, &alice, "Draft").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/edit/", post_id))
        .insert_header(bearer(&token))
        .to_request();
    let form: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(form["post_id"], json!(post_id));
    assert_eq!(form["form"]["title"], "Draft");

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/edit/", post_id))
        .insert_header(bearer(&token))
        .set_json(json!({"title": "Final", "content": "Edited"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/api/posts/{}/", post_id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/", post_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["title"], "Final");
    assert_eq!(detail["content"], "Edited");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/delete/", post_id))
        .insert_header(bearer(&token))
        .to_request();
    let confirm: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(confirm["post"]["title"], "Final");

    let req = test::TestRequest::post()
        .uri(&format!("/api/posts/{}/delete/", post_id))
        .insert_header(bearer(&token))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/api/posts/");

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}/", post_id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_about_and_health() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/about/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "About");

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("X-Request-ID", "health-1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["request_id"], "health-1");
}

#[actix_web::test]
async fn test_register_login_me() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "correct-horse"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "carol",
            "email": "other@example.com",
            "password": "correct-horse"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(res).await;
    assert!(body["detail"].as_str().unwrap().contains("carol"));

    for (username, password) in [("carol", "wrong-password"), ("nobody", "correct-horse")] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": username, "password": password}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", username);
        assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "carol", "password": "correct-horse"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let auth: Value = test::read_body_json(res).await;
    let token = auth["access_token"].as_str().unwrap().to_string();
    assert_eq!(auth["token_type"], "Bearer");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "carol");
    assert_eq!(me["email"], "carol@example.com");

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_rejects_short_password() {
    let state = AppState::in_memory();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "dave",
            "email": "dave@example.com",
            "password": "short"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
