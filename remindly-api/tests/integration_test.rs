/// Integration tests for the Remindly API
///
/// These tests drive the full router end-to-end:
/// - Registration, confirmation and login
/// - Authentication on protected routes
/// - To-do list lifecycle
/// - Subscription management and a reminder cycle run by the worker

mod common;

use axum::http::StatusCode;
use common::{TestContext, PASSWORD, PUBLIC_BASE_URL};
use remindly_shared::registration::CONFIRMATION_SUBJECT;
use remindly_worker::digest::{DIGEST_SUBJECT, UNSUBSCRIBED_SUBJECT};
use remindly_worker::scheduler::ReminderScheduler;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.store.set_offline(true);
    let (status, body) = ctx.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_register_sends_confirmation_link() {
    let ctx = TestContext::new();

    let (status, body) = ctx.register("alice@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["email"], "alice@example.com");

    let token = ctx.confirmation_token("alice@example.com", 1).await;
    assert_eq!(token.len(), 64);

    let mail = &ctx.mailer.sent_to("alice@example.com").await[0];
    assert_eq!(mail.subject, CONFIRMATION_SUBJECT);
    assert!(mail.body.contains(&format!(
        "{}/v1/auth/confirm-email?token={}",
        PUBLIC_BASE_URL, token
    )));
}

#[tokio::test]
async fn test_login_requires_confirmation() {
    let ctx = TestContext::new();

    ctx.register("bob@example.com", PASSWORD).await;
    let (status, _) = ctx.login("bob@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = ctx.confirmation_token("bob@example.com", 1).await;
    let (status, body) = ctx.confirm(&token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "bob@example.com");
    assert_eq!(body["subscribed"], false);

    let (status, body) = ctx.login("bob@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_token_is_single_use() {
    let ctx = TestContext::new();

    ctx.register("carol@example.com", PASSWORD).await;
    let token = ctx.confirmation_token("carol@example.com", 1).await;

    let (status, _) = ctx.confirm(&token).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx.confirm(&token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_reregistration_rotates_token() {
    let ctx = TestContext::new();

    ctx.register("dave@example.com", PASSWORD).await;
    let first = ctx.confirmation_token("dave@example.com", 1).await;

    let (status, _) = ctx.register("dave@example.com", "An0ther!Pass").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let second = ctx.confirmation_token("dave@example.com", 2).await;
    assert_ne!(first, second);

    let (status, _) = ctx.confirm(&first).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.confirm(&second).await;
    assert_eq!(status, StatusCode::CREATED);

    // The latest request's password wins
    let (status, _) = ctx.login("dave@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = ctx.login("dave@example.com", "An0ther!Pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_verified_email_conflicts() {
    let ctx = TestContext::new();
    ctx.verified_user("erin@example.com").await;

    let (status, body) = ctx.register("Erin@Example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // No new link was sent
    assert_eq!(ctx.mailer.sent_to("erin@example.com").await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_confirmations_create_one_user() {
    let ctx = Arc::new(TestContext::new());

    ctx.register("frank@example.com", PASSWORD).await;
    let token = ctx.confirmation_token("frank@example.com", 1).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = ctx.clone();
            let token = token.clone();
            tokio::spawn(async move { ctx.confirm(&token).await.0 })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx.register("not-an-email", PASSWORD).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = ctx.register("grace@example.com", "alllowercase1!").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");

    assert!(ctx.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn test_register_store_failure() {
    let ctx = TestContext::new();
    ctx.store.set_offline(true);

    let (status, body) = ctx.register("heidi@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let ctx = TestContext::new();
    ctx.verified_user("ivan@example.com").await;

    let (status, _) = ctx.login("ivan@example.com", "Wr0ng!Pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.login("nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new();

    let (status, _) = ctx.send("GET", "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send("GET", "/v1/users/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let token = ctx.verified_user("judy@example.com").await;

    let mut ids = Vec::new();
    for text in ["Buy milk", "Walk dog", "File taxes"] {
        let (status, body) = ctx
            .send("POST", "/v1/tasks", Some(&token), Some(json!({ "text": text })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["text"], text);
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    let (status, body) = ctx.send("GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["Buy milk", "Walk dog", "File taxes"]);

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{}", ids[1]), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{}", ids[1]), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.send("DELETE", "/v1/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, body) = ctx.send("GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_tasks_are_private() {
    let ctx = TestContext::new();
    let owner = ctx.verified_user("kim@example.com").await;
    let other = ctx.verified_user("leo@example.com").await;

    let (_, body) = ctx
        .send("POST", "/v1/tasks", Some(&owner), Some(json!({ "text": "Secret" })))
        .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (_, body) = ctx.send("GET", "/v1/tasks", Some(&other), None).await;
    assert_eq!(body, json!([]));

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{}", id), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx.send("GET", "/v1/tasks", Some(&owner), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_task_rejected() {
    let ctx = TestContext::new();
    let token = ctx.verified_user("mia@example.com").await;

    let (status, body) = ctx
        .send("POST", "/v1/tasks", Some(&token), Some(json!({ "text": "   " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "text");
}

#[tokio::test]
async fn test_subscription_and_account_deletion() {
    let ctx = TestContext::new();
    let token = ctx.verified_user("nina@example.com").await;

    let (status, body) = ctx.send("GET", "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscribed"], false);

    let (status, body) = ctx
        .send(
            "PUT",
            "/v1/users/me/subscription",
            Some(&token),
            Some(json!({ "subscribed": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscribed"], true);

    let (_, body) = ctx.send("GET", "/v1/users/me", Some(&token), None).await;
    assert_eq!(body["subscribed"], true);

    let (status, _) = ctx.send("DELETE", "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The token outlives the account
    let (status, _) = ctx.send("GET", "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send("POST", "/v1/tasks", Some(&token), Some(json!({ "text": "Orphan" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.login("nina@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reminder_cycle_after_signup() {
    let ctx = TestContext::new();
    let busy = ctx.verified_user("olga@example.com").await;
    let idle = ctx.verified_user("pete@example.com").await;

    for token in [&busy, &idle] {
        ctx.send(
            "PUT",
            "/v1/users/me/subscription",
            Some(token),
            Some(json!({ "subscribed": true })),
        )
        .await;
    }

    for text in ["Buy milk", "Walk dog"] {
        ctx.send("POST", "/v1/tasks", Some(&busy), Some(json!({ "text": text })))
            .await;
    }

    ctx.mailer.clear().await;

    let scheduler = ReminderScheduler::new(
        ctx.store.clone(),
        ctx.mailer.clone(),
        Duration::from_secs(3600),
    );
    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.recipients, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.unsubscribed, 1);

    let digest = &ctx.mailer.sent_to("olga@example.com").await[0];
    assert_eq!(digest.subject, DIGEST_SUBJECT);
    assert!(digest.body.contains("1. Buy milk"));
    assert!(digest.body.contains("2. Walk dog"));

    let notice = &ctx.mailer.sent_to("pete@example.com").await[0];
    assert_eq!(notice.subject, UNSUBSCRIBED_SUBJECT);

    let (_, body) = ctx.send("GET", "/v1/users/me", Some(&idle), None).await;
    assert_eq!(body["subscribed"], false);
}
