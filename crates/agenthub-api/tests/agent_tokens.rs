//! Agent token lifecycle against a real PostgreSQL database.
//!
//! Covers issuing, listing and revoking agent tokens through the HTTP API and
//! checks that revoked or expired tokens neither list nor authenticate.

mod common;

use agenthub_common::ids;
use agenthub_db::repository::tokens;
use axum::http::StatusCode;
use common::{Harness, harness};
use serde_json::Value;

impl Harness {
    async fn issue(&self, admin: &str, agent_id: &str) -> Value {
        let (status, body) = self
            .call("POST", &format!("/auth/agents/{agent_id}/tokens"), admin)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    async fn listed_ids(&self, admin: &str, agent_id: &str) -> Vec<String> {
        let (status, body) = self
            .call("GET", &format!("/auth/agents/{agent_id}/tokens"), admin)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["tokens"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_issue_and_list_agent_tokens() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let agent_id = h.agent().await;

    let first = h.issue(&admin, &agent_id).await;
    let second = h.issue(&admin, &agent_id).await;

    let access = first["access_token"].as_str().unwrap();
    assert!(access.starts_with("tkn_"));
    assert_eq!(access.len(), 4 + ids::TOKEN_RANDOM_LEN);
    assert_eq!(first["token_type"], "bearer");
    assert!(first.get("is_revoked").is_none());

    let expires_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(first["expires_at"].clone()).unwrap();
    let days = (expires_at - chrono::Utc::now()).num_days();
    assert!((364..=365).contains(&days), "expires in {days} days");

    let listed = h.listed_ids(&admin, &agent_id).await;
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&first["id"].as_str().unwrap().to_string()));
    assert!(listed.contains(&second["id"].as_str().unwrap().to_string()));
}

#[tokio::test]
async fn test_listing_requires_admin_and_known_agent() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let agent_id = h.agent().await;
    let agent_token = h.issue(&admin, &agent_id).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = h
        .call("GET", &format!("/auth/agents/{agent_id}/tokens"), &agent_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = h
        .call("GET", "/auth/agents/agent_missing/tokens", &admin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Agent not found");
}

#[tokio::test]
async fn test_revoke_twice_succeeds_and_token_stops_authenticating() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let agent_id = h.agent().await;
    let issued = h.issue(&admin, &agent_id).await;
    let token_id = issued["id"].as_str().unwrap();
    let access = issued["access_token"].as_str().unwrap();

    let (status, _) = h.call("GET", "/tasks", access).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/auth/agents/{agent_id}/tokens/{token_id}");
    for _ in 0..2 {
        let (status, body) = h.call("DELETE", &uri, &admin).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(
            body["message"],
            format!("Token {token_id} revoked successfully")
        );
    }

    let (status, body) = h.call("GET", "/tasks", access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert!(h.listed_ids(&admin, &agent_id).await.is_empty());
}

#[tokio::test]
async fn test_revoke_other_agents_token_is_not_found() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let owner = h.agent().await;
    let other = h.agent().await;
    let issued = h.issue(&admin, &owner).await;
    let token_id = issued["id"].as_str().unwrap();

    let (status, body) = h
        .call(
            "DELETE",
            &format!("/auth/agents/{other}/tokens/{token_id}"),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Token not found or does not belong to this agent"
    );

    // The owner's token is untouched.
    assert_eq!(h.listed_ids(&admin, &owner).await, vec![token_id.to_string()]);
}

#[tokio::test]
async fn test_expired_token_is_not_listed_or_accepted() {
    let Some(h) = harness().await else { return };
    let admin = h.admin_token().await;
    let agent_id = h.agent().await;
    let expired = h.issue(&admin, &agent_id).await;
    let live = h.issue(&admin, &agent_id).await;

    sqlx::query("UPDATE tokens SET expires_at = NOW() - INTERVAL '1 day' WHERE id = $1")
        .bind(expired["id"].as_str().unwrap())
        .execute(&h.db.pool)
        .await
        .unwrap();

    assert_eq!(
        h.listed_ids(&admin, &agent_id).await,
        vec![live["id"].as_str().unwrap().to_string()]
    );

    let expired_access = expired["access_token"].as_str().unwrap();
    let (status, _) = h.call("GET", "/tasks", expired_access).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(
        tokens::find_active_by_access_token(&h.db.pool, expired_access)
            .await
            .unwrap()
            .is_none()
    );
}
