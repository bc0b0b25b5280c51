//! Agent dispatch.
//!
//! Every inbound customer message enqueues one job per active chat agent. A job
//! waits until the chat has been quiet for the agent's buffer time, then sends
//! the recent conversation to the agent's webhook. At most one job per chat
//! agent is pending at a time; jobs arriving while one is pending are folded
//! into it, since the pending job will read the newer messages anyway.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use agenthub_common::config::DispatchConfig;
use agenthub_common::models::{Agent, Chat, Message, SenderType};
use agenthub_db::repository::{agents, chat_agents, chats, messages};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::{Mutex, mpsc};

use crate::delivery::Delivery;
use crate::webhook::WebhookClient;

/// One unit of dispatch work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchJob {
    pub chat_agent_id: String,
    pub message_id: String,
}

/// What happened to a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DispatchOutcome {
    Error { message: String },
    Skipped { message: String },
    Buffered {
        chat_agent_id: String,
        buffer_seconds: i32,
        #[serde(skip)]
        retry_in: Duration,
    },
    Sent { chat_agent_id: String },
    Failed { chat_agent_id: String, attempts: u32 },
}

/// Everything a job needs to run.
#[derive(Clone)]
pub struct DispatchContext {
    pub db: PgPool,
    pub webhook: WebhookClient,
    pub delivery: Delivery,
}

/// How long to keep waiting before the chat counts as quiet, if at all.
pub fn remaining_buffer(
    now: DateTime<Utc>,
    last_message_ts: DateTime<Utc>,
    buffer_time_seconds: i32,
) -> Option<Duration> {
    let buffer = chrono::Duration::seconds(i64::from(buffer_time_seconds.max(0)));
    let elapsed = now - last_message_ts;
    if elapsed < buffer {
        (buffer - elapsed).to_std().ok()
    } else {
        None
    }
}

/// Webhook body sent to an agent.
pub fn build_payload(chat: &Chat, agent: &Agent, trigger_message_id: &str, history: &[Message]) -> serde_json::Value {
    json!({
        "chat": {
            "id": chat.id,
            "external_id": chat.external_id,
            "name": chat.name,
            "channel_id": chat.channel_id,
            "meta_data": chat.meta_data,
        },
        "agent": {
            "id": agent.id,
            "name": agent.name,
        },
        "trigger_message_id": trigger_message_id,
        "messages": history.iter().map(|m| json!({
            "id": m.id,
            "external_id": m.external_id,
            "content": m.content,
            "sender_type": m.sender_type,
            "timestamp": m.timestamp,
            "message_type": m.message_type(),
        })).collect::<Vec<_>>(),
    })
}

/// A job that passed every check and is ready to call the webhook.
struct ReadyCall {
    chat_agent_id: String,
    chat: Chat,
    agent: Agent,
    webhook_url: String,
    payload: serde_json::Value,
}

enum Step {
    Done(DispatchOutcome),
    Ready(Box<ReadyCall>),
}

async fn evaluate(ctx: &DispatchContext, job: &DispatchJob) -> Result<Step, sqlx::Error> {
    let done = |outcome| Ok(Step::Done(outcome));

    let Some(link) = chat_agents::find_by_id(&ctx.db, &job.chat_agent_id).await? else {
        return done(DispatchOutcome::Error {
            message: format!("ChatAgent {} not found", job.chat_agent_id),
        });
    };
    if !link.active {
        return done(DispatchOutcome::Skipped {
            message: "ChatAgent is inactive".into(),
        });
    }

    let Some(agent) = agents::find_by_id(&ctx.db, &link.agent_id).await? else {
        return done(DispatchOutcome::Error {
            message: format!("Agent {} not found", link.agent_id),
        });
    };
    if !agent.is_active {
        return done(DispatchOutcome::Skipped {
            message: "Agent is inactive".into(),
        });
    }
    let Some(webhook_url) = agent.webhook_url.clone() else {
        return done(DispatchOutcome::Skipped {
            message: "Agent has no webhook URL".into(),
        });
    };

    let Some(chat) = chats::find_by_id(&ctx.db, &link.chat_id).await? else {
        return done(DispatchOutcome::Error {
            message: format!("Chat {} not found", link.chat_id),
        });
    };

    let now = Utc::now();
    if let Some(retry_in) = remaining_buffer(now, chat.last_message_ts, agent.buffer_time_seconds) {
        return done(DispatchOutcome::Buffered {
            chat_agent_id: link.id,
            buffer_seconds: agent.buffer_time_seconds,
            retry_in,
        });
    }

    let since = now - chrono::Duration::minutes(i64::from(agent.recent_msg_window_minutes));
    let history =
        messages::recent_for_chat(&ctx.db, &chat.id, since, i64::from(agent.history_msg_count)).await?;
    let payload = build_payload(&chat, &agent, &job.message_id, &history);

    Ok(Step::Ready(Box::new(ReadyCall {
        chat_agent_id: link.id,
        chat,
        agent,
        webhook_url,
        payload,
    })))
}

async fn call(ctx: &DispatchContext, ready: ReadyCall) -> DispatchOutcome {
    let outcome = ctx.webhook.post_json(&ready.webhook_url, &ready.payload).await;
    if !outcome.delivered {
        return DispatchOutcome::Failed {
            chat_agent_id: ready.chat_agent_id,
            attempts: outcome.attempts,
        };
    }

    if !ready.agent.is_fire_and_forget {
        if let Some(content) = sync_reply(outcome.response.as_ref()) {
            let meta = json!({"agent_id": ready.agent.id, "source": "webhook_response"});
            if let Err(e) = ctx
                .delivery
                .post_reply(&ready.chat, SenderType::Agent, content, meta, true)
                .await
            {
                tracing::error!(chat_id = %ready.chat.id, agent_id = %ready.agent.id, error = %e, "Failed to store agent reply");
            }
        }
    }

    DispatchOutcome::Sent {
        chat_agent_id: ready.chat_agent_id,
    }
}

/// A non-empty `content` string in the webhook response body.
fn sync_reply(response: Option<&serde_json::Value>) -> Option<&str> {
    response?
        .get("content")?
        .as_str()
        .map(str::trim)
        .filter(|c| !c.is_empty())
}

/// Run one dispatch pass for a chat agent without scheduling retries.
pub async fn process_chat_message(
    ctx: &DispatchContext,
    chat_agent_id: &str,
    message_id: &str,
) -> Result<DispatchOutcome, sqlx::Error> {
    let job = DispatchJob {
        chat_agent_id: chat_agent_id.to_string(),
        message_id: message_id.to_string(),
    };
    match evaluate(ctx, &job).await? {
        Step::Done(outcome) => Ok(outcome),
        Step::Ready(ready) => Ok(call(ctx, *ready).await),
    }
}

/// Chat agents with a job queued or waiting out their buffer.
#[derive(Clone, Default)]
pub struct PendingSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PendingSet {
    /// Returns false when a job for this chat agent is already pending.
    pub async fn claim(&self, chat_agent_id: &str) -> bool {
        self.inner.lock().await.insert(chat_agent_id.to_string())
    }

    pub async fn release(&self, chat_agent_id: &str) {
        self.inner.lock().await.remove(chat_agent_id);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Handle for enqueueing dispatch jobs onto the background worker.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<DispatchJob>,
    pending: PendingSet,
}

impl Dispatcher {
    /// Start the worker loop on the current runtime.
    pub fn spawn(ctx: DispatchContext, config: &DispatchConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let pending = PendingSet::default();
        tokio::spawn(run(ctx, rx, pending.clone()));
        Self { tx, pending }
    }

    /// Queue a job. Returns false when it was folded into a pending job.
    pub async fn enqueue(&self, chat_agent_id: &str, message_id: &str) -> bool {
        if !self.pending.claim(chat_agent_id).await {
            tracing::debug!(%chat_agent_id, %message_id, "Dispatch already pending, coalesced");
            return false;
        }
        let job = DispatchJob {
            chat_agent_id: chat_agent_id.to_string(),
            message_id: message_id.to_string(),
        };
        if self.tx.send(job).await.is_err() {
            tracing::error!(%chat_agent_id, "Dispatch worker is gone, job dropped");
            self.pending.release(chat_agent_id).await;
            return false;
        }
        true
    }
}

async fn run(ctx: DispatchContext, mut rx: mpsc::Receiver<DispatchJob>, pending: PendingSet) {
    tracing::info!("Agent dispatch worker started");
    while let Some(job) = rx.recv().await {
        let ctx = ctx.clone();
        let pending = pending.clone();
        tokio::spawn(async move { run_job(ctx, job, pending).await });
    }
    tracing::info!("Agent dispatch worker stopped");
}

async fn run_job(ctx: DispatchContext, job: DispatchJob, pending: PendingSet) {
    loop {
        match evaluate(&ctx, &job).await {
            Ok(Step::Done(DispatchOutcome::Buffered { retry_in, buffer_seconds, .. })) => {
                tracing::debug!(chat_agent_id = %job.chat_agent_id, buffer_seconds, ?retry_in, "Chat still active, buffering");
                tokio::time::sleep(retry_in).await;
            }
            Ok(Step::Done(outcome)) => {
                pending.release(&job.chat_agent_id).await;
                tracing::info!(chat_agent_id = %job.chat_agent_id, ?outcome, "Dispatch finished");
                return;
            }
            Ok(Step::Ready(ready)) => {
                // Release before the call so messages arriving meanwhile start a new job.
                pending.release(&job.chat_agent_id).await;
                let outcome = call(&ctx, *ready).await;
                tracing::info!(chat_agent_id = %job.chat_agent_id, message_id = %job.message_id, ?outcome, "Dispatch finished");
                return;
            }
            Err(e) => {
                pending.release(&job.chat_agent_id).await;
                tracing::error!(chat_agent_id = %job.chat_agent_id, error = %e, "Dispatch failed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenthub_common::models::DeliveryStatus;

    fn agent() -> Agent {
        Agent {
            id: "agent_1".into(),
            name: "Support".into(),
            webhook_url: Some("https://agent.example.com/hook".into()),
            is_active: true,
            is_fire_and_forget: false,
            buffer_time_seconds: 3,
            history_msg_count: 40,
            recent_msg_window_minutes: 1440,
            activate_for_new_conversation: true,
            created_at: Utc::now(),
        }
    }

    fn chat() -> Chat {
        Chat {
            id: "chat_1".into(),
            name: "Jane".into(),
            external_id: "15551234567".into(),
            channel_id: "channel_1".into(),
            contact_id: None,
            assigned_user_id: None,
            last_message_ts: Utc::now(),
            last_sender_type: Some(SenderType::Contact),
            last_message: Some("hi".into()),
            meta_data: json!({"contact_phone": "15551234567"}),
            extra_data: json!({}),
            created_at: Utc::now(),
        }
    }

    fn message(id: &str, content: &str, sender_type: SenderType) -> Message {
        Message {
            id: id.into(),
            external_id: None,
            chat_id: "chat_1".into(),
            content: content.into(),
            sender_type,
            timestamp: Utc::now(),
            meta_data: json!({}),
            readed: false,
            delivery_status: DeliveryStatus::Sent,
        }
    }

    #[test]
    fn test_buffer_still_running() {
        let now = Utc::now();
        let remaining = remaining_buffer(now, now - chrono::Duration::seconds(1), 3).unwrap();
        assert_eq!(remaining, Duration::from_secs(2));
    }

    #[test]
    fn test_buffer_elapsed() {
        let now = Utc::now();
        assert!(remaining_buffer(now, now - chrono::Duration::seconds(3), 3).is_none());
        assert!(remaining_buffer(now, now - chrono::Duration::seconds(10), 3).is_none());
        assert!(remaining_buffer(now, now, 0).is_none());
    }

    #[test]
    fn test_payload_shape() {
        let history = vec![
            message("message_1", "hi", SenderType::Contact),
            message("message_2", "hello!", SenderType::Agent),
        ];
        let payload = build_payload(&chat(), &agent(), "message_1", &history);

        assert_eq!(payload["chat"]["id"], "chat_1");
        assert_eq!(payload["chat"]["external_id"], "15551234567");
        assert_eq!(payload["agent"]["id"], "agent_1");
        assert_eq!(payload["trigger_message_id"], "message_1");
        let messages = payload["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["id"], "message_1");
        assert_eq!(messages[1]["sender_type"], "AGENT");
        assert_eq!(messages[1]["message_type"], "text");
    }

    #[test]
    fn test_outcome_serialization() {
        let skipped = DispatchOutcome::Skipped {
            message: "ChatAgent is inactive".into(),
        };
        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            json!({"status": "skipped", "message": "ChatAgent is inactive"})
        );

        let buffered = DispatchOutcome::Buffered {
            chat_agent_id: "chatagent_1".into(),
            buffer_seconds: 3,
            retry_in: Duration::from_secs(2),
        };
        assert_eq!(
            serde_json::to_value(&buffered).unwrap(),
            json!({"status": "buffered", "chat_agent_id": "chatagent_1", "buffer_seconds": 3})
        );
    }

    #[test]
    fn test_sync_reply_extraction() {
        assert_eq!(sync_reply(Some(&json!({"content": " Hi! "}))), Some("Hi!"));
        assert_eq!(sync_reply(Some(&json!({"content": "   "}))), None);
        assert_eq!(sync_reply(Some(&json!({"ok": true}))), None);
        assert_eq!(sync_reply(None), None);
    }

    #[tokio::test]
    async fn test_pending_set_coalesces() {
        let pending = PendingSet::default();
        assert!(pending.claim("chatagent_1").await);
        assert!(!pending.claim("chatagent_1").await);
        assert!(pending.claim("chatagent_2").await);
        assert_eq!(pending.len().await, 2);

        pending.release("chatagent_1").await;
        assert!(pending.claim("chatagent_1").await);
    }
}
