//! Link between a chat and an agent that should receive its messages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatAgent {
    pub id: String,
    pub chat_id: String,
    pub agent_id: String,
    pub active: bool,
}

/// Chat link joined with the agent it points to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatAgentDetail {
    pub id: String,
    pub chat_id: String,
    pub agent_id: String,
    pub active: bool,
    pub agent_name: String,
    pub agent_webhook_url: Option<String>,
    pub agent_is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatAgentListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_limit() -> i64 {
    50
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatAgentList {
    pub chat_agents: Vec<ChatAgentDetail>,
    pub total_count: i64,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChatAgentRequest {
    pub active: bool,
}
