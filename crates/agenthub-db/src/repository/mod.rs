//! Repository layer: one module per aggregate, plain async functions over a `PgPool`.

pub mod agents;
pub mod boards;
pub mod channels;
pub mod chat_agents;
pub mod chats;
pub mod documents;
pub mod menus;
pub mod messages;
pub mod notes;
pub mod tasks;
pub mod tokens;
pub mod users;
