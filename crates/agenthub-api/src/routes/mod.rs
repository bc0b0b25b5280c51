//! API route modules.

pub mod agent_tokens;
pub mod agents;
pub mod auth;
pub mod boards;
pub mod channels;
pub mod chat_agents;
pub mod chats;
pub mod globals;
pub mod health;
pub mod inbound;
pub mod menu;
pub mod tasks;
pub mod users;

/// Explicit MIME type, or one guessed from the file name.
pub(crate) fn resolve_mime_type(explicit: Option<&str>, file_name: &str) -> String {
    match explicit.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_guessing() {
        assert_eq!(resolve_mime_type(None, "invoice.pdf"), "application/pdf");
        assert_eq!(resolve_mime_type(None, "photo.PNG"), "image/png");
        assert_eq!(resolve_mime_type(None, "blob"), "application/octet-stream");
        assert_eq!(resolve_mime_type(Some("text/csv"), "data.bin"), "text/csv");
        assert_eq!(resolve_mime_type(Some("  "), "notes.txt"), "text/plain");
    }
}
