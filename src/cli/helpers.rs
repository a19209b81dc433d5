//! Shared helper functions for CLI commands

use std::io::{self, IsTerminal};

use crate::core::identity::EntityId;

/// Shorten an ID for list output: `PRD-01HZX3V6J...`
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render an empty value as "-"
pub fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

/// Prompts only make sense on a terminal
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Prd);
        let formatted = format_short_id(&id);
        // PRD- plus a 26 char ULID, so always truncated
        assert_eq!(formatted.len(), 16);
        assert!(formatted.starts_with("PRD-"));
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Chair", 10), "Chair");
        assert_eq!(truncate_str("Stainless Steel", 8), "Stain...");
        assert_eq!(truncate_str("Aluminium", 9), "Aluminium");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(""), "-");
        assert_eq!(or_dash("  "), "-");
        assert_eq!(or_dash("Oak"), "Oak");
    }
}
