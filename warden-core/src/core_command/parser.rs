//! Command text parsing
//!
//! Commands are a configured prefix followed by colon-separated phrases,
//! e.g. `warden:lock:name` or `warden:subadmin:u-123`. Anything that does
//! not match the vocabulary is ignored.

use crate::core_platform::ActorId;
use crate::core_policy::LockKind;

/// A parsed group command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Report engine status (identity count, uptime)
    Status,
    /// Show the group's current lock flags
    ShowLocks,
    /// Toggle one protection lock
    SetLock { kind: LockKind, enabled: bool },
    /// Assign (`Some`) or clear (`None`) the group's sub-admin
    SetSubAdmin { actor: Option<ActorId> },
    /// All controlled identities leave the group
    Leave,
}

/// Find the prefix (if any) that marks this text as a command
pub fn match_prefix<'a>(text: &'a str, prefixes: &[String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find(|prefix| text.starts_with(prefix.as_str()))
        .map(|prefix| &text[prefix.len()..])
}

fn parse_lock_target(phrase: &str) -> Option<LockKind> {
    match phrase {
        "name" => Some(LockKind::Name),
        "picture" => Some(LockKind::Picture),
        "link" => Some(LockKind::Url),
        "invite" => Some(LockKind::Invite),
        _ => None,
    }
}

/// Parse a full message into a command, if it carries one
pub fn parse_command(text: &str, prefixes: &[String]) -> Option<Command> {
    let rest = match_prefix(text.trim(), prefixes)?;
    let phrases: Vec<&str> = rest.split(':').map(str::trim).collect();

    match phrases.as_slice() {
        ["status"] => Some(Command::Status),
        ["locks"] => Some(Command::ShowLocks),
        ["lock", target] => {
            parse_lock_target(target).map(|kind| Command::SetLock { kind, enabled: true })
        }
        ["unlock", target] => {
            parse_lock_target(target).map(|kind| Command::SetLock { kind, enabled: false })
        }
        ["subadmin", "clear"] => Some(Command::SetSubAdmin { actor: None }),
        ["subadmin", actor] if !actor.is_empty() => {
            Some(Command::SetSubAdmin { actor: Some(ActorId::new(*actor)) })
        }
        ["leave"] => Some(Command::Leave),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["warden:".to_string(), "!w ".to_string()]
    }

    #[test]
    fn test_non_command_text_is_ignored() {
        assert_eq!(parse_command("hello there", &prefixes()), None);
        assert_eq!(parse_command("warden:dance", &prefixes()), None);
        assert_eq!(parse_command("warden:lock:everything", &prefixes()), None);
    }

    #[test]
    fn test_lock_and_unlock() {
        assert_eq!(
            parse_command("warden:lock:name", &prefixes()),
            Some(Command::SetLock { kind: LockKind::Name, enabled: true })
        );
        assert_eq!(
            parse_command("warden:unlock:link", &prefixes()),
            Some(Command::SetLock { kind: LockKind::Url, enabled: false })
        );
        assert_eq!(
            parse_command("!w lock:invite", &prefixes()),
            Some(Command::SetLock { kind: LockKind::Invite, enabled: true })
        );
    }

    #[test]
    fn test_sub_admin_assignment() {
        assert_eq!(
            parse_command("warden:subadmin:u-123", &prefixes()),
            Some(Command::SetSubAdmin { actor: Some(ActorId::new("u-123")) })
        );
        assert_eq!(
            parse_command("warden:subadmin:clear", &prefixes()),
            Some(Command::SetSubAdmin { actor: None })
        );
    }

    #[test]
    fn test_status_locks_and_leave() {
        assert_eq!(parse_command("warden:status", &prefixes()), Some(Command::Status));
        assert_eq!(parse_command("  warden:locks ", &prefixes()), Some(Command::ShowLocks));
        assert_eq!(parse_command("warden:leave", &prefixes()), Some(Command::Leave));
    }
}
