//! Approval of privileged host actions.

use crate::host::{Flag, TournamentAction};

/// Decides which privileged actions a bot may perform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionPolicy {
    /// Whether enabling local user input is allowed.
    pub allow_user_input: bool,
}

impl ActionPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(allow_user_input: bool) -> Self {
        Self { allow_user_input }
    }

    /// Whether the host should carry out `action`.
    ///
    /// Full map information is never granted. Anything not explicitly
    /// listed is denied.
    #[must_use]
    pub fn authorize(&self, action: &TournamentAction) -> bool {
        let allowed = match action {
            TournamentAction::EnableFlag(Flag::CompleteMapInformation) => {
                tracing::info!("Denied request for complete map information");
                false
            }
            TournamentAction::EnableFlag(Flag::UserInput) => self.allow_user_input,
            TournamentAction::EnableFlag(Flag::Other(_)) => true,
            TournamentAction::LeaveGame
            | TournamentAction::SetLatCom
            | TournamentAction::SetTextSize
            | TournamentAction::SendText
            | TournamentAction::Printf
            | TournamentAction::SetCommandOptimizationLevel => true,
            _ => false,
        };
        tracing::debug!(?action, allowed, "Tournament action");
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_info_always_denied() {
        let action = TournamentAction::EnableFlag(Flag::CompleteMapInformation);
        assert!(!ActionPolicy::new(false).authorize(&action));
        assert!(!ActionPolicy::new(true).authorize(&action));
    }

    #[test]
    fn test_user_input_follows_config() {
        let action = TournamentAction::EnableFlag(Flag::UserInput);
        assert!(!ActionPolicy::new(false).authorize(&action));
        assert!(ActionPolicy::new(true).authorize(&action));
    }

    #[test]
    fn test_other_flags_allowed() {
        assert!(ActionPolicy::default().authorize(&TournamentAction::EnableFlag(Flag::Other(9))));
    }

    #[test]
    fn test_allow_list() {
        let policy = ActionPolicy::default();
        for action in [
            TournamentAction::LeaveGame,
            TournamentAction::SetLatCom,
            TournamentAction::SetTextSize,
            TournamentAction::SendText,
            TournamentAction::Printf,
            TournamentAction::SetCommandOptimizationLevel,
        ] {
            assert!(policy.authorize(&action), "{action:?}");
        }
    }

    #[test]
    fn test_everything_else_denied() {
        let policy = ActionPolicy::new(true);
        for action in [
            TournamentAction::PauseGame,
            TournamentAction::ResumeGame,
            TournamentAction::SetLocalSpeed,
            TournamentAction::SetFrameSkip,
            TournamentAction::SetMap,
            TournamentAction::SetGui,
            TournamentAction::SetAlliance,
            TournamentAction::SetVision,
            TournamentAction::Other(77),
        ] {
            assert!(!policy.authorize(&action), "{action:?}");
        }
    }
}
