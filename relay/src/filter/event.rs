//! GitHub event discriminator taken from the `X-GitHub-Event` header.

use std::fmt;

/// Event types the relay has rules for. Anything else is carried through
/// as [`GithubEvent::Other`] and always forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubEvent {
    CheckSuite,
    CheckRun,
    Create,
    Delete,
    Push,
    WorkflowJob,
    WorkflowRun,
    Other(String),
}

impl GithubEvent {
    /// Classify a raw header value. Matching is exact, as GitHub sends
    /// event names in lowercase snake case.
    pub fn from_header(name: &str) -> Self {
        match name {
            "check_suite" => Self::CheckSuite,
            "check_run" => Self::CheckRun,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "push" => Self::Push,
            "workflow_job" => Self::WorkflowJob,
            "workflow_run" => Self::WorkflowRun,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CheckSuite => "check_suite",
            Self::CheckRun => "check_run",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Push => "push",
            Self::WorkflowJob => "workflow_job",
            Self::WorkflowRun => "workflow_run",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for GithubEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_events() {
        for name in [
            "check_suite",
            "check_run",
            "create",
            "delete",
            "push",
            "workflow_job",
            "workflow_run",
        ] {
            let event = GithubEvent::from_header(name);
            assert!(!matches!(event, GithubEvent::Other(_)), "{name}");
            assert_eq!(event.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_and_missing() {
        assert_eq!(
            GithubEvent::from_header("pull_request"),
            GithubEvent::Other("pull_request".to_string())
        );
        assert_eq!(GithubEvent::from_header(""), GithubEvent::Other(String::new()));
        // Case matters
        assert_eq!(
            GithubEvent::from_header("Push"),
            GithubEvent::Other("Push".to_string())
        );
    }
}
