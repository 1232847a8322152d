//! Event filtering.
//!
//! Decides, per delivery, whether an event is worth posting to Discord.
//! Noisy successes and events Discord ignores anyway are suppressed, which
//! keeps the channel readable and the webhook clear of rate limits.
//!
//! ## Dispatch
//!
//! ```text
//! X-GitHub-Event → GithubEvent → rule for that event → Verdict
//! ```
//!
//! Events without a rule are always forwarded.

pub mod event;
pub mod rules;

use serde_json::Value;

pub use event::GithubEvent;

/// Optional rules that can be toggled through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRules {
    /// Suppress branch create/delete events sent by Dependabot
    pub dependabot_branches: bool,
    /// Account id treated as Dependabot
    pub dependabot_sender_id: u64,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            dependabot_branches: true,
            dependabot_sender_id: rules::DEPENDABOT_SENDER_ID,
        }
    }
}

/// Why an event was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    CheckSuiteIncomplete,
    CheckSuiteSucceeded,
    CheckRunIncomplete,
    RepoSyncSucceeded,
    DependabotBranch,
    LocalisationSync,
    WorkflowEvent,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckSuiteIncomplete => "check_suite_incomplete",
            Self::CheckSuiteSucceeded => "check_suite_succeeded",
            Self::CheckRunIncomplete => "check_run_incomplete",
            Self::RepoSyncSucceeded => "repo_sync_succeeded",
            Self::DependabotBranch => "dependabot_branch",
            Self::LocalisationSync => "localisation_sync",
            Self::WorkflowEvent => "workflow_event",
        }
    }
}

/// Outcome of evaluating the filter for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Suppress(SuppressReason),
}

impl Verdict {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Verdict::Suppress(_))
    }
}

/// Rules decided by the event type alone.
///
/// These hold for any body, including one that is not JSON.
pub fn suppressed_event(event: &GithubEvent) -> Option<SuppressReason> {
    match event {
        // Discord drops these on its side
        GithubEvent::WorkflowJob | GithubEvent::WorkflowRun => Some(SuppressReason::WorkflowEvent),
        _ => None,
    }
}

/// Evaluate the suppression rules for an event.
///
/// Pure: the same event and payload always produce the same verdict.
pub fn evaluate(event: &GithubEvent, payload: &Value, filter: &FilterRules) -> Verdict {
    let reason = match event {
        GithubEvent::CheckSuite => rules::check_suite(payload),
        GithubEvent::CheckRun => rules::check_run(payload),
        GithubEvent::Create | GithubEvent::Delete => rules::branch_ref(payload, filter),
        GithubEvent::Push => rules::push(payload),
        GithubEvent::WorkflowJob | GithubEvent::WorkflowRun | GithubEvent::Other(_) => {
            suppressed_event(event)
        }
    };

    match reason {
        Some(reason) => Verdict::Suppress(reason),
        None => Verdict::Forward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verdict(event: &str, payload: Value) -> Verdict {
        evaluate(&GithubEvent::from_header(event), &payload, &FilterRules::default())
    }

    #[test]
    fn test_workflow_events_always_suppressed() {
        for event in ["workflow_job", "workflow_run"] {
            assert_eq!(
                verdict(event, json!({"action": "completed", "workflow_job": {"conclusion": "failure"}})),
                Verdict::Suppress(SuppressReason::WorkflowEvent)
            );
            assert!(verdict(event, json!(null)).is_suppressed());
        }
    }

    #[test]
    fn test_suppressed_event_needs_no_payload() {
        assert_eq!(
            suppressed_event(&GithubEvent::WorkflowJob),
            Some(SuppressReason::WorkflowEvent)
        );
        assert_eq!(
            suppressed_event(&GithubEvent::WorkflowRun),
            Some(SuppressReason::WorkflowEvent)
        );
        for event in ["push", "check_suite", "check_run", "create", "delete", "issues"] {
            assert_eq!(suppressed_event(&GithubEvent::from_header(event)), None, "{event}");
        }
    }

    #[test]
    fn test_unknown_events_forwarded() {
        assert_eq!(verdict("issues", json!({"action": "opened"})), Verdict::Forward);
        assert_eq!(verdict("", json!({})), Verdict::Forward);
        // A repo-sync-looking payload only matters for push events
        assert_eq!(
            verdict("pull_request", json!({"ref": rules::REPO_SYNC_REF, "commits": []})),
            Verdict::Forward
        );
    }

    #[test]
    fn test_create_and_delete_share_rule() {
        let payload = json!({"ref_type": "branch", "sender": {"id": 49699333}});
        assert_eq!(
            verdict("create", payload.clone()),
            Verdict::Suppress(SuppressReason::DependabotBranch)
        );
        assert_eq!(
            verdict("delete", payload),
            Verdict::Suppress(SuppressReason::DependabotBranch)
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let payload = json!({"status": "completed", "check_suite": {"conclusion": "failure"}});
        let first = verdict("check_suite", payload.clone());
        for _ in 0..10 {
            assert_eq!(verdict("check_suite", payload.clone()), first);
        }
        assert_eq!(first, Verdict::Forward);
    }
}
