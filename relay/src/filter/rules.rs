//! Suppression predicates, one per recognised event type.
//!
//! Each predicate reads a typed view of the payload in which every field is
//! optional. A field that is missing or of the wrong type never matches.

use serde::Deserialize;
use serde_json::Value;

use super::{FilterRules, SuppressReason};

/// Check run name used by the repository sync workflow.
pub const REPO_SYNC_CHECK_NAME: &str = "Repo Sync";

/// Branch the localisation sync bot pushes to.
pub const REPO_SYNC_REF: &str = "refs/heads/weirdgloop/repo-sync";

/// Committer address of translatewiki.net's localisation bot.
pub const L10N_BOT_EMAIL: &str = "l10n-bot@translatewiki.net";

/// GitHub account id of `dependabot[bot]`.
pub const DEPENDABOT_SENDER_ID: u64 = 49699333;

const COMPLETED: &str = "completed";
const SUCCESS: &str = "success";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckDetails {
    name: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckSuiteEvent {
    status: Option<String>,
    check_suite: Option<CheckDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckRunEvent {
    status: Option<String>,
    check_run: Option<CheckDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Sender {
    id: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefEvent {
    ref_type: Option<String>,
    sender: Option<Sender>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Committer {
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Commit {
    committer: Option<Committer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushEvent {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    commits: Option<Vec<Commit>>,
}

/// Deserialize a typed view, treating a shape mismatch as an empty payload.
fn view<'a, T>(payload: &'a Value) -> T
where
    T: Deserialize<'a> + Default,
{
    T::deserialize(payload).unwrap_or_default()
}

/// Resolve a check's status.
///
/// GitHub nests it as `check_suite.status` / `check_run.status`; a
/// top-level `status` is honoured when the nested one is absent.
fn check_status<'a>(
    nested: Option<&'a CheckDetails>,
    top_level: &'a Option<String>,
) -> Option<&'a str> {
    nested
        .and_then(|c| c.status.as_deref())
        .or(top_level.as_deref())
}

/// Incomplete check suites, and suites that succeeded.
pub fn check_suite(payload: &Value) -> Option<SuppressReason> {
    let event: CheckSuiteEvent = view(payload);
    let suite = event.check_suite.as_ref();

    if check_status(suite, &event.status) != Some(COMPLETED) {
        return Some(SuppressReason::CheckSuiteIncomplete);
    }

    if suite.and_then(|s| s.conclusion.as_deref()) == Some(SUCCESS) {
        return Some(SuppressReason::CheckSuiteSucceeded);
    }

    None
}

/// Incomplete check runs, and successful "Repo Sync" runs.
pub fn check_run(payload: &Value) -> Option<SuppressReason> {
    let event: CheckRunEvent = view(payload);
    let run = event.check_run.as_ref();

    if check_status(run, &event.status) != Some(COMPLETED) {
        return Some(SuppressReason::CheckRunIncomplete);
    }

    let is_repo_sync = run.and_then(|r| r.name.as_deref()) == Some(REPO_SYNC_CHECK_NAME);
    let succeeded = run.and_then(|r| r.conclusion.as_deref()) == Some(SUCCESS);
    if is_repo_sync && succeeded {
        return Some(SuppressReason::RepoSyncSucceeded);
    }

    None
}

/// Branches created or deleted by Dependabot, when that rule is enabled.
pub fn branch_ref(payload: &Value, rules: &FilterRules) -> Option<SuppressReason> {
    if !rules.dependabot_branches {
        return None;
    }

    let event: RefEvent = view(payload);
    let is_branch = event.ref_type.as_deref() == Some("branch");
    let by_dependabot = event.sender.and_then(|s| s.id) == Some(rules.dependabot_sender_id);

    (is_branch && by_dependabot).then_some(SuppressReason::DependabotBranch)
}

/// Pushes to the repo-sync branch made up entirely of localisation commits.
///
/// A push on that branch with an empty, null or absent commit list is
/// suppressed as well.
pub fn push(payload: &Value) -> Option<SuppressReason> {
    let event: PushEvent = view(payload);

    if event.git_ref.as_deref() != Some(REPO_SYNC_REF) {
        return None;
    }

    let all_l10n = event.commits.iter().flatten().all(|commit| {
        commit
            .committer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            == Some(L10N_BOT_EMAIL)
    });

    all_l10n.then_some(SuppressReason::LocalisationSync)
}
