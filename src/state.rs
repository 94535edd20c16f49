//! UI-agnostic conversation state and the reducer that applies backend
//! replies to it.
//!
//! All proposal-lifecycle invariants live here: the ledger is always a
//! wholesale copy of the backend's last `proposal`, the confirmation gate
//! is cleared before every send, and the artifact never regresses to the
//! empty sentinel once something has been rendered. The controller in
//! `app.rs` is a thin shell around these methods.

use serde::{Deserialize, Serialize};

/// Seed turn shown at session start.
pub const GREETING: &str = "Hello! I am your cloud architect bot. Tell me what you want to build, and I will design the pattern for you using AWS specifications.";

/// The empty-document sentinel for the rendered artifact.
pub const EMPTY_ARTIFACT: &str = "{}";

/// Reserved in-band message that resets server-side context.
pub const CLEAR_MESSAGE: &str = "clear";

/// Fixed turn appended when a request fails.
pub const TRANSPORT_ERROR_REPLY: &str = "Error communicating with backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::User, text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { speaker: Speaker::Assistant, text: text.into() }
    }
}

/// Where the controller is in the proposal lifecycle.
///
/// `Sending` doubles as the re-entrancy guard: a new submit while a request
/// is in flight is a no-op instead of racing the pending response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    AwaitingConfirmation,
}

/// A backend reply after transport-level normalization.
///
/// `artifact` is `Some` only when the response carried a non-trivial
/// `json_output`, already rendered to display text.
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub reply: String,
    pub artifact: Option<String>,
    pub proposal: Vec<String>,
    pub is_proposal: bool,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub turns: Vec<Turn>,
    /// Pending proposal ledger, always exactly the backend's last `proposal`.
    pub proposal: Vec<String>,
    /// Latest rendered infrastructure document, display-ready.
    pub artifact: String,
    pub phase: Phase,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
            proposal: Vec::new(),
            artifact: EMPTY_ARTIFACT.to_string(),
            phase: Phase::Idle,
        }
    }

    pub fn awaiting_confirmation(&self) -> bool {
        self.phase == Phase::AwaitingConfirmation
    }

    /// Whether free-text input may produce the next send. False while the
    /// confirmation gate is up or a request is in flight.
    pub fn can_edit(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Record the outgoing user turn and drop the confirmation gate.
    ///
    /// The gate is cleared unconditionally before every send; the response
    /// may re-raise it. The ledger is left as-is so it can ride along in the
    /// request body.
    pub fn begin_send(&mut self, text: &str) {
        self.turns.push(Turn::user(text));
        self.phase = Phase::Sending;
    }

    /// Apply a successful reply to an ordinary turn.
    pub fn apply_reply(&mut self, reply: ChatReply) {
        self.turns.push(Turn::assistant(reply.reply));
        if let Some(artifact) = reply.artifact {
            self.artifact = artifact;
        }
        // Full replacement, never a merge of prior and new items.
        self.proposal = reply.proposal;
        self.phase = if reply.is_proposal {
            Phase::AwaitingConfirmation
        } else {
            Phase::Idle
        };
    }

    /// Record a transport failure for an in-flight turn. Only the log gains
    /// a turn; ledger and artifact keep their pre-send values so the user
    /// can retry without losing proposal context.
    pub fn fail_send(&mut self) {
        self.turns.push(Turn::assistant(TRANSPORT_ERROR_REPLY));
        if self.phase == Phase::Sending {
            self.phase = Phase::Idle;
        }
    }

    /// Apply a successful reply to the reserved clear message: the entire
    /// log is replaced with a single seeded turn, everything else resets.
    pub fn apply_clear(&mut self, reply: ChatReply) {
        self.turns = vec![Turn::assistant(reply.reply)];
        self.proposal.clear();
        self.artifact = EMPTY_ARTIFACT.to_string();
        self.phase = Phase::Idle;
    }

    /// Surface a clear failure the same way as a submit failure. Used only
    /// when the error-surfacing policy asks for it; the phase is untouched
    /// because clear never entered `Sending`.
    pub fn fail_clear(&mut self) {
        self.turns.push(Turn::assistant(TRANSPORT_ERROR_REPLY));
    }

    /// Seed the artifact pane from the initial read-only fetch. Touches
    /// nothing else.
    pub fn seed_artifact(&mut self, artifact: String) {
        self.artifact = artifact;
    }
}

/// Display form of a proposal item: the trailing segment of a
/// `::`-namespaced identifier (`AWS::S3::Bucket` -> `Bucket`). The full
/// identifier stays in the ledger and is round-tripped unmodified.
pub fn display_name(item: &str) -> &str {
    item.rsplit("::").next().unwrap_or(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal_reply(items: &[&str]) -> ChatReply {
        ChatReply {
            reply: "Here's my proposal...".to_string(),
            artifact: None,
            proposal: items.iter().map(|s| s.to_string()).collect(),
            is_proposal: true,
        }
    }

    #[test]
    fn test_new_state_seeds_greeting() {
        let state = ConversationState::new();
        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].speaker, Speaker::Assistant);
        assert_eq!(state.turns[0].text, GREETING);
        assert!(state.proposal.is_empty());
        assert_eq!(state.artifact, EMPTY_ARTIFACT);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_proposal_reply_raises_gate() {
        let mut state = ConversationState::new();
        state.begin_send("I want a scalable web app");
        assert_eq!(state.phase, Phase::Sending);

        state.apply_reply(proposal_reply(&["AWS::S3::Bucket", "AWS::EC2::Instance"]));
        assert!(state.awaiting_confirmation());
        assert!(!state.can_edit());
        assert_eq!(state.proposal, vec!["AWS::S3::Bucket", "AWS::EC2::Instance"]);
    }

    #[test]
    fn test_confirm_yes_clears_gate_and_ledger() {
        let mut state = ConversationState::new();
        state.begin_send("I want a scalable web app");
        state.apply_reply(proposal_reply(&["AWS::S3::Bucket", "AWS::EC2::Instance"]));

        state.begin_send("Yes");
        // Gate drops before the response arrives.
        assert!(!state.awaiting_confirmation());

        state.apply_reply(ChatReply {
            reply: "Deployed.".to_string(),
            artifact: Some("{\n  \"Resources\": {}\n}".to_string()),
            proposal: Vec::new(),
            is_proposal: false,
        });
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.proposal.is_empty());
        assert_eq!(state.artifact, "{\n  \"Resources\": {}\n}");
    }

    #[test]
    fn test_ledger_is_replaced_not_merged() {
        let mut state = ConversationState::new();
        state.begin_send("a bucket");
        state.apply_reply(proposal_reply(&["AWS::S3::Bucket"]));

        state.begin_send("No");
        state.apply_reply(proposal_reply(&["AWS::DynamoDB::Table"]));
        assert_eq!(state.proposal, vec!["AWS::DynamoDB::Table"]);

        state.begin_send("No");
        state.apply_reply(ChatReply {
            reply: "Okay, scrapped.".to_string(),
            ..ChatReply::default()
        });
        assert!(state.proposal.is_empty());
    }

    #[test]
    fn test_artifact_does_not_regress() {
        let mut state = ConversationState::new();
        state.begin_send("a bucket");
        state.apply_reply(ChatReply {
            reply: "Done.".to_string(),
            artifact: Some("rendered".to_string()),
            ..ChatReply::default()
        });
        assert_eq!(state.artifact, "rendered");

        // A reply without an artifact leaves the previous one in place.
        state.begin_send("tell me more");
        state.apply_reply(ChatReply {
            reply: "Sure.".to_string(),
            ..ChatReply::default()
        });
        assert_eq!(state.artifact, "rendered");
    }

    #[test]
    fn test_transport_failure_is_isolated() {
        let mut state = ConversationState::new();
        state.begin_send("a bucket");
        state.apply_reply(ChatReply {
            reply: "Done.".to_string(),
            artifact: Some("rendered".to_string()),
            proposal: vec!["AWS::S3::Bucket".to_string()],
            is_proposal: false,
        });
        let ledger_before = state.proposal.clone();
        let artifact_before = state.artifact.clone();
        let turns_before = state.turns.len();

        state.begin_send("and a queue");
        state.fail_send();

        assert_eq!(state.proposal, ledger_before);
        assert_eq!(state.artifact, artifact_before);
        assert_eq!(state.phase, Phase::Idle);
        // Only the log grew: the outgoing turn plus the error turn.
        assert_eq!(state.turns.len(), turns_before + 2);
        assert_eq!(state.turns.last().unwrap().text, TRANSPORT_ERROR_REPLY);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = ConversationState::new();
        state.begin_send("a bucket");
        state.apply_reply(proposal_reply(&["AWS::S3::Bucket"]));
        state.artifact = "rendered".to_string();

        let cleared = ChatReply {
            reply: "Architecture cleared.".to_string(),
            ..ChatReply::default()
        };
        state.apply_clear(cleared.clone());

        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].text, "Architecture cleared.");
        assert!(state.proposal.is_empty());
        assert_eq!(state.artifact, EMPTY_ARTIFACT);
        assert_eq!(state.phase, Phase::Idle);

        // Idempotent: clearing again yields the same end state.
        let snapshot = state.turns.len();
        state.apply_clear(cleared);
        assert_eq!(state.turns.len(), snapshot);
        assert!(state.proposal.is_empty());
        assert_eq!(state.artifact, EMPTY_ARTIFACT);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_clear_failure_leaves_state_untouched() {
        let mut state = ConversationState::new();
        state.begin_send("a bucket");
        state.apply_reply(proposal_reply(&["AWS::S3::Bucket"]));

        // Default policy: the failure is only status-logged, the reducer is
        // never called, so nothing changes. The surfaced policy appends the
        // error turn without touching the gate.
        state.fail_clear();
        assert!(state.awaiting_confirmation());
        assert_eq!(state.proposal, vec!["AWS::S3::Bucket"]);
    }

    #[test]
    fn test_display_name_strips_namespace() {
        assert_eq!(display_name("AWS::S3::Bucket"), "Bucket");
        assert_eq!(display_name("AWS::ApiGateway::RestApi"), "RestApi");
        assert_eq!(display_name("plain-id"), "plain-id");
        assert_eq!(display_name(""), "");
    }
}
