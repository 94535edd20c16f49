use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use crate::backend::BackendClient;
use crate::config::Config;
use crate::state::{ChatReply, ConversationState, Phase, CLEAR_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Artifact,
}

/// What the in-flight request is for, so its completion is applied through
/// the right reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Turn,
    Clear,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Conversation state machine
    pub state: ConversationState,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars

    // Scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub artifact_scroll: u16,

    // Status line for errors that are not surfaced as turns
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // In-flight requests (at most one chat request at a time)
    chat_task: Option<JoinHandle<anyhow::Result<ChatReply>>>,
    pending: PendingKind,
    artifact_task: Option<JoinHandle<anyhow::Result<String>>>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub artifact_area: Option<Rect>,

    // Backend
    pub backend: BackendClient,
    surface_clear_errors: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let backend = BackendClient::new(&config.backend_url(), config.strict_replies());

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,

            state: ConversationState::new(),

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            artifact_scroll: 0,

            status: None,

            animation_frame: 0,

            chat_task: None,
            pending: PendingKind::Turn,
            artifact_task: None,

            chat_area: None,
            artifact_area: None,

            backend,
            surface_clear_errors: config.surface_clear_errors(),
        }
    }

    pub fn request_in_flight(&self) -> bool {
        self.chat_task.is_some()
    }

    /// Seed the artifact pane from the backend on startup. Read-only; never
    /// touches the conversation log or the ledger.
    pub fn load_artifact(&mut self) {
        let backend = self.backend.clone();
        self.artifact_task = Some(tokio::spawn(async move { backend.fetch_artifact().await }));
    }

    /// Submit the input buffer as a free-text turn. A no-op while the
    /// confirmation gate is up or a request is already in flight.
    pub fn submit_input(&mut self) {
        if !self.state.can_edit() || self.chat_task.is_some() {
            return;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }

        self.input.clear();
        self.input_cursor = 0;
        self.send(text);
    }

    /// Answer the pending proposal. The literal choice goes through the
    /// ordinary chat channel as if typed.
    pub fn confirm(&mut self, choice: &str) {
        if self.state.phase != Phase::AwaitingConfirmation || self.chat_task.is_some() {
            return;
        }
        self.send(choice.to_string());
    }

    /// Reset the conversation via the reserved clear message. Allowed even
    /// mid-proposal; no user turn is appended and local state only changes
    /// once the backend confirms.
    pub fn request_clear(&mut self) {
        if self.chat_task.is_some() {
            return;
        }

        let backend = self.backend.clone();
        self.pending = PendingKind::Clear;
        self.chat_task = Some(tokio::spawn(async move {
            backend.send_turn(CLEAR_MESSAGE, &[]).await
        }));
    }

    fn send(&mut self, text: String) {
        self.state.begin_send(&text);
        self.scroll_chat_to_bottom();

        let backend = self.backend.clone();
        let proposal = self.state.proposal.clone();
        self.pending = PendingKind::Turn;
        self.chat_task = Some(tokio::spawn(async move {
            backend.send_turn(&text, &proposal).await
        }));
    }

    /// Apply any finished background request. Called from the event loop;
    /// tick events guarantee it runs even when the user is idle.
    pub async fn poll_backend(&mut self) {
        if self.chat_task.as_ref().is_some_and(|task| task.is_finished()) {
            let task = self.chat_task.take().unwrap();
            let kind = self.pending;
            let result = match task.await {
                Ok(result) => result,
                Err(err) => Err(err.into()),
            };

            match (kind, result) {
                (PendingKind::Turn, Ok(reply)) => {
                    self.state.apply_reply(reply);
                    self.status = None;
                }
                (PendingKind::Turn, Err(_)) => {
                    self.state.fail_send();
                }
                (PendingKind::Clear, Ok(reply)) => {
                    self.state.apply_clear(reply);
                    self.chat_scroll = 0;
                    self.artifact_scroll = 0;
                    self.status = None;
                }
                (PendingKind::Clear, Err(err)) => {
                    if self.surface_clear_errors {
                        self.state.fail_clear();
                    } else {
                        self.status = Some(format!("clear failed: {}", err));
                    }
                }
            }
            self.scroll_chat_to_bottom();
        }

        if self.artifact_task.as_ref().is_some_and(|task| task.is_finished()) {
            let task = self.artifact_task.take().unwrap();
            match task.await {
                Ok(Ok(artifact)) => self.state.seed_artifact(artifact),
                Ok(Err(err)) => self.status = Some(format!("artifact load failed: {}", err)),
                Err(err) => self.status = Some(format!("artifact load failed: {}", err)),
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat_task.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_artifact_down(&mut self) {
        self.artifact_scroll = self.artifact_scroll.saturating_add(1);
    }

    pub fn scroll_artifact_up(&mut self) {
        self.artifact_scroll = self.artifact_scroll.saturating_sub(1);
    }

    /// Scroll chat so the latest turn (or the pending indicator) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for turn in &self.state.turns {
            total_lines += 1; // Role line ("You:" or "Architect:")
            for line in turn.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after turn
        }

        // Room for the pending indicator
        total_lines += 2;

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Speaker;

    fn app() -> App {
        App::new(&Config::new())
    }

    #[tokio::test]
    async fn test_empty_input_does_not_submit() {
        let mut app = app();
        app.input = "   ".to_string();
        app.submit_input();
        assert!(!app.request_in_flight());
        assert_eq!(app.state.turns.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_appends_turn_and_clears_input() {
        let mut app = app();
        app.input = "I want a scalable web app".to_string();
        app.input_cursor = app.input.chars().count();
        app.submit_input();

        assert!(app.request_in_flight());
        assert_eq!(app.input, "");
        assert_eq!(app.input_cursor, 0);
        let last = app.state.turns.last().unwrap();
        assert_eq!(last.speaker, Speaker::User);
        assert_eq!(last.text, "I want a scalable web app");
    }

    #[tokio::test]
    async fn test_submit_is_noop_while_request_in_flight() {
        let mut app = app();
        app.input = "first".to_string();
        app.submit_input();
        let turns = app.state.turns.len();

        app.input = "second".to_string();
        app.submit_input();
        assert_eq!(app.state.turns.len(), turns);
        assert_eq!(app.input, "second");
    }

    #[tokio::test]
    async fn test_confirm_requires_pending_proposal() {
        let mut app = app();
        app.confirm("Yes");
        assert!(!app.request_in_flight());
        assert_eq!(app.state.turns.len(), 1);
    }

    #[tokio::test]
    async fn test_gate_blocks_free_text_but_not_confirm() {
        let mut app = app();
        app.state.phase = Phase::AwaitingConfirmation;
        app.state.proposal = vec!["AWS::S3::Bucket".to_string()];

        app.input = "something else".to_string();
        app.submit_input();
        assert!(!app.request_in_flight());

        app.confirm("No");
        assert!(app.request_in_flight());
        assert_eq!(app.state.turns.last().unwrap().text, "No");
        // Gate dropped as part of the send; the response decides what's next.
        assert_eq!(app.state.phase, Phase::Sending);
    }

    #[tokio::test]
    async fn test_clear_appends_no_user_turn() {
        let mut app = app();
        app.request_clear();
        assert!(app.request_in_flight());
        assert_eq!(app.state.turns.len(), 1);
    }
}
