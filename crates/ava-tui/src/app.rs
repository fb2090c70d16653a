use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::warn;
use ava_core::{ChatError, ChatReply, ChatRole, WidgetController};

/// Fallbacks used before the first render reports real panel dimensions.
const DEFAULT_CHAT_WIDTH: u16 = 50;
const DEFAULT_CHAT_HEIGHT: u16 = 20;

pub struct App {
    pub should_quit: bool,
    pub controller: WidgetController,

    // Draft editing
    pub cursor: usize, // cursor position in the draft, in chars

    // Transcript view
    pub scroll: u16,
    pub chat_height: u16, // inner height of the transcript pane
    pub chat_width: u16,  // inner width, for wrap calculations
    pub chat_area: Option<Rect>,

    // Outstanding request
    pub exchange_task: Option<JoinHandle<Result<ChatReply, ChatError>>>,

    // Typing indicator frame, 0-2
    pub animation_frame: u8,
}

impl App {
    pub fn new(controller: WidgetController) -> Self {
        Self {
            should_quit: false,
            controller,
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            exchange_task: None,
            animation_frame: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.controller.toggle();
    }

    /// Submit the draft and run the request on a background task.
    pub fn submit(&mut self) {
        if self.exchange_task.is_some() {
            return;
        }
        if let Some(pending) = self.controller.begin_submit() {
            self.cursor = 0;
            self.animation_frame = 0;
            self.exchange_task = Some(tokio::spawn(pending.run()));
        }
    }

    /// Fold a finished request back into the controller, if there is one.
    pub async fn poll_exchange(&mut self) {
        let finished = self
            .exchange_task
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }

        if let Some(task) = self.exchange_task.take() {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "chat request task failed");
                    Err(ChatError::Aborted(e.to_string()))
                }
            };
            self.controller.complete(outcome);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.controller.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Follow the newest message whenever the controller asks for it.
    /// Returns whether the view moved.
    pub fn sync_scroll(&mut self) -> bool {
        if self.controller.take_scroll_request() {
            self.scroll_to_bottom();
            return true;
        }
        false
    }

    /// Total wrapped height of the transcript plus the typing indicator.
    pub fn transcript_lines(&self) -> usize {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            DEFAULT_CHAT_WIDTH as usize
        };

        let mut total_lines: usize = 0;

        for msg in self.controller.transcript().messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Ava:")
            let body = match (&msg.link_url, msg.is_link) {
                (Some(url), true) => format!("{} ({})", msg.content, url),
                _ => msg.content.clone(),
            };
            for line in body.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            if body.is_empty() {
                total_lines = total_lines.saturating_add(1);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.controller.is_loading() {
            total_lines = total_lines.saturating_add(2); // "Ava:" + dots
        }

        total_lines
    }

    /// Furthest scroll offset that still fills the pane. ratatui scrolls by
    /// `u16`, so very long transcripts pin at `u16::MAX`.
    fn max_scroll(&self, visible_height: u16) -> u16 {
        let overflow = self.transcript_lines().saturating_sub(visible_height as usize);
        u16::try_from(overflow).unwrap_or(u16::MAX)
    }

    pub fn scroll_to_bottom(&mut self) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_CHAT_HEIGHT
        };

        self.scroll = self.max_scroll(visible_height);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.max_scroll(self.chat_height.max(1));
        self.scroll = (self.scroll.saturating_add(lines)).min(max_scroll);
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    pub fn user_message_count(&self) -> usize {
        self.controller
            .transcript()
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count()
    }
}
