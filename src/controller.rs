use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::Config;
use crate::library::{Text, TextId};
use crate::metrics::{self, SessionStats};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::scheduler::{AdvanceScheduler, PendingAdvance};
use crate::session::{CharState, Phase, Session};

/// Delay between finishing a page and being moved to the next one.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub page_size: usize,
    pub advance_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}

impl From<&Config> for ControllerConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            page_size: cfg.page_size,
            advance_delay: Duration::from_millis(cfg.advance_delay_ms),
        }
    }
}

/// Result of feeding an input change to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Not in a typing phase, nothing changed.
    Ignored,
    /// Longer than the current page, nothing changed.
    Rejected,
    Accepted { mistake: bool },
    /// Page finished, an advance to the next page is scheduled.
    PageComplete { page: usize },
    AllComplete,
}

/// Drives the live [`Session`]: selection, keystrokes and page changes.
#[derive(Debug, Default)]
pub struct TypingController {
    config: ControllerConfig,
    session: Session,
    scheduler: AdvanceScheduler,
}

impl TypingController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn pending_advance(&self) -> Option<&PendingAdvance> {
        self.scheduler.pending()
    }

    /// Start a fresh session on `text`.
    pub fn select_text(&mut self, text: Text) {
        self.cancel_pending();
        info!(id = %text.id, title = %text.title, "text selected");
        self.session = Session::for_text(text, self.config.page_size);
        debug!(pages = self.session.page_count(), "text paginated");
    }

    /// Drop the session entirely, back to no selection.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.session = Session::default();
    }

    /// Forget `id` if it is the selected text. Returns true if the session was cleared.
    pub fn text_removed(&mut self, id: &TextId) -> bool {
        let selected = self
            .session
            .selected_text()
            .is_some_and(|text| &text.id == id);
        if selected {
            info!(%id, "selected text removed, clearing session");
            self.clear();
        }
        selected
    }

    /// Apply the new full contents of the input box.
    pub fn input_changed(&mut self, value: &str, now: Instant) -> InputOutcome {
        let Phase::Typing(page) = self.phase() else {
            return InputOutcome::Ignored;
        };

        let page_text = self.session.current_page().to_string();
        let new_len = value.chars().count();
        if new_len > page_text.chars().count() {
            return InputOutcome::Rejected;
        }

        if self.session.started_at.is_none() && new_len > 0 {
            self.session.started_at = Some(now);
        }

        let mut mistake = false;
        if new_len > self.session.user_input.chars().count() {
            let typed = value.chars().last();
            let expected = page_text.chars().nth(new_len - 1);
            if typed != expected {
                mistake = true;
                self.session.error_count += 1;
            }
        }

        let complete = value == page_text.as_str();
        self.session.user_input = value.to_string();

        if !complete {
            return InputOutcome::Accepted { mistake };
        }

        if self.session.is_last_page() {
            info!(errors = self.session.error_count, "all pages complete");
            InputOutcome::AllComplete
        } else {
            let task = self.scheduler.schedule(page, now, self.config.advance_delay);
            debug!(page, due_in_ms = self.config.advance_delay.as_millis() as u64, generation = ?task.generation, "page complete, advance scheduled");
            InputOutcome::PageComplete { page }
        }
    }

    pub fn type_char(&mut self, c: char, now: Instant) -> InputOutcome {
        let mut value = self.session.user_input.clone();
        value.push(c);
        self.input_changed(&value, now)
    }

    pub fn backspace(&mut self, now: Instant) -> InputOutcome {
        let mut value = self.session.user_input.clone();
        if value.pop().is_none() {
            return InputOutcome::Ignored;
        }
        self.input_changed(&value, now)
    }

    /// Run the scheduled advance if it is due. Returns the page moved to.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let task = self.scheduler.take_due(now)?;

        if self.phase() != Phase::PageComplete(task.from_page) {
            debug!(from_page = task.from_page, "dropping advance for a page no longer complete");
            return None;
        }

        self.go_to_page(task.from_page + 1);
        debug!(page = self.session.current_page_index, "advanced to next page");
        Some(self.session.current_page_index)
    }

    pub fn next_page(&mut self) -> bool {
        if self.session.selected_text.is_none() || self.session.is_last_page() {
            return false;
        }
        self.cancel_pending();
        self.go_to_page(self.session.current_page_index + 1);
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.session.selected_text.is_none() || self.session.current_page_index == 0 {
            return false;
        }
        self.cancel_pending();
        self.go_to_page(self.session.current_page_index - 1);
        true
    }

    pub fn accuracy(&self) -> u32 {
        metrics::accuracy(&self.session.user_input, self.session.current_page())
    }

    pub fn wpm(&self, now: Instant) -> u32 {
        metrics::wpm(self.session.started_at, &self.session.user_input, now)
    }

    pub fn char_states(&self) -> Vec<(char, CharState)> {
        self.session.char_states()
    }

    pub fn stats(&self, now: Instant) -> SessionStats {
        let session = &self.session;
        SessionStats {
            wpm: self.wpm(now),
            accuracy: self.accuracy(),
            errors: session.error_count,
            typed_chars: session.user_input.chars().count(),
            page_chars: session.current_page().chars().count(),
            page_number: if session.selected_text.is_some() && session.page_count() > 0 {
                session.current_page_index + 1
            } else {
                0
            },
            page_count: session.page_count(),
        }
    }

    fn go_to_page(&mut self, index: usize) {
        self.session.current_page_index = index;
        self.session.user_input.clear();
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.scheduler.invalidate() {
            debug!(from_page = task.from_page, "pending advance cancelled");
        }
    }
}
