use std::time::Instant;

use crate::library::Text;
use crate::pagination::paginate;

/// Where the live session stands, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoSelection,
    Typing(usize),
    PageComplete(usize),
    AllComplete,
}

/// How a page char should be shown relative to the typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

/// State of the one in-progress typing exercise.
///
/// Only [`crate::controller::TypingController`] mutates it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) selected_text: Option<Text>,
    pub(crate) pages: Vec<String>,
    pub(crate) current_page_index: usize,
    pub(crate) user_input: String,
    pub(crate) error_count: u32,
    pub(crate) started_at: Option<Instant>,
}

impl Session {
    pub fn for_text(text: Text, page_size: usize) -> Self {
        let pages = paginate(&text.body, page_size);
        Self {
            selected_text: Some(text),
            pages,
            ..Self::default()
        }
    }

    pub fn selected_text(&self) -> Option<&Text> {
        self.selected_text.as_ref()
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn current_page(&self) -> &str {
        self.pages
            .get(self.current_page_index)
            .map_or("", String::as_str)
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page_index + 1 >= self.pages.len()
    }

    pub fn phase(&self) -> Phase {
        if self.selected_text.is_none() {
            return Phase::NoSelection;
        }
        if self.pages.is_empty() {
            // nothing to type
            return Phase::AllComplete;
        }

        if self.user_input == self.current_page() {
            if self.is_last_page() {
                Phase::AllComplete
            } else {
                Phase::PageComplete(self.current_page_index)
            }
        } else {
            Phase::Typing(self.current_page_index)
        }
    }

    /// Every char of the current page paired with its display state.
    pub fn char_states(&self) -> Vec<(char, CharState)> {
        let typed: Vec<char> = self.user_input.chars().collect();

        self.current_page()
            .chars()
            .enumerate()
            .map(|(idx, expected)| {
                let state = match typed.get(idx) {
                    Some(&c) if c == expected => CharState::Correct,
                    Some(_) => CharState::Incorrect,
                    None if idx == typed.len() => CharState::Cursor,
                    None => CharState::Pending,
                };
                (expected, state)
            })
            .collect()
    }
}
