use ratatui::{buffer::Buffer, layout::Rect, widgets::Paragraph, widgets::Widget};

use crate::app::AuthStatus;
use crate::ui::{auth::render_auth, centered, practice::render_practice, AppView};

/// A UI Screen boundary: renders one top-level state of the app
pub trait Screen {
    fn render(&self, view: &AppView, area: Rect, buf: &mut Buffer);
}

/// Shown until the auth provider has answered
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, view: &AppView, area: Rect, buf: &mut Buffer) {
        Paragraph::new("Loading...")
            .style(view.palette.muted())
            .centered()
            .render(centered(area, area.width, 1), buf);
    }
}

pub struct AuthScreen;

impl Screen for AuthScreen {
    fn render(&self, view: &AppView, area: Rect, buf: &mut Buffer) {
        render_auth(view, area, buf);
    }
}

/// Library, reference text and input area
pub struct PracticeScreen;

impl Screen for PracticeScreen {
    fn render(&self, view: &AppView, area: Rect, buf: &mut Buffer) {
        render_practice(view, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(status: &AuthStatus) -> Box<dyn Screen> {
    match status {
        AuthStatus::Restoring => Box::new(LoadingScreen),
        AuthStatus::SignedOut => Box::new(AuthScreen),
        AuthStatus::SignedIn(_) => Box::new(PracticeScreen),
    }
}

