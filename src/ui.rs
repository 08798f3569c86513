pub mod auth;
pub mod library;
pub mod practice;
pub mod screen;

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
    Frame,
};

use crate::app::App;

const HORIZONTAL_MARGIN: u16 = 2;
const SIDEBAR_WIDTH: u16 = 30;

/// Colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub error: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        background: Color::Rgb(250, 250, 250),
        text: Color::Rgb(31, 41, 55),
        muted: Color::Rgb(156, 163, 175),
        accent: Color::Rgb(37, 99, 235),
        correct: Color::Rgb(22, 163, 74),
        incorrect: Color::Rgb(220, 38, 38),
        error: Color::Rgb(185, 28, 28),
    };

    pub const DARK: Palette = Palette {
        background: Color::Rgb(17, 24, 39),
        text: Color::Rgb(229, 231, 235),
        muted: Color::Rgb(107, 114, 128),
        accent: Color::Rgb(96, 165, 250),
        correct: Color::Rgb(74, 222, 128),
        incorrect: Color::Rgb(248, 113, 113),
        error: Color::Rgb(252, 165, 165),
    };

    pub fn for_theme(dark: bool) -> Self {
        if dark {
            Self::DARK
        } else {
            Self::LIGHT
        }
    }

    pub fn base(&self) -> Style {
        Style::new().fg(self.text).bg(self.background)
    }

    pub fn muted(&self) -> Style {
        Style::new().fg(self.muted)
    }

    pub fn accent(&self) -> Style {
        Style::new().fg(self.accent).add_modifier(Modifier::BOLD)
    }
}

/// Everything a frame needs: the app and the instant it is drawn at.
pub struct AppView<'a> {
    pub app: &'a App,
    pub now: Instant,
    pub palette: Palette,
}

impl<'a> AppView<'a> {
    pub fn new(app: &'a App, now: Instant) -> Self {
        Self {
            app,
            now,
            palette: Palette::for_theme(app.is_dark()),
        }
    }
}

impl Widget for AppView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.palette.base());
        screen::current_screen(self.app.auth_status()).render(&self, area, buf);
    }
}

pub fn draw(f: &mut Frame, app: &App, now: Instant) {
    f.render_widget(AppView::new(app, now), f.area());
}

/// A `width` x `height` rect in the middle of `area`, clamped to it.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SqliteAuthProvider;
    use crate::config::Config;
    use crate::library::{Library, TextId};

    fn app(signed_in: bool) -> App {
        let auth = SqliteAuthProvider::open_in_memory()
            .unwrap()
            .with_external_account(Some("tester".into()));
        let config = Config {
            page_size: 100,
            ..Config::default()
        };
        let mut app = App::new(config, Box::new(auth), Library::with_defaults().unwrap());
        app.restore_session();
        if signed_in {
            app.sign_in_with_external_identity();
        }
        app
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        AppView::new(app, Instant::now()).render(area, &mut buffer);

        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_loading_screen() {
        let auth = SqliteAuthProvider::open_in_memory().unwrap();
        let app = App::new(Config::default(), Box::new(auth), Library::with_defaults().unwrap());

        assert!(render(&app, 80, 24).contains("Loading"));
    }

    #[test]
    fn test_auth_screen() {
        let mut app = app(false);
        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("Log in"));
        assert!(rendered.contains("Email"));
        assert!(!rendered.contains("Display name"));

        app.toggle_auth_mode();
        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("Sign up"));
        assert!(rendered.contains("Display name"));
    }

    #[test]
    fn test_password_is_masked() {
        let mut app = app(false);
        app.auth_focus_next();
        for c in "hunter2".chars() {
            app.auth_input(c);
        }

        let rendered = render(&app, 80, 24);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("•••••••"));
    }

    #[test]
    fn test_auth_error_is_shown() {
        let mut app = app(false);
        app.submit_auth();

        assert!(render(&app, 80, 24).contains("Invalid email or password"));
    }

    #[test]
    fn test_no_selection_prompt() {
        let app = app(true);
        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("Select a text"));
        assert!(rendered.contains("tester"));
    }

    #[test]
    fn test_practice_screen_shows_page_and_stats() {
        let mut app = app(true);
        app.select_text(&TextId::new("default-1"));
        let page_chars = app.controller().session().current_page().chars().count();
        let pages = app.controller().session().page_count();

        let rendered = render(&app, 120, 30);
        assert!(rendered.contains(&format!("Page 1 of {pages}")));
        assert!(rendered.contains(&format!("Characters 0 / {page_chars}")));
        assert!(rendered.contains("The quick"));
        assert!(rendered.contains("WPM"));
        assert!(rendered.contains("Accuracy"));
    }

    #[test]
    fn test_sidebar_can_be_hidden() {
        let mut app = app(true);
        app.select_text(&TextId::new("default-1"));
        app.toggle_sidebar();

        assert!(!render(&app, 120, 30).contains("Accuracy"));
    }

    #[test]
    fn test_completion_messages() {
        let mut app = app(true);
        let now = Instant::now();
        let id = {
            let request = app.begin_upload(std::path::Path::new("tiny.txt")).unwrap();
            app.finish_upload(crate::upload::UploadResponse {
                ticket: request.ticket,
                file_name: request.file_name,
                result: Ok("ab".into()),
            })
            .unwrap()
        };
        app.select_text(&id);
        app.type_char('a', now);
        app.type_char('b', now);

        assert!(render(&app, 100, 30).contains("All Completed!"));

        app.select_text(&TextId::new("default-1"));
        let page = app.controller().session().current_page().to_string();
        for c in page.chars() {
            app.type_char(c, now);
        }
        assert!(render(&app, 100, 30).contains("Page Completed!"));
    }

    #[test]
    fn test_library_overlay_lists_texts() {
        let mut app = app(true);
        app.toggle_library();

        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("Library"));
        assert!(rendered.contains("JavaScript Basics"));
    }

    #[test]
    fn test_upload_prompt_overlay() {
        let mut app = app(true);
        app.open_upload_prompt();
        for c in "notes.md".chars() {
            app.upload_prompt_input(c);
        }

        let rendered = render(&app, 100, 30);
        assert!(rendered.contains("notes.md"));
        assert!(rendered.contains("pdf"));
    }

    #[test]
    fn test_dark_theme_background() {
        let mut app = app(true);
        app.toggle_theme();

        let area = Rect::new(0, 0, 60, 20);
        let mut buffer = Buffer::empty(area);
        AppView::new(&app, Instant::now()).render(area, &mut buffer);
        assert_eq!(buffer[(0, 19)].bg, Palette::DARK.background);
    }

    #[test]
    fn test_tiny_areas_do_not_panic() {
        let mut app = app(true);
        app.select_text(&TextId::new("default-2"));
        app.toggle_library();

        for (w, h) in [(1, 1), (10, 3), (20, 5), (40, 10)] {
            render(&app, w, h);
        }
    }

    #[test]
    fn test_centered_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered(area, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centered(area, 50, 50), area);
    }
}
