use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AuthStatus, Overlay};
use crate::runtime::AppEvent;
use crate::upload::UploadRequest;

/// What the event loop has to do after an event was applied.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    /// Hand the request to an extraction worker.
    StartUpload(UploadRequest),
}

/// Apply one runtime event to the app.
///
/// A due page advance runs first, whatever the event, so a steady stream of
/// keys cannot hold it back.
pub fn dispatch(app: &mut App, event: AppEvent, now: Instant) -> KeyAction {
    app.on_tick(now);

    match event {
        AppEvent::Key(key) => handle_key(app, key, now),
        AppEvent::Upload(response) => {
            app.finish_upload(response);
            KeyAction::None
        }
        AppEvent::Tick | AppEvent::Resize => KeyAction::None,
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent, now: Instant) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // ctrl+c to quit, from anywhere
    if ctrl && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match app.auth_status() {
        AuthStatus::Restoring => match key.code {
            KeyCode::Esc => KeyAction::Quit,
            _ => KeyAction::None,
        },
        AuthStatus::SignedOut => auth_key(app, key),
        AuthStatus::SignedIn(_) => match app.overlay() {
            Overlay::Library { .. } => library_key(app, key),
            Overlay::UploadPrompt { .. } => upload_prompt_key(app, key),
            Overlay::None => practice_key(app, key, now),
        },
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn auth_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Tab => app.auth_focus_next(),
        KeyCode::BackTab => app.auth_focus_previous(),
        KeyCode::Enter => app.submit_auth(),
        KeyCode::Backspace => app.auth_backspace(),
        KeyCode::Char('n') if !is_plain(&key) => app.toggle_auth_mode(),
        KeyCode::Char('g') if !is_plain(&key) => app.sign_in_with_external_identity(),
        KeyCode::Char(c) if is_plain(&key) => app.auth_input(c),
        _ => {}
    }
    KeyAction::None
}

fn library_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Char('l') if !is_plain(&key) => app.close_overlay(),
        KeyCode::Up => app.library_move(-1),
        KeyCode::Down => app.library_move(1),
        KeyCode::Enter => app.select_highlighted(),
        KeyCode::Delete => app.delete_highlighted(),
        _ => {}
    }
    KeyAction::None
}

fn upload_prompt_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Esc => app.close_overlay(),
        KeyCode::Enter => {
            if let Some(request) = app.submit_upload_prompt() {
                return KeyAction::StartUpload(request);
            }
        }
        KeyCode::Backspace => app.upload_prompt_backspace(),
        KeyCode::Char(c) if is_plain(&key) => app.upload_prompt_input(c),
        _ => {}
    }
    KeyAction::None
}

fn practice_key(app: &mut App, key: KeyEvent, now: Instant) -> KeyAction {
    if !is_plain(&key) {
        match key.code {
            KeyCode::Char('l') => app.toggle_library(),
            KeyCode::Char('o') => app.open_upload_prompt(),
            KeyCode::Char('t') => app.toggle_theme(),
            KeyCode::Char('b') => app.toggle_sidebar(),
            KeyCode::Char('x') => app.logout(),
            _ => {}
        }
        return KeyAction::None;
    }

    match key.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::PageDown => {
            app.next_page();
        }
        KeyCode::PageUp => {
            app.previous_page();
        }
        KeyCode::Backspace => {
            app.backspace(now);
        }
        KeyCode::Enter => {
            app.type_char('\n', now);
        }
        KeyCode::Char(c) => {
            app.type_char(c, now);
        }
        _ => {}
    }
    KeyAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SqliteAuthProvider;
    use crate::config::Config;
    use crate::library::{Library, TextId};
    use crate::session::Phase;
    use assert_matches::assert_matches;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn signed_in() -> App {
        let auth = SqliteAuthProvider::open_in_memory()
            .unwrap()
            .with_external_account(Some("tester".into()));
        let config = Config {
            page_size: 100,
            ..Config::default()
        };
        let mut app = App::new(
            config,
            Box::new(auth),
            Library::with_defaults().unwrap(),
        );
        app.restore_session();
        handle_key(&mut app, ctrl('g'), Instant::now());
        app
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let mut app = signed_in();
        assert_eq!(handle_key(&mut app, ctrl('c'), Instant::now()), KeyAction::Quit);

        app.toggle_library();
        assert_eq!(handle_key(&mut app, ctrl('c'), Instant::now()), KeyAction::Quit);
    }

    #[test]
    fn restoring_ignores_typing() {
        let auth = SqliteAuthProvider::open_in_memory().unwrap();
        let mut app = App::new(Config::default(), Box::new(auth), Library::with_defaults().unwrap());

        assert_eq!(
            handle_key(&mut app, key(KeyCode::Char('a')), Instant::now()),
            KeyAction::None
        );
        assert_eq!(app.auth_status(), &AuthStatus::Restoring);
        assert_eq!(handle_key(&mut app, key(KeyCode::Esc), Instant::now()), KeyAction::Quit);
    }

    #[test]
    fn auth_form_keys() {
        let auth = SqliteAuthProvider::open_in_memory().unwrap();
        let mut app = App::new(Config::default(), Box::new(auth), Library::with_defaults().unwrap());
        app.restore_session();
        let now = Instant::now();

        for c in "me@x.io".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)), now);
        }
        handle_key(&mut app, key(KeyCode::Tab), now);
        handle_key(&mut app, key(KeyCode::Char('p')), now);
        handle_key(&mut app, key(KeyCode::BackTab), now);
        handle_key(&mut app, key(KeyCode::Backspace), now);

        assert_eq!(app.auth_form().login_email, "me@x.i");
        assert_eq!(app.auth_form().login_password, "p");

        handle_key(&mut app, ctrl('n'), now);
        assert_eq!(app.auth_form().mode, crate::app::AuthMode::SignUp);
    }

    #[test]
    fn library_keys_select_text() {
        let mut app = signed_in();
        let now = Instant::now();

        handle_key(&mut app, ctrl('l'), now);
        handle_key(&mut app, key(KeyCode::Down), now);
        handle_key(&mut app, key(KeyCode::Enter), now);

        let selected = app.controller().session().selected_text().unwrap();
        assert_eq!(selected.id, TextId::new("default-2"));
        assert_eq!(app.overlay(), &Overlay::None);
    }

    #[test]
    fn typing_keys_reach_controller() {
        let mut app = signed_in();
        app.select_text(&TextId::new("default-1"));
        let now = Instant::now();

        handle_key(&mut app, key(KeyCode::Char('T')), now);
        handle_key(&mut app, key(KeyCode::Char('x')), now);
        handle_key(&mut app, key(KeyCode::Backspace), now);

        assert_eq!(app.controller().session().user_input(), "T");
        assert_eq!(app.controller().session().error_count(), 1);
        assert_eq!(app.controller().phase(), Phase::Typing(0));
    }

    #[test]
    fn shortcuts_do_not_type() {
        let mut app = signed_in();
        app.select_text(&TextId::new("default-1"));
        let now = Instant::now();

        handle_key(&mut app, ctrl('t'), now);
        handle_key(&mut app, ctrl('b'), now);

        assert!(app.is_dark());
        assert!(!app.is_sidebar_open());
        assert_eq!(app.controller().session().user_input(), "");
    }

    #[test]
    fn upload_prompt_yields_request() {
        let mut app = signed_in();
        let now = Instant::now();

        handle_key(&mut app, ctrl('o'), now);
        for c in "/tmp/a.md".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)), now);
        }

        assert_matches!(
            handle_key(&mut app, key(KeyCode::Enter), now),
            KeyAction::StartUpload(request) if request.file_name == "a.md"
        );
        assert!(app.is_uploading());
    }

    #[test]
    fn logout_returns_to_auth() {
        let mut app = signed_in();
        handle_key(&mut app, ctrl('x'), Instant::now());
        assert_eq!(app.auth_status(), &AuthStatus::SignedOut);
    }

    #[test]
    fn dispatch_tick_advances_page() {
        let mut app = signed_in();
        app.select_text(&TextId::new("default-1"));
        let page = app.controller().session().current_page().to_string();
        let start = Instant::now();

        for c in page.chars() {
            let code = if c == '\n' { KeyCode::Enter } else { KeyCode::Char(c) };
            dispatch(&mut app, AppEvent::Key(key(code)), start);
        }
        assert_eq!(app.controller().phase(), Phase::PageComplete(0));

        dispatch(&mut app, AppEvent::Tick, start + std::time::Duration::from_secs(1));
        assert_eq!(app.controller().session().current_page_index(), 1);
    }

    #[test]
    fn dispatch_key_runs_due_advance() {
        let mut app = signed_in();
        app.select_text(&TextId::new("default-1"));
        let first = app.controller().session().current_page().to_string();
        let second_first_char = app.controller().session().pages()[1].chars().next().unwrap();
        let start = Instant::now();

        for c in first.chars() {
            dispatch(&mut app, AppEvent::Key(key(KeyCode::Char(c))), start);
        }
        assert_eq!(app.controller().phase(), Phase::PageComplete(0));

        // no Tick in between: the key itself triggers the advance
        let later = start + std::time::Duration::from_secs(1);
        dispatch(&mut app, AppEvent::Key(key(KeyCode::Char(second_first_char))), later);

        assert_eq!(app.controller().session().current_page_index(), 1);
        assert_eq!(app.controller().session().user_input(), second_first_char.to_string());
        assert_eq!(app.controller().session().error_count(), 0);
    }

    #[test]
    fn dispatch_before_due_keeps_page_complete() {
        let mut app = signed_in();
        app.select_text(&TextId::new("default-1"));
        let first = app.controller().session().current_page().to_string();
        let start = Instant::now();

        for c in first.chars() {
            dispatch(&mut app, AppEvent::Key(key(KeyCode::Char(c))), start);
        }
        dispatch(&mut app, AppEvent::Resize, start);

        assert_eq!(app.controller().phase(), Phase::PageComplete(0));
    }
}
