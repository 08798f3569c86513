use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthProvider, User, MIN_PASSWORD_LEN};
use crate::config::Config;
use crate::controller::{ControllerConfig, InputOutcome, TypingController};
use crate::library::{Library, Text, TextId};
use crate::metrics::SessionStats;
use crate::upload::{UploadError, UploadRequest, UploadResponse, UploadTracker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Waiting for the provider to report a previous session
    Restoring,
    SignedOut,
    SignedIn(User),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum AuthMode {
    #[strum(serialize = "Log in")]
    Login,
    #[strum(serialize = "Sign up")]
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    DisplayName,
    Email,
    Password,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub focus: AuthField,
    pub login_email: String,
    pub login_password: String,
    pub signup_name: String,
    pub signup_email: String,
    pub signup_password: String,
    pub error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: AuthField::Email,
            login_email: String::new(),
            login_password: String::new(),
            signup_name: String::new(),
            signup_email: String::new(),
            signup_password: String::new(),
            error: None,
        }
    }
}

impl AuthForm {
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[AuthField::DisplayName, AuthField::Email, AuthField::Password],
        }
    }

    pub fn value(&self, field: AuthField) -> &str {
        match (self.mode, field) {
            (AuthMode::Login, AuthField::Email) => &self.login_email,
            (AuthMode::Login, AuthField::Password) => &self.login_password,
            (AuthMode::Login, AuthField::DisplayName) => "",
            (AuthMode::SignUp, AuthField::DisplayName) => &self.signup_name,
            (AuthMode::SignUp, AuthField::Email) => &self.signup_email,
            (AuthMode::SignUp, AuthField::Password) => &self.signup_password,
        }
    }

    fn value_mut(&mut self) -> Option<&mut String> {
        match (self.mode, self.focus) {
            (AuthMode::Login, AuthField::Email) => Some(&mut self.login_email),
            (AuthMode::Login, AuthField::Password) => Some(&mut self.login_password),
            (AuthMode::Login, AuthField::DisplayName) => None,
            (AuthMode::SignUp, AuthField::DisplayName) => Some(&mut self.signup_name),
            (AuthMode::SignUp, AuthField::Email) => Some(&mut self.signup_email),
            (AuthMode::SignUp, AuthField::Password) => Some(&mut self.signup_password),
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % fields.len()
        } else {
            (idx + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }
}

/// Modal layered over the practice screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Library {
        highlighted: usize,
    },
    UploadPrompt {
        path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line message replacing the browser's alert boxes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// The whole application state. Every mutation goes through a method here;
/// the UI only ever sees `&App`.
#[derive(Debug)]
pub struct App {
    auth: Box<dyn AuthProvider>,
    auth_status: AuthStatus,
    auth_form: AuthForm,
    dark_theme: bool,
    sidebar_open: bool,
    overlay: Overlay,
    library: Library,
    controller: TypingController,
    uploads: UploadTracker,
    notice: Option<Notice>,
}

impl App {
    pub fn new(config: Config, auth: Box<dyn AuthProvider>, library: Library) -> Self {
        Self {
            auth,
            auth_status: AuthStatus::Restoring,
            auth_form: AuthForm::default(),
            dark_theme: config.dark_theme,
            sidebar_open: config.sidebar_open,
            overlay: Overlay::None,
            library,
            controller: TypingController::new(ControllerConfig::from(&config)),
            uploads: UploadTracker::default(),
            notice: None,
        }
    }

    pub fn auth_status(&self) -> &AuthStatus {
        &self.auth_status
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.auth_status {
            AuthStatus::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    pub fn auth_form(&self) -> &AuthForm {
        &self.auth_form
    }

    pub fn is_dark(&self) -> bool {
        self.dark_theme
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn controller(&self) -> &TypingController {
        &self.controller
    }

    pub fn is_uploading(&self) -> bool {
        self.uploads.is_pending()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn stats(&self, now: Instant) -> SessionStats {
        self.controller.stats(now)
    }

    /// `saved` with the presentation toggles of this run applied.
    pub fn preferences(&self, saved: Config) -> Config {
        Config {
            dark_theme: self.dark_theme,
            sidebar_open: self.sidebar_open,
            ..saved
        }
    }

    // auth

    /// Ask the provider for a still signed-in user from an earlier run.
    pub fn restore_session(&mut self) {
        self.auth_status = match self.auth.current_user() {
            Ok(Some(user)) => {
                info!(user_id = user.id, "session restored");
                AuthStatus::SignedIn(user)
            }
            Ok(None) => AuthStatus::SignedOut,
            Err(err) => {
                warn!(%err, "could not restore session");
                AuthStatus::SignedOut
            }
        };
    }

    pub fn auth_input(&mut self, c: char) {
        if let Some(value) = self.auth_form.value_mut() {
            value.push(c);
        }
    }

    pub fn auth_backspace(&mut self) {
        if let Some(value) = self.auth_form.value_mut() {
            value.pop();
        }
    }

    pub fn auth_focus_next(&mut self) {
        self.auth_form.move_focus(true);
    }

    pub fn auth_focus_previous(&mut self) {
        self.auth_form.move_focus(false);
    }

    pub fn toggle_auth_mode(&mut self) {
        let form = &mut self.auth_form;
        form.mode = match form.mode {
            AuthMode::Login => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::Login,
        };
        form.focus = AuthField::Email;
        form.error = None;
    }

    /// Log in or sign up with the form contents, depending on the mode.
    pub fn submit_auth(&mut self) {
        self.auth_form.error = None;

        let result = match self.auth_form.mode {
            AuthMode::Login => {
                let form = &self.auth_form;
                self.auth.sign_in(&form.login_email, &form.login_password)
            }
            AuthMode::SignUp => {
                let form = &self.auth_form;
                if form.signup_password.chars().count() < MIN_PASSWORD_LEN {
                    Err(AuthError::WeakPassword)
                } else {
                    self.auth
                        .sign_up(&form.signup_email, &form.signup_password, &form.signup_name)
                }
            }
        };
        self.apply_auth_result(result);
    }

    pub fn sign_in_with_external_identity(&mut self) {
        self.auth_form.error = None;
        let result = self.auth.sign_in_with_external_identity();
        self.apply_auth_result(result);
    }

    fn apply_auth_result(&mut self, result: Result<User, AuthError>) {
        match result {
            Ok(user) => {
                info!(user_id = user.id, "authenticated");
                self.auth_status = AuthStatus::SignedIn(user);
            }
            Err(err) => {
                debug!(%err, "authentication failed");
                self.auth_form.error = Some(err.to_string());
            }
        }
    }

    /// Sign out and drop everything tied to the login.
    pub fn logout(&mut self) {
        if let Err(err) = self.auth.sign_out() {
            warn!(%err, "sign out failed");
        }
        self.controller.clear();
        self.uploads.invalidate();
        self.library.clear_uploaded();
        self.overlay = Overlay::None;
        self.notice = None;
        self.auth_status = AuthStatus::SignedOut;
    }

    // presentation toggles

    pub fn toggle_theme(&mut self) {
        self.dark_theme = !self.dark_theme;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // library

    pub fn toggle_library(&mut self) {
        self.overlay = match self.overlay {
            Overlay::Library { .. } => Overlay::None,
            _ => Overlay::Library { highlighted: 0 },
        };
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    pub fn library_move(&mut self, delta: isize) {
        if let Overlay::Library { highlighted } = &mut self.overlay {
            let last = self.library.len().saturating_sub(1);
            *highlighted = highlighted.saturating_add_signed(delta).min(last);
        }
    }

    /// Start practicing `id`. Any pending page advance or upload is superseded.
    pub fn select_text(&mut self, id: &TextId) -> bool {
        let Some(text) = self.library.get(id).cloned() else {
            return false;
        };
        self.start_session(text);
        true
    }

    pub fn select_highlighted(&mut self) {
        if let Overlay::Library { highlighted } = self.overlay {
            if let Some(text) = self.library.nth(highlighted).cloned() {
                self.start_session(text);
            }
        }
    }

    fn start_session(&mut self, text: Text) {
        self.uploads.invalidate();
        self.controller.select_text(text);
        self.overlay = Overlay::None;
    }

    pub fn delete_text(&mut self, id: &TextId) {
        match self.library.remove(id) {
            Ok(text) => {
                self.controller.text_removed(&text.id);
                if let Overlay::Library { highlighted } = &mut self.overlay {
                    *highlighted = (*highlighted).min(self.library.len().saturating_sub(1));
                }
            }
            Err(err) => self.notice = Some(Notice::error(err.to_string())),
        }
    }

    pub fn delete_highlighted(&mut self) {
        if let Overlay::Library { highlighted } = self.overlay {
            if let Some(id) = self.library.nth(highlighted).map(|text| text.id.clone()) {
                self.delete_text(&id);
            }
        }
    }

    // uploads

    pub fn open_upload_prompt(&mut self) {
        if self.uploads.is_pending() {
            self.notice = Some(Notice::error("An upload is already in progress"));
            return;
        }
        self.overlay = Overlay::UploadPrompt {
            path: String::new(),
        };
    }

    pub fn upload_prompt_input(&mut self, c: char) {
        if let Overlay::UploadPrompt { path } = &mut self.overlay {
            path.push(c);
        }
    }

    pub fn upload_prompt_backspace(&mut self) {
        if let Overlay::UploadPrompt { path } = &mut self.overlay {
            path.pop();
        }
    }

    /// Submit the prompt. Returns the request to hand to an extraction worker.
    pub fn submit_upload_prompt(&mut self) -> Option<UploadRequest> {
        let Overlay::UploadPrompt { path } = &self.overlay else {
            return None;
        };
        let path = path.trim().to_string();
        self.overlay = Overlay::None;
        if path.is_empty() {
            return None;
        }
        self.begin_upload(Path::new(&path))
    }

    /// Validate `path` and mark an upload in flight. Errors become a notice.
    pub fn begin_upload(&mut self, path: &Path) -> Option<UploadRequest> {
        match self.uploads.begin(path) {
            Ok(request) => {
                self.notice = Some(Notice::info(format!("Extracting {}...", request.file_name)));
                Some(request)
            }
            Err(err @ UploadError::InFlight) => {
                self.notice = Some(Notice::error(err.to_string()));
                None
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "upload refused");
                self.notice = Some(Notice::error(err.to_string()));
                None
            }
        }
    }

    /// Apply a finished extraction. Stale results are dropped silently.
    pub fn finish_upload(&mut self, response: UploadResponse) -> Option<TextId> {
        let response = self.uploads.complete(response)?;

        match response.result {
            Ok(content) => {
                let text = self
                    .library
                    .add_uploaded(&response.file_name, &content, Utc::now());
                let id = text.id.clone();
                self.notice = Some(Notice::info(format!("\"{}\" added to library!", text.title)));
                Some(id)
            }
            Err(err) => {
                self.notice = Some(Notice::error(format!("Error uploading file: {err}")));
                None
            }
        }
    }

    // typing

    pub fn type_char(&mut self, c: char, now: Instant) -> InputOutcome {
        self.controller.type_char(c, now)
    }

    pub fn backspace(&mut self, now: Instant) -> InputOutcome {
        self.controller.backspace(now)
    }

    pub fn next_page(&mut self) -> bool {
        self.controller.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.controller.previous_page()
    }

    /// Periodic housekeeping: runs a due page advance.
    pub fn on_tick(&mut self, now: Instant) -> Option<usize> {
        self.controller.poll(now)
    }
}
