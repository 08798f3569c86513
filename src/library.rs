use chrono::{DateTime, Utc};
use include_dir::{include_dir, Dir};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};

static TEXTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

const LIBRARY_FILE: &str = "library.json";

static TEXT_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(txt|md|html|htm)$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextId(String);

impl TextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Category {
    Beginner,
    Intermediate,
    Advanced,
    Uploaded,
}

/// A reference text that can be practiced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub id: TextId,
    pub title: String,
    pub category: Category,
    pub body: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("built-in library file {0} is missing")]
    MissingBuiltIn(&'static str),
    #[error("built-in library is not valid UTF-8")]
    InvalidEncoding,
    #[error("built-in library could not be parsed: {0}")]
    InvalidBuiltIn(#[from] serde_json::Error),
    #[error("\"{0}\" is a built-in text and cannot be deleted")]
    BuiltInText(String),
    #[error("no text with id {0}")]
    NotFound(TextId),
}

/// Load the texts bundled with the binary.
pub fn default_texts() -> Result<Vec<Text>, LibraryError> {
    let file = TEXTS_DIR
        .get_file(LIBRARY_FILE)
        .ok_or(LibraryError::MissingBuiltIn(LIBRARY_FILE))?;
    let contents = file
        .contents_utf8()
        .ok_or(LibraryError::InvalidEncoding)?;

    let mut texts: Vec<Text> = serde_json::from_str(contents)?;
    for text in &mut texts {
        text.is_default = true;
    }

    Ok(texts)
}

/// Title for an uploaded file: the file name minus a text-like extension.
pub fn title_from_file_name(file_name: &str) -> String {
    TEXT_EXTENSION.replace(file_name, "").into_owned()
}

/// Built-in texts followed by the texts uploaded during this login.
#[derive(Debug, Clone, Default)]
pub struct Library {
    defaults: Vec<Text>,
    uploaded: Vec<Text>,
}

impl Library {
    pub fn new(defaults: Vec<Text>) -> Self {
        Self {
            defaults,
            uploaded: Vec::new(),
        }
    }

    pub fn with_defaults() -> Result<Self, LibraryError> {
        Ok(Self::new(default_texts()?))
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text> {
        self.defaults.iter().chain(self.uploaded.iter())
    }

    pub fn len(&self) -> usize {
        self.defaults.len() + self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &TextId) -> Option<&Text> {
        self.texts().find(|text| &text.id == id)
    }

    pub fn nth(&self, index: usize) -> Option<&Text> {
        self.texts().nth(index)
    }

    pub fn uploaded(&self) -> &[Text] {
        &self.uploaded
    }

    /// Add extracted document text under a title derived from `file_name`.
    pub fn add_uploaded(&mut self, file_name: &str, content: &str, now: DateTime<Utc>) -> &Text {
        let base = format!("uploaded-{}", now.timestamp_millis());
        let mut id = TextId::new(base.clone());
        let mut suffix = 1;
        while self.get(&id).is_some() {
            id = TextId::new(format!("{base}-{suffix}"));
            suffix += 1;
        }

        let text = Text {
            id,
            title: title_from_file_name(file_name),
            category: Category::Uploaded,
            body: content.trim().to_string(),
            is_default: false,
        };
        info!(id = %text.id, title = %text.title, chars = text.body.chars().count(), "text added to library");

        self.uploaded.push(text);
        &self.uploaded[self.uploaded.len() - 1]
    }

    /// Remove an uploaded text. Built-in texts cannot be removed.
    pub fn remove(&mut self, id: &TextId) -> Result<Text, LibraryError> {
        if let Some(text) = self.defaults.iter().find(|text| &text.id == id) {
            return Err(LibraryError::BuiltInText(text.title.clone()));
        }

        let position = self
            .uploaded
            .iter()
            .position(|text| &text.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.clone()))?;

        let removed = self.uploaded.remove(position);
        debug!(id = %removed.id, "text removed from library");
        Ok(removed)
    }

    pub fn clear_uploaded(&mut self) {
        self.uploaded.clear();
    }
}
