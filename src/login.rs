//! Credential form shown at startup without credentials and after an
//! authentication failure.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::notion::normalize_notion_id;
use crate::source::Credentials;
use crate::text_utils::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Database,
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    None,
    /// Validate these credentials by fetching the song list.
    Submit { creds: Credentials, remember: bool },
    Invalid(String),
}

#[derive(Debug, Default)]
pub struct LoginState {
    database: TextInput,
    token: TextInput,
    focus: Field,
    remember: bool,
    submitting: bool,
}

impl LoginState {
    /// Form pre-filled with whatever credentials are already known.
    pub fn with_credentials(creds: &Credentials) -> Self {
        Self {
            database: TextInput::new(creds.database_id.clone()),
            token: TextInput::new(creds.token.clone()),
            ..Default::default()
        }
    }

    pub fn database(&self) -> &TextInput {
        &self.database
    }

    pub fn token(&self) -> &TextInput {
        &self.token
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn remember(&self) -> bool {
        self.remember
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The validation request came back, successfully or not.
    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            Field::Database => &mut self.database,
            Field::Token => &mut self.token,
        }
    }

    fn submit(&mut self) -> LoginAction {
        if self.submitting {
            return LoginAction::None;
        }
        let raw_db = self.database.value().trim();
        let token = self.token.value().trim();
        if raw_db.is_empty() || token.is_empty() {
            return LoginAction::Invalid("Database ID and token are both required".into());
        }
        let database_id = normalize_notion_id(raw_db).unwrap_or_else(|| raw_db.to_string());
        let creds = Credentials::new(token, database_id);
        self.submitting = true;
        tracing::info!(remember = self.remember, "submitting credentials");
        LoginAction::Submit {
            creds,
            remember: self.remember,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> LoginAction {
        if key.kind != KeyEventKind::Press {
            return LoginAction::None;
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::Database => Field::Token,
                    Field::Token => Field::Database,
                };
            }
            KeyCode::F(2) => self.remember = !self.remember,
            KeyCode::Enter => return self.submit(),
            KeyCode::Backspace => {
                self.focused_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_mut().push(c);
            }
            _ => {}
        }
        LoginAction::None
    }
}
