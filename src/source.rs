//! Data-retrieval seam: where songs and lyric lines come from.

use std::future::Future;
use thiserror::Error;

/// One entry of the song database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub group: String,
}

/// Credentials for the song database.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub database_id: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            database_id: database_id.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.database_id.trim().is_empty()
    }
}

// Never print the token.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("database_id", &self.database_id)
            .finish()
    }
}

/// Failure taxonomy for fetches. Only `Auth` sends the user back to login.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("authentication invalid: {0}")]
    Auth(String),
    #[error("{0}")]
    Data(String),
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth(_))
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

pub trait SongSource: Send + Sync + 'static {
    /// All songs of the database, in display order.
    fn fetch_songs(&self, creds: &Credentials)
    -> impl Future<Output = FetchResult<Vec<Song>>> + Send;

    /// The lyric lines of one song, in document order.
    fn fetch_lyrics(
        &self,
        creds: &Credentials,
        song_id: &str,
    ) -> impl Future<Output = FetchResult<Vec<String>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_token() {
        let creds = Credentials::new("secret_abc", "db1");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("secret_abc"));
        assert!(shown.contains("db1"));
    }

    #[test]
    fn completeness() {
        assert!(Credentials::new("t", "d").is_complete());
        assert!(!Credentials::new(" ", "d").is_complete());
        assert!(!Credentials::default().is_complete());
    }
}
