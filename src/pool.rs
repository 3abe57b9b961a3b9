// pool.rs: Background fetch worker feeding the UI loop

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::projection::FetchTicket;
use crate::source::{Credentials, FetchResult, Song, SongSource};

/// Why a song list is being fetched; echoed back with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongsOrigin {
    Startup,
    Reload,
    /// Credential check from the login form.
    Login { remember: bool },
}

#[derive(Debug, Clone)]
pub enum FetchRequest {
    Songs {
        creds: Credentials,
        origin: SongsOrigin,
    },
    Lyrics {
        ticket: FetchTicket,
        creds: Credentials,
    },
}

#[derive(Debug)]
pub enum FetchResponse {
    Songs {
        creds: Credentials,
        origin: SongsOrigin,
        result: FetchResult<Vec<Song>>,
    },
    Lyrics {
        ticket: FetchTicket,
        result: FetchResult<Vec<String>>,
    },
}

async fn run<S: SongSource>(source: &S, request: FetchRequest) -> FetchResponse {
    match request {
        FetchRequest::Songs { creds, origin } => {
            let result = source.fetch_songs(&creds).await;
            match &result {
                Ok(songs) => tracing::info!(songs = songs.len(), ?origin, "song list fetched"),
                Err(e) => tracing::warn!(error = %e, ?origin, "song list fetch failed"),
            }
            FetchResponse::Songs {
                creds,
                origin,
                result,
            }
        }
        FetchRequest::Lyrics { ticket, creds } => {
            let result = source.fetch_lyrics(&creds, &ticket.song_id).await;
            if let Err(e) = &result {
                tracing::warn!(error = %e, request = ticket.request, "lyrics fetch failed");
            }
            FetchResponse::Lyrics { ticket, result }
        }
    }
}

/// Serve fetch requests until the request channel closes or shutdown is
/// signalled. Requests run concurrently; responses arrive in completion
/// order, not request order.
pub async fn listen<S: SongSource>(
    source: Arc<S>,
    mut request_rx: mpsc::Receiver<FetchRequest>,
    response_tx: mpsc::Sender<FetchResponse>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_request = request_rx.recv() => {
                let Some(request) = maybe_request else {
                    break;
                };
                let source = Arc::clone(&source);
                let tx = response_tx.clone();
                tokio::spawn(async move {
                    let response = run(source.as_ref(), request).await;
                    if tx.send(response).await.is_err() {
                        tracing::debug!("UI loop gone; dropping fetch response");
                    }
                });
            }
        }
    }
    tracing::debug!("fetch worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchError;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct FakeSource;

    impl SongSource for FakeSource {
        async fn fetch_songs(&self, creds: &Credentials) -> FetchResult<Vec<Song>> {
            if creds.token != "good" {
                return Err(FetchError::Auth("bad token".into()));
            }
            Ok(vec![Song {
                id: "s1".into(),
                title: "One".into(),
                group: "A".into(),
            }])
        }

        async fn fetch_lyrics(&self, _creds: &Credentials, song_id: &str) -> FetchResult<Vec<String>> {
            let delay = if song_id == "slow" { 500 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![format!("{song_id} line")])
        }
    }

    fn spawn_worker() -> (mpsc::Sender<FetchRequest>, mpsc::Receiver<FetchResponse>, mpsc::Sender<()>) {
        let (req_tx, req_rx) = mpsc::channel(8);
        let (resp_tx, resp_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        tokio::spawn(listen(Arc::new(FakeSource), req_rx, resp_tx, shutdown_rx));
        (req_tx, resp_rx, shutdown_tx)
    }

    fn ticket(request: u64, song_id: &str) -> FetchTicket {
        FetchTicket {
            request,
            song_id: song_id.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn responses_arrive_in_completion_order() {
        let (tx, mut rx, _shutdown) = spawn_worker();
        let creds = Credentials::new("good", "db");
        tx.send(FetchRequest::Lyrics {
            ticket: ticket(1, "slow"),
            creds: creds.clone(),
        })
        .await
        .unwrap();
        tx.send(FetchRequest::Lyrics {
            ticket: ticket(2, "fast"),
            creds,
        })
        .await
        .unwrap();

        let mut order = Vec::new();
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                FetchResponse::Lyrics { ticket, result } => {
                    order.push((ticket.request, result.unwrap()));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(
            order,
            vec![
                (2, vec!["fast line".to_string()]),
                (1, vec!["slow line".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn songs_echo_origin_and_credentials() {
        let (tx, mut rx, _shutdown) = spawn_worker();
        tx.send(FetchRequest::Songs {
            creds: Credentials::new("bad", "db"),
            origin: SongsOrigin::Login { remember: true },
        })
        .await
        .unwrap();
        match rx.recv().await.unwrap() {
            FetchResponse::Songs {
                creds,
                origin,
                result,
            } => {
                assert_eq!(creds.token, "bad");
                assert_eq!(origin, SongsOrigin::Login { remember: true });
                assert!(result.unwrap_err().is_auth());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let (req_tx, req_rx) = mpsc::channel(1);
        let (resp_tx, _resp_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(listen(Arc::new(FakeSource), req_rx, resp_tx, shutdown_rx));
        shutdown_tx.send(()).await.unwrap();
        handle.await.unwrap();
        drop(req_tx);
    }
}
