//! The seam to whatever hands out sessions and stream catalogues.

use std::future::Future;

use papatch_manifest::Stream;

use crate::error::{Result, SyncError};

/// An authenticated session ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    ticket: String,
}

impl Session {
    pub fn new(ticket: impl Into<String>) -> Self {
        Self { ticket: ticket.into() }
    }

    pub fn ticket(&self) -> &str {
        &self.ticket
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("ticket", &"<redacted>").finish()
    }
}

/// Streams offered to a session, in the order the service listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamCatalog {
    streams: Vec<Stream>,
}

impl StreamCatalog {
    pub fn new(streams: Vec<Stream>) -> Self {
        Self { streams }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Take the stream called `name` out of the catalogue.
    pub fn select(mut self, name: &str) -> Result<Stream> {
        match self.streams.iter().position(|s| s.name == name) {
            Some(index) => Ok(self.streams.swap_remove(index)),
            None => Err(SyncError::UnknownStream {
                name: name.to_owned(),
                available: self.names().map(str::to_owned).collect(),
            }),
        }
    }
}

impl FromIterator<Stream> for StreamCatalog {
    fn from_iter<I: IntoIterator<Item = Stream>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Authenticates and lists streams.
///
/// Implementations report their own failures; callers map them to
/// [`SyncError::AuthFailed`] and [`SyncError::StreamListUnavailable`].
pub trait SessionProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn login(&self) -> impl Future<Output = std::result::Result<Session, Self::Error>> + Send;

    /// List the streams available to `session`. The ticket is consumed.
    fn streams(&self, session: Session) -> impl Future<Output = std::result::Result<StreamCatalog, Self::Error>> + Send;
}

/// Log in and fetch the catalogue, classifying failures.
pub async fn open_catalog<P: SessionProvider>(provider: &P) -> Result<StreamCatalog> {
    let session = provider
        .login()
        .await
        .map_err(|e| SyncError::AuthFailed(Box::new(e)))?;
    provider
        .streams(session)
        .await
        .map_err(|e| SyncError::StreamListUnavailable(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str) -> Stream {
        Stream {
            name: name.into(),
            download_url: "https://cdn".into(),
            title_folder: "PA".into(),
            manifest_name: "manifest".into(),
            auth_suffix: String::new(),
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("rejected")]
    struct Rejected;

    struct Fixed {
        accept: bool,
    }

    impl SessionProvider for Fixed {
        type Error = Rejected;

        async fn login(&self) -> std::result::Result<Session, Rejected> {
            if self.accept { Ok(Session::new("t")) } else { Err(Rejected) }
        }

        async fn streams(&self, _session: Session) -> std::result::Result<StreamCatalog, Rejected> {
            Ok([stream("stable"), stream("pte")].into_iter().collect())
        }
    }

    #[test]
    fn test_select_known_and_unknown() {
        let catalog: StreamCatalog = [stream("stable"), stream("pte")].into_iter().collect();
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["stable", "pte"]);
        assert_eq!(catalog.clone().select("pte").unwrap().name, "pte");

        match catalog.select("nightly") {
            Err(SyncError::UnknownStream { name, available }) => {
                assert_eq!(name, "nightly");
                assert_eq!(available, ["stable", "pte"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_session_debug_hides_ticket() {
        assert!(!format!("{:?}", Session::new("secret")).contains("secret"));
    }

    #[tokio::test]
    async fn test_open_catalog_classifies_login_failure() {
        let catalog = open_catalog(&Fixed { accept: true }).await.unwrap();
        assert_eq!(catalog.len(), 2);

        let err = open_catalog(&Fixed { accept: false }).await.unwrap_err();
        assert!(matches!(err, SyncError::AuthFailed(_)));
    }
}
