use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

use crate::config::Config;
use crate::error::LoadError;

/// Where raw CSV text comes from. Identifiers are opaque to the loader.
#[async_trait]
pub trait RecordSource {
    async fn fetch(&self, id: &str) -> Result<String, LoadError>;
    fn describe(&self) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Fs,
    Http,
}

impl SourceKind {
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.data_base_url.is_some() {
            SourceKind::Http
        } else {
            SourceKind::Fs
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Box<dyn RecordSource + Send + Sync>, LoadError> {
        match self {
            SourceKind::Fs => Ok(Box::new(FsSource::new(&cfg.data_dir))),
            SourceKind::Http => {
                let base = cfg.data_base_url.clone().unwrap_or_default();
                Ok(Box::new(HttpSource::new(&base)?))
            }
        }
    }
}

/// Reads identifiers as paths relative to a root directory.
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RecordSource for FsSource {
    async fn fetch(&self, id: &str) -> Result<String, LoadError> {
        tokio::fs::read_to_string(self.root.join(id))
            .await
            .map_err(|source| LoadError::Io {
                id: id.to_string(),
                source,
            })
    }

    fn describe(&self) -> String {
        format!("fs:{}", self.root.display())
    }
}

/// Fetches identifiers relative to a base URL.
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, LoadError> {
        // A base without a trailing slash would make `join` replace its last segment.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&normalized).map_err(|source| LoadError::InvalidUrl {
            id: base.to_string(),
            source,
        })?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn url_for(&self, id: &str) -> Result<Url, LoadError> {
        self.base.join(id).map_err(|source| LoadError::InvalidUrl {
            id: id.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, id: &str) -> Result<String, LoadError> {
        let url = self.url_for(id)?;
        let http_err = |source| LoadError::Http {
            id: id.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(http_err)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `/exports/runs.csv` with 200 and every other path with 404, one request per connection.
    async fn serve_exports() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                let (status, body) = if request.starts_with("GET /exports/runs.csv ") {
                    ("200 OK", "The recipe\na.B\n")
                } else {
                    ("404 Not Found", "missing")
                };
                let resp = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{}/exports", addr)
    }

    #[tokio::test]
    async fn http_source_maps_status_and_body() {
        let src = HttpSource::new(&serve_exports().await).unwrap();

        let err = src.fetch("absent.csv").await.unwrap_err();
        assert!(matches!(err, LoadError::Status { status: 404, .. }));
        assert_eq!(err.source_id(), "absent.csv");

        let body = src.fetch("runs.csv").await.unwrap();
        assert_eq!(body, "The recipe\na.B\n");
    }

    #[test]
    fn http_source_joins_ids_under_base() {
        let src = HttpSource::new("https://example.com/exports").unwrap();
        let url = src.url_for("runs.csv").unwrap();
        assert_eq!(url.as_str(), "https://example.com/exports/runs.csv");
    }

    #[test]
    fn http_source_rejects_bad_base() {
        assert!(matches!(
            HttpSource::new("not a url"),
            Err(LoadError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn kind_follows_base_url() {
        let mut cfg = Config::default();
        assert_eq!(SourceKind::from_config(&cfg), SourceKind::Fs);
        cfg.data_base_url = Some("http://localhost:8000".to_string());
        assert_eq!(SourceKind::from_config(&cfg), SourceKind::Http);
    }

    #[tokio::test]
    async fn fs_source_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = FsSource::new(dir.path());
        let err = src.fetch("absent.csv").await.unwrap_err();
        assert_eq!(err.source_id(), "absent.csv");
    }
}
