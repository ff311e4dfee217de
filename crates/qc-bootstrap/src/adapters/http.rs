//! # HTTP Artifact Source
//!
//! Downloads archives from a base URL. The staged file keeps the name the
//! server chose: the `Content-Disposition` filename when present, otherwise
//! the last path segment after redirects. This is how a request for
//! `snapshot.tar.bz2` lands as `snapshot-<slot>-<hash>.tar.bz2`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response, Url};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::domain::{BootstrapError, Stage};
use crate::ports::ArtifactSource;

/// Artifact source backed by an HTTP(S) endpoint.
pub struct HttpArtifactSource {
    client: Client,
    base_url: Url,
}

impl HttpArtifactSource {
    /// Create a source for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` for an unparseable URL or if the
    /// HTTP client cannot be built.
    pub fn new(base_url: &str, http: &HttpConfig) -> Result<Self, BootstrapError> {
        let mut base_url = Url::parse(base_url.trim())
            .map_err(|e| BootstrapError::Config(format!("invalid snapshot URL {:?}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .read_timeout(Duration::from_secs(http.read_timeout_secs))
            .build()
            .map_err(|e| BootstrapError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn download(response: &mut Response, path: &Path) -> Result<u64, DownloadError> {
        let mut file = File::create(path).await.map_err(DownloadError::Io)?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(DownloadError::Http)? {
            file.write_all(&chunk).await.map_err(DownloadError::Io)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(DownloadError::Io)?;
        file.sync_all().await.map_err(DownloadError::Io)?;
        Ok(written)
    }
}

enum DownloadError {
    Http(reqwest::Error),
    Io(std::io::Error),
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn fetch(&self, remote_name: &str, dest_dir: &Path) -> Result<PathBuf, BootstrapError> {
        let url = self
            .base_url
            .join(remote_name)
            .map_err(|e| BootstrapError::fetch(remote_name, e.to_string()))?;

        info!(%url, "Downloading artifact");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BootstrapError::fetch(remote_name, describe_request_error(&e, &url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::fetch(remote_name, format!("HTTP {}", status)));
        }

        let file_name = served_file_name(&response)
            .ok_or_else(|| BootstrapError::fetch(remote_name, "server provided no usable file name"))?;
        let path = dest_dir.join(&file_name);

        match Self::download(&mut response, &path).await {
            Ok(bytes) => {
                debug!(file = %file_name, bytes, "Download complete");
                Ok(path)
            }
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                Err(match err {
                    DownloadError::Http(e) => {
                        BootstrapError::fetch(file_name, format!("transfer interrupted: {}", e))
                    }
                    DownloadError::Io(e) => {
                        BootstrapError::io(Stage::Fetch, format!("writing {}", path.display()), e)
                    }
                })
            }
        }
    }

    fn endpoint(&self) -> String {
        self.base_url.to_string()
    }
}

fn describe_request_error(err: &reqwest::Error, url: &Url) -> String {
    if err.is_connect() {
        format!("cannot connect to {}", url)
    } else if err.is_timeout() {
        format!("timed out requesting {}", url)
    } else {
        err.to_string()
    }
}

/// File name chosen by the server, validated as a single path component.
fn served_file_name(response: &Response) -> Option<String> {
    let from_header = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_content_disposition);

    let candidate = from_header.or_else(|| {
        response
            .url()
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string)
    })?;

    sanitize_file_name(&candidate)
}

/// `filename` parameter of a `Content-Disposition` value.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let raw = raw.trim();
        let unquoted = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);
        Some(unquoted.to_string())
    })
}

/// Accept `name` only if it is a plain file name.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_content_disposition_quoted() {
        assert_eq!(
            filename_from_content_disposition(
                "attachment; filename=\"snapshot-100-abc.tar.bz2\""
            ),
            Some("snapshot-100-abc.tar.bz2".to_string())
        );
    }

    #[test]
    fn test_content_disposition_bare() {
        assert_eq!(
            filename_from_content_disposition("attachment; FileName=genesis.tar.bz2"),
            Some("genesis.tar.bz2".to_string())
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }

    #[test]
    fn test_sanitize_rejects_paths() {
        assert_eq!(sanitize_file_name("../etc/passwd"), None);
        assert_eq!(sanitize_file_name("a/b.tar.bz2"), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(
            sanitize_file_name("snapshot-1-h.tar.bz2"),
            Some("snapshot-1-h.tar.bz2".to_string())
        );
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let source =
            HttpArtifactSource::new("http://example.com/ledger", &HttpConfig::default()).unwrap();
        assert_eq!(source.base_url().as_str(), "http://example.com/ledger/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpArtifactSource::new("not a url", &HttpConfig::default());
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    fn reply(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
        let mut out = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n", status, body.len());
        for (name, value) in headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(body);
        bytes
    }

    /// Minimal HTTP/1.1 responder mimicking a snapshot-serving RPC node.
    async fn serve() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                    let response = match path.as_str() {
                        "/genesis.tar.bz2" => reply("200 OK", &[], b"genesis-bytes"),
                        "/snapshot.tar.bz2" => {
                            reply("302 Found", &[("Location", "/snapshot-777-RedirHash.tar.bz2")], b"")
                        }
                        "/snapshot-777-RedirHash.tar.bz2" => reply("200 OK", &[], b"snapshot-bytes"),
                        "/named.tar.bz2" => reply(
                            "200 OK",
                            &[("Content-Disposition", "attachment; filename=\"snapshot-5-Named.tar.bz2\"")],
                            b"named",
                        ),
                        "/evil.tar.bz2" => reply(
                            "200 OK",
                            &[("Content-Disposition", "attachment; filename=\"../escape.tar.bz2\"")],
                            b"evil",
                        ),
                        _ => reply("404 Not Found", &[], b""),
                    };
                    let _ = tokio::io::AsyncWriteExt::write_all(&mut stream, &response).await;
                    let _ = tokio::io::AsyncWriteExt::shutdown(&mut stream).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_plain_artifact() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let source = HttpArtifactSource::new(&base, &HttpConfig::default()).unwrap();

        let path = source.fetch("genesis.tar.bz2", dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("genesis.tar.bz2"));
        assert_eq!(std::fs::read(&path).unwrap(), b"genesis-bytes");
    }

    #[tokio::test]
    async fn test_fetch_keeps_redirected_name() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let source = HttpArtifactSource::new(&base, &HttpConfig::default()).unwrap();

        let path = source.fetch("snapshot.tar.bz2", dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("snapshot-777-RedirHash.tar.bz2"));
        assert_eq!(std::fs::read(&path).unwrap(), b"snapshot-bytes");
    }

    #[tokio::test]
    async fn test_fetch_uses_content_disposition() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let source = HttpArtifactSource::new(&base, &HttpConfig::default()).unwrap();

        let path = source.fetch("named.tar.bz2", dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("snapshot-5-Named.tar.bz2"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_traversal_name() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let source = HttpArtifactSource::new(&base, &HttpConfig::default()).unwrap();

        let result = source.fetch("evil.tar.bz2", dir.path()).await;

        assert!(matches!(result, Err(BootstrapError::Fetch { .. })));
        assert!(!dir.path().parent().unwrap().join("escape.tar.bz2").exists());
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let source = HttpArtifactSource::new(&base, &HttpConfig::default()).unwrap();

        match source.fetch("missing.tar.bz2", dir.path()).await {
            Err(BootstrapError::Fetch { artifact, reason }) => {
                assert_eq!(artifact, "missing.tar.bz2");
                assert!(reason.contains("404"), "reason: {}", reason);
            }
            other => panic!("expected Fetch error, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let source =
            HttpArtifactSource::new(&format!("http://{}", addr), &HttpConfig::default()).unwrap();

        let result = source.fetch("genesis.tar.bz2", dir.path()).await;
        assert!(matches!(result, Err(BootstrapError::Fetch { .. })));
    }
}
