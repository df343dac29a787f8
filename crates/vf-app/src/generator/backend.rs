pub mod config;
pub mod schemas;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;
use vf_core::{Endpoint, JobSpecification};

use crate::error::AppError;
use crate::generator::backend::schemas::{ErrorResponse, GenerateResponse, HealthResponse};

const HEALTH_PATH: &str = "health";

/// The remote generation service. Every call is a single round trip.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        base_url: &Url,
        endpoint: Endpoint,
        job: &JobSpecification,
    ) -> Result<GenerateResponse, AppError>;

    async fn health(&self, base_url: &Url) -> Result<HealthResponse, AppError>;

    async fn download(&self, artifact_url: &str) -> Result<Vec<u8>, AppError>;
}

pub struct HttpBackend {
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(AppError::from_reqwest)?;
        Ok(Self { http })
    }
}

fn join(base_url: &Url, path: &str) -> Result<Url, AppError> {
    base_url
        .join(path.trim_start_matches('/'))
        .map_err(|err| AppError::InvalidUrl(format!("{base_url}{path}: {err}")))
}

/// Every non-2xx is a failure. A `detail` in the body is kept for the log.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}

fn error_from_body(status: u16, body: &str) -> AppError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { detail }) if !detail.trim().is_empty() => {
            AppError::BackendError { status, detail }
        }
        _ => AppError::Status(status),
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate(
        &self,
        base_url: &Url,
        endpoint: Endpoint,
        job: &JobSpecification,
    ) -> Result<GenerateResponse, AppError> {
        let url = join(base_url, endpoint.path())?;
        debug!(%url, "posting generation job");

        let response = self
            .http
            .post(url)
            .json(job)
            .send()
            .await
            .map_err(AppError::from_reqwest)?;

        check_status(response).await?.json().await.map_err(AppError::from_reqwest)
    }

    async fn health(&self, base_url: &Url) -> Result<HealthResponse, AppError> {
        let url = join(base_url, HEALTH_PATH)?;
        let response = self.http.get(url).send().await.map_err(AppError::from_reqwest)?;
        check_status(response).await?.json().await.map_err(AppError::from_reqwest)
    }

    async fn download(&self, artifact_url: &str) -> Result<Vec<u8>, AppError> {
        let url =
            Url::parse(artifact_url).map_err(|_| AppError::InvalidUrl(artifact_url.to_string()))?;
        let response = self.http.get(url).send().await.map_err(AppError::from_reqwest)?;
        let bytes = check_status(response).await?.bytes().await.map_err(AppError::from_reqwest)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use vf_core::{JobRequest, Mode};

    /// Answers a single connection with a canned response and hands back the
    /// raw request it read.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });
        (base_url, handle)
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn topic_job() -> (Endpoint, JobSpecification) {
        JobRequest::new("5 productivity hacks", Mode::Topic).normalize().unwrap().unwrap()
    }

    fn backend(timeout: Option<Duration>) -> HttpBackend {
        HttpBackend::new(timeout).unwrap()
    }

    #[tokio::test]
    async fn test_generate_posts_json() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"script": "Hack #1", "video_url": "http://localhost:8000/v/1.mp4"}"#,
            Duration::ZERO,
        )
        .await;
        let (endpoint, job) = topic_job();

        let response = backend(None).generate(&base_url, endpoint, &job).await.unwrap();
        assert_eq!(response.script.as_deref(), Some("Hack #1"));
        assert_eq!(response.video_url, "http://localhost:8000/v/1.mp4");

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /generate-video "), "{request}");
        assert!(lowered.contains("content-type: application/json"), "{request}");
        assert!(request.contains(r#""is_custom":false"#), "{request}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_failure() {
        let (base_url, _server) =
            serve_once("500 Internal Server Error", "<html>oops</html>", Duration::ZERO).await;
        let (endpoint, job) = topic_job();

        let err = backend(None).generate(&base_url, endpoint, &job).await.unwrap_err();
        assert!(matches!(err, AppError::Status(500)), "{err:?}");
    }

    #[tokio::test]
    async fn test_detail_body_is_not_shown() {
        let (base_url, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"detail": "Audio generation failed: [Errno 2] /srv/app/outputs"}"#,
            Duration::ZERO,
        )
        .await;
        let (endpoint, job) = topic_job();

        let err = backend(None).generate(&base_url, endpoint, &job).await.unwrap_err();
        assert!(matches!(err, AppError::BackendError { status: 500, .. }), "{err:?}");
        assert!(!err.user_message().contains("Errno"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let (base_url, _server) = serve_once("200 OK", "{not json", Duration::ZERO).await;
        let (endpoint, job) = topic_job();

        let err = backend(None).generate(&base_url, endpoint, &job).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_missing_video_url_is_a_decode_error() {
        let (base_url, _server) = serve_once("200 OK", r#"{"script": "x"}"#, Duration::ZERO).await;
        let (endpoint, job) = topic_job();

        let err = backend(None).generate(&base_url, endpoint, &job).await.unwrap_err();
        assert!(matches!(err, AppError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let (base_url, _server) = serve_once(
            "200 OK",
            r#"{"video_url": "http://localhost:8000/v/1.mp4"}"#,
            Duration::from_secs(5),
        )
        .await;
        let (endpoint, job) = topic_job();

        let err = backend(Some(Duration::from_millis(200)))
            .generate(&base_url, endpoint, &job)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Timeout), "{err:?}");
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        drop(listener);
        let (endpoint, job) = topic_job();

        let err = backend(Some(Duration::from_secs(5)))
            .generate(&base_url, endpoint, &job)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)), "{err:?}");
        assert_ne!(err.user_message(), AppError::Timeout.user_message());
    }

    #[tokio::test]
    async fn test_health_reads_status() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"status": "healthy"}"#, Duration::ZERO).await;

        let health = backend(None).health(&base_url).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert!(server.await.unwrap().starts_with("GET /health "));
    }

    #[test]
    fn test_endpoint_urls() {
        let base = Url::parse("http://192.168.1.169:8000").unwrap();
        assert_eq!(
            join(&base, Endpoint::GeneratePhysicsVideo.path()).unwrap().as_str(),
            "http://192.168.1.169:8000/generate-physics-video"
        );
        assert_eq!(join(&base, HEALTH_PATH).unwrap().as_str(), "http://192.168.1.169:8000/health");
    }

    #[test]
    fn test_error_detail_stays_out_of_user_message() {
        let err = error_from_body(
            500,
            r#"{"detail": "Internal server error: [Errno 2] No such file or directory: '/srv/app/outputs/abc_audio.mp3'"}"#,
        );
        assert!(matches!(&err, AppError::BackendError { status: 500, .. }));
        assert!(err.to_string().contains("Errno"));
        let message = err.user_message();
        assert!(!message.contains("Errno"));
        assert!(!message.contains("/srv/app"));
        assert!(message.contains("500"));

        assert!(matches!(error_from_body(502, "<html>Bad Gateway</html>"), AppError::Status(502)));
        assert!(matches!(error_from_body(500, r#"{"detail": ""}"#), AppError::Status(500)));
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let base = Url::parse("https://gen.example.com/api/").unwrap();
        assert_eq!(
            join(&base, Endpoint::GenerateVideo.path()).unwrap().as_str(),
            "https://gen.example.com/api/generate-video"
        );
    }
}
