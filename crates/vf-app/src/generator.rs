use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;
use vf_core::address::rewrite_artifact_url;
use vf_core::{GenerationResult, JobRequest, ProgressEvent, ProgressState, RequestError, Stage};

use crate::error::AppError;
use crate::events::{self, AppEvent};
use crate::generator::backend::GenerationBackend;

pub mod backend;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input, nothing was sent
    Skipped,
    /// A request is already outstanding
    Busy,
    Completed(GenerationResult),
    Failed(String),
}

/// Owns the progress state for one session and drives it through a
/// submission. At most one request is in flight at a time.
pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
    base_url: Url,
    stage_interval: Duration,
    state: ProgressState,
    events: UnboundedSender<AppEvent>,
}

impl Generator {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        base_url: Url,
        stage_interval: Duration,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self { backend, base_url, stage_interval, state: ProgressState::Idle, events }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_busy()
    }

    pub async fn submit(&mut self, request: &JobRequest) -> Result<SubmitOutcome, RequestError> {
        let Some((endpoint, job)) = request.normalize()? else {
            debug!("blank input, nothing to submit");
            return Ok(SubmitOutcome::Skipped);
        };
        if !self.can_submit() {
            warn!("submission ignored, a generation is already running");
            return Ok(SubmitOutcome::Busy);
        }

        let job_id = Uuid::new_v4();
        let started = Utc::now();
        let backend = Arc::clone(&self.backend);
        let base_url = self.base_url.clone();
        let interval = self.stage_interval;

        self.transition(ProgressEvent::Submitted);
        self.emit(AppEvent::Submitted {
            job_id,
            endpoint,
            base_url: base_url.clone(),
            at: started,
        });
        info!(%job_id, %endpoint, %base_url, mode = request.mode.name(), "submitting generation job");

        let call = backend.generate(&base_url, endpoint, &job);
        tokio::pin!(call);
        let mut stage = Stage::Script;
        let outcome = loop {
            tokio::select! {
                outcome = &mut call => break outcome,
                _ = tokio::time::sleep(interval), if stage.next().is_some() => {
                    if let Some(next) = stage.next() {
                        stage = next;
                        self.transition(ProgressEvent::Advanced(next));
                    }
                }
            }
        };

        let elapsed_secs = (Utc::now() - started).num_seconds();
        match outcome {
            Ok(response) => {
                let artifact_url = rewrite_artifact_url(&response.video_url, &base_url);
                if artifact_url != response.video_url {
                    debug!(raw = %response.video_url, %artifact_url, "rewrote artifact address");
                }
                let result = GenerationResult { script: response.script, artifact_url };
                info!(%job_id, elapsed_secs, url = %result.artifact_url, "generation complete");

                self.transition(ProgressEvent::Succeeded(result.clone()));
                self.emit(AppEvent::Completed { job_id, result: result.clone(), elapsed_secs });
                Ok(SubmitOutcome::Completed(result))
            }
            Err(err) => {
                error!(%job_id, elapsed_secs, "generation failed: {err}");
                self.transition(ProgressEvent::Failed(err.user_message()));
                let message = self.state.error_message().unwrap_or_default().to_string();
                self.emit(AppEvent::Failed { job_id, error: message.clone() });
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// Drops the finished result or error and goes back to idle.
    pub fn clear(&mut self) {
        self.transition(ProgressEvent::Cleared);
    }

    pub async fn health(&self) -> Result<String, AppError> {
        let response = self.backend.health(&self.base_url).await?;
        Ok(response.status)
    }

    /// Saves the finished video. Never touches the progress state.
    pub async fn save_artifact(&self, path: &Path) -> Result<(), AppError> {
        let result = self.state.result().ok_or(AppError::NoArtifact)?;
        let bytes = self.backend.download(&result.artifact_url).await?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| AppError::Io { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), bytes = bytes.len(), "saved video");
        Ok(())
    }

    fn transition(&mut self, event: ProgressEvent) {
        let next = std::mem::take(&mut self.state).apply(event);
        self.state = next;
        self.emit(AppEvent::Progress(self.state.clone()));
    }

    fn emit(&self, event: AppEvent) {
        events::send(&self.events, event);
    }
}
