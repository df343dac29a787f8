use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use url::Url;
use uuid::Uuid;
use vf_core::{Endpoint, GenerationResult, ProgressState};

/// Everything the presentation layer hears about a submission
#[derive(Debug, Clone)]
pub enum AppEvent {
    Submitted {
        job_id: Uuid,
        endpoint: Endpoint,
        base_url: Url,
        at: DateTime<Utc>,
    },
    /// Full replacement of the displayed state
    Progress(ProgressState),
    Completed {
        job_id: Uuid,
        result: GenerationResult,
        elapsed_secs: i64,
    },
    Failed {
        job_id: Uuid,
        error: String,
    },
    Status(String),
    /// Side actions that failed without affecting the submission
    Warning(String),
}

/// Sends to the presentation layer. A closed channel is logged, not an error.
pub fn send(events: &UnboundedSender<AppEvent>, event: AppEvent) -> bool {
    match events.send(event) {
        Ok(()) => true,
        Err(err) => {
            debug!(event = ?err.0, "no listener for app events");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_send_reports_closed_channel() {
        let (tx, mut rx) = unbounded_channel();
        assert!(send(&tx, AppEvent::Status("Saved to out.mp4".into())));
        assert!(matches!(rx.try_recv(), Ok(AppEvent::Status(message)) if message == "Saved to out.mp4"));

        drop(rx);
        assert!(!send(&tx, AppEvent::Warning("download failed".into())));
    }
}
