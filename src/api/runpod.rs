use crate::api::http::{JobTransport, ReqwestTransport, Sleeper, TokioSleeper};
use crate::error::GenerationError;
use crate::input::prepare_image;
use crate::video::{
    GenerationRequest, JobStatus, RemoteJob, Resolution, VIDEO_CONTENT_TYPE, VideoGenerationResult,
};
use crate::{logi, logok, logw};
use anyhow::Result;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const RUNPOD_API_BASE: &str = "https://api.runpod.ai/v2";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
const GENERIC_FAILURE: &str = "Video generation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ImageToVideo,
    TextToVideo,
}

impl Endpoint {
    pub fn for_request(request: &GenerationRequest) -> Self {
        if request.input_image().is_some() {
            Self::ImageToVideo
        } else {
            Self::TextToVideo
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            Self::ImageToVideo => "wan-2-6-i2v",
            Self::TextToVideo => "wan-2-6-t2v",
        }
    }
}

/// The queue only accepts 5, 10 or 15 second clips. NaN and infinities
/// snap to the 5 second default.
pub fn snap_duration(duration: f64) -> u32 {
    if !duration.is_finite() || duration <= 7.0 {
        5
    } else if duration <= 12.0 {
        10
    } else {
        15
    }
}

pub fn map_resolution(label: &str) -> &'static str {
    Resolution::from_label(label).size()
}

/// Derives the status URL from a run URL: `.../<model>/run` -> `.../<model>/status/<id>`.
pub fn status_url(run_url: &str, job_id: &str) -> String {
    let base = run_url.strip_suffix("/run").unwrap_or(run_url);
    format!("{base}/status/{job_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedJob {
    pub endpoint: Endpoint,
    pub body: Value,
}

pub async fn shape_request(request: &GenerationRequest) -> Result<ShapedJob, GenerationError> {
    let endpoint = Endpoint::for_request(request);

    let mut input = json!({
        "prompt": request.prompt(),
        "duration": snap_duration(request.duration()),
        "size": request.resolution().size(),
        "enable_audio": request.generate_audio(),
    });

    if let Some(image) = request.input_image() {
        input["image"] = Value::String(prepare_image(image).await?);
    }

    Ok(ShapedJob {
        endpoint,
        body: json!({ "input": input }),
    })
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusOutput {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub output: Option<StatusOutput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    fn artifact(&self) -> Option<&str> {
        let output = self.output.as_ref()?;
        output
            .video_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| output.result.as_deref().filter(|r| !r.is_empty()))
    }
}

pub fn extract_result(status: &StatusResponse) -> Result<VideoGenerationResult, GenerationError> {
    let url = status.artifact().ok_or_else(|| {
        GenerationError::ProtocolViolation("No video URL returned from Runpod API".to_string())
    })?;
    Ok(VideoGenerationResult {
        url: url.to_string(),
        content_type: VIDEO_CONTENT_TYPE.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct RunpodClient {
    api_key: String,
    api_base: String,
    poll: PollSettings,
    transport: Arc<dyn JobTransport>,
    sleeper: Arc<dyn Sleeper>,
}

impl RunpodClient {
    /// Client over a shared reqwest client, sleeping on the tokio timer.
    pub fn with_client(api_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self::with_transport(
            api_key,
            Arc::new(ReqwestTransport::with_client(client)),
            Arc::new(TokioSleeper),
        )
    }

    pub fn with_transport(
        api_key: impl Into<String>,
        transport: Arc<dyn JobTransport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: RUNPOD_API_BASE.to_string(),
            poll: PollSettings::default(),
            transport,
            sleeper,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn run_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}/run", self.api_base, endpoint.model_id())
    }

    pub async fn submit(&self, run_url: &str, body: &Value) -> Result<RemoteJob, GenerationError> {
        let reply = self.transport.post_json(run_url, &self.api_key, body).await?;

        if !reply.is_success() {
            return Err(GenerationError::Transport {
                operation: "submit video generation job",
                status: reply.status,
                status_text: reply.status_text,
                body: Some(reply.body),
            });
        }

        let parsed: SubmitResponse = serde_json::from_str(&reply.body).map_err(|err| {
            GenerationError::ProtocolViolation(format!("undecodable submit response: {err}"))
        })?;
        let id = parsed.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            GenerationError::ProtocolViolation("submit response carries no job id".to_string())
        })?;

        logi(format!(
            "Runpod job {} submitted ({})",
            id,
            parsed.status.as_deref().unwrap_or("unknown status")
        ));
        Ok(RemoteJob::submitted(id))
    }

    /// Polls until the job completes, fails, or the attempt budget runs out.
    ///
    /// Returns the final status payload of a COMPLETED job. The caller's
    /// `job` reflects every observed status.
    pub async fn poll_for_completion(
        &self,
        run_url: &str,
        job: &mut RemoteJob,
    ) -> Result<StatusResponse, GenerationError> {
        let url = status_url(run_url, job.id());
        let max_attempts = self.poll.max_attempts;

        for attempt in 1..=max_attempts {
            let reply = self.transport.get(&url, &self.api_key).await?;
            if !reply.is_success() {
                return Err(GenerationError::Transport {
                    operation: "check job status",
                    status: reply.status,
                    status_text: reply.status_text,
                    body: None,
                });
            }

            let status: StatusResponse = serde_json::from_str(&reply.body).map_err(|err| {
                GenerationError::ProtocolViolation(format!("undecodable status response: {err}"))
            })?;
            debug!(job = job.id(), attempt, status = %status.status, "polled job status");

            match JobStatus::from_wire(&status.status) {
                Some(next) => {
                    job.observe(
                        status.id.as_deref(),
                        next,
                        status.artifact().map(str::to_string),
                        status.error.clone(),
                    )?;
                    match next {
                        JobStatus::Completed => return Ok(status),
                        JobStatus::Failed => {
                            let message = status
                                .error
                                .filter(|msg| !msg.is_empty())
                                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                            return Err(GenerationError::RemoteFailure(message));
                        }
                        JobStatus::Queued | JobStatus::Running => {}
                    }
                }
                None => logw(format!(
                    "Runpod job {} reported unrecognized status {}",
                    job.id(),
                    status.status
                )),
            }

            if attempt < max_attempts {
                self.sleeper.sleep(self.poll.interval).await;
            }
        }

        Err(GenerationError::Timeout {
            attempts: max_attempts,
        })
    }

    pub async fn generate_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<VideoGenerationResult, GenerationError> {
        let shaped = shape_request(request).await?;
        let run_url = self.run_url(shaped.endpoint);

        let mut job = self.submit(&run_url, &shaped.body).await?;
        let status = self.poll_for_completion(&run_url, &mut job).await?;
        let result = extract_result(&status)?;

        logok(format!("Runpod job {} completed: {}", job.id(), result.url));
        Ok(result)
    }
}
