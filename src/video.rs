use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DURATION_SECS: f64 = 5.0;
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Request shape handed over by callers: every knob except the prompt is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationConfig {
    pub prompt: String,
    #[serde(default)]
    pub input_image: Option<String>,
    #[serde(default)]
    pub input_is_url: bool,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub generate_audio: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Local(PathBuf),
    Remote(String),
}

impl ImageInput {
    pub fn from_reference(reference: &str, is_url: bool) -> Self {
        if is_url {
            Self::Remote(reference.to_string())
        } else {
            Self::Local(PathBuf::from(reference))
        }
    }

    /// The reference as the user gave it, used for naming output files.
    pub fn source(&self) -> String {
        match self {
            Self::Local(path) => path.to_string_lossy().into_owned(),
            Self::Remote(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Hd720,
    Hd1080,
}

impl Resolution {
    /// Unrecognized labels fall back to 720p.
    pub fn from_label(label: &str) -> Self {
        match label {
            "1080p" => Self::Hd1080,
            _ => Self::Hd720,
        }
    }

    /// Frame size in the `W*H` form the queue API expects.
    pub fn size(self) -> &'static str {
        match self {
            Self::Hd720 => "1280*720",
            Self::Hd1080 => "1920*1080",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    input_image: Option<ImageInput>,
    duration: f64,
    resolution: Resolution,
    generate_audio: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            input_image: None,
            duration: DEFAULT_DURATION_SECS,
            resolution: Resolution::default(),
            generate_audio: false,
        }
    }

    pub fn with_input_image(mut self, input: ImageInput) -> Self {
        self.input_image = Some(input);
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_audio(mut self, enabled: bool) -> Self {
        self.generate_audio = enabled;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn input_image(&self) -> Option<&ImageInput> {
        self.input_image.as_ref()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn generate_audio(&self) -> bool {
        self.generate_audio
    }
}

impl From<VideoGenerationConfig> for GenerationRequest {
    fn from(config: VideoGenerationConfig) -> Self {
        let mut request = GenerationRequest::new(config.prompt)
            .with_duration(config.duration.unwrap_or(DEFAULT_DURATION_SECS))
            .with_resolution(
                config
                    .resolution
                    .as_deref()
                    .map(Resolution::from_label)
                    .unwrap_or_default(),
            )
            .with_audio(config.generate_audio.unwrap_or(false));
        if let Some(reference) = config.input_image.filter(|r| !r.is_empty()) {
            request = request.with_input_image(ImageInput::from_reference(&reference, config.input_is_url));
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationResult {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn from_wire(status: &str) -> Option<Self> {
        match status {
            "IN_QUEUE" => Some(Self::Queued),
            "IN_PROGRESS" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Local view of one submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    id: String,
    status: JobStatus,
    output: Option<String>,
    error: Option<String>,
}

impl RemoteJob {
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            output: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Records one status observation.
    ///
    /// `reported_id` is the id carried by the status payload, if any. A payload
    /// for another job, or any update after a terminal state, is rejected.
    pub fn observe(
        &mut self,
        reported_id: Option<&str>,
        status: JobStatus,
        output: Option<String>,
        error: Option<String>,
    ) -> Result<(), GenerationError> {
        if let Some(other) = reported_id.filter(|other| *other != self.id) {
            return Err(GenerationError::ProtocolViolation(format!(
                "status for job {other} returned while polling job {}",
                self.id
            )));
        }
        if self.status.is_terminal() {
            return Err(GenerationError::ProtocolViolation(format!(
                "job {} already finished as {:?}",
                self.id, self.status
            )));
        }
        self.status = status;
        self.output = output;
        self.error = error;
        Ok(())
    }
}
