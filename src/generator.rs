use crate::api::http::build_client;
use crate::api::runpod::RunpodClient;
use crate::config::{Config, MergedConfig, Provider, merge_config};
use crate::error::GenerationError;
use crate::init::ensure_output_dir;
use crate::output::{output_path, resolve_output_filename};
use crate::video::{GenerationRequest, VideoGenerationConfig, VideoGenerationResult};
use crate::{logi, logok};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

const VIDEO_EXTENSION: &str = "mp4";
const VIDEO_ACTION: &str = "video";

/// Everything the `video` command collects from the command line.
#[derive(Debug, Clone, Default)]
pub struct VideoOptions {
    pub prompt: String,
    pub input: Option<String>,
    pub duration: Option<f64>,
    pub resolution: Option<String>,
    pub audio: bool,
    pub out: Option<String>,
    pub name: Option<String>,
    pub provider: Option<Provider>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub url: String,
    pub content_type: String,
    pub provider: Provider,
}

pub fn is_remote_reference(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

pub fn build_request(options: &VideoOptions) -> GenerationRequest {
    let input_image = options.input.clone().filter(|i| !i.is_empty());
    let input_is_url = input_image.as_deref().is_some_and(is_remote_reference);
    GenerationRequest::from(VideoGenerationConfig {
        prompt: options.prompt.clone(),
        input_image,
        input_is_url,
        duration: options.duration,
        resolution: options.resolution.clone(),
        generate_audio: Some(options.audio),
    })
}

pub async fn generate_video(config: &Config, options: &VideoOptions) -> Result<GeneratedFile> {
    let merged = merge_config(config, options.out.as_deref(), options.provider)?;

    match merged.provider {
        Provider::Runpod => {
            let api_key = config.require_runpod_key()?;
            let http = build_client()?;
            let client = RunpodClient::with_client(api_key, http.clone());
            generate_video_with(&client, &http, &merged, options).await
        }
    }
}

pub async fn generate_video_with(
    client: &RunpodClient,
    http: &Client,
    merged: &MergedConfig,
    options: &VideoOptions,
) -> Result<GeneratedFile> {
    let request = build_request(options);
    logi(format!(
        "Generating video via {} ({})",
        merged.provider,
        if request.input_image().is_some() {
            "image-to-video"
        } else {
            "text-to-video"
        }
    ));

    let VideoGenerationResult { url, content_type } = client
        .generate_video(&request)
        .await
        .context("Video generation failed")?;

    let filename = resolve_output_filename(
        VIDEO_EXTENSION,
        VIDEO_ACTION,
        options.name.as_deref().or(merged.output_name.as_deref()),
        options.input.as_deref(),
    )?;
    ensure_output_dir(&merged.output_dir).await?;
    let path = output_path(&merged.output_dir, &filename);

    download_artifact(http, &url, &path).await?;
    logok(format!("Saved {}", path.display()));

    Ok(GeneratedFile {
        path,
        url,
        content_type,
        provider: merged.provider,
    })
}

pub async fn download_artifact(http: &Client, url: &str, dest: &Path) -> Result<(), GenerationError> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|source| GenerationError::Network {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(GenerationError::Transport {
            operation: "download generated video",
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: None,
        });
    }

    let bytes = resp.bytes().await.map_err(|source| GenerationError::Network {
        url: url.to_string(),
        source,
    })?;
    fs::write(dest, &bytes)
        .await
        .map_err(|err| GenerationError::local_io("Failed to write", dest, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{ImageInput, Resolution};

    #[test]
    fn remote_references_are_detected_by_scheme() {
        assert!(is_remote_reference("https://cdn.example.com/a.png"));
        assert!(is_remote_reference("http://cdn.example.com/a.png"));
        assert!(!is_remote_reference("./http/a.png"));
        assert!(!is_remote_reference("ftp://host/a.png"));
    }

    #[test]
    fn options_without_input_build_text_request() {
        let request = build_request(&VideoOptions {
            prompt: "cat".to_string(),
            duration: Some(5.0),
            resolution: Some("720p".to_string()),
            ..Default::default()
        });
        assert_eq!(request.prompt(), "cat");
        assert!(request.input_image().is_none());
        assert_eq!(request.resolution(), Resolution::Hd720);
    }

    #[test]
    fn options_with_url_input_build_remote_image() {
        let request = build_request(&VideoOptions {
            prompt: "cat".to_string(),
            input: Some("https://cdn.example.com/cat.webp".to_string()),
            audio: true,
            ..Default::default()
        });
        assert_eq!(
            request.input_image(),
            Some(&ImageInput::Remote("https://cdn.example.com/cat.webp".to_string()))
        );
        assert!(request.generate_audio());
        assert_eq!(request.duration(), 5.0);
    }

    #[test]
    fn options_with_path_input_build_local_image() {
        let request = build_request(&VideoOptions {
            prompt: "cat".to_string(),
            input: Some("shots/cat.png".to_string()),
            ..Default::default()
        });
        assert_eq!(
            request.input_image(),
            Some(&ImageInput::Local(PathBuf::from("shots/cat.png")))
        );
    }

    #[test]
    fn empty_input_is_ignored() {
        let request = build_request(&VideoOptions {
            prompt: "cat".to_string(),
            input: Some(String::new()),
            ..Default::default()
        });
        assert!(request.input_image().is_none());
    }

    #[test]
    fn generated_file_serializes_camel_case() {
        let file = GeneratedFile {
            path: PathBuf::from("/out/video_1.mp4"),
            url: "https://out/v.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            provider: Provider::Runpod,
        };
        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["contentType"], "video/mp4");
        assert_eq!(value["provider"], "runpod");
        assert_eq!(value["path"], "/out/video_1.mp4");
    }
}
