use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use rand::Rng;
use regex::Regex;
use std::path::{Path, PathBuf};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn extension_regex() -> Result<&'static Regex> {
    static EXT_RE: OnceCell<Regex> = OnceCell::new();
    EXT_RE.get_or_try_init(|| Regex::new(r"\.[^.]+$").context("failed to compile extension regex"))
}

fn strip_extension(name: &str) -> Result<String> {
    Ok(extension_regex()?.replace(name, "").into_owned())
}

/// Base filename of a local path or an http(s) URL, without its extension.
pub fn extract_basename(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let filename = reqwest::Url::parse(source)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|segments| segments.last().map(str::to_string))
            })
            .filter(|segment| !segment.is_empty())
            .unwrap_or_else(|| "file".to_string());
        return strip_extension(&filename);
    }

    let filename = Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    strip_extension(&filename)
}

/// Picks the output filename.
///
/// A custom name wins (with its extension replaced by `extension`). Otherwise
/// the name is derived from the input source when there is one, or from the
/// action alone, with a dashless v4 uuid to keep it unique.
pub fn resolve_output_filename(
    extension: &str,
    action_prefix: &str,
    custom_name: Option<&str>,
    input_source: Option<&str>,
) -> Result<String> {
    if let Some(name) = custom_name.filter(|n| !n.is_empty()) {
        return Ok(format!("{}.{extension}", strip_extension(name)?));
    }

    let uuid = uuid::Uuid::new_v4().simple().to_string();

    Ok(match input_source.filter(|s| !s.is_empty()) {
        Some(source) => format!("{}_{action_prefix}_{uuid}.{extension}", extract_basename(source)?),
        None => format!("{action_prefix}_{uuid}.{extension}"),
    })
}

/// Older `{prefix}_{millis}_{random}.{ext}` naming.
pub fn generate_output_filename(extension: &str, prefix: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let random: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{prefix}_{timestamp}_{random}.{extension}")
}

pub fn output_path(output_dir: &Path, filename: &str) -> PathBuf {
    output_dir.join(filename)
}
