//! Batch audio file transcription.
//!
//! One-shot path, separate from the live pipeline: optionally preprocess
//! the file with ffmpeg (noise filtering + loudness normalization), upload
//! it inline to the transcription model, and save the transcript next to
//! the input.

use crate::defaults;
use crate::error::{ParleyError, Result};
use crate::gemini::GeminiClient;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::warn;

/// Supported input extensions (lowercase, without the dot).
const SUPPORTED_FORMATS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "webm"];

/// Accuracy-focused multilingual transcription prompt.
const TRANSCRIBE_PROMPT: &str = "\
You are a professional transcriber. Transcribe the audio with maximum accuracy.

Instructions:
- Detect and transcribe all languages spoken (English, Korean, French).
- Use native scripts: Korean in Hangul (proper 띄어쓰기), French with diacritics (é, è, ç).
- Handle non-native accents - infer intended words from context.
- Spell technical/academic terms correctly.
- If a word is genuinely unclear, mark [unclear].
- Remove excessive filler words (um, uh, 어, 음).
- Separate speakers if distinguishable.

Output the transcript in clean, readable Markdown.";

/// MIME type for a supported audio file, by extension.
pub fn mime_type(path: &Path) -> Result<&'static str> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" => Ok("audio/mp3"),
        "wav" => Ok("audio/wav"),
        "m4a" => Ok("audio/mp4"),
        "flac" => Ok("audio/flac"),
        "ogg" => Ok("audio/ogg"),
        "webm" => Ok("audio/webm"),
        other => Err(ParleyError::UnsupportedFormat {
            extension: format!(".{}", other),
        }),
    }
}

/// True if the file extension is in the supported set.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_FORMATS.contains(&ext.as_str()))
}

/// Check whether ffmpeg is available on PATH.
async fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Preprocess audio with ffmpeg: band-pass for the voice range, loudness
/// normalization, resample to 16kHz mono.
///
/// Returns the path of a temporary WAV, or the input path unchanged when
/// ffmpeg is missing or fails (preprocessing is best-effort).
pub async fn preprocess_audio(input: &Path) -> Result<PathBuf> {
    if !ffmpeg_available().await {
        warn!("ffmpeg not found, skipping preprocessing");
        return Ok(input.to_path_buf());
    }

    eprintln!("Preprocessing audio (noise reduction & normalization)...");

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    let output = std::env::temp_dir().join(format!(
        "processed_{}_{}.wav",
        stem,
        Local::now().timestamp()
    ));

    let status = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .args([
            "-af",
            "highpass=f=200,lowpass=f=3000,loudnorm",
            "-ar",
            "16000",
            "-ac",
            "1",
        ])
        .arg(&output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(output)
    } else {
        warn!("ffmpeg preprocessing failed, falling back to original file");
        Ok(input.to_path_buf())
    }
}

/// Header written above the saved transcript.
fn transcript_header(input_name: &str, preprocessed: bool) -> String {
    let mut header = format!(
        "# Transcription: {}\n# Date: {}\n",
        input_name,
        Local::now().format("%Y-%m-%d %H:%M")
    );
    if preprocessed {
        header.push_str("# Note: Processed with noise reduction\n");
    }
    header.push_str(&"-".repeat(40));
    header.push_str("\n\n");
    header
}

/// Transcribe an audio file and save the transcript.
///
/// The output path defaults to the input with a `.txt` extension. Returns
/// the transcript text.
pub async fn transcribe_file(
    client: &GeminiClient,
    input: &Path,
    output: Option<&Path>,
    skip_preprocess: bool,
) -> Result<String> {
    if !input.exists() {
        return Err(ParleyError::Other(format!(
            "File not found: {}",
            input.display()
        )));
    }
    if !is_supported(input) {
        return Err(ParleyError::UnsupportedFormat {
            extension: input
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string()),
        });
    }

    let size_mb = input.metadata()?.len() as f64 / (1024.0 * 1024.0);
    eprintln!("Transcribing: {}", input.display());
    eprintln!("File size: {:.1} MB", size_mb);

    let processed = if skip_preprocess {
        input.to_path_buf()
    } else {
        preprocess_audio(input).await?
    };
    let preprocessed = processed != input;

    // The preprocessed file is always WAV; otherwise use the input's type
    let mime = if preprocessed {
        "audio/wav"
    } else {
        mime_type(input)?
    };

    let audio = tokio::fs::read(&processed).await?;

    eprintln!("Generating transcript...");
    let transcript = client
        .generate_with_audio(defaults::TRANSCRIBE_MODEL, TRANSCRIBE_PROMPT, mime, &audio)
        .await
        .map_err(|e| ParleyError::Transcription {
            message: e.to_string(),
        })?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("txt"));

    let input_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let contents = format!(
        "{}{}",
        transcript_header(&input_name, preprocessed),
        transcript
    );
    tokio::fs::write(&output_path, contents).await?;

    println!("{}", transcript);
    eprintln!("{}", "-".repeat(40));
    eprintln!("Saved: {}", output_path.display());

    // Clean up the temporary preprocessed file
    if preprocessed {
        let _ = tokio::fs::remove_file(&processed).await;
    }

    Ok(transcript)
}
