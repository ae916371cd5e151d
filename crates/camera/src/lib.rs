//! Camera capture via an external ffmpeg process.
//!
//! Each capture spawns ffmpeg against the camera's RTSP source, collects the
//! encoded frames from stdout, and hard-kills the process on timeout.
//! Captures hold the session lock for the whole invocation: the capture
//! pipeline is a single-session resource just like the messaging client.

use std::{process::Stdio, time::Duration};

use {
    async_trait::async_trait,
    portero_common::SessionLock,
    tokio::process::Command,
    tracing::{debug, warn},
};

/// Which camera to capture from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Visits,
    Pedestrian,
    FrontDoor,
}

/// Outcome of a capture. `message` is user-visible Spanish text; `data` is
/// present only when `ok`.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub ok: bool,
    pub data: Option<Vec<u8>>,
    pub message: String,
}

impl CaptureResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Capture: Send + Sync {
    /// Grab a single jpeg frame. 15-second timeout.
    async fn snapshot(&self, kind: CameraKind) -> CaptureResult;

    /// Record an mp4 clip of the requested duration.
    /// Timeout: `max(40s, seconds + 8s)`.
    async fn clip(&self, kind: CameraKind, seconds: u32) -> CaptureResult;
}

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

/// Overall deadline for a clip of the given duration: the requested length
/// plus encoder/teardown slack, never below 40 seconds.
fn clip_timeout(seconds: u32) -> Duration {
    Duration::from_secs((u64::from(seconds) + 8).max(40))
}

/// RTSP sources, one per camera.
#[derive(Debug, Clone)]
pub struct CameraUrls {
    pub visits: String,
    pub pedestrian: String,
    pub front_door: String,
}

impl CameraUrls {
    fn url(&self, kind: CameraKind) -> &str {
        match kind {
            CameraKind::Visits => &self.visits,
            CameraKind::Pedestrian => &self.pedestrian,
            CameraKind::FrontDoor => &self.front_door,
        }
    }
}

/// ffmpeg-backed capture service.
pub struct FfmpegCapture {
    urls: CameraUrls,
    lock: SessionLock,
}

impl FfmpegCapture {
    pub fn new(urls: CameraUrls, lock: SessionLock) -> Self {
        Self { urls, lock }
    }

    async fn run_ffmpeg(&self, args: &[&str], deadline: Duration) -> CaptureResult {
        let _session = self.lock.acquire().await;

        let child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to spawn ffmpeg");
                return CaptureResult::failure(format!("❌ Error ejecutando ffmpeg: {e}"));
            },
        };

        match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() && !output.stdout.is_empty() => {
                debug!(bytes = output.stdout.len(), "capture complete");
                CaptureResult {
                    ok: true,
                    data: Some(output.stdout),
                    message: "OK".into(),
                }
            },
            Ok(Ok(_)) => CaptureResult::failure("❌ No se pudo capturar imagen."),
            Ok(Err(e)) => {
                warn!(error = %e, "ffmpeg wait failed");
                CaptureResult::failure(format!("❌ Error ejecutando ffmpeg: {e}"))
            },
            Err(_) => {
                // kill_on_drop reaps the process; report the timeout.
                warn!(timeout = ?deadline, "capture timed out, killing ffmpeg");
                CaptureResult::failure("⏱️ Tiempo agotado capturando imagen.")
            },
        }
    }
}

#[async_trait]
impl Capture for FfmpegCapture {
    async fn snapshot(&self, kind: CameraKind) -> CaptureResult {
        let url = self.urls.url(kind).to_string();
        let args = snapshot_args(&url);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_ffmpeg(&args, SNAPSHOT_TIMEOUT).await
    }

    async fn clip(&self, kind: CameraKind, seconds: u32) -> CaptureResult {
        let url = self.urls.url(kind).to_string();
        let args = clip_args(&url, seconds);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_ffmpeg(&args, clip_timeout(seconds)).await
    }
}

fn snapshot_args(url: &str) -> Vec<String> {
    [
        "-rtsp_transport", "tcp",
        "-i", url,
        "-frames:v", "1",
        "-q:v", "2",
        "-f", "image2",
        "pipe:1",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn clip_args(url: &str, seconds: u32) -> Vec<String> {
    // Fragmented mp4 so the container can stream to a pipe.
    [
        "-rtsp_transport", "tcp",
        "-i", url,
        "-t", &seconds.to_string(),
        "-c:v", "copy",
        "-an",
        "-movflags", "frag_keyframe+empty_moov",
        "-f", "mp4",
        "pipe:1",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}
