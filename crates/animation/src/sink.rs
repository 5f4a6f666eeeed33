//! Frame encoders.
//!
//! A sink receives frames in order and finalises the output on
//! [`FrameSink::finish`]. The output format is chosen from the path:
//!
//! | Path | Sink |
//! |------|------|
//! | `*.gif` | [`GifSink`], `image`'s GIF encoder |
//! | `*.mp4`, `*.mkv`, `*.mov`, `*.avi`, `*.webm` | [`FfmpegSink`], raw RGBA piped to ffmpeg |
//! | `*.png` or a directory | [`PngSequenceSink`], numbered PNG files |

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use tracing::{debug, info};

use crate::error::{AnimationError, AnimationResult};

/// GIF palette quantisation speed, 1 (best) to 30 (fastest).
const GIF_SPEED: i32 = 10;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm"];

/// Output container, picked by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Gif,
    Video,
    PngSequence,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> AnimationResult<Self> {
        if path.is_dir() {
            return Ok(OutputFormat::PngSequence);
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("gif") => Ok(OutputFormat::Gif),
            Some("png") | None => Ok(OutputFormat::PngSequence),
            Some(e) if VIDEO_EXTENSIONS.contains(&e) => Ok(OutputFormat::Video),
            Some(e) => Err(AnimationError::UnsupportedFormat(format!(
                ".{} (use .gif, .png, a directory or one of {})",
                e,
                VIDEO_EXTENSIONS.join("/")
            ))),
        }
    }
}

/// Receives rendered frames in order.
pub trait FrameSink {
    fn push(&mut self, frame: &RgbaImage) -> AnimationResult<()>;

    /// Flush and close the output. Further pushes are an error.
    fn finish(&mut self) -> AnimationResult<()>;

    /// Frames pushed so far.
    fn frames_written(&self) -> usize;
}

// =============================================================================
// GIF
// =============================================================================

/// First write error seen by a [`GifFile`].
type WriteStatus = Arc<Mutex<Option<String>>>;

/// Buffered GIF output that remembers its first failed write.
///
/// The GIF trailer is written, and the buffer flushed, while the encoder
/// drops, where errors cannot be returned.
struct GifFile {
    writer: BufWriter<File>,
    status: WriteStatus,
}

impl GifFile {
    fn record<T>(&self, result: io::Result<T>) -> io::Result<T> {
        if let Err(e) = &result {
            if let Ok(mut status) = self.status.lock() {
                status.get_or_insert_with(|| e.to_string());
            }
        }
        result
    }
}

impl Write for GifFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.writer.write(buf);
        self.record(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.writer.flush();
        self.record(result)
    }
}

impl Drop for GifFile {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Animated GIF that loops forever.
pub struct GifSink {
    encoder: Option<GifEncoder<GifFile>>,
    status: WriteStatus,
    delay: Delay,
    written: usize,
}

impl GifSink {
    pub fn create(path: &Path, fps: f32) -> AnimationResult<Self> {
        let status = WriteStatus::default();
        let file = GifFile {
            writer: BufWriter::new(File::create(path)?),
            status: status.clone(),
        };
        let mut encoder = GifEncoder::new_with_speed(file, GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| AnimationError::Encoder(format!("GIF: {}", e)))?;
        let delay_ms = (1000.0 / fps).round().max(10.0) as u32;
        debug!(path = %path.display(), delay_ms, "Created GIF encoder");
        Ok(Self {
            encoder: Some(encoder),
            status,
            delay: Delay::from_numer_denom_ms(delay_ms, 1),
            written: 0,
        })
    }
}

impl FrameSink for GifSink {
    fn push(&mut self, frame: &RgbaImage) -> AnimationResult<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| AnimationError::Encoder("GIF already finished".to_string()))?;
        encoder
            .encode_frame(Frame::from_parts(frame.clone(), 0, 0, self.delay))
            .map_err(|e| AnimationError::Encoder(format!("GIF frame {}: {}", self.written, e)))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> AnimationResult<()> {
        // Writes the trailer and flushes
        drop(self.encoder.take());
        let failed = self.status.lock().ok().and_then(|mut status| status.take());
        match failed {
            Some(e) => Err(AnimationError::Encoder(format!("GIF write failed: {}", e))),
            None => Ok(()),
        }
    }

    fn frames_written(&self) -> usize {
        self.written
    }
}

// =============================================================================
// PNG sequence
// =============================================================================

/// One PNG per frame: `dir/frame_0000.png`, or `dir/stem_0000.png` when
/// given a `stem.png` path.
pub struct PngSequenceSink {
    dir: PathBuf,
    stem: String,
    written: usize,
}

impl PngSequenceSink {
    pub fn create(path: &Path) -> AnimationResult<Self> {
        let is_file = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        let (dir, stem) = if is_file {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("frame")
                .to_string();
            (dir, stem)
        } else {
            (path.to_path_buf(), "frame".to_string())
        };
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            stem,
            written: 0,
        })
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:04}.png", self.stem, index))
    }
}

impl FrameSink for PngSequenceSink {
    fn push(&mut self, frame: &RgbaImage) -> AnimationResult<()> {
        renderer::write_png(&self.frame_path(self.written), frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> AnimationResult<()> {
        info!(dir = %self.dir.display(), frames = self.written, "Wrote PNG sequence");
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.written
    }
}

// =============================================================================
// ffmpeg
// =============================================================================

/// Video through an `ffmpeg` child process reading raw RGBA from stdin.
pub struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_len: usize,
    written: usize,
}

impl FfmpegSink {
    pub fn spawn(
        ffmpeg: &Path,
        path: &Path,
        size: (u32, u32),
        fps: f32,
        bitrate_kbps: Option<u32>,
    ) -> AnimationResult<Self> {
        let args = ffmpeg_args(path, size, fps, bitrate_kbps);
        debug!(ffmpeg = %ffmpeg.display(), args = ?args, "Starting ffmpeg");

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnimationError::Encoder(format!("Failed to run {}: {}", ffmpeg.display(), e)))?;
        let stdin = child.stdin.take();

        Ok(Self {
            child: Some(child),
            stdin,
            frame_len: size.0 as usize * size.1 as usize * 4,
            written: 0,
        })
    }

    /// Wait for ffmpeg and turn a failed exit into an error carrying its stderr.
    fn wait(&mut self) -> AnimationResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(AnimationError::Encoder(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn push(&mut self, frame: &RgbaImage) -> AnimationResult<()> {
        if frame.as_raw().len() != self.frame_len {
            return Err(AnimationError::Encoder(format!(
                "frame {} is {}x{}, the video was started with a different size",
                self.written,
                frame.width(),
                frame.height()
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| AnimationError::Encoder("ffmpeg already finished".to_string()))?;
        if let Err(e) = stdin.write_all(frame.as_raw()) {
            // A broken pipe means ffmpeg quit; its stderr says why
            self.wait()?;
            return Err(AnimationError::Encoder(format!("ffmpeg stopped reading frames: {}", e)));
        }
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> AnimationResult<()> {
        self.wait()
    }

    fn frames_written(&self) -> usize {
        self.written
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Command line for encoding raw RGBA frames from stdin into `path`.
pub fn ffmpeg_args(path: &Path, size: (u32, u32), fps: f32, bitrate_kbps: Option<u32>) -> Vec<String> {
    let webm = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("webm"))
        .unwrap_or(false);

    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", size.0, size.1));
    args.push("-framerate".to_string());
    args.push(format!("{}", fps));
    args.extend(["-i", "-"].iter().map(|s| s.to_string()));

    // yuv420p needs even dimensions
    args.push("-vf".to_string());
    args.push("pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string());
    args.push("-c:v".to_string());
    args.push(if webm { "libvpx-vp9" } else { "libx264" }.to_string());
    args.push("-pix_fmt".to_string());
    args.push("yuv420p".to_string());
    if let Some(kbps) = bitrate_kbps {
        args.push("-b:v".to_string());
        args.push(format!("{}k", kbps));
    }
    args.push(path.display().to_string());
    args
}

/// Open the sink for `path`.
pub fn open_sink(
    path: &Path,
    size: (u32, u32),
    fps: f32,
    bitrate_kbps: Option<u32>,
    ffmpeg: &Path,
) -> AnimationResult<Box<dyn FrameSink>> {
    let sink: Box<dyn FrameSink> = match OutputFormat::from_path(path)? {
        OutputFormat::Gif => Box::new(GifSink::create(path, fps)?),
        OutputFormat::PngSequence => Box::new(PngSequenceSink::create(path)?),
        OutputFormat::Video => Box::new(FfmpegSink::spawn(ffmpeg, path, size, fps, bitrate_kbps)?),
    };
    Ok(sink)
}
