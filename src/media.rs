use crate::asset::Size;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Delay used for frames that declare none.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("{path} contains no frames")]
    Empty { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct MediaFrame {
    pub image: RgbaImage,
    pub delay: Duration,
}

/// Decoded pixels of one asset. A single frame means a still image.
#[derive(Debug, Clone)]
pub struct Media {
    frames: Vec<MediaFrame>,
}

impl Media {
    pub fn still(image: RgbaImage) -> Self {
        Self {
            frames: vec![MediaFrame {
                image,
                delay: Duration::ZERO,
            }],
        }
    }

    pub fn animated(frames: Vec<MediaFrame>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self { frames })
        }
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn frames(&self) -> &[MediaFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> &RgbaImage {
        &self.frames[index.min(self.frames.len() - 1)].image
    }

    /// Dimensions of the first frame.
    pub fn native_size(&self) -> Size {
        let (w, h) = self.frames[0].image.dimensions();
        Size::new(w, h)
    }

    pub fn animation(&self) -> Animation {
        Animation::new(self.frames.iter().map(|f| f.delay).collect())
    }
}

/// Looping playback clock over a list of frame delays.
#[derive(Debug, Clone)]
pub struct Animation {
    delays: Vec<Duration>,
    current: usize,
    elapsed: Duration,
}

impl Animation {
    pub fn new(delays: Vec<Duration>) -> Self {
        let delays = delays
            .into_iter()
            .map(|d| if d.is_zero() { DEFAULT_FRAME_DELAY } else { d })
            .collect();
        Self {
            delays,
            current: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    /// Move the clock forward. Returns `true` when the visible frame changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.delays.len() < 2 {
            return false;
        }
        let before = self.current;
        self.elapsed += dt;
        // Skip whole loops so a long stall doesn't spin through every frame.
        let total: Duration = self.delays.iter().sum();
        if self.elapsed >= total {
            let loops = self.elapsed.as_nanos() / total.as_nanos();
            self.elapsed -= total * loops as u32;
        }
        while self.elapsed >= self.delays[self.current] {
            self.elapsed -= self.delays[self.current];
            self.current = (self.current + 1) % self.delays.len();
        }
        before != self.current
    }

    /// Time until the next frame change, `None` for still images.
    pub fn time_to_next_frame(&self) -> Option<Duration> {
        if self.delays.len() < 2 {
            return None;
        }
        Some(self.delays[self.current].saturating_sub(self.elapsed))
    }
}

/// Source of decoded media for an asset path.
pub trait MediaLoader {
    fn load(&self, path: &Path) -> Result<Media, MediaError>;
}

/// Decodes GIFs frame by frame and everything else as a still image.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageMediaLoader;

impl MediaLoader for ImageMediaLoader {
    fn load(&self, path: &Path) -> Result<Media, MediaError> {
        if has_extension(path, "gif") {
            load_gif(path)
        } else {
            let image = image::open(path).map_err(|source| MediaError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Media::still(image.to_rgba8()))
        }
    }
}

fn load_gif(path: &Path) -> Result<Media, MediaError> {
    let file = File::open(path).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decode_err = |source| MediaError::Decode {
        path: path.to_path_buf(),
        source,
    };
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(decode_err)?;
    let frames = decoder.into_frames().collect_frames().map_err(decode_err)?;
    let frames: Vec<MediaFrame> = frames
        .into_iter()
        .map(|frame| MediaFrame {
            delay: Duration::from(frame.delay()),
            image: frame.into_buffer(),
        })
        .collect();
    tracing::debug!(path = %path.display(), frames = frames.len(), "gif decoded");
    Media::animated(frames).ok_or_else(|| MediaError::Empty {
        path: path.to_path_buf(),
    })
}

pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Largest size with the aspect ratio of `size` that fits inside `bounds`.
pub fn fit_within(size: Size, bounds: Size) -> Size {
    if size.width == 0 || size.height == 0 {
        return Size::new(0, 0);
    }
    let scale = f64::min(
        bounds.width as f64 / size.width as f64,
        bounds.height as f64 / size.height as f64,
    );
    Size::new(
        ((size.width as f64 * scale).round() as u32).clamp(1, bounds.width.max(1)),
        ((size.height as f64 * scale).round() as u32).clamp(1, bounds.height.max(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn animation_wraps_around() {
        let mut anim = Animation::new(vec![ms(50), ms(50), ms(100)]);
        assert!(!anim.advance(ms(20)));
        assert!(anim.advance(ms(40)));
        assert_eq!(anim.current_frame(), 1);
        assert!(anim.advance(ms(50)));
        assert_eq!(anim.current_frame(), 2);
        assert!(anim.advance(ms(100)));
        assert_eq!(anim.current_frame(), 0);
    }

    #[test]
    fn long_stall_lands_on_the_right_frame() {
        let mut anim = Animation::new(vec![ms(10), ms(10)]);
        anim.advance(ms(10_005));
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(anim.time_to_next_frame(), Some(ms(5)));
    }

    #[test]
    fn zero_delay_frames_use_default() {
        let mut anim = Animation::new(vec![Duration::ZERO, Duration::ZERO]);
        assert_eq!(anim.time_to_next_frame(), Some(DEFAULT_FRAME_DELAY));
        assert!(anim.advance(DEFAULT_FRAME_DELAY));
    }

    #[test]
    fn still_image_never_ticks() {
        let media = Media::still(RgbaImage::new(4, 3));
        let mut anim = media.animation();
        assert!(!anim.advance(ms(1000)));
        assert_eq!(anim.time_to_next_frame(), None);
        assert_eq!(media.native_size(), Size::new(4, 3));
    }

    #[test]
    fn fit_preserves_aspect() {
        let bounds = Size::new(200, 200);
        assert_eq!(fit_within(Size::new(400, 100), bounds), Size::new(200, 50));
        assert_eq!(fit_within(Size::new(50, 100), bounds), Size::new(100, 200));
        assert_eq!(fit_within(Size::new(200, 200), bounds), bounds);
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(has_extension(Path::new("a/B.APNG"), "apng"));
        assert!(!has_extension(Path::new("a/b.png"), "apng"));
        assert!(!has_extension(Path::new("apng"), "apng"));
    }
}
