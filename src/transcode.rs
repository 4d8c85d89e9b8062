use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, DynamicImage, Frame};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Quantizer speed passed to the GIF encoder (1 = best, 30 = fastest).
const GIF_ENCODE_SPEED: i32 = 10;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Converts an APNG into a GIF that the overlay can play.
pub trait Transcoder {
    /// Writes the converted file and returns its path. `source` is left untouched.
    fn transcode(&self, source: &Path) -> Result<PathBuf, TranscodeError>;
}

/// `<dir>/<stem>_temp.gif` next to `source`.
pub fn transcoded_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}_temp.gif"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApngTranscoder;

impl Transcoder for ApngTranscoder {
    fn transcode(&self, source: &Path) -> Result<PathBuf, TranscodeError> {
        let target = transcoded_path(source);
        let frames = read_png_frames(source)?;
        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            frames = frames.len(),
            "transcoding apng"
        );
        write_gif(&target, frames)?;
        Ok(target)
    }
}

fn read_png_frames(source: &Path) -> Result<Vec<Frame>, TranscodeError> {
    let file = File::open(source).map_err(|e| TranscodeError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let decode_err = |e| TranscodeError::Decode {
        path: source.to_path_buf(),
        source: e,
    };
    let decoder = PngDecoder::new(BufReader::new(file)).map_err(decode_err)?;
    if decoder.is_apng() {
        decoder
            .apng()
            .into_frames()
            .collect_frames()
            .map_err(decode_err)
    } else {
        let image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        Ok(vec![Frame::new(image.to_rgba8())])
    }
}

fn write_gif(target: &Path, frames: Vec<Frame>) -> Result<(), TranscodeError> {
    let file = File::create(target).map_err(|e| TranscodeError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;
    let encode_err = |e| TranscodeError::Encode {
        path: target.to_path_buf(),
        source: e,
    };
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), GIF_ENCODE_SPEED);
    let result = encoder
        .set_repeat(Repeat::Infinite)
        .and_then(|()| encoder.encode_frames(frames));
    drop(encoder);
    if let Err(e) = result {
        // Don't leave a truncated GIF behind for the next run to pick up.
        if let Err(remove) = std::fs::remove_file(target) {
            tracing::warn!(path = %target.display(), error = %remove, "failed to remove partial gif");
        }
        return Err(encode_err(e));
    }
    Ok(())
}
