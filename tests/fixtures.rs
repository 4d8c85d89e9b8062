use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, ImageFormat, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub fn write_gif(dir: &Path, name: &str, width: u32, height: u32, frames: usize) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite).unwrap();
    let frames = (0..frames).map(|i| {
        let shade = (i * 60 % 256) as u8;
        Frame::from_parts(
            RgbaImage::from_pixel(width, height, Rgba([shade, 90, 200, 255])),
            0,
            0,
            Delay::from_numer_denom_ms(80, 1),
        )
    });
    encoder.encode_frames(frames).unwrap();
    path
}

/// A plain PNG written under `name`, whatever its extension says.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

/// An animated PNG with `frames` frames of 80 ms each.
pub fn write_apng(dir: &Path, name: &str, width: u32, height: u32, frames: u32) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_animated(frames, 0).unwrap();
    encoder.set_frame_delay(8, 100).unwrap();
    let mut writer = encoder.write_header().unwrap();
    for i in 0..frames {
        let shade = (i * 70 % 256) as u8;
        let image = RgbaImage::from_pixel(width, height, Rgba([shade, 40, 220 - shade / 2, 255]));
        writer.write_image_data(image.as_raw()).unwrap();
    }
    writer.finish().unwrap();
    path
}
