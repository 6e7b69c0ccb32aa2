//! Thumbnail generation for the grid and strip.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::GenericImageView;
use rayon::prelude::*;

/// Decode and resize a batch of images in parallel. Returns
/// `(path, rgba_bytes, width, height)` per image, in input order.
pub fn generate_batch(paths: &[PathBuf], max_size: u32) -> Vec<(PathBuf, Vec<u8>, u32, u32)> {
    paths
        .par_iter()
        .map(|path| {
            let (rgba, width, height) = generate(path, max_size);
            (path.clone(), rgba, width, height)
        })
        .collect()
}

fn generate(path: &Path, max_size: u32) -> (Vec<u8>, u32, u32) {
    match image::open(path) {
        Ok(img) => {
            let thumb = img.resize(max_size, max_size, FilterType::Triangle);
            let (width, height) = thumb.dimensions();
            (thumb.to_rgba8().into_raw(), width, height)
        }
        Err(e) => {
            log::warn!("Failed to load image {}: {}", path.display(), e);
            placeholder(max_size)
        }
    }
}

/// Flat dark square shown for images that fail to decode.
fn placeholder(size: u32) -> (Vec<u8>, u32, u32) {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for _ in 0..size * size {
        rgba.extend_from_slice(&[40, 40, 45, 255]);
    }
    (rgba, size, size)
}
