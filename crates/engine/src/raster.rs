use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;

/// One pixel of an authored map image, as an exact RGB triple.
pub type Rgb = [u8; 3];

/// A decoded raster image. Map decoding reads one pixel per tile from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbRaster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to open image '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl RgbRaster {
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

pub fn load_rgb_raster(path: &Path) -> Result<RgbRaster, RasterError> {
    let reader = ImageReader::open(path).map_err(|source| RasterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| RasterError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgb8();
    let width = image.width();
    let height = image.height();
    let pixels = image
        .pixels()
        .map(|pixel| [pixel.0[0], pixel.0[1], pixel.0[2]])
        .collect();

    Ok(RgbRaster {
        width,
        height,
        pixels,
    })
}
