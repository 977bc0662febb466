/// Image decoding through the `image` crate, and mipmapped sampling
use log::debug;
use orrery_core::{ImageLoader, ResourceLoadError, TextureImage};
use std::path::Path;

/// Loads PNG, JPEG, BMP and TGA files as bottom-up RGBA8
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateLoader;

impl ImageLoader for ImageCrateLoader {
    fn load_rgba(&self, path: &Path) -> Result<TextureImage, ResourceLoadError> {
        let decoded = image::open(path).map_err(|e| ResourceLoadError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Image rows are stored top-down; texture row 0 is the bottom
        let rgba = decoded.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        TextureImage::new(width, height, rgba.into_raw())
    }
}

#[derive(Debug, Clone)]
struct MipLevel {
    width: usize,
    height: usize,
    texels: Vec<[u8; 4]>,
}

impl MipLevel {
    fn texel(&self, x: i64, y: i64) -> [u8; 4] {
        // Repeat wrapping
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.texels[y * self.width + x]
    }

    /// Half-size level, each texel the average of a 2x2 block
    fn downsample(&self) -> MipLevel {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut texels = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let mut sum = [0u32; 4];
                for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let sx = (x * 2 + dx).min(self.width - 1);
                    let sy = (y * 2 + dy).min(self.height - 1);
                    let texel = self.texels[sy * self.width + sx];
                    for (total, channel) in sum.iter_mut().zip(texel) {
                        *total += channel as u32;
                    }
                }
                texels.push(sum.map(|total| ((total + 2) / 4) as u8));
            }
        }

        MipLevel { width, height, texels }
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let (u, v) = (wrap_coordinate(u), wrap_coordinate(v));
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let corners = [
            (self.texel(x0, y0), (1.0 - fx) * (1.0 - fy)),
            (self.texel(x0 + 1, y0), fx * (1.0 - fy)),
            (self.texel(x0, y0 + 1), (1.0 - fx) * fy),
            (self.texel(x0 + 1, y0 + 1), fx * fy),
        ];

        let mut out = [0.0; 4];
        for (texel, weight) in corners {
            for (channel, value) in out.iter_mut().zip(texel) {
                *channel += value as f32 * weight;
            }
        }
        out
    }
}

/// Reduce a texture coordinate to [0, 1) so it stays small when scaled to
/// texels; non-finite coordinates sample at 0
fn wrap_coordinate(t: f32) -> f32 {
    if t.is_finite() {
        t.rem_euclid(1.0)
    } else {
        0.0
    }
}

/// A texture with its full mip chain down to 1x1
#[derive(Debug, Clone)]
pub struct MipChain {
    levels: Vec<MipLevel>,
}

impl MipChain {
    pub fn from_image(image: &TextureImage) -> Self {
        let base = MipLevel {
            width: image.width() as usize,
            height: image.height() as usize,
            texels: image
                .pixels()
                .chunks_exact(4)
                .map(|p| [p[0], p[1], p[2], p[3]])
                .collect(),
        };

        let mut levels = vec![base];
        while let Some(last) = levels.last().filter(|l| l.width > 1 || l.height > 1) {
            let next = last.downsample();
            levels.push(next);
        }
        debug!(
            "Built {} mip levels for {}x{} texture",
            levels.len(),
            image.width(),
            image.height()
        );

        Self { levels }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Size of the base level
    pub fn size(&self) -> (usize, usize) {
        (self.levels[0].width, self.levels[0].height)
    }

    /// Trilinear sample: bilinear within the two levels around `lod`,
    /// blended by its fractional part
    pub fn sample(&self, u: f32, v: f32, lod: f32) -> [u8; 4] {
        let max_level = (self.levels.len() - 1) as f32;
        let lod = lod.clamp(0.0, max_level);
        let lower = lod.floor() as usize;
        let blend = lod - lower as f32;

        let mut color = self.levels[lower].sample_bilinear(u, v);
        if blend > 0.0 {
            let upper = self.levels[lower + 1].sample_bilinear(u, v);
            for (c, high) in color.iter_mut().zip(upper) {
                *c += (high - *c) * blend;
            }
        }
        color.map(|c| c.round().clamp(0.0, 255.0) as u8)
    }
}
