//! 基于 fontdue 的字形光栅化。
//!
//! 每种字体角色（文字/图标）各加载一个字体；
//! 未配置的角色退回到 [`BlockRasterizer`]。

use fontdue::{Font, FontSettings};
use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use tile_grid::{BlockRasterizer, Color, FontRole, GlyphRequest, RasterError, Rasterizer};
use tracing::{info, warn};

use crate::config::FontConfig;
use crate::error::{HostError, HostResult};

/// 字体光栅化器
pub struct FontRasterizer {
    label: Option<Font>,
    icon: Option<Font>,
    fallback: BlockRasterizer,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("label", &self.label.is_some())
            .field("icon", &self.icon.is_some())
            .finish()
    }
}

impl FontRasterizer {
    pub fn new(label: Option<Font>, icon: Option<Font>) -> Self {
        Self {
            label,
            icon,
            fallback: BlockRasterizer,
        }
    }

    /// 不加载任何字体，全部使用方块
    pub fn blocks() -> Self {
        Self::new(None, None)
    }

    /// 按配置加载字体文件
    pub fn load(config: &FontConfig) -> HostResult<Self> {
        let label = config.label_path.as_deref().map(load_font).transpose()?;
        let icon = config.icon_path.as_deref().map(load_font).transpose()?;

        if label.is_none() {
            warn!("未配置文字字体，使用方块代替");
        }
        if icon.is_none() {
            warn!("未配置图标字体，使用方块代替");
        }
        Ok(Self::new(label, icon))
    }

    /// 该角色是否有真实字体
    pub fn has_font(&self, role: FontRole) -> bool {
        self.font(role).is_some()
    }

    fn font(&self, role: FontRole) -> Option<&Font> {
        match role {
            FontRole::Label => self.label.as_ref(),
            FontRole::Icon => self.icon.as_ref(),
        }
    }
}

fn load_font(path: &Path) -> HostResult<Font> {
    let bytes = fs::read(path).map_err(|e| HostError::io(path, e))?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| HostError::Font {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), glyphs = font.glyph_count(), "字体加载成功");
    Ok(font)
}

impl Rasterizer for FontRasterizer {
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError> {
        let Some(font) = self.font(request.font) else {
            return self.fallback.rasterize(request);
        };
        if request.size == 0 {
            return Err(RasterError::Failed {
                message: "字号为 0".to_string(),
            });
        }

        let mask = rasterize_mask(font, request.text, request.size as f32)?;
        Ok(compose_glyph_mask(&mask, request.fg, request.outline))
    }
}

/// 把整段文本渲染成覆盖率遮罩
fn rasterize_mask(font: &Font, text: &str, px: f32) -> Result<GrayImage, RasterError> {
    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map_or((px, 0.0), |m| (m.ascent, m.descent));
    let baseline = ascent.ceil() as i32;
    let height = (ascent - descent).ceil().max(1.0) as u32;

    let mut glyphs = Vec::new();
    let mut pen = 0.0f32;
    for ch in text.chars() {
        if !ch.is_whitespace() && font.lookup_glyph_index(ch) == 0 {
            return Err(RasterError::MissingGlyph {
                text: ch.to_string(),
            });
        }
        let (metrics, coverage) = font.rasterize(ch, px);
        glyphs.push((pen.round() as i32, metrics, coverage));
        pen += metrics.advance_width;
    }

    let width = pen.ceil().max(1.0) as u32;
    let mut mask = GrayImage::new(width, height);
    for (x0, metrics, coverage) in glyphs {
        let gx = x0 + metrics.xmin;
        let gy = baseline - metrics.ymin - metrics.height as i32;
        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let (x, y) = (gx + col as i32, gy + row as i32);
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    continue;
                }
                let alpha = coverage[row * metrics.width + col];
                let pixel = mask.get_pixel_mut(x as u32, y as u32);
                pixel.0[0] = pixel.0[0].max(alpha);
            }
        }
    }
    Ok(mask)
}

/// 把覆盖率遮罩着色成 RGBA 位图
///
/// 有描边时四周各扩 1px，描边为遮罩的 8 邻域膨胀，前景叠加在描边之上。
pub fn compose_glyph_mask(mask: &GrayImage, fg: Color, outline: Option<Color>) -> RgbaImage {
    let pad = u32::from(outline.is_some());
    let (width, height) = (mask.width() + pad * 2, mask.height() + pad * 2);
    let mut image = RgbaImage::new(width, height);

    let coverage = |x: i64, y: i64| -> u8 {
        let (mx, my) = (x - i64::from(pad), y - i64::from(pad));
        if mx < 0 || my < 0 || mx >= i64::from(mask.width()) || my >= i64::from(mask.height()) {
            return 0;
        }
        let Luma([value]) = *mask.get_pixel(mx as u32, my as u32);
        value
    };

    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (i64::from(x), i64::from(y));
            let pixel = image.get_pixel_mut(x, y);

            if let Some(outline) = outline {
                let spread = (-1..=1)
                    .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                    .map(|(dx, dy)| coverage(xi + dx, yi + dy))
                    .max()
                    .unwrap_or(0);
                if spread > 0 {
                    *pixel = tint(outline, spread);
                }
            }

            let own = coverage(xi, yi);
            if own == 0 {
                continue;
            }
            if pixel.0[3] == 0 {
                *pixel = tint(fg, own);
            } else {
                pixel.blend(&tint(fg, own));
            }
        }
    }
    image
}

fn tint(color: Color, coverage: u8) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let alpha = (u16::from(a) * u16::from(coverage) / 255) as u8;
    Rgba([r, g, b, alpha])
}
