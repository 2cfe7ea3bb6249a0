//! # Raster 模块
//!
//! 字形光栅化接口。
//!
//! 引擎不负责字体渲染，只通过 [`Rasterizer`] 请求
//! `(文本或码位, 字体, 字号, 前景色, 描边色) -> 位图`，并把它视为纯函数：
//! 相同的请求必须得到相同的位图，结果按格子缓存规则复用。

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::Color;
use crate::error::RasterError;

/// 字体角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontRole {
    /// 文字标签字体
    Label,
    /// 图标字体
    Icon,
}

impl fmt::Display for FontRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontRole::Label => write!(f, "label"),
            FontRole::Icon => write!(f, "icon"),
        }
    }
}

/// 光栅化请求
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRequest<'a> {
    /// 文本（图标为单个码位）
    pub text: &'a str,
    /// 字体
    pub font: FontRole,
    /// 字号（像素）
    pub size: u32,
    /// 前景色
    pub fg: Color,
    /// 描边色
    pub outline: Option<Color>,
}

/// 字形光栅化器
pub trait Rasterizer {
    /// 渲染文本，返回紧贴内容的透明底位图
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError> {
        (**self).rasterize(request)
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError> {
        (**self).rasterize(request)
    }
}

/// 方块光栅化器
///
/// 每个字符画成一个实心方块，空白字符只占位。
/// 用于没有配置字体文件的无头运行，以及测试。
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRasterizer;

impl BlockRasterizer {
    /// 单个字符的宽度（含 1px 间隔）
    pub fn advance(size: u32) -> u32 {
        (size / 2).max(1) + 1
    }
}

impl Rasterizer for BlockRasterizer {
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError> {
        if request.size == 0 {
            return Err(RasterError::Failed {
                message: "字号为 0".to_string(),
            });
        }

        let pad = u32::from(request.outline.is_some());
        let (cell_w, glyph_w) = match request.font {
            FontRole::Icon => (request.size, request.size),
            FontRole::Label => (Self::advance(request.size), Self::advance(request.size) - 1),
        };
        let count = request.text.chars().count() as u32;
        let width = count * cell_w + pad * 2;
        let height = request.size + pad * 2;

        let mut image = RgbaImage::new(width, height);
        for (i, ch) in request.text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x0 = i as u32 * cell_w;
            if let Some(outline) = request.outline {
                fill_rect(&mut image, x0, 0, glyph_w + 2, request.size + 2, outline);
            }
            fill_rect(&mut image, x0 + pad, pad, glyph_w, request.size, request.fg);
        }
        Ok(image)
    }
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Color) {
    let x_end = (x + w).min(image.width());
    let y_end = (y + h).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color.to_rgba());
        }
    }
}
