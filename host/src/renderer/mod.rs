//! # Renderer 模块
//!
//! 面板合成与输出：把 Grid 的位图贴到固定尺寸的面板画布上。
//!
//! - [`Panel`]：面板画布，按贴靠角放置网格
//! - [`FontRasterizer`]：基于 fontdue 的文字/图标光栅化
//! - [`FrameSink`]：把面板写成 PNG 帧

mod font;
mod frame_sink;

pub use font::{FontRasterizer, compose_glyph_mask};
pub use frame_sink::FrameSink;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tile_grid::{Color, Size, surface};

use crate::config::PanelConfig;

/// 网格在面板上贴靠的角
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    /// 内容左上角在面板上的坐标
    ///
    /// 偏移量总是从贴靠角向面板内部计算；内容超出面板时坐标可能为负。
    pub fn origin(self, panel: Size, content: Size, offset_x: u32, offset_y: u32) -> (i64, i64) {
        let left = i64::from(offset_x);
        let top = i64::from(offset_y);
        let right = i64::from(panel.width) - i64::from(content.width) - left;
        let bottom = i64::from(panel.height) - i64::from(content.height) - top;

        match self {
            Anchor::TopLeft => (left, top),
            Anchor::TopRight => (right, top),
            Anchor::BottomLeft => (left, bottom),
            Anchor::BottomRight => (right, bottom),
        }
    }
}

/// 面板画布
#[derive(Debug)]
pub struct Panel {
    canvas: RgbaImage,
    background: Color,
    anchor: Anchor,
    offset_x: u32,
    offset_y: u32,
    /// 已合成的帧数
    presented: u64,
}

impl Panel {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            canvas: surface::filled(config.width, config.height, config.background),
            background: config.background,
            anchor: config.anchor,
            offset_x: config.offset_x,
            offset_y: config.offset_y,
            presented: 0,
        }
    }

    /// 清空背景并贴上网格位图
    ///
    /// # 返回
    /// 位图左上角在面板上的坐标
    pub fn present(&mut self, bitmap: &RgbaImage) -> (i64, i64) {
        let content = Size::new(bitmap.width(), bitmap.height());
        let origin = self
            .anchor
            .origin(self.size(), content, self.offset_x, self.offset_y);

        self.canvas = surface::filled(self.canvas.width(), self.canvas.height(), self.background);
        if !content.is_empty() {
            surface::overlay(&mut self.canvas, bitmap, origin.0, origin.1);
        }
        self.presented += 1;
        origin
    }

    /// 当前画布
    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// 面板尺寸
    pub fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }

    /// 已合成的帧数
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_origins() {
        let panel = Size::new(100, 50);
        let content = Size::new(20, 10);
        assert_eq!(Anchor::TopLeft.origin(panel, content, 2, 3), (2, 3));
        assert_eq!(Anchor::TopRight.origin(panel, content, 2, 3), (78, 3));
        assert_eq!(Anchor::BottomLeft.origin(panel, content, 2, 3), (2, 37));
        assert_eq!(Anchor::BottomRight.origin(panel, content, 0, 0), (80, 40));
    }

    #[test]
    fn test_oversized_content_goes_negative() {
        let origin = Anchor::BottomRight.origin(Size::new(10, 10), Size::new(12, 4), 0, 0);
        assert_eq!(origin, (-2, 6));
    }

    #[test]
    fn test_present_clears_previous_frame() {
        let config = PanelConfig {
            width: 8,
            height: 4,
            background: Color::BLACK,
            anchor: Anchor::TopLeft,
            ..PanelConfig::default()
        };
        let mut panel = Panel::new(&config);

        let red = surface::filled(3, 2, Color::rgb(255, 0, 0));
        assert_eq!(panel.present(&red), (0, 0));
        assert_eq!(panel.image().get_pixel(2, 1).0, [255, 0, 0, 255]);

        // 网格收缩后旧像素不能残留
        let small = surface::filled(1, 1, Color::rgb(255, 0, 0));
        panel.present(&small);
        assert_eq!(panel.image().get_pixel(2, 1).0, Color::BLACK.0);
        assert_eq!(panel.presented(), 2);
    }

    #[test]
    fn test_present_empty_bitmap() {
        let mut panel = Panel::new(&PanelConfig::default());
        panel.present(&RgbaImage::new(0, 0));
        assert_eq!(panel.size(), Size::new(128, 64));
        assert_eq!(panel.image().get_pixel(127, 0).0, Color::BLACK.0);
    }
}
