//! # Color 模块
//!
//! RGBA 颜色与格子配色。颜色在布局清单中以 `#rrggbb` / `#rrggbbaa` 书写。

use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);

    /// 不透明颜色
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// 带透明度的颜色
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// 透明度
    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    /// 是否完全透明
    pub fn is_transparent(&self) -> bool {
        self.alpha() == 0
    }

    /// 转换为 image 像素
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.0)
    }

    /// 解析 `#rrggbb` 或 `#rrggbbaa`（`#` 可省略）
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        color.to_rgba()
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::parse_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("无效的颜色: {text:?}")))
    }
}

/// 格子配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CellColors {
    /// 格子背景
    pub cell_bg: Color,
    /// 图标底色
    pub icon_bg: Color,
    /// 图标前景
    pub icon_fg: Color,
    /// 文字颜色
    pub label_fg: Color,
    /// 文字描边（透明表示不描边）
    pub label_outline: Color,
}

impl CellColors {
    /// 描边颜色（透明时为 `None`）
    pub fn outline(&self) -> Option<Color> {
        (!self.label_outline.is_transparent()).then_some(self.label_outline)
    }
}

impl Default for CellColors {
    fn default() -> Self {
        Self {
            cell_bg: Color::rgb(0x10, 0x10, 0x18),
            icon_bg: Color::rgb(0x20, 0x40, 0x60),
            icon_fg: Color::WHITE,
            label_fg: Color::rgb(0xe0, 0xe0, 0xe0),
            label_outline: Color::TRANSPARENT,
        }
    }
}
