//! 位图合成辅助函数（基于 `image::imageops`）。

use image::imageops;
use image::{GenericImageView, RgbaImage, SubImage};

use crate::color::Color;

/// 纯色填充的位图
pub fn filled(width: u32, height: u32, color: Color) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color.to_rgba())
}

/// 原样拷贝像素（不混合），超出目标范围的部分被裁掉
pub fn blit<I>(dst: &mut RgbaImage, src: &I, x: i64, y: i64)
where
    I: GenericImageView<Pixel = image::Rgba<u8>>,
{
    imageops::replace(dst, src, x, y);
}

/// 按 alpha 混合叠加
pub fn overlay<I>(dst: &mut RgbaImage, src: &I, x: i64, y: i64)
where
    I: GenericImageView<Pixel = image::Rgba<u8>>,
{
    imageops::overlay(dst, src, x, y);
}

/// 顶部对齐裁剪：保留上方 `height` 行
pub fn crop_top(src: &RgbaImage, height: u32) -> SubImage<&RgbaImage> {
    imageops::crop_imm(src, 0, 0, src.width(), height.min(src.height()))
}

/// 左对齐裁剪：保留左侧 `width` 列
pub fn crop_left(src: &RgbaImage, width: u32) -> SubImage<&RgbaImage> {
    imageops::crop_imm(src, 0, 0, width.min(src.width()), src.height())
}

/// 画一条竖线
pub fn vline(dst: &mut RgbaImage, x: u32, color: Color) {
    if x >= dst.width() {
        return;
    }
    for y in 0..dst.height() {
        dst.put_pixel(x, y, color.to_rgba());
    }
}

/// 居中偏移（内容大于容器时为负）
pub fn centered(container: u32, content: u32) -> i64 {
    (i64::from(container) - i64::from(content)) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_top_keeps_upper_rows() {
        let mut src = filled(4, 4, Color::BLACK);
        src.put_pixel(0, 3, Color::WHITE.to_rgba());
        let cropped = crop_top(&src, 2).to_image();
        assert_eq!(cropped.dimensions(), (4, 2));
        assert!(cropped.pixels().all(|p| p.0 == Color::BLACK.0));

        assert_eq!(crop_top(&src, 10).dimensions(), (4, 4));
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = filled(3, 3, Color::TRANSPARENT);
        blit(&mut dst, &filled(5, 5, Color::WHITE), 1, 1);
        assert_eq!(dst.get_pixel(0, 0).0[3], 0);
        assert_eq!(dst.get_pixel(2, 2).0, Color::WHITE.0);
    }

    #[test]
    fn test_centered() {
        assert_eq!(centered(10, 4), 3);
        assert_eq!(centered(4, 10), -3);
    }
}
