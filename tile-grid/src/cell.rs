//! # Cell 模块
//!
//! 单个格子：根据外部状态决定是否打开，用补间值控制可见高度，
//! 渲染 "图标 + 文字" 位图并按监听的键缓存。

use image::{RgbaImage, SubImage};
use tracing::trace;

use crate::animator::{Animator, AnimatorState};
use crate::cache::{Fingerprint, TileCache};
use crate::error::{GridError, GridResult, RasterError};
use crate::raster::{FontRole, GlyphRequest, Rasterizer};
use crate::surface;
use crate::tile::TileKind;
use crate::value::StateMap;

/// 文字左侧留白
const LABEL_PADDING: i64 = 2;

/// 格子几何与动画参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStyle {
    /// 宽度（固定）
    pub width: u32,
    /// 完全展开时的高度
    pub height: u32,
    /// 每帧高度变化量
    pub speed: f32,
    /// 文字字号
    pub label_size: u32,
    /// 图标字号
    pub icon_size: u32,
    /// 图标码位
    pub icon: Option<char>,
    /// 初始是否展开
    pub start_open: bool,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            width: 64,
            height: 12,
            speed: 1.0,
            label_size: 8,
            icon_size: 10,
            icon: None,
            start_open: false,
        }
    }
}

/// 单次更新的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePass<'a> {
    /// 刚刚变化的键；`None` 表示全量检查
    pub changed_key: Option<&'a str>,
    /// 是否在本次更新中推进动画（Grid 总是传 `false`，之后统一推进）
    pub animate: bool,
    /// 强制重新渲染所有格子
    pub force: bool,
}

impl<'a> UpdatePass<'a> {
    /// 全量检查
    pub fn full() -> Self {
        Self {
            changed_key: None,
            animate: true,
            force: false,
        }
    }

    /// 由单个键的变化触发
    pub fn event(changed_key: &'a str) -> Self {
        Self {
            changed_key: Some(changed_key),
            ..Self::full()
        }
    }

    /// 该键的格子能否跳过有效性检查
    fn skips(&self, key: &str) -> bool {
        matches!(self.changed_key, Some(changed) if changed != key)
    }
}

/// 格子
#[derive(Debug)]
pub struct Cell {
    kind: TileKind,
    style: CellStyle,
    height_animator: Animator,
    /// 不参与缓存（空键）的格子自己保存位图
    local: Option<RgbaImage>,
    force_redraw: bool,
}

impl Cell {
    /// 创建格子
    ///
    /// # 错误
    /// 尺寸为 0 或速度非正时返回配置错误。
    pub fn new(kind: TileKind, style: CellStyle) -> GridResult<Self> {
        if style.width == 0 || style.height == 0 {
            return Err(GridError::layout(
                format!("cell {:?}", kind.entity_key()),
                format!("尺寸必须 > 0，实际为 {}x{}", style.width, style.height),
            ));
        }
        let height_animator =
            Animator::new(0.0, style.height as f32, style.speed, style.start_open)?;

        Ok(Self {
            kind,
            style,
            height_animator,
            local: None,
            force_redraw: false,
        })
    }

    /// 监听的键
    pub fn entity_key(&self) -> &str {
        self.kind.entity_key()
    }

    /// 格子种类
    pub fn kind(&self) -> &TileKind {
        &self.kind
    }

    /// 几何参数
    pub fn style(&self) -> &CellStyle {
        &self.style
    }

    /// 高度补间值
    pub fn animator(&self) -> &Animator {
        &self.height_animator
    }

    /// 动画状态
    pub fn state(&self) -> AnimatorState {
        self.height_animator.state()
    }

    /// 当前可见高度，限制在 `[0, 完全展开高度]`
    pub fn height(&self) -> u32 {
        self.height_animator.pixels().min(self.style.height)
    }

    /// 宽度
    pub fn width(&self) -> u32 {
        self.style.width
    }

    /// 完全展开时的高度
    pub fn natural_height(&self) -> u32 {
        self.style.height
    }

    /// 是否正在动画
    pub fn is_animating(&self) -> bool {
        self.height_animator.is_animating()
    }

    /// 下次更新时强制重新渲染
    pub fn force_redraw(&mut self) {
        self.force_redraw = true;
    }

    /// 高度推进一帧
    pub fn advance(&mut self) {
        self.height_animator.advance();
    }

    /// 高度直接跳到目标
    pub fn snap(&mut self) {
        self.height_animator.snap();
    }

    /// 更新一帧
    ///
    /// 1. 根据状态求打开条件，推进高度动画
    /// 2. 缓存失效（值变化 / 无条目 / 强制）时重新渲染
    ///
    /// # 返回
    /// 本次更新是否产生了不同的像素
    pub fn update(
        &mut self,
        state: &StateMap,
        pass: UpdatePass<'_>,
        cache: &mut TileCache,
        raster: &dyn Rasterizer,
    ) -> GridResult<bool> {
        let key = self.kind.entity_key();
        let value = state.get(key);
        let open = self.kind.is_open(value);

        self.height_animator.set_target(open);
        if pass.animate {
            self.height_animator.advance();
        }

        let force = pass.force || self.force_redraw;
        if !key.is_empty() && !force && pass.skips(key) && cache.contains(key) {
            cache.record_hit();
            return Ok(false);
        }

        let fingerprint = Fingerprint {
            value: value.clone(),
            label: self.kind.label(value),
            colors: self.kind.colors(value, open),
            icon: self.style.icon,
        };

        if key.is_empty() {
            let bitmap = self.render(&fingerprint, raster)?;
            cache.record_uncached();
            let changed = self.local.as_ref() != Some(&bitmap);
            self.local = Some(bitmap);
            self.force_redraw = false;
            return Ok(changed);
        }

        if !force && cache.is_fresh(key, &fingerprint) {
            cache.record_hit();
            return Ok(false);
        }

        trace!(entity = %key, label = %fingerprint.label, "重新渲染格子");
        let bitmap = self.render(&fingerprint, raster)?;
        cache.record_miss();
        self.force_redraw = false;
        Ok(cache.insert(key, fingerprint, bitmap))
    }

    /// 完整高度的位图（空键格子取本地位图，否则取缓存槽位）
    pub fn bitmap<'a>(&'a self, cache: &'a TileCache) -> Option<&'a RgbaImage> {
        match self.kind.entity_key() {
            "" => self.local.as_ref(),
            key => cache.get(key),
        }
    }

    /// 按当前高度顶部对齐裁剪后的可见部分
    pub fn visible<'a>(&'a self, cache: &'a TileCache) -> Option<SubImage<&'a RgbaImage>> {
        let height = self.height();
        if height == 0 {
            return None;
        }
        self.bitmap(cache).map(|bitmap| surface::crop_top(bitmap, height))
    }

    /// 渲染完整尺寸的位图：背景，左侧图标，其后文字
    fn render(
        &self,
        fingerprint: &Fingerprint,
        raster: &dyn Rasterizer,
    ) -> Result<RgbaImage, RasterError> {
        let colors = &fingerprint.colors;
        let (width, height) = (self.style.width, self.style.height);
        let mut canvas = surface::filled(width, height, colors.cell_bg);
        let mut label_x = LABEL_PADDING;

        if let Some(icon) = fingerprint.icon {
            let side = height.min(width);
            surface::blit(&mut canvas, &surface::filled(side, side, colors.icon_bg), 0, 0);

            let mut buf = [0u8; 4];
            let glyph = raster.rasterize(&GlyphRequest {
                text: icon.encode_utf8(&mut buf),
                font: FontRole::Icon,
                size: self.style.icon_size,
                fg: colors.icon_fg,
                outline: None,
            })?;
            surface::overlay(
                &mut canvas,
                &glyph,
                surface::centered(side, glyph.width()),
                surface::centered(side, glyph.height()),
            );
            label_x += i64::from(side);
        }

        if !fingerprint.label.is_empty() {
            let glyph = raster.rasterize(&GlyphRequest {
                text: &fingerprint.label,
                font: FontRole::Label,
                size: self.style.label_size,
                fg: colors.label_fg,
                outline: colors.outline(),
            })?;
            surface::overlay(
                &mut canvas,
                &glyph,
                label_x,
                surface::centered(height, glyph.height()),
            );
        }

        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{CellColors, Color};
    use crate::test_support::CountingRasterizer;
    use crate::tile::Comparison;
    use image::GenericImageView;

    fn sensor_cell() -> Cell {
        let kind = TileKind::threshold("sensor.x", Comparison::Above, 500.0);
        Cell::new(kind, CellStyle::default()).unwrap()
    }

    #[test]
    fn test_rejects_zero_size() {
        let style = CellStyle {
            height: 0,
            ..CellStyle::default()
        };
        assert!(matches!(
            Cell::new(TileKind::new("sensor.x"), style),
            Err(GridError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_speed() {
        let style = CellStyle {
            speed: 0.0,
            ..CellStyle::default()
        };
        assert_eq!(
            Cell::new(TileKind::new("sensor.x"), style).unwrap_err(),
            GridError::InvalidSpeed { speed: 0.0 }
        );
    }

    #[test]
    fn test_cache_hit_when_value_unchanged() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let mut state = StateMap::from_iter([("sensor.x", 600)]);

        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 1);

        state.set("sensor.x", 700);
        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 2);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_unrelated_event_skips_check() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let mut state = StateMap::from_iter([("sensor.x", 1)]);

        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        state.set("sensor.x", 2);

        // 其他键的事件：沿用缓存，即便值已变化
        cell.update(&state, UpdatePass::event("sensor.y"), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 1);

        // 自己的键的事件：重新检查
        cell.update(&state, UpdatePass::event("sensor.x"), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 2);
    }

    #[test]
    fn test_event_renders_when_no_entry() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        cell.update(&StateMap::new(), UpdatePass::event("other"), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 1);
        assert!(cache.contains("sensor.x"));
    }

    #[test]
    fn test_empty_key_always_renders() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = Cell::new(TileKind::fixed("clock", true), CellStyle::default()).unwrap();
        let state = StateMap::new();

        assert!(cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap());
        // 像素相同，不算变化
        assert!(!cell.update(&state, UpdatePass::event("x"), &mut cache, &raster).unwrap());
        assert_eq!(raster.renders(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().uncached, 2);
    }

    #[test]
    fn test_force_redraw() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let state = StateMap::from_iter([("sensor.x", 1)]);

        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        cell.force_redraw();
        cell.update(&state, UpdatePass::event("other"), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 2);

        // 强制标记只生效一次
        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        assert_eq!(raster.renders(), 2);
    }

    #[test]
    fn test_missing_value_renders_not_available() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        cell.update(&StateMap::new(), UpdatePass::full(), &mut cache, &raster).unwrap();
        assert_eq!(cell.state(), AnimatorState::Closed);
        assert_eq!(raster.last_text().as_deref(), Some("N/A"));
    }

    #[test]
    fn test_icon_rendered_at_left() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let colors = CellColors {
            cell_bg: Color::rgb(1, 1, 1),
            icon_bg: Color::rgb(2, 2, 2),
            ..CellColors::default()
        };
        let style = CellStyle {
            icon: Some('\u{f0335}'),
            icon_size: 4,
            start_open: true,
            ..CellStyle::default()
        };
        let mut cell = Cell::new(TileKind::fixed("", true).with_colors(colors), style).unwrap();
        cell.update(&StateMap::new(), UpdatePass::full(), &mut cache, &raster).unwrap();

        let bitmap = cell.bitmap(&cache).unwrap();
        assert_eq!(bitmap.dimensions(), (64, 12));
        assert_eq!(bitmap.get_pixel(0, 0).0, [2, 2, 2, 255]);
        assert_eq!(bitmap.get_pixel(20, 0).0, [1, 1, 1, 255]);
        // 只请求了图标
        assert_eq!(raster.renders(), 1);
    }

    #[test]
    fn test_visible_is_top_aligned_crop() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let state = StateMap::from_iter([("sensor.x", 600)]);

        cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        assert_eq!(cell.height(), 1);
        for _ in 0..4 {
            cell.update(&state, UpdatePass::full(), &mut cache, &raster).unwrap();
        }
        assert_eq!(cell.height(), 5);

        let visible = cell.visible(&cache).unwrap();
        assert_eq!(visible.dimensions(), (64, 5));
        let full = cell.bitmap(&cache).unwrap();
        for y in 0..5 {
            for x in 0..64 {
                assert_eq!(visible.get_pixel(x, y), *full.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_paused_pass_freezes_height() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let state = StateMap::from_iter([("sensor.x", 600)]);
        let paused = UpdatePass {
            animate: false,
            ..UpdatePass::full()
        };

        cell.update(&state, paused, &mut cache, &raster).unwrap();
        assert_eq!(cell.height(), 0);
        assert_eq!(cell.state(), AnimatorState::Opening);
        assert!(cell.visible(&cache).is_none());
    }

    #[test]
    fn test_raster_failure_propagates() {
        let raster = CountingRasterizer::failing();
        let mut cache = TileCache::new();
        let mut cell = sensor_cell();
        let result = cell.update(&StateMap::new(), UpdatePass::full(), &mut cache, &raster);
        assert!(matches!(result, Err(GridError::Raster(_))));
        assert!(cache.is_empty());
    }
}
