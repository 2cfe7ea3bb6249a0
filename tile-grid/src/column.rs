//! # Column 模块
//!
//! 纵向排列的一组格子，整体在水平方向展开/收起。
//!
//! 列的宽度目标 = 任一子格子为 打开/打开中（逻辑或，每帧重算，不锁存）。

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::animator::{Animator, AnimatorState};
use crate::cache::TileCache;
use crate::cell::{Cell, UpdatePass};
use crate::color::Color;
use crate::error::{GridError, GridResult};
use crate::raster::Rasterizer;
use crate::surface;
use crate::value::StateMap;

/// 列样式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnStyle {
    /// 未被格子覆盖区域的背景
    pub background: Color,
    /// 左侧 1px 边线颜色
    pub border: Option<Color>,
    /// 每帧宽度变化量
    pub speed: f32,
}

impl Default for ColumnStyle {
    fn default() -> Self {
        Self {
            background: Color::TRANSPARENT,
            border: None,
            speed: 4.0,
        }
    }
}

/// 列
#[derive(Debug)]
pub struct Column {
    cells: Vec<Cell>,
    style: ColumnStyle,
    width_animator: Animator,
    natural_width: u32,
    natural_height: u32,
}

impl Column {
    /// 创建列
    ///
    /// 完全展开宽度取子格子宽度的最大值，完全展开高度为子格子高度之和。
    ///
    /// # 错误
    /// - 没有格子：[`GridError::EmptyColumn`]
    /// - 速度非正：[`GridError::InvalidSpeed`]
    pub fn new(cells: Vec<Cell>, style: ColumnStyle) -> GridResult<Self> {
        if cells.is_empty() {
            return Err(GridError::EmptyColumn);
        }

        let natural_width = cells.iter().map(Cell::width).max().unwrap_or(0);
        let natural_height = cells.iter().map(Cell::natural_height).sum();
        let start_open = cells.iter().any(|c| c.style().start_open);
        let width_animator = Animator::new(0.0, natural_width as f32, style.speed, start_open)?;

        Ok(Self {
            cells,
            style,
            width_animator,
            natural_width,
            natural_height,
        })
    }

    /// 更新一帧：先更新所有子格子，再推进宽度动画
    ///
    /// # 返回
    /// 是否有子格子产生了不同的像素
    pub fn update(
        &mut self,
        state: &StateMap,
        pass: UpdatePass<'_>,
        cache: &mut TileCache,
        raster: &dyn Rasterizer,
    ) -> GridResult<bool> {
        let mut changed = false;
        for cell in &mut self.cells {
            changed |= cell.update(state, pass, cache, raster)?;
        }

        self.width_animator.set_target(self.any_open());
        if pass.animate {
            self.width_animator.advance();
        }
        Ok(changed)
    }

    /// 推进子格子高度与自身宽度一帧
    pub fn advance(&mut self) {
        self.cells.iter_mut().for_each(Cell::advance);
        self.width_animator.advance();
    }

    /// 任一子格子为 打开/打开中
    pub fn any_open(&self) -> bool {
        self.cells.iter().any(|c| c.state().is_opening_or_open())
    }

    /// 合成列位图
    ///
    /// 按顺序在累计偏移处贴上各格子的可见部分，其余区域填充背景，
    /// 边线始终画满完全展开高度；结果按当前宽度左对齐裁剪。
    pub fn render(&self, cache: &TileCache) -> RgbaImage {
        let mut canvas =
            surface::filled(self.natural_width, self.natural_height, self.style.background);

        let mut y: u32 = 0;
        for cell in &self.cells {
            if let Some(visible) = cell.visible(cache) {
                surface::blit(&mut canvas, &*visible, 0, i64::from(y));
            }
            y += cell.height();
        }

        if let Some(border) = self.style.border {
            surface::vline(&mut canvas, 0, border);
        }

        surface::crop_left(&canvas, self.width()).to_image()
    }

    /// 是否有动画进行中（自身宽度或任一子格子）
    pub fn animating(&self) -> bool {
        self.width_animator.is_animating() || self.cells.iter().any(Cell::is_animating)
    }

    /// 当前宽度
    pub fn width(&self) -> u32 {
        self.width_animator.pixels().min(self.natural_width)
    }

    /// 当前内容高度（子格子当前高度之和）
    pub fn content_height(&self) -> u32 {
        self.cells.iter().map(Cell::height).sum()
    }

    /// 完全展开宽度
    pub fn natural_width(&self) -> u32 {
        self.natural_width
    }

    /// 完全展开高度
    pub fn natural_height(&self) -> u32 {
        self.natural_height
    }

    /// 宽度补间值
    pub fn animator(&self) -> &Animator {
        &self.width_animator
    }

    /// 宽度动画状态
    pub fn state(&self) -> AnimatorState {
        self.width_animator.state()
    }

    /// 子格子
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// 子格子（可变）
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// 所有补间值直接跳到目标
    pub fn snap(&mut self) {
        self.cells.iter_mut().for_each(Cell::snap);
        self.width_animator.snap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellStyle;
    use crate::test_support::CountingRasterizer;
    use crate::tile::TileKind;

    fn binary_cell(key: &str, width: u32, height: u32) -> Cell {
        let style = CellStyle {
            width,
            height,
            ..CellStyle::default()
        };
        Cell::new(TileKind::binary(key, false), style).unwrap()
    }

    fn three_cell_column() -> Column {
        let cells = vec![
            binary_cell("b.0", 10, 4),
            binary_cell("b.1", 12, 4),
            binary_cell("b.2", 8, 4),
        ];
        Column::new(cells, ColumnStyle::default()).unwrap()
    }

    #[test]
    fn test_empty_column_rejected() {
        assert_eq!(
            Column::new(Vec::new(), ColumnStyle::default()).unwrap_err(),
            GridError::EmptyColumn
        );
    }

    #[test]
    fn test_natural_size() {
        let column = three_cell_column();
        assert_eq!(column.natural_width(), 12);
        assert_eq!(column.natural_height(), 12);
        assert_eq!(column.width(), 0);
        assert_eq!(column.content_height(), 0);
    }

    #[test]
    fn test_target_is_logical_or_of_cells() {
        let raster = CountingRasterizer::default();
        for mask in 0u8..8 {
            let mut column = three_cell_column();
            let mut cache = TileCache::new();
            let state: StateMap = (0..3)
                .map(|i| (format!("b.{i}"), mask & (1 << i) != 0))
                .collect();

            column
                .update(&state, UpdatePass::full(), &mut cache, &raster)
                .unwrap();
            assert_eq!(column.animator().target_open(), mask != 0, "mask {mask:03b}");
            assert_eq!(column.any_open(), mask != 0);
        }
    }

    #[test]
    fn test_target_is_not_latched() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut column = three_cell_column();
        let mut state = StateMap::from_iter([("b.1", true)]);

        for _ in 0..2 {
            column
                .update(&state, UpdatePass::full(), &mut cache, &raster)
                .unwrap();
        }
        assert!(column.animator().target_open());
        assert_eq!(column.width(), 8);

        state.set("b.1", false);
        column
            .update(&state, UpdatePass::full(), &mut cache, &raster)
            .unwrap();
        assert!(!column.animator().target_open());
        assert_eq!(column.state(), AnimatorState::Closing);
        assert_eq!(column.width(), 4);
    }

    #[test]
    fn test_render_stacks_visible_cells() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut column = three_cell_column();
        let state = StateMap::from_iter([("b.0", true), ("b.2", true)]);

        column
            .update(&state, UpdatePass::full(), &mut cache, &raster)
            .unwrap();
        column.snap();

        assert_eq!(column.width(), 12);
        assert_eq!(column.content_height(), 8);
        let image = column.render(&cache);
        assert_eq!(image.dimensions(), (12, 12));

        // b.2 紧贴在 b.0 之下（b.1 收起，不占高度）
        let b2 = cache.get("b.2").unwrap();
        assert_eq!(image.get_pixel(0, 4), b2.get_pixel(0, 0));
        // b.0 只有 10 宽，右侧是列背景
        assert_eq!(image.get_pixel(11, 0).0, Color::TRANSPARENT.0);
    }

    #[test]
    fn test_border_spans_natural_height() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let style = ColumnStyle {
            border: Some(Color::rgb(255, 0, 0)),
            ..ColumnStyle::default()
        };
        let mut column = Column::new(vec![binary_cell("b.0", 6, 5)], style).unwrap();
        let state = StateMap::from_iter([("b.0", true)]);

        column
            .update(&state, UpdatePass::full(), &mut cache, &raster)
            .unwrap();
        column.width_animator.snap();

        // 格子只展开了 1px，但边线画满 5px
        let image = column.render(&cache);
        assert_eq!(image.height(), 5);
        for y in 0..5 {
            assert_eq!(image.get_pixel(0, y).0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_render_is_cropped_to_animated_width() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut column = three_cell_column();
        let state = StateMap::from_iter([("b.0", true)]);

        column
            .update(&state, UpdatePass::full(), &mut cache, &raster)
            .unwrap();
        assert_eq!(column.width(), 4);
        assert!(column.animating());
        assert_eq!(column.render(&cache).width(), 4);
    }

    #[test]
    fn test_settled_column_is_not_animating() {
        let raster = CountingRasterizer::default();
        let mut cache = TileCache::new();
        let mut column = three_cell_column();
        let state = StateMap::new();
        column
            .update(&state, UpdatePass::full(), &mut cache, &raster)
            .unwrap();
        assert!(!column.animating());
        assert_eq!(column.state(), AnimatorState::Closed);
    }
}
