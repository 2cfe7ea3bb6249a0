//! # Grid 模块
//!
//! 从左到右排列的列，合成整块面板的位图。
//!
//! ## 每帧流程
//!
//! ```text
//! StateMap ──► Grid::update(changed_key?)
//!                 │
//!                 ├─ Column::update ─► Cell::update（打开条件 → 补间 → 缓存/渲染）
//!                 │
//!                 ├─ bounds = (Σ 列宽, max 列内容高)
//!                 │
//!                 └─ 新建透明位图，按累计横向偏移贴上各列
//! ```
//!
//! 状态表只在 `update` 调用期间借用，Grid 从不保存或修改它。

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::cache::{CacheStats, TileCache};
use crate::cell::UpdatePass;
use crate::column::Column;
use crate::error::GridResult;
use crate::layout::GridLayout;
use crate::raster::Rasterizer;
use crate::surface;
use crate::value::StateMap;

/// 尺寸（像素）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 面积为 0
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 单帧更新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// 本帧的外框尺寸
    pub bounds: Size,
    /// 外部是否需要重新合成/推送
    pub dirty: bool,
    /// 是否仍有动画进行中
    pub animating: bool,
    /// 是否有格子产生了不同的像素
    pub pixels_changed: bool,
}

/// 格子网格
#[derive(Debug)]
pub struct Grid {
    columns: Vec<Column>,
    cache: TileCache,
    bitmap: RgbaImage,
    bounds: Size,
    dirty: bool,
    animating: bool,
    paused: bool,
    /// 下一次更新强制重新渲染
    force: bool,
    /// 是否已经产出过一帧
    has_frame: bool,
}

impl Grid {
    /// 由列创建网格（允许为空）
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            cache: TileCache::new(),
            bitmap: RgbaImage::new(0, 0),
            bounds: Size::ZERO,
            dirty: false,
            animating: false,
            paused: false,
            force: false,
            has_frame: false,
        }
    }

    /// 由布局清单创建网格
    pub fn from_layout(layout: &GridLayout) -> GridResult<Self> {
        layout.build()
    }

    /// 更新一帧
    ///
    /// `changed_key` 为刚刚变化的键：其他键的格子若已有缓存则直接沿用。
    /// 传 `None` 为全量检查，调用方需要定期执行。
    ///
    /// # 错误
    /// 光栅化失败时返回 [`GridError::Raster`](crate::GridError::Raster)，
    /// 此时位图、外框与所有补间值保持上一帧的内容。
    pub fn update(
        &mut self,
        state: &StateMap,
        changed_key: Option<&str>,
        raster: &dyn Rasterizer,
    ) -> GridResult<FrameReport> {
        // 所有格子渲染成功后才推进补间
        let pass = UpdatePass {
            changed_key,
            animate: false,
            force: self.force,
        };

        let mut pixels_changed = false;
        for column in &mut self.columns {
            pixels_changed |= column.update(state, pass, &mut self.cache, raster)?;
        }
        self.force = false;
        if !self.paused {
            self.columns.iter_mut().for_each(Column::advance);
        }

        let bounds = Size {
            width: self.columns.iter().map(Column::width).sum(),
            height: self
                .columns
                .iter()
                .map(Column::content_height)
                .max()
                .unwrap_or(0),
        };

        let mut bitmap = RgbaImage::new(bounds.width, bounds.height);
        let mut x: u32 = 0;
        for column in &self.columns {
            let width = column.width();
            if width > 0 {
                surface::blit(&mut bitmap, &column.render(&self.cache), i64::from(x), 0);
            }
            x += width;
        }

        let animating = self.columns.iter().any(Column::animating);
        let bounds_changed = bounds != self.bounds;
        let dirty = animating || pixels_changed || bounds_changed || !self.has_frame;

        if bounds_changed {
            debug!(from = %self.bounds, to = %bounds, "外框变化");
        }

        self.bitmap = bitmap;
        self.bounds = bounds;
        self.animating = animating;
        self.dirty = dirty;
        self.has_frame = true;

        Ok(FrameReport {
            bounds,
            dirty,
            animating,
            pixels_changed,
        })
    }

    /// 当前合成位图（尺寸等于 `bounds()`）
    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// 当前外框
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// 最近一帧是否需要重新推送
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// 最近一帧是否仍有动画
    pub fn animating(&self) -> bool {
        self.animating
    }

    /// 下一次更新重新渲染所有格子
    pub fn force_redraw(&mut self) {
        self.force = true;
    }

    /// 暂停/恢复动画推进
    ///
    /// 暂停期间打开条件照常求值，缓存照常失效，只是补间值不动。
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// 是否暂停
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// 所有补间值直接跳到目标（下一次 `update` 生效于位图）
    pub fn snap(&mut self) {
        self.columns.iter_mut().for_each(Column::snap);
    }

    /// 缓存统计
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 格子缓存
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// 列
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 格子总数
    pub fn cell_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells().len()).sum()
    }
}
