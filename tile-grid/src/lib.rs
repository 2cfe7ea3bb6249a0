//! # Tile Grid
//!
//! 家庭状态面板（LED 点阵）的格子网格引擎。
//!
//! ## 架构概述
//!
//! `tile-grid` 是纯逻辑核心，不做任何文件或网络 IO。
//! 宿主每帧把状态表借给 Grid，取回位图与外框：
//!
//! ```text
//! Host                                Grid
//!   │                                   │
//!   │──── &StateMap, changed_key ─────►│ update()
//!   │                                   │   Column ─► Cell ─► Animator
//!   │◄─── FrameReport + bitmap() ──────│
//!   │                                   │
//! ```
//!
//! 文字与图标通过 [`Rasterizer`] 交给宿主实现，引擎只负责合成。
//!
//! ## 核心类型
//!
//! - [`Animator`]：按帧前进的补间值，四态状态机
//! - [`Cell`]：单个格子，高度动画 + 缓存位图
//! - [`Column`]：纵向一列格子，宽度动画
//! - [`Grid`]：整块面板，持有格子缓存
//! - [`StateMap`] / [`StateValue`]：外部状态
//! - [`TileKind`]：格子种类（监听的键、文字、打开条件、配色）
//!
//! ## 使用示例
//!
//! ```ignore
//! use tile_grid::{BlockRasterizer, GridLayout, StateMap};
//!
//! let layout = GridLayout::from_json(&manifest)?;
//! let mut grid = layout.build()?;
//! let mut state = StateMap::new();
//!
//! loop {
//!     let changed = feed.poll(&mut state);
//!     let report = grid.update(&state, changed.as_deref(), &BlockRasterizer)?;
//!     if report.dirty {
//!         panel.present(grid.bitmap());
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`animator`]：补间值
//! - [`value`]：状态值与状态表
//! - [`tile`]：格子种类
//! - [`cell`] / [`column`] / [`grid`]：三层合成
//! - [`cache`]：格子位图缓存
//! - [`layout`]：JSON 布局清单
//! - [`raster`]：光栅化接口
//! - [`error`]：错误类型

pub mod animator;
pub mod cache;
pub mod cell;
pub mod color;
pub mod column;
pub mod error;
pub mod grid;
pub mod layout;
pub mod raster;
pub mod surface;
pub mod tile;
pub mod value;

#[cfg(test)]
mod test_support;

// 重导出核心类型
pub use animator::{Animator, AnimatorState};
pub use cache::{CacheStats, Fingerprint, TileCache};
pub use cell::{Cell, CellStyle, UpdatePass};
pub use color::{CellColors, Color};
pub use column::{Column, ColumnStyle};
pub use error::{GridError, GridResult, RasterError};
pub use grid::{FrameReport, Grid, Size};
pub use layout::{
    CellDefaults, CellKindSpec, CellSpec, ColumnSpec, GridLayout, IssueLevel, LayoutIssue,
};
pub use raster::{BlockRasterizer, FontRole, GlyphRequest, Rasterizer};
pub use tile::{Comparison, TileKind};
pub use value::{NOT_AVAILABLE, StateMap, StateValue};
