//! # Layout 模块
//!
//! 声明式布局清单（JSON），描述有哪些列、每列有哪些格子。
//!
//! ```json
//! {
//!   "defaults": { "width": 64, "height": 12 },
//!   "columns": [
//!     {
//!       "border": "#3060a0",
//!       "cells": [
//!         { "kind": "threshold", "entity": "sensor.download", "compare": "<", "threshold": 100,
//!           "label": "{value} Mb/s", "precision": 0, "icon": 983862 },
//!         { "kind": "binary", "entity": "binary_sensor.door", "label": "门" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! 校验与构建分开：[`GridLayout::validate`] 只收集问题，
//! [`GridLayout::build`] 遇到错误级问题时拒绝构建。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use tracing::debug;

use crate::cell::{Cell, CellStyle};
use crate::color::CellColors;
use crate::column::{Column, ColumnStyle};
use crate::error::{GridError, GridResult};
use crate::grid::Grid;
use crate::tile::{Comparison, TileKind};

/// 文字模板中的取值占位符
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// 布局清单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// 格子的默认参数
    #[serde(default)]
    pub defaults: CellDefaults,
    /// 从左到右的列
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

/// 格子默认参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellDefaults {
    pub width: u32,
    pub height: u32,
    pub speed: f32,
    pub label_size: u32,
    pub icon_size: u32,
    pub colors: CellColors,
}

impl Default for CellDefaults {
    fn default() -> Self {
        let style = CellStyle::default();
        Self {
            width: style.width,
            height: style.height,
            speed: style.speed,
            label_size: style.label_size,
            icon_size: style.icon_size,
            colors: CellColors::default(),
        }
    }
}

/// 列描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(flatten)]
    pub style: ColumnStyle,
    #[serde(default)]
    pub cells: Vec<CellSpec>,
}

/// 格子种类描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellKindSpec {
    /// 数值阈值
    Threshold {
        entity: String,
        compare: Comparison,
        threshold: f64,
    },
    /// 布尔
    Binary {
        entity: String,
        #[serde(default)]
        invert: bool,
    },
    /// 枚举匹配
    State { entity: String, states: Vec<String> },
    /// 静态文字
    Static {
        #[serde(default)]
        open: bool,
    },
}

impl CellKindSpec {
    /// 监听的键（静态格子为空串）
    pub fn entity(&self) -> &str {
        match self {
            Self::Threshold { entity, .. }
            | Self::Binary { entity, .. }
            | Self::State { entity, .. } => entity,
            Self::Static { .. } => "",
        }
    }
}

/// 格子描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    #[serde(flatten)]
    pub kind: CellKindSpec,
    /// 文字模板，`{value}` 替换为格式化后的值
    pub label: Option<String>,
    /// 数值小数位数
    pub precision: Option<usize>,
    /// 图标码位
    pub icon: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub speed: Option<f32>,
    /// 关闭时（或未设置 `active_colors` 时）的配色
    pub colors: Option<CellColors>,
    /// 打开时的配色
    pub active_colors: Option<CellColors>,
    #[serde(default)]
    pub start_open: bool,
}

impl CellSpec {
    /// 合并默认参数后的几何参数
    fn style(&self, defaults: &CellDefaults) -> CellStyle {
        CellStyle {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            speed: self.speed.unwrap_or(defaults.speed),
            label_size: defaults.label_size,
            icon_size: defaults.icon_size,
            icon: self.icon.and_then(char::from_u32),
            start_open: self.start_open,
        }
    }

    /// 转换为格子种类
    fn tile_kind(&self, defaults: &CellDefaults) -> TileKind {
        let kind = match &self.kind {
            CellKindSpec::Threshold {
                entity,
                compare,
                threshold,
            } => TileKind::threshold(entity.as_str(), *compare, *threshold),
            CellKindSpec::Binary { entity, invert } => TileKind::binary(entity.as_str(), *invert),
            CellKindSpec::State { entity, states } => {
                TileKind::state_match(entity.as_str(), states.iter().cloned())
            }
            CellKindSpec::Static { open } => {
                TileKind::fixed(self.label.clone().unwrap_or_default(), *open)
            }
        };

        let kind = match (&self.kind, &self.label) {
            (CellKindSpec::Static { .. }, _) => kind,
            (_, template) => {
                let template = template
                    .clone()
                    .unwrap_or_else(|| VALUE_PLACEHOLDER.to_string());
                let precision = self.precision;
                kind.with_label(move |value| {
                    template.replace(VALUE_PLACEHOLDER, &value.display(precision))
                })
            }
        };

        let colors = self.colors.unwrap_or(defaults.colors);
        match self.active_colors {
            Some(active) => kind.with_color_rule(move |_, open| if open { active } else { colors }),
            None => kind.with_colors(colors),
        }
    }
}

/// 问题级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IssueLevel {
    /// 警告（可以构建）
    Warn,
    /// 错误（拒绝构建）
    Error,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 布局问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutIssue {
    pub level: IssueLevel,
    /// 位置，如 `columns[0].cells[1]`
    pub location: String,
    pub message: String,
}

impl LayoutIssue {
    fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            location: location.into(),
            message: message.into(),
        }
    }

    fn warn(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warn,
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.location, self.message)
    }
}

fn speed_ok(speed: f32) -> bool {
    speed.is_finite() && speed > 0.0
}

impl GridLayout {
    /// 解析 JSON
    pub fn from_json(text: &str) -> GridResult<Self> {
        serde_json::from_str(text).map_err(|e| GridError::layout("json", e.to_string()))
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> GridResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GridError::layout("json", e.to_string()))
    }

    /// 格子总数
    pub fn cell_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).sum()
    }

    /// 检查布局，返回全部问题（按出现顺序）
    pub fn validate(&self) -> Vec<LayoutIssue> {
        let mut issues = Vec::new();
        let defaults = &self.defaults;

        if self.columns.is_empty() {
            issues.push(LayoutIssue::warn("columns", "没有任何列，输出始终为空"));
        }
        if defaults.width == 0 || defaults.height == 0 {
            issues.push(LayoutIssue::warn(
                "defaults",
                format!("默认尺寸 {}x{} 为 0", defaults.width, defaults.height),
            ));
        }

        // 键 -> 第一个监听它的位置
        let mut owners: HashMap<&str, String> = HashMap::new();

        for (ci, column) in self.columns.iter().enumerate() {
            let column_loc = format!("columns[{ci}]");
            if column.cells.is_empty() {
                issues.push(LayoutIssue::error(&column_loc, "列中没有格子"));
            }
            if !speed_ok(column.style.speed) {
                issues.push(LayoutIssue::error(
                    &column_loc,
                    format!("速度必须 > 0，实际为 {}", column.style.speed),
                ));
            }

            for (i, cell) in column.cells.iter().enumerate() {
                let loc = format!("{column_loc}.cells[{i}]");
                let style = cell.style(defaults);

                if style.width == 0 || style.height == 0 {
                    issues.push(LayoutIssue::error(
                        &loc,
                        format!("尺寸必须 > 0，实际为 {}x{}", style.width, style.height),
                    ));
                }
                if !speed_ok(style.speed) {
                    issues.push(LayoutIssue::error(
                        &loc,
                        format!("速度必须 > 0，实际为 {}", style.speed),
                    ));
                }
                if let Some(code) = cell.icon.filter(|c| char::from_u32(*c).is_none()) {
                    issues.push(LayoutIssue::error(&loc, format!("无效的图标码位 {code:#x}")));
                }

                match &cell.kind {
                    CellKindSpec::State { states, .. } if states.is_empty() => {
                        issues.push(LayoutIssue::warn(&loc, "states 为空，格子永远不会打开"));
                    }
                    CellKindSpec::Static { .. } if cell.label.is_none() => {
                        issues.push(LayoutIssue::warn(&loc, "静态格子没有文字"));
                    }
                    _ => {}
                }

                let entity = cell.kind.entity();
                if entity.is_empty() {
                    if !matches!(cell.kind, CellKindSpec::Static { .. }) {
                        issues.push(LayoutIssue::warn(&loc, "未指定键，每次更新都会重新渲染"));
                    }
                    continue;
                }
                match owners.entry(entity) {
                    Entry::Occupied(first) => issues.push(LayoutIssue::warn(
                        &loc,
                        format!("键 {entity:?} 已被 {} 监听，两者共用一个缓存槽位", first.get()),
                    )),
                    Entry::Vacant(slot) => {
                        slot.insert(loc);
                    }
                }
            }
        }

        issues
    }

    /// 构建网格
    ///
    /// # 错误
    /// 存在错误级问题时返回第一个问题对应的 [`GridError::InvalidLayout`]。
    pub fn build(&self) -> GridResult<Grid> {
        let issues = self.validate();
        for issue in issues.iter().filter(|i| !i.is_error()) {
            debug!(location = %issue.location, message = %issue.message, "布局警告");
        }
        if let Some(issue) = issues.into_iter().find(LayoutIssue::is_error) {
            return Err(GridError::layout(issue.location, issue.message));
        }

        let columns = self
            .columns
            .iter()
            .map(|spec| {
                let cells = spec
                    .cells
                    .iter()
                    .map(|cell| {
                        Cell::new(cell.tile_kind(&self.defaults), cell.style(&self.defaults))
                    })
                    .collect::<GridResult<Vec<_>>>()?;
                Column::new(cells, spec.style)
            })
            .collect::<GridResult<Vec<_>>>()?;

        debug!(
            columns = columns.len(),
            cells = self.cell_count(),
            "布局构建完成"
        );
        Ok(Grid::new(columns))
    }
}
