//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tile_grid::Color;
use tracing::{info, warn};

use crate::renderer::Anchor;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 布局清单路径
    #[serde(default = "default_layout_path")]
    pub layout_path: PathBuf,

    /// 状态事件文件（JSON Lines），不配置时只渲染空状态
    #[serde(default)]
    pub events_path: Option<PathBuf>,

    /// 面板配置
    #[serde(default)]
    pub panel: PanelConfig,

    /// 字体配置
    #[serde(default)]
    pub fonts: FontConfig,

    /// 引擎节奏配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 帧输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 面板配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// 面板宽度（像素）
    #[serde(default = "default_panel_width")]
    pub width: u32,

    /// 面板高度（像素）
    #[serde(default = "default_panel_height")]
    pub height: u32,

    /// 背景色
    #[serde(default = "default_panel_background")]
    pub background: Color,

    /// 网格贴靠的角
    #[serde(default)]
    pub anchor: Anchor,

    /// 距离贴靠角的水平偏移（向内）
    #[serde(default)]
    pub offset_x: u32,

    /// 距离贴靠角的垂直偏移（向内）
    #[serde(default)]
    pub offset_y: u32,
}

/// 字体配置
///
/// 未配置字体文件时使用内置的方块光栅化器。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// 文字字体（TTF/OTF）
    #[serde(default)]
    pub label_path: Option<PathBuf>,

    /// 图标字体（如 Material Design Icons）
    #[serde(default)]
    pub icon_path: Option<PathBuf>,

    /// 覆盖布局中的文字字号
    #[serde(default)]
    pub label_size: Option<u32>,

    /// 覆盖布局中的图标字号
    #[serde(default)]
    pub icon_size: Option<u32>,
}

/// 引擎节奏配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 逻辑帧率（只用于把秒换算成帧）
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 每隔多少帧做一次全量检查
    #[serde(default = "default_full_refresh_interval")]
    pub full_refresh_interval: u64,

    /// 第一帧是否播放展开动画（否则直接跳到终点）
    #[serde(default = "default_true")]
    pub animate_on_start: bool,

    /// 键多少秒没有更新后视为不可用（0 表示永不过期）
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

/// 帧输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// 是否写出 PNG 帧
    #[serde(default)]
    pub write_frames: bool,

    /// 只写出需要重绘的帧
    #[serde(default = "default_true")]
    pub only_dirty: bool,
}

/// 调试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 每隔多少帧输出一次缓存统计（0 表示关闭）
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

// 默认值函数
fn default_layout_path() -> PathBuf {
    PathBuf::from("assets/layout.json")
}

fn default_panel_width() -> u32 {
    128
}

fn default_panel_height() -> u32 {
    64
}

fn default_panel_background() -> Color {
    Color::BLACK
}

fn default_fps() -> u32 {
    30
}

fn default_full_refresh_interval() -> u64 {
    30
}

fn default_stale_after_secs() -> u64 {
    600
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("frames")
}

fn default_stats_interval() -> u64 {
    if cfg!(debug_assertions) { 300 } else { 0 }
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            layout_path: default_layout_path(),
            events_path: None,
            panel: PanelConfig::default(),
            fonts: FontConfig::default(),
            engine: EngineConfig::default(),
            output: OutputConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: default_panel_width(),
            height: default_panel_height(),
            background: default_panel_background(),
            anchor: Anchor::default(),
            offset_x: 0,
            offset_y: 0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            full_refresh_interval: default_full_refresh_interval(),
            animate_on_start: true,
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            write_frames: false,
            only_dirty: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            stats_interval: default_stats_interval(),
        }
    }
}

impl EngineConfig {
    /// 过期阈值（帧），`None` 表示永不过期
    pub fn stale_after_frames(&self) -> Option<u64> {
        (self.stale_after_secs > 0).then(|| self.stale_after_secs * u64::from(self.fps))
    }

    /// 验证帧节奏参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::ValidationFailed("fps 必须 > 0".to_string()));
        }
        if self.full_refresh_interval == 0 {
            return Err(ConfigError::ValidationFailed(
                "full_refresh_interval 必须 > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并输出警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.layout_path.exists() {
            return Err(ConfigError::ValidationFailed(format!(
                "布局清单不存在: {}",
                self.layout_path.display()
            )));
        }

        if let Some(events) = &self.events_path
            && !events.exists()
        {
            return Err(ConfigError::ValidationFailed(format!(
                "事件文件不存在: {}",
                events.display()
            )));
        }

        for font in [&self.fonts.label_path, &self.fonts.icon_path]
            .into_iter()
            .flatten()
        {
            if !font.exists() {
                return Err(ConfigError::ValidationFailed(format!(
                    "字体文件不存在: {}",
                    font.display()
                )));
            }
        }

        if self.panel.width == 0 || self.panel.height == 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "面板尺寸必须 > 0，实际为 {}x{}",
                self.panel.width, self.panel.height
            )));
        }

        if self.fonts.label_size == Some(0) || self.fonts.icon_size == Some(0) {
            return Err(ConfigError::ValidationFailed("字号必须 > 0".to_string()));
        }

        self.engine.validate()
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
