//! # Host 层
//!
//! 家庭状态面板的宿主层实现，驱动 `tile-grid` 引擎并输出画面。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置加载
//! - 状态事件回放与过期
//! - 字体光栅化
//! - 面板合成与帧输出
//!
//! Host 层不包含格子逻辑，只负责把状态交给 Grid 并展示 Grid 的位图。

pub mod config;
pub mod error;
pub mod feed;
pub mod renderer;
pub mod runner;

pub use config::{
    AppConfig, ConfigError, DebugConfig, EngineConfig, FontConfig, OutputConfig, PanelConfig,
};
pub use error::{HostError, HostResult};
pub use feed::{FeedTick, StateEvent, StateFeed};
pub use renderer::{Anchor, FontRasterizer, FrameSink, Panel};
pub use runner::{RunStats, Runner};
