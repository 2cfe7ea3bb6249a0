//! # Error 模块
//!
//! 宿主层错误类型。

use std::path::PathBuf;
use thiserror::Error;
use tile_grid::GridError;

use crate::config::ConfigError;

/// 宿主层错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 文件读取失败
    #[error("读取 {} 失败: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文件内容无法解析
    #[error("解析 {} 失败: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// 字体加载失败
    #[error("字体加载失败: {} - {message}", path.display())]
    Font { path: PathBuf, message: String },

    /// 帧输出失败
    #[error("写入帧失败: {} - {message}", path.display())]
    FrameWrite { path: PathBuf, message: String },

    /// 引擎错误
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// 宿主层结果类型
pub type HostResult<T> = Result<T, HostError>;
