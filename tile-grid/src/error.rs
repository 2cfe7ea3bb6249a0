//! # Error 模块
//!
//! 定义 tile-grid 中使用的错误类型。
//!
//! 状态值的类型问题不属于错误（一律回退为"关闭"/"N/A"），
//! 这里只有两类：构造期的配置错误，以及外部光栅化器的失败。

use thiserror::Error;

use crate::raster::FontRole;

/// 光栅化错误（由外部字形渲染器产生）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// 字体中不存在对应字形
    #[error("字形缺失: {text:?}")]
    MissingGlyph { text: String },

    /// 字体未加载
    #[error("字体不可用: {role}")]
    FontUnavailable { role: FontRole },

    /// 其他光栅化失败
    #[error("光栅化失败: {message}")]
    Failed { message: String },
}

/// tile-grid 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// 动画速度必须为正
    #[error("动画速度必须 > 0，实际为 {speed}")]
    InvalidSpeed { speed: f32 },

    /// 动画区间无效（min > max 或非有限值）
    #[error("无效的动画区间 [{min}, {max}]")]
    InvalidRange { min: f32, max: f32 },

    /// 列中没有任何格子
    #[error("列中没有任何格子")]
    EmptyColumn,

    /// 布局清单无效
    #[error("{context}: 无效的布局 - {message}")]
    InvalidLayout { context: String, message: String },

    /// 渲染错误
    #[error("渲染错误: {0}")]
    Raster(#[from] RasterError),
}

impl GridError {
    /// 创建布局错误
    pub fn layout(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_error_converts() {
        let err: GridError = RasterError::FontUnavailable {
            role: FontRole::Icon,
        }
        .into();
        assert!(matches!(err, GridError::Raster(_)));
        assert_eq!(err.to_string(), "渲染错误: 字体不可用: icon");
    }

    #[test]
    fn test_layout_error_message() {
        let err = GridError::layout("columns[1].cells[0]", "图标码位无效");
        assert_eq!(err.to_string(), "columns[1].cells[0]: 无效的布局 - 图标码位无效");
    }
}
