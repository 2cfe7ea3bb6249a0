//! 单元测试共用的光栅化器。

use image::RgbaImage;
use std::cell::{Cell, RefCell};

use crate::error::RasterError;
use crate::raster::{BlockRasterizer, GlyphRequest, Rasterizer};

/// 记录调用次数的方块光栅化器
#[derive(Debug, Default)]
pub(crate) struct CountingRasterizer {
    calls: Cell<usize>,
    last_text: RefCell<Option<String>>,
    fail: bool,
}

impl CountingRasterizer {
    /// 每次调用都失败
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// 调用次数
    pub(crate) fn renders(&self) -> usize {
        self.calls.get()
    }

    /// 最近一次请求的文本
    pub(crate) fn last_text(&self) -> Option<String> {
        self.last_text.borrow().clone()
    }
}

impl Rasterizer for CountingRasterizer {
    fn rasterize(&self, request: &GlyphRequest<'_>) -> Result<RgbaImage, RasterError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_text.borrow_mut() = Some(request.text.to_string());
        if self.fail {
            return Err(RasterError::Failed {
                message: "测试失败".to_string(),
            });
        }
        BlockRasterizer.rasterize(request)
    }
}
