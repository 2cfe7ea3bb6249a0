//! PNG 帧输出。

use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HostError, HostResult};

/// 把面板画布逐帧写成 `frame_00042.png`
#[derive(Debug)]
pub struct FrameSink {
    dir: PathBuf,
    written: u64,
}

impl FrameSink {
    /// 创建输出目录（已存在时直接使用）
    pub fn new(dir: impl Into<PathBuf>) -> HostResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| HostError::io(&dir, e))?;
        Ok(Self { dir, written: 0 })
    }

    /// 帧文件路径
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.dir.join(format!("frame_{frame:05}.png"))
    }

    /// 写出一帧
    pub fn write(&mut self, frame: u64, image: &RgbaImage) -> HostResult<PathBuf> {
        let path = self.frame_path(frame);
        image.save(&path).map_err(|e| HostError::FrameWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.written += 1;
        debug!(path = %path.display(), "写出帧");
        Ok(path)
    }

    /// 输出目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 已写出的帧数
    pub fn written(&self) -> u64 {
        self.written
    }
}
