//! # Animator 模块
//!
//! 一维补间值，带 打开/关闭/打开中/关闭中 四态状态机。
//!
//! 与按时长插值的动画不同，这里每个逻辑帧前进固定的 `speed`，
//! 方向只取决于**当前**的目标，不记录历史：
//!
//! ```text
//! Closed ──目标=开──► Opening ──到达 max──► Open
//!   ▲                   │  ▲                 │
//!   │               目标翻转                目标=关
//!   │                   ▼  │                 ▼
//!   └──到达 min───── Closing ◄───────────────┘
//! ```

use crate::error::{GridError, GridResult};

/// 动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimatorState {
    /// 已打开（value == max 且目标为开）
    Open,
    /// 已关闭（value == min 且目标为关）
    Closed,
    /// 打开中
    Opening,
    /// 关闭中
    Closing,
}

impl AnimatorState {
    /// 目标为开（已打开或打开中）
    pub fn is_opening_or_open(&self) -> bool {
        matches!(self, Self::Open | Self::Opening)
    }

    /// 是否已到达终点
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }
}

/// 补间值
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    min: f32,
    max: f32,
    /// 每帧变化量
    speed: f32,
    target_open: bool,
    /// 当前值，始终位于 [min, max]
    value: f32,
}

impl Animator {
    /// 创建补间值
    ///
    /// 初始值取决于 `open`：打开时位于 `max`，否则位于 `min`。
    ///
    /// # 错误
    /// - `speed` 非正或非有限：[`GridError::InvalidSpeed`]
    /// - `min > max` 或端点非有限：[`GridError::InvalidRange`]
    pub fn new(min: f32, max: f32, speed: f32, open: bool) -> GridResult<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(GridError::InvalidSpeed { speed });
        }
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(GridError::InvalidRange { min, max });
        }

        Ok(Self {
            min,
            max,
            speed,
            target_open: open,
            value: if open { max } else { min },
        })
    }

    /// 前进一帧
    ///
    /// 每个逻辑帧最多调用一次；不调用即冻结当前值（用于暂停）。
    pub fn advance(&mut self) {
        self.value = if self.target_open {
            (self.value + self.speed).min(self.max)
        } else {
            (self.value - self.speed).max(self.min)
        };
    }

    /// 设置目标（下一次 `advance` 时生效）
    pub fn set_target(&mut self, open: bool) {
        self.target_open = open;
    }

    /// 直接跳到目标终点
    pub fn snap(&mut self) {
        self.value = if self.target_open { self.max } else { self.min };
    }

    /// 当前状态
    pub fn state(&self) -> AnimatorState {
        match (self.target_open, self.value >= self.max, self.value <= self.min) {
            (true, true, _) => AnimatorState::Open,
            (true, false, _) => AnimatorState::Opening,
            (false, _, true) => AnimatorState::Closed,
            (false, _, false) => AnimatorState::Closing,
        }
    }

    /// 是否处于两端之间
    pub fn is_animating(&self) -> bool {
        self.value > self.min && self.value < self.max
    }

    /// 当前值
    pub fn value(&self) -> f32 {
        self.value
    }

    /// 当前值（取整后的像素数）
    pub fn pixels(&self) -> u32 {
        self.value.round().max(0.0) as u32
    }

    /// 目标是否为开
    pub fn target_open(&self) -> bool {
        self.target_open
    }

    /// 区间
    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// 每帧变化量
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// 归一化进度（0.0 - 1.0），退化区间返回 0
    pub fn progress(&self) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }
}
