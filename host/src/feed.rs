//! # Feed 模块
//!
//! 状态事件回放：把 JSON Lines 事件按帧写入 [`StateMap`]。
//!
//! ```text
//! {"frame": 0,  "key": "sensor.download", "value": 312.4}
//! {"frame": 12, "key": "binary_sensor.door", "value": "on"}
//! # 以 # 开头的行是注释
//! ```
//!
//! 同时记录每个键最后一次更新的帧号；超过阈值没有更新的键
//! 在全量检查时被置为未定义，格子随之显示 `N/A`。

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use tile_grid::{StateMap, StateValue};
use tracing::{debug, info};

use crate::error::{HostError, HostResult};

/// 单条状态事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    /// 生效的帧号
    pub frame: u64,
    /// 状态键
    pub key: String,
    /// 新值（任意 JSON）
    #[serde(default)]
    pub value: serde_json::Value,
}

/// 一帧内应用事件的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedTick {
    /// 值发生变化的键（按首次出现顺序，不重复）
    pub changed: Vec<String>,
}

impl FeedTick {
    /// 只有一个键变化时返回它，作为增量更新的提示
    pub fn hint(&self) -> Option<&str> {
        match self.changed.as_slice() {
            [key] => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    fn push(&mut self, key: &str) {
        if !self.changed.iter().any(|k| k == key) {
            self.changed.push(key.to_string());
        }
    }
}

/// 状态事件回放器
#[derive(Debug, Default)]
pub struct StateFeed {
    /// 待应用事件（按帧号排序）
    events: VecDeque<StateEvent>,
    /// 键 -> 最后一次收到事件的帧号
    last_seen: HashMap<String, u64>,
    /// 过期阈值（帧）
    stale_after: Option<u64>,
}

impl StateFeed {
    /// 由事件创建；同一帧内的事件保持原有顺序
    pub fn new(mut events: Vec<StateEvent>) -> Self {
        events.sort_by_key(|e| e.frame);
        Self {
            events: events.into(),
            last_seen: HashMap::new(),
            stale_after: None,
        }
    }

    /// 设置过期阈值（帧），`None` 表示永不过期
    pub fn with_stale_after(mut self, frames: Option<u64>) -> Self {
        self.stale_after = frames;
        self
    }

    /// 解析 JSON Lines 文本
    ///
    /// 空行与 `#` 开头的行被忽略；`source` 只用于错误信息。
    pub fn parse(text: &str, source: &Path) -> HostResult<Self> {
        let mut events = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event: StateEvent = serde_json::from_str(line)
                .map_err(|e| HostError::parse(source, format!("第 {} 行: {e}", index + 1)))?;
            events.push(event);
        }
        Ok(Self::new(events))
    }

    /// 读取事件文件
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| HostError::io(path, e))?;
        let feed = Self::parse(&text, path)?;
        info!(path = %path.display(), events = feed.pending(), "事件文件加载成功");
        Ok(feed)
    }

    /// 应用所有 `frame` 及之前的事件
    pub fn apply(&mut self, frame: u64, state: &mut StateMap) -> FeedTick {
        let mut tick = FeedTick::default();
        while self.events.front().is_some_and(|e| e.frame <= frame) {
            let Some(event) = self.events.pop_front() else {
                break;
            };
            let value = StateValue::from_json(&event.value);
            if state.set(event.key.as_str(), value) {
                tick.push(&event.key);
            }
            self.last_seen.insert(event.key, frame);
        }
        tick
    }

    /// 把超过阈值没有更新的键置为未定义
    ///
    /// # 返回
    /// 本次被置为未定义的键
    pub fn expire(&mut self, frame: u64, state: &mut StateMap) -> Vec<String> {
        let Some(limit) = self.stale_after else {
            return Vec::new();
        };

        let mut expired: Vec<String> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| frame.saturating_sub(**seen) >= limit)
            .map(|(key, _)| key.clone())
            .collect();
        expired.retain(|key| state.set(key.as_str(), StateValue::Undefined));
        expired.sort();

        for key in &expired {
            debug!(key = %key, frame, "状态过期");
        }
        expired
    }

    /// 剩余事件数
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// 事件是否已全部应用
    pub fn is_finished(&self) -> bool {
        self.events.is_empty()
    }
}
