//! # Tile Cache 模块
//!
//! 格子位图缓存，以监听的键为槽位。
//!
//! 缓存由 `Grid` 持有，不是进程级全局状态，多个 Grid 彼此独立。
//! 监听同一个键的多个格子共用同一槽位，后写入者覆盖先写入者。

use image::RgbaImage;
use std::collections::HashMap;

use crate::color::CellColors;
use crate::value::StateValue;

/// 渲染指纹
///
/// 记录生成位图时的输入；输入不变则位图可信。
/// 同时比较原始值和生成的文字，派生文字（如超时后的 N/A）也能被发现。
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    /// 键对应的值
    pub value: StateValue,
    /// 文字
    pub label: String,
    /// 配色
    pub colors: CellColors,
    /// 图标码位
    pub icon: Option<char>,
}

/// 缓存条目
#[derive(Debug)]
struct CacheEntry {
    fingerprint: Fingerprint,
    bitmap: RgbaImage,
}

/// 格子位图缓存
#[derive(Debug, Default)]
pub struct TileCache {
    /// 缓存条目（键 -> 条目）
    entries: HashMap<String, CacheEntry>,
    /// 统计：命中次数
    hits: u64,
    /// 统计：未命中次数（重新渲染）
    misses: u64,
    /// 统计：不参与缓存的渲染次数
    uncached: u64,
}

impl TileCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取位图
    pub fn get(&self, key: &str) -> Option<&RgbaImage> {
        self.entries.get(key).map(|e| &e.bitmap)
    }

    /// 检查是否存在
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 槽位内容是否由相同的输入生成
    pub fn is_fresh(&self, key: &str, fingerprint: &Fingerprint) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| &e.fingerprint == fingerprint)
    }

    /// 写入槽位
    ///
    /// # 返回
    /// 像素是否与旧内容不同（没有旧内容时为 `true`）
    pub fn insert(&mut self, key: &str, fingerprint: Fingerprint, bitmap: RgbaImage) -> bool {
        let changed = self.get(key) != Some(&bitmap);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                fingerprint,
                bitmap,
            },
        );
        changed
    }

    /// 移除槽位
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// 清空缓存
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_uncached(&mut self) {
        self.uncached += 1;
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            uncached: self.uncached,
            hit_rate: if lookups > 0 {
                self.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }

    /// 重置统计
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.uncached = 0;
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// 缓存条目数量
    pub entries: usize,
    /// 命中次数
    pub hits: u64,
    /// 未命中次数
    pub misses: u64,
    /// 不参与缓存的渲染次数
    pub uncached: u64,
    /// 命中率
    pub hit_rate: f64,
}

impl CacheStats {
    /// 总渲染次数
    pub fn renders(&self) -> u64 {
        self.misses + self.uncached
    }

    /// 格式化为可读字符串
    pub fn format(&self) -> String {
        format!(
            "TileCache: {} entries, hit rate: {:.1}% ({} hits / {} misses), uncached renders: {}",
            self.entries,
            self.hit_rate * 100.0,
            self.hits,
            self.misses,
            self.uncached,
        )
    }
}
