//! # Runner 模块
//!
//! 无头帧循环：事件回放 → Grid 更新 → 面板合成 → 帧输出。
//!
//! ## 每帧流程
//!
//! ```text
//! StateFeed::apply ──► (全量帧) StateFeed::expire
//!        │
//!        ▼
//! Grid::update(changed_key)  ── 全量帧 / 多键变化时为 None
//!        │
//!        ▼ dirty?
//! Panel::present ──► FrameSink::write
//! ```

use std::fs;
use tile_grid::{FrameReport, Grid, GridLayout, Rasterizer, StateMap};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, EngineConfig};
use crate::error::{HostError, HostResult};
use crate::feed::StateFeed;
use crate::renderer::{FontRasterizer, FrameSink, Panel};

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// 已执行的帧数
    pub frames: u64,
    /// 需要重绘的帧数
    pub dirty_frames: u64,
    /// 写出的帧数
    pub written_frames: u64,
    /// 全量检查次数
    pub full_passes: u64,
    /// 单键增量更新次数
    pub event_passes: u64,
    /// 过期的键（累计）
    pub expired_keys: u64,
}

/// 帧循环
pub struct Runner {
    grid: Grid,
    state: StateMap,
    feed: StateFeed,
    raster: Box<dyn Rasterizer>,
    panel: Panel,
    sink: Option<FrameSink>,
    engine: EngineConfig,
    only_dirty: bool,
    stats_interval: u64,
    frame: u64,
    stats: RunStats,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("frame", &self.frame)
            .field("bounds", &self.grid.bounds())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// 组装帧循环；帧节奏参数无效时返回配置错误
    pub fn new(
        grid: Grid,
        feed: StateFeed,
        raster: Box<dyn Rasterizer>,
        panel: Panel,
        engine: EngineConfig,
    ) -> HostResult<Self> {
        engine.validate()?;
        let feed = feed.with_stale_after(engine.stale_after_frames());
        Ok(Self {
            grid,
            state: StateMap::new(),
            feed,
            raster,
            panel,
            sink: None,
            engine,
            only_dirty: true,
            stats_interval: 0,
            frame: 0,
            stats: RunStats::default(),
        })
    }

    /// 写出帧到 `sink`
    pub fn with_sink(mut self, sink: FrameSink, only_dirty: bool) -> Self {
        self.sink = Some(sink);
        self.only_dirty = only_dirty;
        self
    }

    /// 每隔 `frames` 帧输出一次缓存统计（0 表示关闭）
    pub fn with_stats_interval(mut self, frames: u64) -> Self {
        self.stats_interval = frames;
        self
    }

    /// 按配置加载布局、字体、事件与输出目录
    pub fn from_config(config: &AppConfig) -> HostResult<Self> {
        let path = &config.layout_path;
        let text = fs::read_to_string(path).map_err(|e| HostError::io(path, e))?;
        let mut layout = GridLayout::from_json(&text)?;

        if let Some(size) = config.fonts.label_size {
            layout.defaults.label_size = size;
        }
        if let Some(size) = config.fonts.icon_size {
            layout.defaults.icon_size = size;
        }
        for issue in layout.validate().iter().filter(|i| !i.is_error()) {
            warn!(location = %issue.location, message = %issue.message, "布局警告");
        }
        let grid = layout.build()?;
        info!(
            path = %path.display(),
            columns = grid.columns().len(),
            cells = grid.cell_count(),
            "布局加载成功"
        );

        let feed = match &config.events_path {
            Some(events) => StateFeed::load(events)?,
            None => StateFeed::default(),
        };
        let raster = FontRasterizer::load(&config.fonts)?;
        let panel = Panel::new(&config.panel);

        let mut runner = Self::new(grid, feed, Box::new(raster), panel, config.engine.clone())?
            .with_stats_interval(config.debug.stats_interval);
        if config.output.write_frames {
            let sink = FrameSink::new(&config.output.dir)?;
            runner = runner.with_sink(sink, config.output.only_dirty);
        }
        Ok(runner)
    }

    /// 执行一帧
    pub fn step(&mut self) -> HostResult<FrameReport> {
        let frame = self.frame;
        let tick = self.feed.apply(frame, &mut self.state);

        let full = frame % self.engine.full_refresh_interval == 0;
        if full {
            let expired = self.feed.expire(frame, &mut self.state);
            self.stats.expired_keys += expired.len() as u64;
        }

        // 过期也会改变状态，因此全量帧不使用增量提示
        let changed_key = if full { None } else { tick.hint() };
        match changed_key {
            Some(_) => self.stats.event_passes += 1,
            None => self.stats.full_passes += 1,
        }

        let mut report = self.grid.update(&self.state, changed_key, &*self.raster)?;
        if frame == 0 && !self.engine.animate_on_start {
            self.grid.snap();
            report = self.grid.update(&self.state, None, &*self.raster)?;
        }

        if report.dirty {
            self.stats.dirty_frames += 1;
            self.panel.present(self.grid.bitmap());
        }
        if let Some(sink) = &mut self.sink
            && (report.dirty || !self.only_dirty)
        {
            sink.write(frame, self.panel.image())?;
            self.stats.written_frames += 1;
        }

        if self.stats_interval > 0 && frame % self.stats_interval == 0 {
            debug!(frame, stats = %self.grid.cache_stats().format(), "缓存统计");
        }

        self.frame += 1;
        self.stats.frames += 1;
        Ok(report)
    }

    /// 连续执行 `frames` 帧
    pub fn run(&mut self, frames: u64) -> HostResult<RunStats> {
        for _ in 0..frames {
            self.step()?;
        }
        info!(
            frames = self.stats.frames,
            dirty = self.stats.dirty_frames,
            written = self.stats.written_frames,
            pending_events = self.feed.pending(),
            "运行结束"
        );
        info!("{}", self.grid.cache_stats().format());
        Ok(self.stats)
    }

    /// 下一帧的帧号
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }
}
