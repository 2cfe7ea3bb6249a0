//! # Tile 模块
//!
//! 格子"种类"的声明式描述。
//!
//! 每种格子不是一个类型，而是一个值：监听哪个键、如何生成文字、
//! 何时打开、用什么配色，全部由闭包组合而成。
//!
//! ```rust,ignore
//! let download = TileKind::threshold("sensor.speedtest_download", Comparison::Below, 100.0)
//!     .with_label(|v| format!("{} Mb/s", v.display(Some(0))));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::color::CellColors;
use crate::value::StateValue;

/// 文字生成函数
pub type LabelFormat = Box<dyn Fn(&StateValue) -> String>;
/// 打开条件
pub type OpenPredicate = Box<dyn Fn(&StateValue) -> bool>;
/// 配色规则（第二个参数为当前是否打开）
pub type ColorRule = Box<dyn Fn(&StateValue, bool) -> CellColors>;

/// 数值比较方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// 大于阈值
    #[serde(rename = ">")]
    Above,
    /// 小于阈值
    #[serde(rename = "<")]
    Below,
}

impl Comparison {
    /// 判断 `value` 与 `threshold` 是否满足该方向
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Above => value > threshold,
            Comparison::Below => value < threshold,
        }
    }
}

/// 格子种类
pub struct TileKind {
    entity_key: String,
    label_format: LabelFormat,
    open_predicate: OpenPredicate,
    color_rule: ColorRule,
}

impl TileKind {
    /// 监听 `entity_key` 的格子：默认显示值本身、始终关闭、默认配色
    pub fn new(entity_key: impl Into<String>) -> Self {
        Self {
            entity_key: entity_key.into(),
            label_format: Box::new(|value| value.display(None)),
            open_predicate: Box::new(|_| false),
            color_rule: Box::new(|_, _| CellColors::default()),
        }
    }

    /// 数值阈值格子：数值满足比较方向时打开
    ///
    /// 非数值或缺失时保持关闭。
    pub fn threshold(
        entity_key: impl Into<String>,
        comparison: Comparison,
        threshold: f64,
    ) -> Self {
        Self::new(entity_key).with_predicate(move |value| {
            value
                .as_number()
                .is_some_and(|n| comparison.holds(n, threshold))
        })
    }

    /// 布尔格子：值为真时打开（`invert` 时取反）
    ///
    /// 无法判断真假的值一律关闭，取反时也一样。
    pub fn binary(entity_key: impl Into<String>, invert: bool) -> Self {
        Self::new(entity_key).with_predicate(move |value| value.as_bool() == Some(!invert))
    }

    /// 枚举格子：字符串与 `states` 中任一项完全相等时打开
    pub fn state_match<S: Into<String>>(
        entity_key: impl Into<String>,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        let states: Vec<String> = states.into_iter().map(Into::into).collect();
        Self::new(entity_key).with_predicate(move |value| match value {
            StateValue::String(s) => states.iter().any(|state| state == s),
            _ => false,
        })
    }

    /// 静态格子：不监听任何键，不参与缓存
    pub fn fixed(label: impl Into<String>, open: bool) -> Self {
        let label = label.into();
        Self::new("")
            .with_label(move |_| label.clone())
            .with_predicate(move |_| open)
    }

    /// 替换文字生成函数
    pub fn with_label(mut self, format: impl Fn(&StateValue) -> String + 'static) -> Self {
        self.label_format = Box::new(format);
        self
    }

    /// 替换打开条件
    pub fn with_predicate(mut self, predicate: impl Fn(&StateValue) -> bool + 'static) -> Self {
        self.open_predicate = Box::new(predicate);
        self
    }

    /// 替换配色规则
    pub fn with_color_rule(
        mut self,
        rule: impl Fn(&StateValue, bool) -> CellColors + 'static,
    ) -> Self {
        self.color_rule = Box::new(rule);
        self
    }

    /// 固定配色
    pub fn with_colors(self, colors: CellColors) -> Self {
        self.with_color_rule(move |_, _| colors)
    }

    /// 监听的键（空串表示不监听）
    pub fn entity_key(&self) -> &str {
        &self.entity_key
    }

    /// 生成文字
    pub fn label(&self, value: &StateValue) -> String {
        (self.label_format)(value)
    }

    /// 是否打开
    pub fn is_open(&self, value: &StateValue) -> bool {
        (self.open_predicate)(value)
    }

    /// 配色
    pub fn colors(&self, value: &StateValue, open: bool) -> CellColors {
        (self.color_rule)(value, open)
    }
}

impl fmt::Debug for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileKind")
            .field("entity_key", &self.entity_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_threshold_directions() {
        let above = TileKind::threshold("sensor.x", Comparison::Above, 500.0);
        assert!(above.is_open(&StateValue::from(600)));
        assert!(!above.is_open(&StateValue::from(500)));
        assert!(above.is_open(&StateValue::from("501.5")));

        let below = TileKind::threshold("sensor.x", Comparison::Below, 10.0);
        assert!(below.is_open(&StateValue::from(9.9)));
        assert!(!below.is_open(&StateValue::from(10)));
    }

    #[test]
    fn test_threshold_fails_closed() {
        let kind = TileKind::threshold("sensor.x", Comparison::Below, 10.0);
        assert!(!kind.is_open(&StateValue::Undefined));
        assert!(!kind.is_open(&StateValue::from("fast")));
    }

    #[test]
    fn test_binary() {
        let kind = TileKind::binary("binary_sensor.door", false);
        assert!(kind.is_open(&StateValue::from("on")));
        assert!(!kind.is_open(&StateValue::from("off")));
        assert!(!kind.is_open(&StateValue::Undefined));

        let inverted = TileKind::binary("binary_sensor.door", true);
        assert!(inverted.is_open(&StateValue::from(false)));
        assert!(!inverted.is_open(&StateValue::from(true)));
        assert!(!inverted.is_open(&StateValue::from("garbage")));
    }

    #[test]
    fn test_state_match_is_exact() {
        let kind = TileKind::state_match("climate.mode", ["heat", "cool"]);
        assert!(kind.is_open(&StateValue::from("heat")));
        assert!(!kind.is_open(&StateValue::from("Heat")));
        assert!(!kind.is_open(&StateValue::from("off")));
        assert!(!kind.is_open(&StateValue::from(1)));
    }

    #[test]
    fn test_fixed_tile() {
        let kind = TileKind::fixed("hello", true);
        assert_eq!(kind.entity_key(), "");
        assert_eq!(kind.label(&StateValue::Undefined), "hello");
        assert!(kind.is_open(&StateValue::Undefined));
    }

    #[test]
    fn test_default_label_and_color_rule() {
        let warn = CellColors {
            cell_bg: Color::rgb(0x80, 0, 0),
            ..CellColors::default()
        };
        let kind = TileKind::new("sensor.t")
            .with_color_rule(move |_, open| if open { warn } else { CellColors::default() });
        assert_eq!(kind.label(&StateValue::Undefined), "N/A");
        assert_eq!(kind.label(&StateValue::from(21)), "21");
        assert_eq!(kind.colors(&StateValue::Undefined, true), warn);
        assert_eq!(
            kind.colors(&StateValue::Undefined, false),
            CellColors::default()
        );
    }
}
