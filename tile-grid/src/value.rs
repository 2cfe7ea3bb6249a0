//! # Value 模块
//!
//! 外部状态的显式建模。
//!
//! 上游集成（MQTT / Home Assistant）给出的值是松散类型的，
//! 这里统一收敛为 [`StateValue`]，并提供**全函数**的类型转换：
//! 缺失的键、类型不符的值都是可表示的状态，而不是错误。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// 上游用来表示"无值"的字符串
const UNDEFINED_MARKERS: &[&str] = &["unknown", "unavailable", "none", "null", "n/a"];

/// 视为 `true` 的字符串
const TRUTHY: &[&str] = &["on", "true", "yes", "home", "open", "detected", "1"];

/// 视为 `false` 的字符串
const FALSY: &[&str] = &["off", "false", "no", "not_home", "closed", "clear", "0"];

/// 缺失值的显示文本
pub const NOT_AVAILABLE: &str = "N/A";

/// 传感器状态值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StateValue {
    /// 未定义（键缺失、上游报告 unknown 等）
    #[default]
    Undefined,
    /// 布尔值
    Bool(bool),
    /// 数值
    Number(f64),
    /// 字符串
    String(String),
}

static UNDEFINED: StateValue = StateValue::Undefined;

impl StateValue {
    /// 从 JSON 值转换
    ///
    /// 数组、对象和非有限数值都视为未定义。
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Undefined,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map_or(Self::Undefined, Self::Number),
            Value::String(s) => Self::from_text(s),
            Value::Array(_) | Value::Object(_) => Self::Undefined,
        }
    }

    /// 从文本转换（去除首尾空白，识别 unknown 等标记）
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || is_marker(trimmed, UNDEFINED_MARKERS) {
            Self::Undefined
        } else {
            Self::String(trimmed.to_string())
        }
    }

    /// 是否未定义
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// 转换为数值
    ///
    /// 数字字符串会被解析；布尔值映射为 1/0。
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Self::Undefined => None,
        }
    }

    /// 转换为布尔值
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) if n.is_finite() => Some(*n != 0.0),
            Self::Number(_) => None,
            Self::String(s) if is_marker(s, TRUTHY) => Some(true),
            Self::String(s) if is_marker(s, FALSY) => Some(false),
            Self::String(_) | Self::Undefined => None,
        }
    }

    /// 转换为文本
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Undefined => None,
            Self::Bool(b) => Some(if *b { "on" } else { "off" }.to_string()),
            Self::Number(n) => Some(format_number(*n, None)),
            Self::String(s) => Some(s.clone()),
        }
    }

    /// 格式化用于显示
    ///
    /// `precision` 只作用于数值（包括可解析为数值的字符串）。
    /// 未定义的值显示为 `N/A`。
    pub fn display(&self, precision: Option<usize>) -> String {
        match (self, precision) {
            (Self::Undefined, _) => NOT_AVAILABLE.to_string(),
            (Self::Number(n), p) => format_number(*n, p),
            (Self::String(s), Some(p)) => match self.as_number() {
                Some(n) => format_number(n, Some(p)),
                None => s.clone(),
            },
            _ => self.as_text().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

fn is_marker(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.trim().eq_ignore_ascii_case(m))
}

fn format_number(n: f64, precision: Option<usize>) -> String {
    if !n.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    match precision {
        Some(p) => format!("{n:.p$}"),
        None if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        None => format!("{n}"),
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Undefined
        }
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::from_text(&value)
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(&value)
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|v| Self::from_json(&v))
    }
}

/// 外部状态映射（键为点分传感器标识，如 `sensor.speedtest_download_average`）
///
/// 引擎只读取，不修改；读取缺失的键得到 [`StateValue::Undefined`]。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateMap {
    values: HashMap<String, StateValue>,
}

impl StateMap {
    /// 创建空映射
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取值（缺失时为未定义）
    pub fn get(&self, key: &str) -> &StateValue {
        self.values.get(key).unwrap_or(&UNDEFINED)
    }

    /// 写入值
    ///
    /// # 返回
    /// - `true`: 值发生了变化
    /// - `false`: 与原值相同
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StateValue>) -> bool {
        let value = value.into();
        let key = key.into();
        if self.values.get(&key) == Some(&value) {
            return false;
        }
        self.values.insert(key, value);
        true
    }

    /// 移除值
    pub fn remove(&mut self, key: &str) -> Option<StateValue> {
        self.values.remove(key)
    }

    /// 是否包含该键
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 键数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 遍历所有键值
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 从 JSON 对象构建（非对象输入得到空映射）
    pub fn from_json_object(value: &serde_json::Value) -> Self {
        value
            .as_object()
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), StateValue::from_json(v)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<K, V> FromIterator<(K, V)> for StateMap
where
    K: Into<String>,
    V: Into<StateValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
