//! # FDF 文档数据模型
//!
//! SCALE-UP 输入文件（FDF, Flexible Data Format）的内存表示。
//! 保留原始行序、注释与空行，修改后可以无损写回。
//!
//! ## 标签匹配规则
//! FDF 标签比较时忽略大小写以及 `_` `.` `-` 字符，
//! 即 `MC_nsweeps`、`mc.nsweeps`、`MCNSWEEPS` 指同一个设置。
//! 输出时保留原始拼写。
//!
//! ## 依赖关系
//! - 被 `parsers/fdf.rs`, `validate.rs`, `models/settings.rs`, `sweep/` 使用
//! - 无外部模块依赖

use std::fmt;

/// 规范化 FDF 标签（用于比较）
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '_' | '.' | '-'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 解析布尔值标记（.true. / T / yes ...）
pub fn parse_bool_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        ".true." | "t" | "true" | "yes" | ".t." => Some(true),
        ".false." | "f" | "false" | "no" | ".f." => Some(false),
        _ => None,
    }
}

/// 解析浮点数，接受 Fortran 风格指数 (1.0d-3)
pub fn parse_float_token(token: &str) -> Option<f64> {
    if let Ok(v) = token.parse::<f64>() {
        return Some(v);
    }
    if token.contains(['d', 'D']) {
        return token.replace(['d', 'D'], "e").parse::<f64>().ok();
    }
    None
}

/// FDF 标量值
#[derive(Debug, Clone, PartialEq)]
pub enum FdfValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FdfValue {
    /// 从单个标记推断类型
    pub fn from_token(token: &str) -> Self {
        if let Some(b) = parse_bool_token(token) {
            FdfValue::Bool(b)
        } else if let Ok(i) = token.parse::<i64>() {
            FdfValue::Int(i)
        } else if let Some(f) = parse_float_token(token) {
            FdfValue::Float(f)
        } else {
            FdfValue::Str(token.to_string())
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FdfValue::Int(_) | FdfValue::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FdfValue::Int(i) => Some(*i as f64),
            FdfValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FdfValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FdfValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 转换为写回文件的标记
    pub fn to_token(&self) -> String {
        match self {
            FdfValue::Bool(true) => ".true.".to_string(),
            FdfValue::Bool(false) => ".false.".to_string(),
            FdfValue::Int(i) => i.to_string(),
            FdfValue::Float(f) => format_float(*f),
            FdfValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for FdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_token())
    }
}

impl From<bool> for FdfValue {
    fn from(v: bool) -> Self {
        FdfValue::Bool(v)
    }
}

impl From<i64> for FdfValue {
    fn from(v: i64) -> Self {
        FdfValue::Int(v)
    }
}

impl From<f64> for FdfValue {
    fn from(v: f64) -> Self {
        FdfValue::Float(v)
    }
}

impl From<&str> for FdfValue {
    fn from(v: &str) -> Self {
        FdfValue::Str(v.to_string())
    }
}

/// 浮点数输出：整数值保留一位小数，以免被读成整数
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// 标量设置行：`Key value [unit] [# comment]`
#[derive(Debug, Clone, PartialEq)]
pub struct FdfScalar {
    /// 原始拼写的标签
    pub key: String,
    /// 标签后的所有标记
    pub tokens: Vec<String>,
    /// 行尾注释（不含 `#`）
    pub comment: Option<String>,
    /// 源文件行号（1 起），新建条目为 0
    pub line: usize,
}

impl FdfScalar {
    pub fn new(key: impl Into<String>, tokens: Vec<String>) -> Self {
        FdfScalar {
            key: key.into(),
            tokens,
            comment: None,
            line: 0,
        }
    }

    /// 值（第一个标记）；无标记的裸标签视为 `.true.`
    pub fn value(&self) -> FdfValue {
        match self.tokens.first() {
            Some(t) => FdfValue::from_token(t),
            None => FdfValue::Bool(true),
        }
    }

    /// 单位（数值后的第二个标记）
    pub fn unit(&self) -> Option<&str> {
        if self.value().is_numeric() {
            self.tokens.get(1).map(|s| s.as_str())
        } else {
            None
        }
    }

    /// 原始值字符串（所有标记）
    pub fn raw_value(&self) -> String {
        self.tokens.join(" ")
    }
}

/// 块设置：`%block Name` ... `%endblock Name`
#[derive(Debug, Clone, PartialEq)]
pub struct FdfBlock {
    pub name: String,
    pub rows: Vec<Vec<String>>,
    /// 各数据行的行尾注释（不含 `#`），与 `rows` 按下标对应
    pub comments: Vec<Option<String>>,
    pub line: usize,
}

impl FdfBlock {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        FdfBlock {
            name: name.into(),
            rows,
            comments: Vec::new(),
            line: 0,
        }
    }

    /// 第 `i` 行的行尾注释
    pub fn row_comment(&self, i: usize) -> Option<&str> {
        self.comments.get(i).and_then(|c| c.as_deref())
    }
}

/// 文档中的一项
#[derive(Debug, Clone, PartialEq)]
pub enum FdfEntry {
    Blank,
    /// 注释行（不含 `#`）
    Comment(String),
    Scalar(FdfScalar),
    Block(FdfBlock),
}

/// FDF 文档
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FdfDocument {
    pub entries: Vec<FdfEntry>,
}

impl FdfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有标量设置
    pub fn scalars(&self) -> impl Iterator<Item = &FdfScalar> {
        self.entries.iter().filter_map(|e| match e {
            FdfEntry::Scalar(s) => Some(s),
            _ => None,
        })
    }

    /// 所有块
    pub fn blocks(&self) -> impl Iterator<Item = &FdfBlock> {
        self.entries.iter().filter_map(|e| match e {
            FdfEntry::Block(b) => Some(b),
            _ => None,
        })
    }

    /// 查找标量设置（后出现者优先，与 SCALE-UP 读取行为一致）
    pub fn get(&self, key: &str) -> Option<&FdfScalar> {
        let norm = normalize_label(key);
        self.scalars()
            .filter(|s| normalize_label(&s.key) == norm)
            .last()
    }

    /// 查找块
    pub fn get_block(&self, name: &str) -> Option<&FdfBlock> {
        let norm = normalize_label(name);
        self.blocks()
            .filter(|b| normalize_label(&b.name) == norm)
            .last()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some() || self.get_block(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).map(|s| s.raw_value())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|s| s.value().as_bool())
    }

    fn scalar_mut(&mut self, key: &str) -> Option<&mut FdfScalar> {
        let norm = normalize_label(key);
        self.entries
            .iter_mut()
            .rev()
            .find_map(|e| match e {
                FdfEntry::Scalar(s) if normalize_label(&s.key) == norm => Some(s),
                _ => None,
            })
    }

    /// 设置标量的全部标记；不存在时追加到末尾
    pub fn set_scalar(&mut self, key: &str, tokens: Vec<String>) {
        if let Some(scalar) = self.scalar_mut(key) {
            scalar.tokens = tokens;
        } else {
            self.entries
                .push(FdfEntry::Scalar(FdfScalar::new(key, tokens)));
        }
    }

    /// 设置标量值，保留已有单位
    pub fn set_value(&mut self, key: &str, value: impl Into<FdfValue>) {
        let token = value.into().to_token();
        if let Some(scalar) = self.scalar_mut(key) {
            let unit = scalar.unit().map(|u| u.to_string());
            scalar.tokens = std::iter::once(token).chain(unit).collect();
        } else {
            self.entries
                .push(FdfEntry::Scalar(FdfScalar::new(key, vec![token])));
        }
    }

    /// 设置带单位的数值
    pub fn set_with_unit(&mut self, key: &str, value: impl Into<FdfValue>, unit: &str) {
        self.set_scalar(key, vec![value.into().to_token(), unit.to_string()]);
    }

    /// 替换或追加块
    pub fn set_block(&mut self, name: &str, rows: Vec<Vec<String>>) {
        let norm = normalize_label(name);
        let existing = self.entries.iter_mut().rev().find_map(|e| match e {
            FdfEntry::Block(b) if normalize_label(&b.name) == norm => Some(b),
            _ => None,
        });

        match existing {
            Some(block) => {
                block.rows = rows;
                block.comments.clear();
            }
            None => self.entries.push(FdfEntry::Block(FdfBlock::new(name, rows))),
        }
    }

    /// 删除同名的标量和块，返回删除数量
    pub fn remove(&mut self, key: &str) -> usize {
        let norm = normalize_label(key);
        let before = self.entries.len();
        self.entries.retain(|e| match e {
            FdfEntry::Scalar(s) => normalize_label(&s.key) != norm,
            FdfEntry::Block(b) => normalize_label(&b.name) != norm,
            _ => true,
        });
        before - self.entries.len()
    }
}

#[cfg(test)]
impl FdfDocument {
    pub(crate) fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|s| s.value().as_i64())
    }

    pub(crate) fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|s| s.value().as_f64())
    }
}
