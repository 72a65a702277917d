//! # 解析器模块
//!
//! SCALE-UP 输入与几何文件的解析和写出。
//!
//! ## 依赖关系
//! - 被 `commands/`, `sweep/`, `results/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: fdf, restart

pub mod fdf;
pub mod restart;

use crate::error::{Result, ScupError};
use std::path::Path;

/// 几何文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Restart,
    Reference,
}

/// 从文件扩展名推断几何文件类型
pub fn geometry_kind(path: &Path) -> Result<GeometryKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "restart" => Ok(GeometryKind::Restart),
        "ref" => Ok(GeometryKind::Reference),
        _ => Err(ScupError::UnsupportedFormat(format!(
            "Cannot determine geometry format for: {}",
            path.display()
        ))),
    }
}
