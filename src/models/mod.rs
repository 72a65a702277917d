//! # 数据模型模块
//!
//! 定义 FDF 输入文件、SCALE-UP 设置、超胞几何结构与批量模拟记录。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `sweep/`, `results/`, `analysis/`, `commands/` 使用
//! - 子模块: fdf, settings, geometry, setup

pub mod fdf;
pub mod geometry;
pub mod settings;
pub mod setup;

pub use fdf::{FdfDocument, FdfEntry};
pub use geometry::Geometry;
pub use settings::{ScupSettings, SettingOverrides};
pub use setup::{ConfigId, SimulationSetup};
