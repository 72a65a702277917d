//! # 结果分析模块
//!
//! 由平均几何结构与 partial 文件计算极化、应变统计，并导出 CSV 与图表。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/` 使用
//! - 使用 `models/`, `parsers/restart.rs`
//! - 子模块: polarization, stats, export, plot

pub mod export;
pub mod plot;
pub mod polarization;
pub mod stats;

pub use export::TemperatureSeries;
pub use polarization::BornCharges;
pub use stats::Stats3;
