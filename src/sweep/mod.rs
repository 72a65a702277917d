//! # Monte Carlo 参数扫描模块
//!
//! 温度、应力、应变、电场的组合扫描：生成构型、准备目录、运行 SCALE-UP。
//!
//! ## 依赖关系
//! - 被 `commands/sweep.rs` 使用
//! - 使用 `models/`, `parsers/`
//! - 子模块: plan, stage, scaleup

pub mod plan;
pub mod scaleup;
pub mod stage;

pub use plan::{parse_temperatures, parse_vector, SweepPlan};
pub use stage::{StageContext, StagedRun};
