//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `sweep/`, `results/`, `analysis/`, `utils/`
//! - 子模块: fdf, sweep, geometry, analyze

pub mod analyze;
pub mod fdf;
pub mod geometry;
pub mod sweep;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Fdf(args) => fdf::execute(args),
        Commands::Sweep(args) => sweep::execute(args),
        Commands::Geometry(args) => geometry::execute(args),
        Commands::Analyze(args) => analyze::execute(args),
    }
}
