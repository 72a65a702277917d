//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `fdf`: FDF 输入文件（嵌套子命令 check / show / set）
//! - `sweep`: 参数扫描批量模拟
//! - `geometry`: .restart 几何文件（嵌套子命令 strain / average）
//! - `analyze`: 结果分析（嵌套子命令 config / polarization / strain）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: fdf, sweep, geometry, analyze

pub mod analyze;
pub mod fdf;
pub mod geometry;
pub mod sweep;

use clap::{ArgAction, Parser, Subcommand};

/// scupkit - SCALE-UP 输入、批量模拟与分析工具箱
#[derive(Parser)]
#[command(name = "scupkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Input deck, sweep and analysis toolkit for SCALE-UP lattice Monte Carlo", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Check, show and edit FDF input decks
    Fdf(fdf::FdfArgs),

    /// Run a temperature / stress / strain / field sweep
    Sweep(sweep::SweepArgs),

    /// Create and average .restart geometry files
    Geometry(geometry::GeometryArgs),

    /// Analyze a finished sweep
    Analyze(analyze::AnalyzeArgs),
}
