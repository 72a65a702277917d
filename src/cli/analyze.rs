//! # analyze 子命令 CLI 定义
//!
//! 批量模拟结果分析，包含多个子命令：
//! - `config`: 单个构型的概要
//! - `polarization`: 各温度的宏观极化
//! - `strain`: 各温度的平均应变
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze/` 相应模块

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// Analyze 主命令
// ─────────────────────────────────────────────────────────────

/// analyze 主命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(subcommand)]
    pub command: AnalyzeCommands,
}

/// analyze 子命令
#[derive(Subcommand, Debug)]
pub enum AnalyzeCommands {
    /// Summarize one simulated configuration
    Config(ConfigArgs),

    /// Macroscopic polarization from Born effective charges
    Polarization(PolarizationArgs),

    /// Average strains and c/a ratio
    Strain(StrainArgs),
}

/// 选择构型的公共参数
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Sweep output folder
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Stress vector of the configuration (defaults to zero)
    #[arg(long, value_name = "XX,YY,ZZ,YZ,XZ,XY")]
    pub stress: Option<String>,

    /// Strain vector of the configuration (defaults to zero)
    #[arg(long, value_name = "XX,YY,ZZ,YZ,XZ,XY")]
    pub strain: Option<String>,

    /// Field vector of the configuration (defaults to zero)
    #[arg(long, value_name = "X,Y,Z")]
    pub field: Option<String>,

    /// MC equilibration steps (defaults to the value recorded by the sweep)
    #[arg(long)]
    pub equilibration_steps: Option<u64>,
}

// ─────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Temperature in K
    #[arg(short, long)]
    pub temp: f64,

    /// Write the averaged geometry (.restart) or the reference structure (.REF)
    #[arg(short, long)]
    pub write: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────
// polarization
// ─────────────────────────────────────────────────────────────

/// 极化的空间分辨方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PolarizationMode {
    /// Whole supercell, per partial file
    Total,
    /// Per z layer of the averaged geometry
    Layers,
    /// Per (x, y) column of the averaged geometry
    Columns,
}

#[derive(Args, Debug)]
pub struct PolarizationArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Born charges CSV with header "index,zx,zy,zz"
    #[arg(short, long)]
    pub born: PathBuf,

    /// Temperatures to analyze (defaults to every recorded temperature)
    #[arg(short, long)]
    pub temps: Option<String>,

    /// Polarization mode
    #[arg(long, value_enum, default_value = "total")]
    pub mode: PolarizationMode,

    /// Average absolute values of each component
    #[arg(long, default_value_t = false)]
    pub abs: bool,

    /// Output CSV file
    #[arg(long, default_value = "polarization.csv")]
    pub csv: PathBuf,

    /// Output plot (.png or .svg)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────
// strain
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct StrainArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Temperatures to analyze (defaults to every recorded temperature)
    #[arg(short, long)]
    pub temps: Option<String>,

    /// Do not rotate axes so that the largest strain is reported as z
    #[arg(long, default_value_t = false)]
    pub no_rotate: bool,

    /// Output CSV file
    #[arg(long, default_value = "strain.csv")]
    pub csv: PathBuf,

    /// Output plot (.png or .svg)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
