//! # geometry 子命令 CLI 定义
//!
//! .restart 几何文件的生成与平均
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/geometry.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// geometry 主命令参数
#[derive(Args, Debug)]
pub struct GeometryArgs {
    #[command(subcommand)]
    pub command: GeometryCommands,
}

/// geometry 子命令
#[derive(Subcommand, Debug)]
pub enum GeometryCommands {
    /// Write a zero-displacement .restart file with a given strain
    Strain(StrainArgs),

    /// Average partial .restart files into one equilibrium geometry
    Average(AverageArgs),
}

/// 超胞描述
#[derive(Args, Debug)]
pub struct CellArgs {
    /// Supercell shape, e.g. "8,8,8"
    #[arg(long)]
    pub supercell: String,

    /// Atomic species, e.g. "Sr,Ti,O"
    #[arg(long, value_delimiter = ',', required = true)]
    pub species: Vec<String>,

    /// Atoms per unit cell
    #[arg(long)]
    pub nats: usize,
}

#[derive(Args, Debug)]
pub struct StrainArgs {
    #[command(flatten)]
    pub cell: CellArgs,

    /// Strain, 6 Voigt components
    #[arg(long, value_name = "XX,YY,ZZ,YZ,XZ,XY")]
    pub strain: String,

    /// Output .restart file
    #[arg(short, long, default_value = "strained.restart")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct AverageArgs {
    /// Partial .restart files or glob patterns
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Only use partials above this MC step
    #[arg(long)]
    pub after_step: Option<u64>,

    /// Output .restart file
    #[arg(short, long, default_value = "average.restart")]
    pub output: PathBuf,
}
