//! # fdf 子命令 CLI 定义
//!
//! FDF 输入文件的检查、显示与修改
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fdf.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// fdf 主命令参数
#[derive(Args, Debug)]
pub struct FdfArgs {
    #[command(subcommand)]
    pub command: FdfCommands,
}

/// fdf 子命令
#[derive(Subcommand, Debug)]
pub enum FdfCommands {
    /// Check FDF decks for syntax and known-setting errors
    Check(CheckArgs),

    /// Show the settings of an FDF deck
    Show(ShowArgs),

    /// Set scalar values or blocks in an FDF deck
    Set(SetArgs),
}

// ─────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input FDF file or directory
    pub input: PathBuf,

    /// File patterns when the input is a directory (comma-separated)
    #[arg(short, long, default_value = "*.fdf")]
    pub pattern: String,

    /// Search directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Treat warnings as errors
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Number of parallel jobs (0 = all CPUs)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,
}

// ─────────────────────────────────────────────────────────────
// show
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Input FDF file
    pub input: PathBuf,

    /// Only show these keys (repeatable)
    #[arg(short, long)]
    pub key: Vec<String>,
}

// ─────────────────────────────────────────────────────────────
// set
// ─────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Input FDF file
    pub input: PathBuf,

    /// Scalar assignments, e.g. MC_nsweeps=40000 or "MC_temperature=20 kelvin"
    pub assignments: Vec<String>,

    /// Block assignments, rows separated by ';', e.g. "Supercell=8 8 8"
    #[arg(short, long)]
    pub block: Vec<String>,

    /// Remove keys or blocks (repeatable)
    #[arg(long)]
    pub remove: Vec<String>,

    /// Output file (defaults to editing the input in place)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
