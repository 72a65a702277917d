//! # sweep 子命令 CLI 定义
//!
//! 温度 / 应力 / 应变 / 电场参数扫描
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/sweep.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 作业调度方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Scheduler {
    /// Run SCALE-UP directly on this machine
    Local,
    /// Write one sbatch script per configuration
    Slurm,
}

/// sweep 子命令参数
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Base FDF input deck
    pub fdf: PathBuf,

    /// Temperatures in K: "20,40,60" or "start:stop:count"
    #[arg(short, long)]
    pub temps: String,

    /// External stress in GPa, 6 Voigt components (repeatable)
    #[arg(long, value_name = "XX,YY,ZZ,YZ,XZ,XY")]
    pub stress: Vec<String>,

    /// Strain, 6 Voigt components (repeatable)
    #[arg(long, value_name = "XX,YY,ZZ,YZ,XZ,XY")]
    pub strain: Vec<String>,

    /// Static electric field in V/m, 3 components (repeatable)
    #[arg(long, value_name = "X,Y,Z")]
    pub field: Vec<String>,

    /// Output folder
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Remove an existing output folder first
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    // ─────────────────────────────────────────────────────────────
    // Supercell (recorded for analysis; needed for strain sweeps)
    // ─────────────────────────────────────────────────────────────
    /// Supercell shape, e.g. "8,8,8" (defaults to the deck's Supercell block)
    #[arg(long)]
    pub supercell: Option<String>,

    /// Atomic species, e.g. "Sr,Ti,O"
    #[arg(long, value_delimiter = ',')]
    pub species: Vec<String>,

    /// Atoms per unit cell
    #[arg(long)]
    pub nats: Option<usize>,

    // ─────────────────────────────────────────────────────────────
    // Monte Carlo overrides
    // ─────────────────────────────────────────────────────────────
    /// Total MC sweeps (MC_nsweeps)
    #[arg(long)]
    pub mc_steps: Option<u64>,

    /// Steps between partial geometry files (n_write_mc)
    #[arg(long)]
    pub mc_step_interval: Option<u64>,

    /// Maximum MC displacement in bohr (MC_max_step_d)
    #[arg(long)]
    pub mc_max_jump: Option<f64>,

    /// Steps between lattice outputs (Print_std_lattice_nsteps)
    #[arg(long)]
    pub lattice_output_interval: Option<u64>,

    /// Fixed strain components as six T/F flags, e.g. "TTFFFF"
    #[arg(long)]
    pub fix_strain: Option<String>,

    /// Equilibration steps recorded for later analysis
    #[arg(long)]
    pub equilibration_steps: Option<u64>,

    // ─────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────
    /// SCALE-UP executable
    #[arg(long, env = "SCUP_EXEC")]
    pub exec: Option<String>,

    /// How to run each configuration
    #[arg(long, value_enum, default_value = "local")]
    pub scheduler: Scheduler,

    /// Configurations run concurrently in local mode (0 = all CPUs)
    #[arg(short = 'j', long, default_value_t = 1)]
    pub jobs: usize,

    /// Only stage the configuration folders, do not run
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    // ─────────────────────────────────────────────────────────────
    // Slurm options
    // ─────────────────────────────────────────────────────────────
    /// Submit the generated sbatch scripts
    #[arg(long, default_value_t = false)]
    pub submit: bool,

    /// Slurm partition
    #[arg(long, default_value = "cpu")]
    pub partition: String,

    /// Slurm constraint
    #[arg(long)]
    pub constraint: Option<String>,

    /// Number of tasks
    #[arg(long, default_value_t = 1)]
    pub ntasks: u32,

    /// CPUs per task
    #[arg(long, default_value_t = 1)]
    pub cpus_per_task: u32,

    /// Memory per CPU
    #[arg(long, default_value = "2G")]
    pub mem_per_cpu: String,

    /// Time limit (e.g., '24:00:00')
    #[arg(long, default_value = "24:00:00")]
    pub time: String,

    /// Modules to load in the job script (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub modules: Vec<String>,
}
