//! # scupkit - SCALE-UP 模拟辅助工具箱
//!
//! 将 SCALE-UP 二阶原理 Monte Carlo 模拟的输入准备、批量运行与结果分析
//! 统一成单一可执行文件。
//!
//! ## 子命令
//! - `fdf` - FDF 输入文件检查、显示与修改
//! - `sweep` - 按温度 / 应力 / 应变 / 电场批量运行（本地或 Slurm）
//! - `geometry` - .restart 几何文件生成与平均
//! - `analyze` - 批量模拟结果分析
//!   - `config` - 单个构型概要
//!   - `polarization` - 极化
//!   - `strain` - 应变与 c/a 比
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (FDF 与几何文件解析器)
//!   │     ├── models/    (数据模型)
//!   │     ├── sweep/     (扫描计划与运行)
//!   │     ├── results/   (结果读取)
//!   │     ├── analysis/  (极化、应变与导出)
//!   │     └── batch/     (并行批处理)
//!   ├── validate.rs (FDF 检查规则)
//!   ├── utils/      (工具函数)
//!   ├── logging.rs  (日志初始化)
//!   └── error.rs    (错误处理)
//! ```

mod analysis;
mod batch;
mod cli;
mod commands;
mod error;
mod logging;
mod models;
mod parsers;
mod results;
mod sweep;
mod utils;
mod validate;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
