//! # analyze 命令实现
//!
//! 批量模拟结果分析统一入口，包含多个子命令：
//! - `config`: 单个构型概要
//! - `polarization`: 极化随温度变化
//! - `strain`: 应变与 c/a 比随温度变化
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `results/` 定位并读取构型
//! - 子模块: config, polarization, strain

pub mod config;
pub mod polarization;
pub mod strain;

use crate::cli::analyze::{AnalyzeArgs, AnalyzeCommands, SelectArgs};
use crate::error::{Result, ScupError};
use crate::results::{Configuration, SimulationIndex};
use crate::sweep::{parse_temperatures, parse_vector};
use crate::utils::output;

/// 执行 analyze 命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    match args.command {
        AnalyzeCommands::Config(a) => config::execute(a),
        AnalyzeCommands::Polarization(a) => polarization::execute(a),
        AnalyzeCommands::Strain(a) => strain::execute(a),
    }
}

/// 解析后的构型选择
#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    pub stress: Option<[f64; 6]>,
    pub strain: Option<[f64; 6]>,
    pub field: Option<[f64; 3]>,
    pub equilibration_steps: Option<u64>,
}

impl Selection {
    pub fn from_args(args: &SelectArgs) -> Result<Self> {
        Ok(Selection {
            stress: args.stress.as_deref().map(parse_vector::<6>).transpose()?,
            strain: args.strain.as_deref().map(parse_vector::<6>).transpose()?,
            field: args.field.as_deref().map(parse_vector::<3>).transpose()?,
            equilibration_steps: args.equilibration_steps,
        })
    }

    /// 读取某一温度下的构型
    pub fn access(&self, index: &SimulationIndex, temperature: f64) -> Result<Configuration> {
        index.access(
            temperature,
            self.stress,
            self.strain,
            self.field,
            self.equilibration_steps,
        )
    }
}

/// 待分析的温度：命令行给出时使用之，否则使用全部已记录温度
pub(crate) fn temperatures(index: &SimulationIndex, temps: Option<&str>) -> Result<Vec<f64>> {
    match temps {
        Some(t) => parse_temperatures(t),
        None => Ok(index.setup.temperatures.clone()),
    }
}

/// 逐温度读取构型；未模拟的组合报错，读取失败的构型跳过
pub(crate) fn load_series(
    index: &SimulationIndex,
    selection: &Selection,
    temps: &[f64],
) -> Result<Vec<(f64, Configuration)>> {
    let mut loaded = Vec::new();
    for &t in temps {
        match selection.access(index, t) {
            Ok(conf) => loaded.push((t, conf)),
            Err(e @ ScupError::ConfigurationNotSimulated(_)) => return Err(e),
            Err(e) => output::print_warning(&format!("T = {} K skipped: {}", t, e)),
        }
    }

    if loaded.is_empty() {
        return Err(ScupError::Other(
            "No configuration could be read".to_string(),
        ));
    }
    Ok(loaded)
}
