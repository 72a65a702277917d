//! # 批量模拟记录
//!
//! 一次参数扫描的全部参数，写入输出目录的 `simulation.json`，
//! 供 `results/` 在分析时定位各个构型的子目录。
//!
//! ## 依赖关系
//! - 被 `sweep/`, `results/` 使用
//! - 使用 `serde` / `serde_json`

use crate::error::{Result, ScupError};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 记录文件名
pub const SETUP_FILE: &str = "simulation.json";

/// 构型编号：各参数轴上的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigId {
    pub temp: usize,
    pub stress: usize,
    pub strain: usize,
    pub field: usize,
}

impl ConfigId {
    /// 构型名 `cTTPPSSFF`
    pub fn name(&self) -> String {
        format!(
            "c{:02}{:02}{:02}{:02}",
            self.temp, self.stress, self.strain, self.field
        )
    }

    /// 构型子目录名 `<system>.cTTPPSSFF`
    pub fn folder_name(&self, system_name: &str) -> String {
        format!("{}.{}", system_name, self.name())
    }
}

/// 某温度下运行的文件基名 `<system>T<温度取整>`
pub fn run_name(system_name: &str, temperature: f64) -> String {
    format!("{}T{}", system_name, temperature.trunc() as i64)
}

/// 批量模拟记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSetup {
    /// FDF 中原始的 System_name
    pub name: String,
    pub supercell: Option<[usize; 3]>,
    pub species: Vec<String>,
    pub nats: usize,
    /// 温度 (K)
    pub temperatures: Vec<f64>,
    /// 外加应力 (GPa, Voigt)
    pub stresses: Vec<[f64; 6]>,
    /// 应变 (Voigt)
    pub strains: Vec<[f64; 6]>,
    /// 静电场 (V/m)
    pub fields: Vec<[f64; 3]>,
    /// MC 平衡步数（分析时的默认阈值）
    #[serde(default)]
    pub equilibration_steps: Option<u64>,
}

fn position_of<const N: usize>(axis: &[[f64; N]], v: &[f64; N]) -> Option<usize> {
    axis.iter()
        .position(|a| a.iter().zip(v).all(|(x, y)| (x - y).abs() <= 1e-9))
}

impl SimulationSetup {
    /// 根据参数值查找构型编号
    pub fn locate(
        &self,
        temperature: f64,
        stress: &[f64; 6],
        strain: &[f64; 6],
        field: &[f64; 3],
    ) -> Option<ConfigId> {
        Some(ConfigId {
            temp: self
                .temperatures
                .iter()
                .position(|t| (t - temperature).abs() <= 1e-9)?,
            stress: position_of(&self.stresses, stress)?,
            strain: position_of(&self.strains, strain)?,
            field: position_of(&self.fields, field)?,
        })
    }

    /// 读取记录文件
    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(SETUP_FILE);
        if !path.exists() {
            return Err(ScupError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| ScupError::read(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 写入记录文件
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(SETUP_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| ScupError::write(&path, e))
    }
}
