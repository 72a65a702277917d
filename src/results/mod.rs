//! # 模拟结果读取模块
//!
//! 根据输出目录中的 `simulation.json` 定位各构型的子目录并读取结果。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/` 使用
//! - 使用 `models/setup.rs`, `results/configuration.rs`
//! - 子模块: configuration

pub mod configuration;

pub use configuration::Configuration;

use crate::error::{Result, ScupError};
use crate::models::setup::run_name;
use crate::models::{ConfigId, Geometry, SimulationSetup};

use std::path::{Path, PathBuf};

/// 未记录平衡步数时的默认阈值
pub const DEFAULT_EQUILIBRATION_STEPS: u64 = 0;

/// 已完成的批量模拟
#[derive(Debug, Clone)]
pub struct SimulationIndex {
    pub output_dir: PathBuf,
    pub setup: SimulationSetup,
}

impl SimulationIndex {
    /// 打开输出目录
    pub fn open(output_dir: &Path) -> Result<Self> {
        if !output_dir.is_dir() {
            return Err(ScupError::OutputFolderMissing {
                path: output_dir.display().to_string(),
            });
        }
        let setup = SimulationSetup::load(output_dir)?;
        Ok(SimulationIndex {
            output_dir: output_dir.to_path_buf(),
            setup,
        })
    }

    /// 超胞模板（记录不完整时返回 None，改由 .REF 文件头确定）
    pub fn template(&self) -> Option<Geometry> {
        if self.setup.species.is_empty() || self.setup.nats == 0 {
            return None;
        }
        self.setup
            .supercell
            .map(|sc| Geometry::new(sc, self.setup.species.clone(), self.setup.nats))
    }

    /// 按参数值查找构型编号，未给出的向量视为零
    pub fn locate(
        &self,
        temperature: f64,
        stress: Option<[f64; 6]>,
        strain: Option<[f64; 6]>,
        field: Option<[f64; 3]>,
    ) -> Result<ConfigId> {
        let stress = stress.unwrap_or([0.0; 6]);
        let strain = strain.unwrap_or([0.0; 6]);
        let field = field.unwrap_or([0.0; 3]);

        self.setup
            .locate(temperature, &stress, &strain, &field)
            .ok_or_else(|| {
                ScupError::ConfigurationNotSimulated(format!(
                    "T={} stress={:?} strain={:?} field={:?}",
                    temperature, stress, strain, field
                ))
            })
    }

    /// 构型目录
    pub fn folder(&self, id: ConfigId) -> PathBuf {
        self.output_dir.join(id.folder_name(&self.setup.name))
    }

    /// 读取指定构型
    pub fn access(
        &self,
        temperature: f64,
        stress: Option<[f64; 6]>,
        strain: Option<[f64; 6]>,
        field: Option<[f64; 3]>,
        equilibration_steps: Option<u64>,
    ) -> Result<Configuration> {
        let id = self.locate(temperature, stress, strain, field)?;
        self.load(id, equilibration_steps)
    }

    /// 按编号读取构型
    pub fn load(&self, id: ConfigId, equilibration_steps: Option<u64>) -> Result<Configuration> {
        let temperature = self.setup.temperatures[id.temp];
        let threshold = equilibration_steps
            .or(self.setup.equilibration_steps)
            .unwrap_or(DEFAULT_EQUILIBRATION_STEPS);

        Configuration::load(
            &self.folder(id),
            &run_name(&self.setup.name, temperature),
            self.template().as_ref(),
            threshold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::configuration::tests::{template, write_config};
    use super::*;
    use tempfile::TempDir;

    fn setup() -> SimulationSetup {
        let t = template();
        SimulationSetup {
            name: "srtio3".to_string(),
            supercell: Some(t.supercell),
            species: t.species.clone(),
            nats: t.nats,
            temperatures: vec![20.0, 40.0],
            stresses: vec![[0.0; 6]],
            strains: vec![[0.0; 6]],
            fields: vec![[0.0; 3]],
            equilibration_steps: Some(100),
        }
    }

    #[test]
    fn test_open_missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SimulationIndex::open(&dir.path().join("output")),
            Err(ScupError::OutputFolderMissing { .. })
        ));
    }

    #[test]
    fn test_access() {
        let dir = TempDir::new().unwrap();
        setup().save(dir.path()).unwrap();

        let folder = dir.path().join("srtio3.c01000000");
        std::fs::create_dir(&folder).unwrap();
        write_config(&folder, "srtio3T40", &[100, 200, 300]);

        let index = SimulationIndex::open(dir.path()).unwrap();
        let conf = index.access(40.0, None, None, None, None).unwrap();
        assert_eq!(conf.step_threshold, 100);
        assert_eq!(conf.nmeas, 2);

        let all = index.access(40.0, None, None, None, Some(0)).unwrap();
        assert_eq!(all.nmeas, 3);
    }

    #[test]
    fn test_access_unknown_configuration() {
        let dir = TempDir::new().unwrap();
        setup().save(dir.path()).unwrap();
        let index = SimulationIndex::open(dir.path()).unwrap();

        assert!(matches!(
            index.access(60.0, None, None, None, None),
            Err(ScupError::ConfigurationNotSimulated(_))
        ));
        assert!(matches!(
            index.access(20.0, Some([1.0; 6]), None, None, None),
            Err(ScupError::ConfigurationNotSimulated(_))
        ));
    }
}
