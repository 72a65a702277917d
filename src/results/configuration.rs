//! # 单个构型的模拟结果
//!
//! 读取构型目录中的 partial `.restart` 文件与 `_FINAL.REF` 参考结构，
//! 对平衡阶段之后的 partial 取平均。
//!
//! ## 平衡阈值
//! 只有步数严格大于阈值的 partial 参与平均。
//! 若总步数不超过阈值，阈值降为总步数的 20%。
//!
//! ## 依赖关系
//! - 被 `results/mod.rs`, `commands/analyze/` 使用
//! - 使用 `parsers/restart.rs`, `models/geometry.rs`

use crate::error::{Result, ScupError};
use crate::models::Geometry;
use crate::parsers::restart::read_header;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// 阈值不足时回退到总步数的比例
const FALLBACK_FRACTION: f64 = 0.2;

fn partial_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"partial\D*(\d+)\.restart$").unwrap())
}

/// 从文件名中提取 partial 的 MC 步数
pub fn partial_step(file_name: &str) -> Option<u64> {
    partial_regex()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 列出目录中的 partial 文件，按步数排序
pub fn find_partials(folder: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let entries = std::fs::read_dir(folder).map_err(|e| ScupError::read(folder, e))?;

    let mut partials: Vec<(u64, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            partial_step(&name).map(|step| (step, e.path()))
        })
        .collect();

    partials.sort_by_key(|(step, _)| *step);
    Ok(partials)
}

/// 一个已完成模拟的构型
#[derive(Debug, Clone)]
pub struct Configuration {
    pub folder: PathBuf,
    /// 运行基名 `<system>T<温度>`
    pub run_name: String,
    /// 全部 partial 文件（按步数排序）
    pub partials: Vec<(u64, PathBuf)>,
    pub total_steps: u64,
    /// 实际使用的平衡阈值
    pub step_threshold: u64,
    /// 参与平均的 partial 数量
    pub nmeas: usize,
    /// 参考结构 + 平均应变与位移
    pub geometry: Geometry,
}

impl Configuration {
    /// 读取构型目录
    ///
    /// `template` 提供超胞、种类与原子数；为 `None` 时从 `_FINAL.REF` 的文件头读取。
    pub fn load(
        folder: &Path,
        run_name: &str,
        template: Option<&Geometry>,
        equilibration_steps: u64,
    ) -> Result<Self> {
        if !folder.is_dir() {
            return Err(ScupError::DirectoryNotFound {
                path: folder.display().to_string(),
            });
        }

        let partials = find_partials(folder)?;
        let Some(&(total_steps, _)) = partials.last() else {
            return Err(ScupError::NotEnoughPartials {
                path: folder.display().to_string(),
            });
        };

        let mut step_threshold = equilibration_steps;
        if total_steps <= step_threshold {
            let reduced = (FALLBACK_FRACTION * total_steps as f64).floor() as u64;
            warn!(
                threshold = step_threshold,
                total_steps,
                reduced,
                "step threshold exceeds total steps, reducing to 20% of total"
            );
            step_threshold = reduced;
        }

        let measured: Vec<&PathBuf> = partials
            .iter()
            .filter(|(step, _)| *step > step_threshold)
            .map(|(_, p)| p)
            .collect();

        let ref_path = folder.join(format!("{}_FINAL.REF", run_name));
        let mut geometry = match template {
            Some(g) => g.clone(),
            None => read_header(&ref_path)?,
        };
        geometry.load_reference(&ref_path)?;
        geometry.load_equilibrium_displacements(&measured)?;

        debug!(
            folder = %folder.display(),
            total_steps,
            step_threshold,
            nmeas = measured.len(),
            "loaded configuration"
        );

        Ok(Configuration {
            folder: folder.to_path_buf(),
            run_name: run_name.to_string(),
            nmeas: measured.len(),
            partials,
            total_steps,
            step_threshold,
            geometry,
        })
    }

    /// 参与平均的 partial 文件
    pub fn measured_partials(&self) -> Vec<&Path> {
        self.partials
            .iter()
            .filter(|(step, _)| *step > self.step_threshold)
            .map(|(_, p)| p.as_path())
            .collect()
    }

    /// 平均应变 (Voigt)
    pub fn strains(&self) -> [f64; 6] {
        self.geometry.strains
    }
}
