//! # 构型目录准备
//!
//! 为每个构型建立独立的工作目录，写入该构型的 FDF 输入与初始应变几何。
//! 各构型互不共享文件，因此可以并行运行。
//!
//! ## 依赖关系
//! - 被 `commands/sweep.rs` 使用
//! - 使用 `models/`, `parsers/fdf.rs`, `parsers/restart.rs`, `sweep/plan.rs`

use crate::error::{Result, ScupError};
use crate::models::settings::keys;
use crate::models::setup::run_name;
use crate::models::{ConfigId, FdfDocument, Geometry};
use crate::parsers::fdf::write_fdf_file;
use crate::sweep::plan::SweepPlan;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 初始应变几何文件名
pub const INITIAL_RESTART: &str = "initial.restart";

/// 已准备好的单个构型
#[derive(Debug, Clone)]
pub struct StagedRun {
    pub id: ConfigId,
    pub temperature: f64,
    /// 构型目录
    pub folder: PathBuf,
    /// 运行基名 `<system>T<温度>`
    pub run_name: String,
    pub fdf_path: PathBuf,
    pub out_path: PathBuf,
}

/// 所有构型共享的准备上下文
pub struct StageContext<'a> {
    /// 已应用公共覆盖的基础 FDF
    pub base: &'a FdfDocument,
    pub system_name: &'a str,
    pub plan: &'a SweepPlan,
    pub output_dir: &'a Path,
    /// 应变扫描时的几何模板（超胞、原子种类、原子数）
    pub geometry: Option<&'a Geometry>,
}

fn to_tokens(values: &[f64]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// 将 Parameter_file 改写为绝对路径（相对于基础 FDF 所在目录）
pub fn absolutize_parameter_file(doc: &mut FdfDocument, base_dir: &Path) {
    let Some(param) = doc.get_str(keys::PARAMETER_FILE) else {
        return;
    };
    let param_path = Path::new(&param);
    if param_path.is_absolute() {
        return;
    }

    let resolved = base_dir.join(param_path);
    if let Ok(abs) = resolved.canonicalize() {
        debug!(from = %param, to = %abs.display(), "resolved Parameter_file");
        doc.set_value(keys::PARAMETER_FILE, abs.display().to_string().as_str());
    }
}

impl StageContext<'_> {
    /// 生成构型的 FDF 文档（不写文件）
    pub fn configure(&self, id: ConfigId) -> FdfDocument {
        let plan = self.plan;
        let temperature = plan.temperatures[id.temp];
        let mut doc = self.base.clone();

        doc.set_value(keys::SYSTEM_NAME, run_name(self.system_name, temperature).as_str());
        doc.set_with_unit(keys::MC_TEMPERATURE, temperature, "kelvin");

        if plan.has_stress {
            doc.set_block(
                keys::EXTERNAL_STRESS,
                vec![to_tokens(&plan.stresses[id.stress])],
            );
        }
        if plan.has_field {
            doc.set_block(
                keys::ELECTRIC_FIELD,
                vec![to_tokens(&plan.fields[id.field])],
            );
        }
        if plan.has_strain {
            doc.set_value(keys::GEOMETRY_RESTART, INITIAL_RESTART);
        }

        doc
    }

    /// 建立构型目录并写入输入文件
    pub fn stage(&self, id: ConfigId) -> Result<StagedRun> {
        let temperature = self.plan.temperatures[id.temp];
        let run = run_name(self.system_name, temperature);
        let folder = self.output_dir.join(id.folder_name(self.system_name));

        fs::create_dir_all(&folder).map_err(|e| ScupError::write(&folder, e))?;

        if self.plan.has_strain {
            let template = self.geometry.ok_or_else(|| {
                ScupError::InvalidArgument(
                    "Strain sweeps need the supercell, species and atoms per cell".to_string(),
                )
            })?;
            let mut geom = template.clone();
            geom.reset();
            geom.strains = self.plan.strains[id.strain];
            geom.write_restart(&folder.join(INITIAL_RESTART))?;
        }

        let doc = self.configure(id);
        let fdf_path = folder.join(format!("{}.fdf", run));
        write_fdf_file(&doc, &fdf_path)?;

        debug!(config = %id.name(), folder = %folder.display(), "staged configuration");

        Ok(StagedRun {
            id,
            temperature,
            out_path: folder.join(format!("{}.out", run)),
            folder,
            run_name: run,
            fdf_path,
        })
    }
}
