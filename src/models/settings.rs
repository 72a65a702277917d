//! # SCALE-UP 设置模型
//!
//! 从 FDF 文档中提取 Monte Carlo 模拟相关的强类型设置，
//! 以及批量模拟时对公共设置的覆盖。
//!
//! ## 依赖关系
//! - 被 `commands/fdf.rs`, `sweep/` 使用
//! - 使用 `models/fdf.rs`

use crate::error::{Result, ScupError};
use crate::models::fdf::{parse_bool_token, FdfDocument};

/// 常用 FDF 标签
pub mod keys {
    pub const SYSTEM_NAME: &str = "System_name";
    pub const PARAMETER_FILE: &str = "Parameter_file";
    pub const SUPERCELL: &str = "Supercell";
    pub const MC_TEMPERATURE: &str = "MC_temperature";
    pub const MC_NSWEEPS: &str = "MC_nsweeps";
    pub const N_WRITE_MC: &str = "n_write_mc";
    pub const MC_MAX_STEP_D: &str = "MC_max_step_d";
    pub const LATTICE_NSTEPS: &str = "Print_std_lattice_nsteps";
    pub const FIX_STRAIN: &str = "fix_strain_component";
    pub const RUN_MODE: &str = "run_mode";
    pub const MC_STRAINS: &str = "MC_strains";
    pub const GEOMETRY_RESTART: &str = "geometry_restart";
    pub const EXTERNAL_STRESS: &str = "external_stress";
    pub const ELECTRIC_FIELD: &str = "static_electric_field";
}

/// SCALE-UP Monte Carlo 设置
#[derive(Debug, Clone, PartialEq)]
pub struct ScupSettings {
    pub system_name: String,
    pub parameter_file: Option<String>,
    pub supercell: Option<[u32; 3]>,
    /// 温度 (K)
    pub temperature: Option<f64>,
    pub nsweeps: Option<u64>,
    pub n_write_mc: Option<u64>,
    pub max_step_d: Option<f64>,
    pub lattice_output_interval: Option<u64>,
    pub fixed_strain: Option<[bool; 6]>,
    pub run_mode: Option<String>,
    pub mc_strains: Option<bool>,
}

impl ScupSettings {
    /// 从 FDF 文档提取设置
    pub fn from_document(doc: &FdfDocument) -> Result<Self> {
        let system_name = doc
            .get_str(keys::SYSTEM_NAME)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScupError::MissingSetting(keys::SYSTEM_NAME.to_string()))?;

        let unsigned = |key: &str| -> Result<Option<u64>> {
            match doc.get(key) {
                None => Ok(None),
                Some(s) => s
                    .value()
                    .as_i64()
                    .and_then(|v| u64::try_from(v).ok())
                    .map(Some)
                    .ok_or_else(|| {
                        ScupError::InvalidSetting(format!(
                            "{} must be a non-negative integer, found '{}'",
                            key,
                            s.raw_value()
                        ))
                    }),
            }
        };

        let number = |key: &str| -> Result<Option<f64>> {
            match doc.get(key) {
                None => Ok(None),
                Some(s) => s.value().as_f64().map(Some).ok_or_else(|| {
                    ScupError::InvalidSetting(format!(
                        "{} must be a number, found '{}'",
                        key,
                        s.raw_value()
                    ))
                }),
            }
        };

        Ok(ScupSettings {
            system_name,
            parameter_file: doc.get_str(keys::PARAMETER_FILE),
            supercell: read_supercell(doc)?,
            temperature: number(keys::MC_TEMPERATURE)?,
            nsweeps: unsigned(keys::MC_NSWEEPS)?,
            n_write_mc: unsigned(keys::N_WRITE_MC)?,
            max_step_d: number(keys::MC_MAX_STEP_D)?,
            lattice_output_interval: unsigned(keys::LATTICE_NSTEPS)?,
            fixed_strain: read_fixed_strain(doc)?,
            run_mode: doc.get_str(keys::RUN_MODE),
            mc_strains: doc.get_bool(keys::MC_STRAINS),
        })
    }
}

/// 读取 Supercell 块
pub fn read_supercell(doc: &FdfDocument) -> Result<Option<[u32; 3]>> {
    let Some(block) = doc.get_block(keys::SUPERCELL) else {
        return Ok(None);
    };

    let values: Vec<u32> = block
        .rows
        .first()
        .map(|row| row.iter().filter_map(|t| t.parse().ok()).collect())
        .unwrap_or_default();

    match values.as_slice() {
        [a, b, c] if *a > 0 && *b > 0 && *c > 0 => Ok(Some([*a, *b, *c])),
        _ => Err(ScupError::InvalidSetting(
            "Supercell block must hold three positive integers".to_string(),
        )),
    }
}

/// 读取 fix_strain_component 块
pub fn read_fixed_strain(doc: &FdfDocument) -> Result<Option<[bool; 6]>> {
    let Some(block) = doc.get_block(keys::FIX_STRAIN) else {
        return Ok(None);
    };

    let invalid = || {
        ScupError::InvalidSetting(
            "fix_strain_component block must hold six T/F flags".to_string(),
        )
    };

    let flags: Vec<bool> = block
        .rows
        .first()
        .ok_or_else(invalid)?
        .iter()
        .map(|t| parse_bool_token(t))
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;

    <[bool; 6]>::try_from(flags).map(Some).map_err(|_| invalid())
}

/// 固定应变分量 -> T/F 行
pub fn strain_flags_row(flags: &[bool]) -> Vec<String> {
    flags
        .iter()
        .map(|&f| if f { "T" } else { "F" }.to_string())
        .collect()
}

/// 批量模拟时对公共设置的覆盖
#[derive(Debug, Clone, Default)]
pub struct SettingOverrides {
    /// MC 总步数 (MC_nsweeps)
    pub mc_steps: Option<u64>,
    /// 写出 partial 文件的步数间隔 (n_write_mc)
    pub mc_step_interval: Option<u64>,
    /// MC 最大位移 (MC_max_step_d)
    pub mc_max_jump: Option<f64>,
    /// 晶格信息输出间隔 (Print_std_lattice_nsteps)
    pub lattice_output_interval: Option<u64>,
    /// 固定的应变分量
    pub fixed_strain_components: Option<Vec<bool>>,
}

impl SettingOverrides {
    /// 将覆盖写入文档
    pub fn apply(&self, doc: &mut FdfDocument) -> Result<()> {
        if let Some(steps) = self.mc_steps {
            doc.set_value(keys::MC_NSWEEPS, steps as i64);
        }
        if let Some(interval) = self.mc_step_interval {
            doc.set_value(keys::N_WRITE_MC, interval as i64);
        }
        if let Some(jump) = self.mc_max_jump {
            doc.set_value(keys::MC_MAX_STEP_D, jump);
        }
        if let Some(interval) = self.lattice_output_interval {
            doc.set_value(keys::LATTICE_NSTEPS, interval as i64);
        }
        if let Some(ref flags) = self.fixed_strain_components {
            if flags.len() != 6 {
                return Err(ScupError::InvalidSetting(format!(
                    "fixed strain components need 6 flags, got {}",
                    flags.len()
                )));
            }
            doc.set_block(keys::FIX_STRAIN, vec![strain_flags_row(flags)]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fdf::parse_fdf_content;

    const DECK: &str = r#"
System_name               srtio3
Parameter_file            srtio3_full_lat.xml
run_mode                  MC
MC_strains                .true.
MC_temperature            20 kelvin
MC_nsweeps                40000
MC_max_step_d             0.1 bohr
n_write_mc                50
Print_std_lattice_nsteps  25

%block Supercell
 8 8 8
%endblock Supercell

%block fix_strain_component
 T T F F F T
%endblock fix_strain_component
"#;

    #[test]
    fn test_from_document() {
        let doc = parse_fdf_content(DECK, "deck").unwrap();
        let s = ScupSettings::from_document(&doc).unwrap();

        assert_eq!(s.system_name, "srtio3");
        assert_eq!(s.parameter_file.as_deref(), Some("srtio3_full_lat.xml"));
        assert_eq!(s.supercell, Some([8, 8, 8]));
        assert_eq!(s.temperature, Some(20.0));
        assert_eq!(s.nsweeps, Some(40000));
        assert_eq!(s.n_write_mc, Some(50));
        assert_eq!(s.max_step_d, Some(0.1));
        assert_eq!(s.lattice_output_interval, Some(25));
        assert_eq!(s.fixed_strain, Some([true, true, false, false, false, true]));
        assert_eq!(s.run_mode.as_deref(), Some("MC"));
        assert_eq!(s.mc_strains, Some(true));
    }

    #[test]
    fn test_missing_system_name() {
        let doc = parse_fdf_content("MC_nsweeps 10\n", "deck").unwrap();
        assert!(matches!(
            ScupSettings::from_document(&doc),
            Err(ScupError::MissingSetting(_))
        ));
    }

    #[test]
    fn test_negative_sweeps_rejected() {
        let doc = parse_fdf_content("System_name a\nMC_nsweeps -4\n", "deck").unwrap();
        assert!(matches!(
            ScupSettings::from_document(&doc),
            Err(ScupError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_apply_overrides() {
        let mut doc = parse_fdf_content(DECK, "deck").unwrap();
        let overrides = SettingOverrides {
            mc_steps: Some(1000),
            mc_step_interval: Some(10),
            mc_max_jump: Some(0.05),
            lattice_output_interval: None,
            fixed_strain_components: Some(vec![false; 6]),
        };
        overrides.apply(&mut doc).unwrap();

        let s = ScupSettings::from_document(&doc).unwrap();
        assert_eq!(s.nsweeps, Some(1000));
        assert_eq!(s.n_write_mc, Some(10));
        assert_eq!(s.max_step_d, Some(0.05));
        assert_eq!(doc.get("MC_max_step_d").unwrap().unit(), Some("bohr"));
        assert_eq!(s.lattice_output_interval, Some(25));
        assert_eq!(s.fixed_strain, Some([false; 6]));
    }

    #[test]
    fn test_fixed_strain_rejects_stray_tokens() {
        let doc = parse_fdf_content(
            "System_name a\n%block fix_strain_component\nT T F F F T X\n%endblock fix_strain_component\n",
            "deck",
        )
        .unwrap();
        assert!(matches!(
            read_fixed_strain(&doc),
            Err(ScupError::InvalidSetting(_))
        ));

        let doc = parse_fdf_content(
            "System_name a\n%block fix_strain_component\nT T F F F T\n%endblock fix_strain_component\n",
            "deck",
        )
        .unwrap();
        assert_eq!(
            read_fixed_strain(&doc).unwrap(),
            Some([true, true, false, false, false, true])
        );
    }

    #[test]
    fn test_fixed_strain_needs_six_flags() {
        let mut doc = FdfDocument::new();
        let overrides = SettingOverrides {
            fixed_strain_components: Some(vec![true; 5]),
            ..Default::default()
        };
        assert!(overrides.apply(&mut doc).is_err());
    }
}
