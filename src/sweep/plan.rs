//! # 参数扫描计划
//!
//! 温度、应力、应变、电场四个参数轴的全组合。
//!
//! ## 参数约定
//! - 温度：K
//! - 应力：GPa，Voigt 6 分量
//! - 应变：相对形变，Voigt 6 分量
//! - 电场：V/m，3 分量
//!
//! 未指定的轴默认只有一个零向量。
//!
//! ## 依赖关系
//! - 被 `sweep/stage.rs`, `commands/sweep.rs` 使用
//! - 使用 `models/setup.rs`

use crate::error::{Result, ScupError};
use crate::models::ConfigId;

/// 每个参数轴的最大取值数（构型编号每轴两位）
pub const MAX_AXIS_LEN: usize = 100;

/// 解析逗号分隔的定长向量，如 "0.02,0.02,0,0,0,0"
pub fn parse_vector<const N: usize>(input: &str) -> Result<[f64; N]> {
    let invalid = || ScupError::InvalidVector {
        input: input.to_string(),
        expected: N,
    };

    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid())?;

    <[f64; N]>::try_from(values).map_err(|_| invalid())
}

/// 解析温度列表："20,40,60" 或 "start:stop:count"（含两端的等间距）
pub fn parse_temperatures(input: &str) -> Result<Vec<f64>> {
    let invalid = || {
        ScupError::InvalidArgument(format!(
            "Invalid temperature list '{}': use '20,40,60' or 'start:stop:count'",
            input
        ))
    };

    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').map(|s| s.trim()).collect();
        let [start, stop, count] = parts.as_slice() else {
            return Err(invalid());
        };
        let start: f64 = start.parse().map_err(|_| invalid())?;
        let stop: f64 = stop.parse().map_err(|_| invalid())?;
        let count: usize = count.parse().map_err(|_| invalid())?;

        return Ok(match count {
            0 => Vec::new(),
            1 => vec![start],
            n => {
                let step = (stop - start) / (n - 1) as f64;
                (0..n).map(|i| start + step * i as f64).collect()
            }
        });
    }

    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| invalid()))
        .collect()
}

/// 参数扫描计划
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub temperatures: Vec<f64>,
    pub stresses: Vec<[f64; 6]>,
    pub strains: Vec<[f64; 6]>,
    pub fields: Vec<[f64; 3]>,
    /// 以下标志记录哪些轴由用户指定（决定是否写入 FDF）
    pub has_stress: bool,
    pub has_strain: bool,
    pub has_field: bool,
}

fn has_duplicates<const N: usize>(axis: &[[f64; N]]) -> bool {
    axis.iter()
        .enumerate()
        .any(|(i, a)| axis[..i].iter().any(|b| a == b))
}

impl SweepPlan {
    pub fn new(
        temperatures: Vec<f64>,
        stresses: Option<Vec<[f64; 6]>>,
        strains: Option<Vec<[f64; 6]>>,
        fields: Option<Vec<[f64; 3]>>,
    ) -> Result<Self> {
        let stresses = stresses.filter(|v| !v.is_empty());
        let strains = strains.filter(|v| !v.is_empty());
        let fields = fields.filter(|v| !v.is_empty());

        let plan = SweepPlan {
            has_stress: stresses.is_some(),
            has_strain: strains.is_some(),
            has_field: fields.is_some(),
            temperatures,
            stresses: stresses.unwrap_or_else(|| vec![[0.0; 6]]),
            strains: strains.unwrap_or_else(|| vec![[0.0; 6]]),
            fields: fields.unwrap_or_else(|| vec![[0.0; 3]]),
        };
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if self.temperatures.is_empty() {
            return Err(ScupError::InvalidArgument(
                "At least one temperature is required".to_string(),
            ));
        }
        if self.temperatures.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(ScupError::InvalidArgument(
                "Temperatures must be finite and non-negative".to_string(),
            ));
        }

        let temps: Vec<[f64; 1]> = self.temperatures.iter().map(|t| [*t]).collect();
        let axes = [
            ("temperature", temps.len(), has_duplicates(&temps)),
            ("stress", self.stresses.len(), has_duplicates(&self.stresses)),
            ("strain", self.strains.len(), has_duplicates(&self.strains)),
            ("field", self.fields.len(), has_duplicates(&self.fields)),
        ];

        for (name, len, dup) in axes {
            if len > MAX_AXIS_LEN {
                return Err(ScupError::InvalidArgument(format!(
                    "Too many {} values ({}), at most {} are supported",
                    name, len, MAX_AXIS_LEN
                )));
            }
            if dup {
                return Err(ScupError::InvalidArgument(format!(
                    "Duplicate {} values in sweep",
                    name
                )));
            }
        }

        Ok(())
    }

    /// 构型总数
    pub fn len(&self) -> usize {
        self.temperatures.len() * self.stresses.len() * self.strains.len() * self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按 温度 -> 应力 -> 应变 -> 电场 的顺序枚举所有构型
    pub fn configurations(&self) -> Vec<ConfigId> {
        let mut ids = Vec::with_capacity(self.len());
        for temp in 0..self.temperatures.len() {
            for stress in 0..self.stresses.len() {
                for strain in 0..self.strains.len() {
                    for field in 0..self.fields.len() {
                        ids.push(ConfigId {
                            temp,
                            stress,
                            strain,
                            field,
                        });
                    }
                }
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        let v: [f64; 6] = parse_vector("0.02, 0.02,0,0,0,0").unwrap();
        assert_eq!(v, [0.02, 0.02, 0.0, 0.0, 0.0, 0.0]);

        assert!(parse_vector::<3>("1,2").is_err());
        assert!(parse_vector::<3>("1,2,x").is_err());
    }

    #[test]
    fn test_parse_temperatures_list_and_range() {
        assert_eq!(parse_temperatures("20,40,60").unwrap(), vec![20.0, 40.0, 60.0]);

        let range = parse_temperatures("20:260:13").unwrap();
        assert_eq!(range.len(), 13);
        assert_eq!(range[0], 20.0);
        assert!((range[12] - 260.0).abs() < 1e-9);
        assert!((range[1] - 40.0).abs() < 1e-9);

        assert_eq!(parse_temperatures("50:100:1").unwrap(), vec![50.0]);
        assert!(parse_temperatures("20:40").is_err());
        assert!(parse_temperatures("a,b").is_err());
    }

    #[test]
    fn test_default_axes() {
        let plan = SweepPlan::new(vec![20.0, 40.0], None, None, None).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(!plan.has_strain);
        assert_eq!(plan.strains, vec![[0.0; 6]]);
    }

    #[test]
    fn test_configuration_order() {
        let plan = SweepPlan::new(
            vec![20.0, 40.0],
            None,
            Some(vec![[0.01, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0; 6]]),
            None,
        )
        .unwrap();

        let names: Vec<String> = plan.configurations().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["c00000000", "c00000100", "c01000000", "c01000100"]
        );
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(SweepPlan::new(vec![], None, None, None).is_err());
        assert!(SweepPlan::new(vec![20.0, 20.0], None, None, None).is_err());
        assert!(SweepPlan::new(vec![20.0], Some(vec![[1.0; 6], [1.0; 6]]), None, None).is_err());
        assert!(SweepPlan::new(vec![-5.0], None, None, None).is_err());
    }

    #[test]
    fn test_rejects_long_axis() {
        let temps: Vec<f64> = (0..101).map(|i| i as f64).collect();
        assert!(SweepPlan::new(temps, None, None, None).is_err());
    }
}
