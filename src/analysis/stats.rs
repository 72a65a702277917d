//! # 三分量统计
//!
//! 对 (x, y, z) 三分量样本求平均值与总体标准差，
//! 以及应变分析时的主轴旋转与 c/a 比。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/`, `analysis/export.rs` 使用
//! - 使用 `models/geometry.rs`, `parsers/restart.rs`

use crate::error::Result;
use crate::models::Geometry;

use std::path::Path;

/// 三分量平均值与标准差
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats3 {
    pub mean: [f64; 3],
    /// 总体标准差 (ddof = 0)
    pub std: [f64; 3],
}

impl Stats3 {
    /// 逐分量统计；样本为空时返回 None
    pub fn from_samples(samples: &[[f64; 3]]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;

        let mut mean = [0.0; 3];
        for s in samples {
            for i in 0..3 {
                mean[i] += s[i] / n;
            }
        }

        let mut var = [0.0; 3];
        for s in samples {
            for i in 0..3 {
                var[i] += (s[i] - mean[i]).powi(2) / n;
            }
        }

        Some(Stats3 {
            mean,
            std: var.map(f64::sqrt),
        })
    }

    /// 对绝对值统计（畴结构中正负极化相互抵消时使用）
    pub fn from_abs_samples(samples: &[[f64; 3]]) -> Option<Self> {
        let abs: Vec<[f64; 3]> = samples.iter().map(|s| s.map(f64::abs)).collect();
        Self::from_samples(&abs)
    }

    /// 旋转坐标轴，使平均值最大的分量成为 z
    ///
    /// 最大分量为 y 时输出 (z, x, y)，为 x 时输出 (y, z, x)。
    pub fn rotate_to_major_axis(&self) -> Self {
        let order = major_axis_order(&self.mean);
        Stats3 {
            mean: order.map(|i| self.mean[i]),
            std: order.map(|i| self.std[i]),
        }
    }
}

/// 旋转后各分量对应的原下标，用于对单个样本做同样的旋转
pub fn major_axis_order(mean: &[f64; 3]) -> [usize; 3] {
    match major_axis(mean) {
        2 => [0, 1, 2],
        1 => [2, 0, 1],
        _ => [1, 2, 0],
    }
}

/// 最大分量的下标（并列时取最前）
fn major_axis(v: &[f64; 3]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if v[i] > v[best] {
            best = i;
        }
    }
    best
}

/// 平均 c/a 比 `(1 + η_z) / (1 + η_x)`
pub fn ca_ratio(strains: &[[f64; 3]]) -> Option<f64> {
    if strains.is_empty() {
        return None;
    }
    let sum: f64 = strains.iter().map(|s| (1.0 + s[2]) / (1.0 + s[0])).sum();
    Some(sum / strains.len() as f64)
}

/// 读取每个 partial 文件的对角应变 (xx, yy, zz)
pub fn partial_strains<P: AsRef<Path>>(template: &Geometry, partials: &[P]) -> Result<Vec<[f64; 3]>> {
    let mut geom = template.clone();
    partials
        .iter()
        .map(|p| {
            geom.load_restart(p.as_ref())?;
            Ok([geom.strains[0], geom.strains[1], geom.strains[2]])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mean_and_population_std() {
        let s = Stats3::from_samples(&[[1.0, 2.0, -1.0], [3.0, 2.0, 1.0]]).unwrap();
        assert_eq!(s.mean, [2.0, 2.0, 0.0]);
        assert_eq!(s.std, [1.0, 0.0, 1.0]);

        assert!(Stats3::from_samples(&[]).is_none());
    }

    #[test]
    fn test_abs_samples() {
        let s = Stats3::from_abs_samples(&[[1.0, 0.0, -2.0], [-1.0, 0.0, 2.0]]).unwrap();
        assert_eq!(s.mean, [1.0, 0.0, 2.0]);
        assert_eq!(s.std, [0.0; 3]);
    }

    #[test]
    fn test_rotation() {
        let stats = |mean: [f64; 3]| Stats3 {
            mean,
            std: [0.1, 0.2, 0.3],
        };

        let z = stats([1.0, 2.0, 3.0]).rotate_to_major_axis();
        assert_eq!(z.mean, [1.0, 2.0, 3.0]);

        let y = stats([1.0, 3.0, 2.0]).rotate_to_major_axis();
        assert_eq!(y.mean, [2.0, 1.0, 3.0]);
        assert_eq!(y.std, [0.3, 0.1, 0.2]);

        let x = stats([3.0, 1.0, 2.0]).rotate_to_major_axis();
        assert_eq!(x.mean, [1.0, 2.0, 3.0]);
        assert_eq!(x.std, [0.2, 0.3, 0.1]);
    }

    #[test]
    fn test_ca_ratio() {
        let r = ca_ratio(&[[0.0, 0.0, 0.01], [0.01, 0.01, 0.01]]).unwrap();
        assert!((r - (1.01 + 1.0) / 2.0).abs() < 1e-12);
        assert!(ca_ratio(&[]).is_none());
    }

    #[test]
    fn test_partial_strains() {
        let dir = TempDir::new().unwrap();
        let mut g = Geometry::new([1, 1, 1], vec!["Sr".into(), "Ti".into(), "O".into()], 5);
        g.strains = [0.01, 0.02, 0.03, 0.5, 0.5, 0.5];
        let path = dir.path().join("a_partial_10.restart");
        g.write_restart(&path).unwrap();

        let template = Geometry::new([1, 1, 1], vec!["Sr".into(), "Ti".into(), "O".into()], 5);
        let strains = partial_strains(&template, &[path]).unwrap();
        assert_eq!(strains, vec![[0.01, 0.02, 0.03]]);
    }
}
