//! # Born 有效电荷极化计算
//!
//! 由原子位移与 Born 有效电荷（对角近似）计算超胞宏观极化：
//!
//! ```text
//! P_i = Σ Z_i τ_i / V,   V = N_cells · Π a_k (1 + η_k)
//! ```
//!
//! 结果单位为 C/m²。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/` 使用
//! - 使用 `models/geometry.rs`, `parsers/restart.rs`
//! - 使用 `csv` + `serde` 读取 Born 电荷表

use crate::error::{Result, ScupError};
use crate::models::Geometry;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// 元电荷 (C)
pub const ELEMENTARY_CHARGE: f64 = 1.60217646e-19;
/// Bohr 半径 (m)
pub const BOHR: f64 = 5.29177e-11;

/// e/bohr² -> C/m²
pub fn unit_conversion(p: f64) -> f64 {
    p * ELEMENTARY_CHARGE / (BOHR * BOHR)
}

fn convert3(p: [f64; 3]) -> [f64; 3] {
    p.map(unit_conversion)
}

#[derive(Debug, Deserialize)]
struct BornRow {
    index: usize,
    zx: f64,
    zy: f64,
    zz: f64,
}

/// 原胞内原子下标 -> 对角 Born 有效电荷 (e)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BornCharges {
    charges: BTreeMap<usize, [f64; 3]>,
}

impl BornCharges {
    pub fn new(charges: BTreeMap<usize, [f64; 3]>) -> Self {
        BornCharges { charges }
    }

    /// 读取 CSV：表头 `index,zx,zy,zz`
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(path)?;

        let mut charges = BTreeMap::new();
        for row in rdr.deserialize() {
            let row: BornRow = row?;
            if charges.insert(row.index, [row.zx, row.zy, row.zz]).is_some() {
                return Err(ScupError::ParseError {
                    format: "Born charge".to_string(),
                    path: path.display().to_string(),
                    reason: format!("atom index {} listed twice", row.index),
                });
            }
        }

        if charges.is_empty() {
            return Err(ScupError::ParseError {
                format: "Born charge".to_string(),
                path: path.display().to_string(),
                reason: "no charges listed".to_string(),
            });
        }

        Ok(BornCharges { charges })
    }

    pub fn get(&self, index: usize) -> Option<&[f64; 3]> {
        self.charges.get(&index)
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// 检查所有下标都在原胞内
    pub fn check(&self, nats: usize) -> Result<()> {
        match self.charges.keys().find(|&&i| i >= nats) {
            Some(&index) => Err(ScupError::AtomIndexOutOfBounds { index, nats }),
            None => Ok(()),
        }
    }
}

/// 原胞体积 (Bohr³)；未读取参考结构时报错
fn cell_volume(geom: &Geometry) -> Result<f64> {
    geom.strained_cell_volume()
        .ok_or(ScupError::ReferenceNotLoaded)
}

/// 对满足条件的原胞求 Σ Z τ
fn dipole_sum<F>(geom: &Geometry, born: &BornCharges, mut include: F) -> [f64; 3]
where
    F: FnMut(usize, usize, usize) -> bool,
{
    let mut sum = [0.0; 3];
    for (x, y, z, j) in geom.sites() {
        let Some(charges) = born.get(j) else {
            continue;
        };
        if !include(x, y, z) {
            continue;
        }
        let tau = geom.displacement(x, y, z, j);
        for i in 0..3 {
            sum[i] += charges[i] * tau[i];
        }
    }
    sum
}

/// 超胞宏观极化 (C/m²)
pub fn polarization(geom: &Geometry, born: &BornCharges) -> Result<[f64; 3]> {
    born.check(geom.nats)?;
    let volume = geom.ncells() as f64 * cell_volume(geom)?;
    let sum = dipole_sum(geom, born, |_, _, _| true);
    Ok(convert3(sum.map(|p| p / volume)))
}

/// 每个 partial 文件的极化
///
/// `template` 需已读取参考结构，晶格常数取自该参考结构。
pub fn stepped_polarization<P: AsRef<Path>>(
    template: &Geometry,
    partials: &[P],
    born: &BornCharges,
) -> Result<Vec<[f64; 3]>> {
    born.check(template.nats)?;
    if template.lat_vectors.is_none() {
        return Err(ScupError::ReferenceNotLoaded);
    }

    let mut geom = template.clone();
    partials
        .iter()
        .map(|p| {
            geom.load_restart(p.as_ref())?;
            polarization(&geom, born)
        })
        .collect()
}

/// 按 z 层计算极化，体积为一个 xy 平面
pub fn layered_polarization(geom: &Geometry, born: &BornCharges) -> Result<Vec<[f64; 3]>> {
    born.check(geom.nats)?;
    let [nx, ny, nz] = geom.supercell;
    let volume = (nx * ny) as f64 * cell_volume(geom)?;

    Ok((0..nz)
        .map(|layer| {
            let sum = dipole_sum(geom, born, |_, _, z| z == layer);
            convert3(sum.map(|p| p / volume))
        })
        .collect())
}

/// 按 (x, y) 柱计算极化，体积为一个 z 柱；结果为 `[x][y]`
pub fn column_polarization(geom: &Geometry, born: &BornCharges) -> Result<Vec<Vec<[f64; 3]>>> {
    born.check(geom.nats)?;
    let [nx, ny, nz] = geom.supercell;
    let volume = nz as f64 * cell_volume(geom)?;

    Ok((0..nx)
        .map(|cx| {
            (0..ny)
                .map(|cy| {
                    let sum = dipole_sum(geom, born, |x, y, _| x == cx && y == cy);
                    convert3(sum.map(|p| p / volume))
                })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// 2x1x2 超胞，原胞边长 2 Bohr，体积 8 Bohr³
    fn geometry() -> Geometry {
        let mut g = Geometry::new([2, 1, 2], vec!["Sr".into(), "Ti".into(), "O".into()], 5);
        g.lat_vectors = Some([4.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 4.0]);
        g.positions = Some(vec![[0.0; 3]; g.natoms()]);
        g
    }

    fn ti_only() -> BornCharges {
        BornCharges::new(BTreeMap::from([(1, [7.0, 7.0, 7.0])]))
    }

    #[test]
    fn test_unit_conversion() {
        let c = unit_conversion(1.0);
        assert!((c - 57.2148).abs() < 1e-3);
    }

    #[test]
    fn test_polarization() {
        let mut g = geometry();
        g.set_displacement(0, 0, 0, 1, [0.0, 0.0, 0.8]);

        let p = polarization(&g, &ti_only()).unwrap();
        // 7 * 0.8 / (4 * 8)
        let expected = unit_conversion(7.0 * 0.8 / 32.0);
        assert_eq!(p[0], 0.0);
        assert!((p[2] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_strain_enlarges_volume() {
        let mut g = geometry();
        g.set_displacement(1, 0, 1, 1, [0.8, 0.0, 0.0]);
        let p0 = polarization(&g, &ti_only()).unwrap()[0];

        g.strains[0] = 0.1;
        let p1 = polarization(&g, &ti_only()).unwrap()[0];
        assert!((p0 / p1 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_requires_reference_and_valid_indices() {
        let bare = Geometry::new([1, 1, 1], vec!["Sr".into()], 5);
        assert!(matches!(
            polarization(&bare, &ti_only()),
            Err(ScupError::ReferenceNotLoaded)
        ));

        let bad = BornCharges::new(BTreeMap::from([(5, [1.0; 3])]));
        assert!(matches!(
            polarization(&geometry(), &bad),
            Err(ScupError::AtomIndexOutOfBounds { index: 5, nats: 5 })
        ));
    }

    #[test]
    fn test_layers_and_columns() {
        let mut g = geometry();
        g.set_displacement(0, 0, 1, 1, [0.0, 0.0, 1.0]);

        let layers = layered_polarization(&g, &ti_only()).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0], [0.0; 3]);
        assert!((layers[1][2] - unit_conversion(7.0 / 16.0)).abs() < 1e-9);

        let columns = column_polarization(&g, &ti_only()).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].len(), 1);
        assert!((columns[0][0][2] - unit_conversion(7.0 / 16.0)).abs() < 1e-9);
        assert_eq!(columns[1][0], [0.0; 3]);
    }

    #[test]
    fn test_stepped_polarization() {
        let dir = TempDir::new().unwrap();
        let template = geometry();

        let mut paths = Vec::new();
        for step in 1..=3 {
            let mut g = template.clone();
            g.set_displacement(0, 0, 0, 1, [0.0, 0.0, step as f64 * 0.1]);
            let path = dir.path().join(format!("run_partial_{}.restart", step));
            g.write_restart(&path).unwrap();
            paths.push(path);
        }

        let pols = stepped_polarization(&template, &paths, &ti_only()).unwrap();
        assert_eq!(pols.len(), 3);
        assert!(pols[2][2] > pols[1][2] && pols[1][2] > pols[0][2]);
    }

    #[test]
    fn test_born_from_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("born.csv");
        std::fs::write(
            &path,
            "index,zx,zy,zz\n0, 2.566657, 2.566657, 2.566657\n1,7.265894,7.265894,7.265894\n",
        )
        .unwrap();

        let born = BornCharges::from_csv(&path).unwrap();
        assert_eq!(born.len(), 2);
        assert_eq!(born.get(1), Some(&[7.265894; 3]));

        std::fs::write(&path, "index,zx,zy,zz\n0,1,1,1\n0,2,2,2\n").unwrap();
        assert!(BornCharges::from_csv(&path).is_err());
    }
}
