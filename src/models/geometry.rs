//! # 超胞几何结构数据模型
//!
//! 保存 SCALE-UP 超胞的应变、参考位置与原子位移。
//! 读写 `.restart` / `.REF` 文件见 `parsers/restart.rs`。
//!
//! ## 坐标约定
//! - 应变：Voigt 记号 (xx, yy, zz, yz, xz, xy)，无量纲
//! - 位置与位移：Bohr
//! - 原胞按 x, y, z 顺序排列，每个原胞内 `nats` 个原子
//!
//! ## 依赖关系
//! - 被 `parsers/restart.rs`, `analysis/`, `results/`, `sweep/` 使用
//! - 无外部模块依赖

/// 超胞几何结构
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// 超胞形状 (nx, ny, nz)
    pub supercell: [usize; 3],
    /// 每个原胞中的原子数
    pub nats: usize,
    /// 原子种类，如 ["Sr", "Ti", "O"]
    pub species: Vec<String>,
    /// 超胞应变 (Voigt)
    pub strains: [f64; 6],
    /// 超胞晶格向量 (3x3 展平)，来自 .REF
    pub lat_vectors: Option<[f64; 9]>,
    /// 参考原子位置，来自 .REF
    pub positions: Option<Vec<[f64; 3]>>,
    /// 原子位移
    pub displacements: Vec<[f64; 3]>,
}

impl Geometry {
    /// 创建零应变、零位移的几何结构
    pub fn new(supercell: [usize; 3], species: Vec<String>, nats: usize) -> Self {
        let natoms = supercell[0] * supercell[1] * supercell[2] * nats;
        Geometry {
            supercell,
            nats,
            species,
            strains: [0.0; 6],
            lat_vectors: None,
            positions: None,
            displacements: vec![[0.0; 3]; natoms],
        }
    }

    /// 原胞数量
    pub fn ncells(&self) -> usize {
        self.supercell[0] * self.supercell[1] * self.supercell[2]
    }

    /// 原子种类数量
    pub fn nels(&self) -> usize {
        self.species.len()
    }

    /// 超胞内原子总数
    pub fn natoms(&self) -> usize {
        self.ncells() * self.nats
    }

    /// 原子 (x, y, z, j) 在展平数组中的下标
    pub fn index(&self, x: usize, y: usize, z: usize, j: usize) -> usize {
        ((x * self.supercell[1] + y) * self.supercell[2] + z) * self.nats + j
    }

    /// 原子位移
    pub fn displacement(&self, x: usize, y: usize, z: usize, j: usize) -> [f64; 3] {
        self.displacements[self.index(x, y, z, j)]
    }

    /// 按文件顺序遍历所有原子 (x, y, z, j)
    pub fn sites(&self) -> impl Iterator<Item = (usize, usize, usize, usize)> {
        let [nx, ny, nz] = self.supercell;
        let nats = self.nats;
        (0..nx).flat_map(move |x| {
            (0..ny).flat_map(move |y| {
                (0..nz).flat_map(move |z| (0..nats).map(move |j| (x, y, z, j)))
            })
        })
    }

    /// 原子在文件中的种类编号（1 起，超过种类数时取最后一种）
    pub fn species_index(&self, j: usize) -> usize {
        (j + 1).min(self.nels())
    }

    /// 原胞晶格常数 (xx, yy, zz)，Bohr
    pub fn lat_constants(&self) -> Option<[f64; 3]> {
        self.lat_vectors.map(|v| {
            [
                v[0] / self.supercell[0] as f64,
                v[4] / self.supercell[1] as f64,
                v[8] / self.supercell[2] as f64,
            ]
        })
    }

    /// 考虑应变后的原胞体积，Bohr³
    pub fn strained_cell_volume(&self) -> Option<f64> {
        self.lat_constants().map(|a| {
            (0..3)
                .map(|i| a[i] * (1.0 + self.strains[i]))
                .product::<f64>()
        })
    }

    /// 清零应变与位移
    pub fn reset(&mut self) {
        self.strains = [0.0; 6];
        self.displacements = vec![[0.0; 3]; self.natoms()];
    }
}

#[cfg(test)]
impl Geometry {
    pub(crate) fn set_displacement(&mut self, x: usize, y: usize, z: usize, j: usize, d: [f64; 3]) {
        let idx = self.index(x, y, z, j);
        self.displacements[idx] = d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srtio3(sc: [usize; 3]) -> Geometry {
        Geometry::new(sc, vec!["Sr".into(), "Ti".into(), "O".into()], 5)
    }

    #[test]
    fn test_new_geometry_is_zeroed() {
        let g = srtio3([2, 3, 4]);
        assert_eq!(g.ncells(), 24);
        assert_eq!(g.natoms(), 120);
        assert_eq!(g.nels(), 3);
        assert!(g.displacements.iter().all(|d| *d == [0.0; 3]));
        assert!(g.lat_constants().is_none());
    }

    #[test]
    fn test_sites_follow_file_order() {
        let g = srtio3([2, 1, 2]);
        let sites: Vec<_> = g.sites().collect();
        assert_eq!(sites.len(), g.natoms());
        assert_eq!(sites[0], (0, 0, 0, 0));
        assert_eq!(sites[5], (0, 0, 1, 0));
        assert_eq!(sites[10], (1, 0, 0, 0));
        for (n, (x, y, z, j)) in sites.into_iter().enumerate() {
            assert_eq!(g.index(x, y, z, j), n);
        }
    }

    #[test]
    fn test_species_index_saturates() {
        let g = srtio3([1, 1, 1]);
        let idx: Vec<usize> = (0..5).map(|j| g.species_index(j)).collect();
        assert_eq!(idx, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_lat_constants_and_volume() {
        let mut g = srtio3([2, 2, 4]);
        g.lat_vectors = Some([14.0, 0.0, 0.0, 0.0, 14.0, 0.0, 0.0, 0.0, 28.0]);
        assert_eq!(g.lat_constants(), Some([7.0, 7.0, 7.0]));

        g.strains = [0.01, 0.0, -0.01, 0.0, 0.0, 0.0];
        let v = g.strained_cell_volume().unwrap();
        assert!((v - 7.0 * 1.01 * 7.0 * 7.0 * 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut g = srtio3([1, 1, 1]);
        g.strains[0] = 0.5;
        g.set_displacement(0, 0, 0, 2, [1.0, 2.0, 3.0]);
        g.reset();
        assert_eq!(g.strains, [0.0; 6]);
        assert_eq!(g.displacement(0, 0, 0, 2), [0.0; 3]);
    }
}
