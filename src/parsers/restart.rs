//! # SCALE-UP .restart / .REF 几何文件解析器
//!
//! ## 格式说明
//! ```text
//! nx ny nz
//! nats nels
//! Sr Ti O
//! s1 s2 s3 s4 s5 s6                 (.restart: Voigt 应变)
//! a1 a2 a3 b1 b2 b3 c1 c2 c3        (.REF: 超胞晶格向量)
//! x y z j species v1 v2 v3          (每个原子一行)
//! ```
//! `.restart` 中 v 为位移，`.REF` 中 v 为参考位置，单位均为 Bohr。
//!
//! ## 依赖关系
//! - 被 `commands/geometry.rs`, `results/`, `analysis/`, `sweep/` 使用
//! - 使用 `models/geometry.rs`

use crate::error::{Result, ScupError};
use crate::models::Geometry;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 以 `1.00000000E-02` 的形式输出浮点数（8 位小数，指数至少两位）
pub fn format_sci(v: f64) -> String {
    let s = format!("{:.8E}", v);
    match s.split_once('E') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}E{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}

fn parse_error(path: &Path, reason: impl Into<String>) -> ScupError {
    ScupError::ParseError {
        format: "geometry".to_string(),
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn mismatch(path: &Path, reason: impl Into<String>) -> ScupError {
    ScupError::GeometryMismatch {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// 逐行读取器
struct Lines<'a> {
    path: &'a Path,
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(path: &'a Path, content: &'a str) -> Self {
        Lines {
            path,
            inner: content.lines().enumerate(),
        }
    }

    /// 下一非空行的标记
    fn next_tokens(&mut self, what: &str) -> Result<(usize, Vec<&'a str>)> {
        for (idx, line) in self.inner.by_ref() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if !tokens.is_empty() {
                return Ok((idx + 1, tokens));
            }
        }
        Err(parse_error(
            self.path,
            format!("unexpected end of file while reading {}", what),
        ))
    }

    fn next_numbers<T: std::str::FromStr>(&mut self, what: &str, count: usize) -> Result<Vec<T>> {
        let (line, tokens) = self.next_tokens(what)?;
        if tokens.len() < count {
            return Err(parse_error(
                self.path,
                format!(
                    "line {}: expected {} values for {}, found {}",
                    line,
                    count,
                    what,
                    tokens.len()
                ),
            ));
        }
        tokens[..count]
            .iter()
            .map(|t| {
                t.parse::<T>().map_err(|_| {
                    parse_error(self.path, format!("line {}: invalid {} '{}'", line, what, t))
                })
            })
            .collect()
    }

    /// 原子行的最后三个数值（第 6~8 列）
    fn next_atom_vector(&mut self) -> Result<[f64; 3]> {
        let (line, tokens) = self.next_tokens("atom line")?;
        if tokens.len() < 8 {
            return Err(parse_error(
                self.path,
                format!("line {}: atom line needs 8 columns, found {}", line, tokens.len()),
            ));
        }
        let mut v = [0.0; 3];
        for (slot, t) in v.iter_mut().zip(&tokens[5..8]) {
            *slot = t.parse().map_err(|_| {
                parse_error(self.path, format!("line {}: invalid coordinate '{}'", line, t))
            })?;
        }
        Ok(v)
    }
}

/// 检查文件头与当前几何结构一致
fn check_header(geom: &Geometry, path: &Path, lines: &mut Lines<'_>) -> Result<()> {
    let sc: Vec<usize> = lines.next_numbers("supercell", 3)?;
    if sc != geom.supercell {
        return Err(mismatch(
            path,
            format!("supercell {:?} != {:?}", sc, geom.supercell),
        ));
    }

    let counts: Vec<usize> = lines.next_numbers("atom counts", 2)?;
    if counts[0] != geom.nats || counts[1] != geom.nels() {
        return Err(mismatch(
            path,
            format!(
                "nats/nels {}/{} != {}/{}",
                counts[0],
                counts[1],
                geom.nats,
                geom.nels()
            ),
        ));
    }

    let (_, species) = lines.next_tokens("species")?;
    let found: BTreeSet<&str> = species.into_iter().collect();
    let expected: BTreeSet<&str> = geom.species.iter().map(|s| s.as_str()).collect();
    if found != expected {
        return Err(mismatch(
            path,
            format!("species {:?} != {:?}", found, expected),
        ));
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ScupError::read(path, e))
}

/// 读取 .restart 内容中的应变与位移
fn read_restart_data(
    geom: &Geometry,
    path: &Path,
    content: &str,
) -> Result<([f64; 6], Vec<[f64; 3]>)> {
    let mut lines = Lines::new(path, content);
    check_header(geom, path, &mut lines)?;

    let strains: Vec<f64> = lines.next_numbers("strains", 6)?;
    let mut strain_arr = [0.0; 6];
    strain_arr.copy_from_slice(&strains);

    let mut disps = Vec::with_capacity(geom.natoms());
    for _ in 0..geom.natoms() {
        disps.push(lines.next_atom_vector()?);
    }

    Ok((strain_arr, disps))
}

/// 仅根据文件头（超胞、原子数、种类）创建零位移几何结构
pub fn read_header(path: &Path) -> Result<Geometry> {
    let content = read_file(path)?;
    let mut lines = Lines::new(path, &content);

    let sc: Vec<usize> = lines.next_numbers("supercell", 3)?;
    let counts: Vec<usize> = lines.next_numbers("atom counts", 2)?;
    let (_, species) = lines.next_tokens("species")?;

    if species.len() != counts[1] {
        return Err(parse_error(
            path,
            format!(
                "header declares {} species but lists {}",
                counts[1],
                species.len()
            ),
        ));
    }

    Ok(Geometry::new(
        [sc[0], sc[1], sc[2]],
        species.into_iter().map(String::from).collect(),
        counts[0],
    ))
}

impl Geometry {
    /// 读取 .restart 文件（覆盖当前应变与位移）
    pub fn load_restart(&mut self, path: &Path) -> Result<()> {
        self.reset();
        let content = read_file(path)?;
        let (strains, disps) = read_restart_data(self, path, &content)?;
        self.strains = strains;
        self.displacements = disps;
        debug!(path = %path.display(), "loaded restart geometry");
        Ok(())
    }

    /// 读取 .REF 参考结构（晶格向量与参考位置）
    pub fn load_reference(&mut self, path: &Path) -> Result<()> {
        let content = read_file(path)?;
        let mut lines = Lines::new(path, &content);
        check_header(self, path, &mut lines)?;

        let vectors: Vec<f64> = lines.next_numbers("lattice vectors", 9)?;
        let mut lat = [0.0; 9];
        lat.copy_from_slice(&vectors);

        let mut positions = Vec::with_capacity(self.natoms());
        for _ in 0..self.natoms() {
            positions.push(lines.next_atom_vector()?);
        }

        self.lat_vectors = Some(lat);
        self.positions = Some(positions);
        debug!(path = %path.display(), "loaded reference geometry");
        Ok(())
    }

    /// 对多个 partial .restart 文件取平均，得到平衡应变与位移
    pub fn load_equilibrium_displacements<P: AsRef<Path>>(&mut self, partials: &[P]) -> Result<()> {
        self.reset();

        if partials.is_empty() {
            return Err(ScupError::NotEnoughPartials {
                path: "<empty partial list>".to_string(),
            });
        }

        let n = partials.len() as f64;
        for p in partials {
            let path = p.as_ref();
            let content = read_file(path)?;
            let (strains, disps) = read_restart_data(self, path, &content)?;

            for (acc, s) in self.strains.iter_mut().zip(strains) {
                *acc += s / n;
            }
            for (acc, d) in self.displacements.iter_mut().zip(disps) {
                for k in 0..3 {
                    acc[k] += d[k] / n;
                }
            }
        }

        debug!(count = partials.len(), "averaged partial geometries");
        Ok(())
    }

    fn header_string(&self) -> String {
        let sc = self.supercell;
        format!(
            "{}\t{}\t{}\n{}\t{}\n{}\n",
            sc[0],
            sc[1],
            sc[2],
            self.nats,
            self.nels(),
            self.species.join("\t")
        )
    }

    fn atom_lines(&self, values: &[[f64; 3]]) -> String {
        let mut out = String::new();
        for (x, y, z, j) in self.sites() {
            let v = values[self.index(x, y, z, j)];
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                x,
                y,
                z,
                j + 1,
                self.species_index(j),
                format_sci(v[0]),
                format_sci(v[1]),
                format_sci(v[2])
            ));
        }
        out
    }

    /// 转换为 .restart 文本
    pub fn to_restart_string(&self) -> String {
        let strains: Vec<String> = self.strains.iter().map(|s| format_sci(*s)).collect();
        format!(
            "{}{}\n{}",
            self.header_string(),
            strains.join("\t"),
            self.atom_lines(&self.displacements)
        )
    }

    /// 转换为 .REF 文本
    pub fn to_reference_string(&self) -> Result<String> {
        let (Some(vectors), Some(positions)) = (self.lat_vectors, self.positions.as_ref()) else {
            return Err(ScupError::ReferenceNotLoaded);
        };
        let vectors: Vec<String> = vectors.iter().map(|v| format_sci(*v)).collect();
        Ok(format!(
            "{}{}\n{}",
            self.header_string(),
            vectors.join("\t"),
            self.atom_lines(positions)
        ))
    }

    /// 写入 .restart 文件（覆盖已有文件）
    pub fn write_restart(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_restart_string()).map_err(|e| ScupError::write(path, e))
    }

    /// 写入 .REF 文件（覆盖已有文件）
    pub fn write_reference(&self, path: &Path) -> Result<()> {
        let content = self.to_reference_string()?;
        fs::write(path, content).map_err(|e| ScupError::write(path, e))
    }
}
