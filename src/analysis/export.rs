//! # 温度序列导出
//!
//! 将各温度下的三分量统计导出为 CSV：
//! `temp,<q>x,<q>y,<q>z,<q>x_err,<q>y_err,<q>z_err`
//!
//! ## 依赖关系
//! - 被 `commands/analyze/`, `analysis/plot.rs` 使用
//! - 使用 `csv` 库写入 CSV 文件

use crate::analysis::stats::Stats3;
use crate::error::{Result, ScupError};

use std::path::Path;
use tabled::Tabled;

/// 某个物理量随温度的变化
#[derive(Debug, Clone)]
pub struct TemperatureSeries {
    /// 列名前缀，如 "p"（极化）或 "s"（应变）
    pub quantity: String,
    /// 单位说明，用于图表
    pub unit: String,
    pub points: Vec<(f64, Stats3)>,
}

/// 终端表格的一行
#[derive(Tabled)]
pub struct SeriesRow {
    #[tabled(rename = "T (K)")]
    pub temp: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

fn with_err(mean: f64, std: f64) -> String {
    format!("{:.4e} ± {:.1e}", mean, std)
}

impl TemperatureSeries {
    pub fn new(quantity: &str, unit: &str) -> Self {
        TemperatureSeries {
            quantity: quantity.to_string(),
            unit: unit.to_string(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, temperature: f64, stats: Stats3) {
        self.points.push((temperature, stats));
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// CSV 表头
    pub fn headers(&self) -> Vec<String> {
        let q = &self.quantity;
        let mut h = vec!["temp".to_string()];
        h.extend(["x", "y", "z"].iter().map(|c| format!("{}{}", q, c)));
        h.extend(["x", "y", "z"].iter().map(|c| format!("{}{}_err", q, c)));
        h
    }

    /// 终端表格行
    pub fn table_rows(&self) -> Vec<SeriesRow> {
        self.points
            .iter()
            .map(|(t, s)| SeriesRow {
                temp: format!("{}", t),
                x: with_err(s.mean[0], s.std[0]),
                y: with_err(s.mean[1], s.std[1]),
                z: with_err(s.mean[2], s.std[2]),
            })
            .collect()
    }

    /// 导出 CSV
    pub fn to_csv(&self, output_path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(output_path)?;
        wtr.write_record(self.headers())?;

        for (t, s) in &self.points {
            let mut record = vec![t.to_string()];
            record.extend(s.mean.iter().map(|v| v.to_string()));
            record.extend(s.std.iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }

        wtr.flush().map_err(|e| ScupError::write(output_path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn series() -> TemperatureSeries {
        let mut s = TemperatureSeries::new("p", "C/m²");
        s.push(
            20.0,
            Stats3 {
                mean: [0.0, 0.0, 0.25],
                std: [0.01, 0.01, 0.02],
            },
        );
        s.push(
            40.0,
            Stats3 {
                mean: [0.0, 0.0, 0.2],
                std: [0.01, 0.01, 0.03],
            },
        );
        s
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            series().headers(),
            vec!["temp", "px", "py", "pz", "px_err", "py_err", "pz_err"]
        );
    }

    #[test]
    fn test_to_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("polarization.csv");
        series().to_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "temp,px,py,pz,px_err,py_err,pz_err");
        assert_eq!(lines[1], "20,0,0,0.25,0.01,0.01,0.02");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_table_rows() {
        let rows = series().table_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].temp, "20");
        assert!(rows[0].z.starts_with("2.5000e-1"));
    }
}
