//! # 极化分析子命令
//!
//! 由 Born 有效电荷与原子位移计算极化 (C/m²)。
//!
//! ## 模式
//! - `total`: 每个参与平均的 partial 文件计算一次超胞极化，再按温度统计
//! - `layers`: 平均结构中每个 z 层的极化
//! - `columns`: 平均结构中每个 (x, y) 柱的极化
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `analysis/polarization.rs`, `analysis/stats.rs`, `analysis/export.rs`, `analysis/plot.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::{load_series, temperatures, Selection};
use crate::analysis::plot::generate_series_plot;
use crate::analysis::polarization::{
    column_polarization, layered_polarization, stepped_polarization,
};
use crate::analysis::{BornCharges, Stats3, TemperatureSeries};
use crate::cli::analyze::{PolarizationArgs, PolarizationMode};
use crate::error::{Result, ScupError};
use crate::results::{Configuration, SimulationIndex};
use crate::utils::{output, progress};

use std::path::Path;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "T (K)")]
    temp: f64,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Px")]
    px: String,
    #[tabled(rename = "Py")]
    py: String,
    #[tabled(rename = "Pz")]
    pz: String,
}

impl SiteRow {
    fn new(temp: f64, site: String, p: [f64; 3]) -> Self {
        SiteRow {
            temp,
            site,
            px: format!("{:.4e}", p[0]),
            py: format!("{:.4e}", p[1]),
            pz: format!("{:.4e}", p[2]),
        }
    }
}

/// 执行极化分析
pub fn execute(args: PolarizationArgs) -> Result<()> {
    output::print_header("Polarization Analysis");

    let selection = Selection::from_args(&args.select)?;
    let index = SimulationIndex::open(&args.select.output)?;
    let temps = temperatures(&index, args.temps.as_deref())?;

    let born = BornCharges::from_csv(&args.born)?;
    output::print_info(&format!(
        "Loaded Born charges for {} atom(s) from '{}'",
        born.len(),
        args.born.display()
    ));

    let loaded = load_series(&index, &selection, &temps)?;

    match args.mode {
        PolarizationMode::Total => total(&args, &loaded, &born),
        PolarizationMode::Layers | PolarizationMode::Columns => {
            if args.plot.is_some() {
                output::print_warning("Plots are only generated in total mode");
            }
            resolved(&args, &loaded, &born)
        }
    }
}

/// 每个温度对 partial 文件的极化求统计
fn total(args: &PolarizationArgs, loaded: &[(f64, Configuration)], born: &BornCharges) -> Result<()> {
    let mut series = TemperatureSeries::new("p", "C/m²");
    let pb = progress::create_progress_bar(loaded.len() as u64, "Polarization");

    for (t, conf) in loaded {
        pb.set_message(format!("T = {} K", t));
        let samples = stepped_polarization(&conf.geometry, &conf.measured_partials(), born)?;
        let stats = if args.abs {
            Stats3::from_abs_samples(&samples)
        } else {
            Stats3::from_samples(&samples)
        };
        if let Some(s) = stats {
            series.push(*t, s);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if series.is_empty() {
        return Err(ScupError::Other("No polarization samples".to_string()));
    }

    println!("{}\n", Table::new(series.table_rows()));

    series.to_csv(&args.csv)?;
    output::print_written("CSV", &args.csv);

    if let Some(plot) = &args.plot {
        generate_series_plot(&series, plot, "Polarization (C/m²)")?;
        output::print_written("plot", plot);
    }

    output::print_done(&format!("Analyzed {} temperature(s)", series.points.len()));
    Ok(())
}

/// 分层或分柱的极化，基于平均结构
fn resolved(args: &PolarizationArgs, loaded: &[(f64, Configuration)], born: &BornCharges) -> Result<()> {
    let mut rows = Vec::new();

    for (t, conf) in loaded {
        if args.mode == PolarizationMode::Layers {
            for (z, p) in layered_polarization(&conf.geometry, born)?.into_iter().enumerate() {
                rows.push(SiteRow::new(*t, z.to_string(), p));
            }
        } else {
            for (x, col) in column_polarization(&conf.geometry, born)?.into_iter().enumerate() {
                for (y, p) in col.into_iter().enumerate() {
                    rows.push(SiteRow::new(*t, format!("{},{}", x, y), p));
                }
            }
        }
    }

    println!("{}\n", Table::new(&rows));

    let site_header = match args.mode {
        PolarizationMode::Layers => "layer",
        _ => "column",
    };
    write_site_csv(&args.csv, site_header, &rows)?;
    output::print_written("CSV", &args.csv);

    output::print_done(&format!("Analyzed {} temperature(s)", loaded.len()));
    Ok(())
}

fn write_site_csv(path: &Path, site_header: &str, rows: &[SiteRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["temp", site_header, "px", "py", "pz"])?;
    for r in rows {
        wtr.write_record([
            r.temp.to_string(),
            r.site.clone(),
            r.px.clone(),
            r.py.clone(),
            r.pz.clone(),
        ])?;
    }
    wtr.flush().map_err(|e| ScupError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_site_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.csv");
        let rows = vec![
            SiteRow::new(20.0, "0".to_string(), [0.0, 0.0, 0.25]),
            SiteRow::new(20.0, "1".to_string(), [0.0, 0.0, -0.25]),
        ];
        write_site_csv(&path, "layer", &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "temp,layer,px,py,pz");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("20,1,"));
    }
}
