//! # 应变分析子命令
//!
//! 对每个温度的 partial 文件读取对角应变，求平均值与标准差，
//! 并给出 c/a 比。默认旋转坐标轴，使最大应变分量作为 z 输出。
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `analysis/stats.rs`, `analysis/export.rs`, `analysis/plot.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::{load_series, temperatures, Selection};
use crate::analysis::plot::generate_series_plot;
use crate::analysis::stats::{ca_ratio, major_axis_order, partial_strains};
use crate::analysis::{Stats3, TemperatureSeries};
use crate::cli::analyze::StrainArgs;
use crate::error::{Result, ScupError};
use crate::results::SimulationIndex;
use crate::utils::{output, progress};

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StrainRow {
    #[tabled(rename = "T (K)")]
    temp: String,
    #[tabled(rename = "xx")]
    x: String,
    #[tabled(rename = "yy")]
    y: String,
    #[tabled(rename = "zz")]
    z: String,
    #[tabled(rename = "c/a")]
    ca: String,
}

/// 单个温度的应变统计；`rotate` 时样本与统计量做同样的轴旋转
fn strain_stats(samples: &[[f64; 3]], rotate: bool) -> Option<(Stats3, f64)> {
    let stats = Stats3::from_samples(samples)?;
    if !rotate {
        return Some((stats, ca_ratio(samples)?));
    }

    let order = major_axis_order(&stats.mean);
    let rotated: Vec<[f64; 3]> = samples.iter().map(|s| order.map(|i| s[i])).collect();
    Some((stats.rotate_to_major_axis(), ca_ratio(&rotated)?))
}

/// 执行应变分析
pub fn execute(args: StrainArgs) -> Result<()> {
    output::print_header("Strain Analysis");

    let selection = Selection::from_args(&args.select)?;
    let index = SimulationIndex::open(&args.select.output)?;
    let temps = temperatures(&index, args.temps.as_deref())?;
    let loaded = load_series(&index, &selection, &temps)?;

    let mut series = TemperatureSeries::new("s", "strain");
    let mut ratios = Vec::new();
    let pb = progress::create_progress_bar(loaded.len() as u64, "Strain");

    for (t, conf) in &loaded {
        pb.set_message(format!("T = {} K", t));
        let samples = partial_strains(&conf.geometry, &conf.measured_partials())?;
        if let Some((stats, ca)) = strain_stats(&samples, !args.no_rotate) {
            series.push(*t, stats);
            ratios.push(ca);
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if series.is_empty() {
        return Err(ScupError::Other("No strain samples".to_string()));
    }

    let rows: Vec<StrainRow> = series
        .table_rows()
        .into_iter()
        .zip(&ratios)
        .map(|(r, ca)| StrainRow {
            temp: r.temp,
            x: r.x,
            y: r.y,
            z: r.z,
            ca: format!("{:.6}", ca),
        })
        .collect();
    println!("{}\n", Table::new(&rows));

    series.to_csv(&args.csv)?;
    output::print_written("CSV", &args.csv);

    if let Some(plot) = &args.plot {
        generate_series_plot(&series, plot, "Strain")?;
        output::print_written("plot", plot);
    }

    output::print_done(&format!("Analyzed {} temperature(s)", series.points.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strain_stats_rotates_samples() {
        // 最大应变在 y 方向
        let samples = [[0.0, 0.02, 0.0], [0.0, 0.04, 0.0]];

        let (plain, ca) = strain_stats(&samples, false).unwrap();
        assert_eq!(plain.mean, [0.0, 0.03, 0.0]);
        assert!((ca - 1.0).abs() < 1e-12);

        let (rotated, ca) = strain_stats(&samples, true).unwrap();
        assert_eq!(rotated.mean, [0.0, 0.0, 0.03]);
        assert!((ca - 1.03).abs() < 1e-12);

        assert!(strain_stats(&[], true).is_none());
    }
}
