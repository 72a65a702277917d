//! # 温度序列图表
//!
//! 使用 `plotters` 绘制 x/y/z 三分量随温度变化的误差棒图。
//!
//! ## 功能
//! - 每个分量一条折线 + 竖直误差棒
//! - 根据扩展名输出 PNG 或 SVG
//!
//! ## 依赖关系
//! - 被 `commands/analyze/` 调用
//! - 使用 `analysis/export.rs` 的 TemperatureSeries
//! - 使用 `plotters` 渲染图表

use crate::analysis::export::TemperatureSeries;
use crate::error::{Result, ScupError};

use plotters::prelude::*;
use std::path::Path;

/// 图表尺寸
pub const PLOT_SIZE: (u32, u32) = (1000, 700);

fn plot_err<E: std::fmt::Debug>(e: E) -> ScupError {
    ScupError::Other(format!("{:?}", e))
}

/// 生成误差棒图，`.svg` 扩展名输出 SVG，其余输出 PNG
pub fn generate_series_plot(series: &TemperatureSeries, output_path: &Path, title: &str) -> Result<()> {
    if series.is_empty() {
        return Err(ScupError::InvalidArgument(
            "Nothing to plot: the series is empty".to_string(),
        ));
    }

    let use_svg = output_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if use_svg {
        let root = SVGBackend::new(output_path, PLOT_SIZE).into_drawing_area();
        draw_series_chart(&root, series, title)?;
        root.present().map_err(|e| ScupError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, PLOT_SIZE).into_drawing_area();
        draw_series_chart(&root, series, title)?;
        root.present().map_err(|e| ScupError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 坐标范围，两侧各留 5% 余量
fn ranges(series: &TemperatureSeries) -> ((f64, f64), (f64, f64)) {
    let temps = series.points.iter().map(|(t, _)| *t);
    let t_min = temps.clone().fold(f64::INFINITY, f64::min);
    let t_max = temps.fold(f64::NEG_INFINITY, f64::max);

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, s) in &series.points {
        for i in 0..3 {
            y_min = y_min.min(s.mean[i] - s.std[i]);
            y_max = y_max.max(s.mean[i] + s.std[i]);
        }
    }

    let pad = |lo: f64, hi: f64| {
        let span = if hi > lo { hi - lo } else { lo.abs().max(1.0) };
        (lo - 0.05 * span, hi + 0.05 * span)
    };

    (pad(t_min, t_max), pad(y_min, y_max))
}

/// 绘制图表的核心逻辑
fn draw_series_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &TemperatureSeries,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let ((x_min, x_max), (y_min, y_max)) = ranges(series);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("T (K)")
        .y_desc(format!("{} ({})", series.quantity, series.unit))
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_err)?;

    let colors = [RGBColor(0, 102, 204), RGBColor(204, 51, 0), RGBColor(0, 153, 76)];

    for (i, (axis, color)) in ["x", "y", "z"].iter().zip(colors).enumerate() {
        let points: Vec<(f64, f64)> = series.points.iter().map(|(t, s)| (*t, s.mean[i])).collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(plot_err)?
            .label(format!("{}{}", series.quantity, axis))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        chart
            .draw_series(series.points.iter().map(|(t, s)| {
                ErrorBar::new_vertical(
                    *t,
                    s.mean[i] - s.std[i],
                    s.mean[i],
                    s.mean[i] + s.std[i],
                    color.filled(),
                    8,
                )
            }))
            .map_err(plot_err)?;

        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 4, color.filled())))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stats::Stats3;
    use tempfile::TempDir;

    fn series() -> TemperatureSeries {
        let mut s = TemperatureSeries::new("s", "strain");
        for (i, t) in [20.0, 40.0, 60.0].into_iter().enumerate() {
            s.push(
                t,
                Stats3 {
                    mean: [0.001 * i as f64, 0.0, 0.01 - 0.002 * i as f64],
                    std: [0.0005; 3],
                },
            );
        }
        s
    }

    #[test]
    fn test_ranges_include_error_bars() {
        let ((x0, x1), (y0, y1)) = ranges(&series());
        assert!(x0 < 20.0 && x1 > 60.0);
        assert!(y0 < -0.0005 && y1 > 0.0105);
    }

    #[test]
    fn test_empty_series() {
        let dir = TempDir::new().unwrap();
        let empty = TemperatureSeries::new("p", "C/m²");
        assert!(generate_series_plot(&empty, &dir.path().join("p.png"), "P").is_err());
    }
}
