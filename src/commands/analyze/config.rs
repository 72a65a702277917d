//! # 单构型概要
//!
//! 显示某一温度（及应力 / 应变 / 电场）构型的步数、测量次数与平均应变，
//! 可选写出平均几何结构或参考结构。
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `results/`, `utils/output.rs`

use super::Selection;
use crate::cli::analyze::ConfigArgs;
use crate::error::Result;
use crate::parsers::restart::format_sci;
use crate::parsers::{geometry_kind, GeometryKind};
use crate::results::SimulationIndex;
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StrainRow {
    #[tabled(rename = "Component")]
    component: &'static str,
    #[tabled(rename = "Strain")]
    value: String,
}

const VOIGT: [&str; 6] = ["xx", "yy", "zz", "yz", "xz", "xy"];

/// 执行 config 分析
pub fn execute(args: ConfigArgs) -> Result<()> {
    let selection = Selection::from_args(&args.select)?;
    let index = SimulationIndex::open(&args.select.output)?;
    let conf = selection.access(&index, args.temp)?;
    let geom = &conf.geometry;

    output::print_header(&format!("{} at {} K", index.setup.name, args.temp));
    output::print_info(&format!("Folder: {}", conf.folder.display()));
    output::print_info(&format!(
        "Supercell: {} x {} x {}, {} atoms per cell ({})",
        geom.supercell[0],
        geom.supercell[1],
        geom.supercell[2],
        geom.nats,
        geom.species.join(" ")
    ));
    output::print_info(&format!(
        "MC steps: {} total, threshold {}, {} measurement(s)",
        conf.total_steps, conf.step_threshold, conf.nmeas
    ));
    if let Some(a) = geom.lat_constants() {
        output::print_info(&format!(
            "Lattice constants (bohr): {:.6} {:.6} {:.6}",
            a[0], a[1], a[2]
        ));
    }

    let rows: Vec<StrainRow> = VOIGT
        .into_iter()
        .zip(conf.strains())
        .map(|(c, v)| StrainRow {
            component: c,
            value: format_sci(v),
        })
        .collect();
    println!("\n{}\n", Table::new(&rows));

    if let Some(path) = &args.write {
        match geometry_kind(path)? {
            GeometryKind::Restart => {
                geom.write_restart(path)?;
                output::print_written("average geometry", path);
            }
            GeometryKind::Reference => {
                geom.write_reference(path)?;
                output::print_written("reference structure", path);
            }
        }
    }

    Ok(())
}
