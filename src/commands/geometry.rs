//! # geometry 命令实现
//!
//! - `strain`: 生成给定应变、零位移的 .restart 文件
//! - `average`: 对多个 partial .restart 文件取平均
//!
//! ## 依赖关系
//! - 使用 `cli/geometry.rs` 定义的参数
//! - 使用 `parsers/restart.rs`, `results/configuration.rs`, `utils/output.rs`
//! - 使用 `glob` 展开输入模式

use crate::cli::geometry::{AverageArgs, GeometryArgs, GeometryCommands, StrainArgs};
use crate::commands::sweep::parse_supercell;
use crate::error::{Result, ScupError};
use crate::models::Geometry;
use crate::parsers::restart::read_header;
use crate::results::configuration::partial_step;
use crate::sweep::parse_vector;
use crate::utils::output;

use std::path::PathBuf;

/// 执行 geometry 命令
pub fn execute(args: GeometryArgs) -> Result<()> {
    match args.command {
        GeometryCommands::Strain(a) => strain(a),
        GeometryCommands::Average(a) => average(a),
    }
}

fn strain(args: StrainArgs) -> Result<()> {
    let supercell = parse_supercell(&args.cell.supercell)?;
    if args.cell.nats == 0 {
        return Err(ScupError::InvalidArgument(
            "Atoms per cell must be positive".to_string(),
        ));
    }

    let mut geom = Geometry::new(supercell, args.cell.species, args.cell.nats);
    geom.strains = parse_vector::<6>(&args.strain)?;
    geom.write_restart(&args.output)?;

    output::print_written("strained geometry", &args.output);
    Ok(())
}

/// 展开文件名与 glob 模式，去重并排序
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.contains(['*', '?', '[']) {
            let paths = glob::glob(input).map_err(|e| {
                ScupError::InvalidArgument(format!("Invalid pattern '{}': {}", input, e))
            })?;
            files.extend(paths.filter_map(|p| p.ok()).filter(|p| p.is_file()));
        } else {
            files.push(PathBuf::from(input));
        }
    }
    files.sort();
    files.dedup();

    if files.is_empty() {
        return Err(ScupError::NoFilesFound {
            pattern: inputs.join(" "),
        });
    }
    Ok(files)
}

fn average(args: AverageArgs) -> Result<()> {
    let mut files = expand_inputs(&args.inputs)?;

    if let Some(after) = args.after_step {
        files.retain(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(partial_step)
                .map(|step| step > after)
                .unwrap_or(false)
        });
        if files.is_empty() {
            return Err(ScupError::NotEnoughPartials {
                path: format!("partials after step {}", after),
            });
        }
    }

    let mut geom = read_header(&files[0])?;
    geom.load_equilibrium_displacements(&files)?;
    geom.write_restart(&args.output)?;

    output::print_info(&format!("Averaged {} partial file(s)", files.len()));
    output::print_written("average geometry", &args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_inputs() {
        let dir = TempDir::new().unwrap();
        for name in ["a_partial_1.restart", "a_partial_2.restart", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let pattern = format!("{}/*.restart", dir.path().display());
        let explicit = dir.path().join("a_partial_1.restart").display().to_string();
        let files = expand_inputs(&[pattern, explicit]).unwrap();
        assert_eq!(files.len(), 2);

        let none = format!("{}/*.REF", dir.path().display());
        assert!(expand_inputs(&[none]).is_err());
    }
}
