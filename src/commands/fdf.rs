//! # fdf 命令实现
//!
//! FDF 输入文件的检查、显示与修改。
//!
//! ## 功能
//! - `check`: 单文件或目录批量检查（并行）
//! - `show`: 以表格显示所有设置与块
//! - `set`: 修改标量和块，写回文件
//!
//! ## 依赖关系
//! - 使用 `cli/fdf.rs` 定义的参数
//! - 使用 `parsers/fdf.rs`, `validate.rs`, `batch/`, `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::fdf::{CheckArgs, FdfArgs, FdfCommands, SetArgs, ShowArgs};
use crate::error::{Result, ScupError};
use crate::models::fdf::normalize_label;
use crate::models::{FdfEntry, ScupSettings};
use crate::parsers::fdf::{parse_fdf_file, to_fdf_string, write_fdf_file};
use crate::utils::output;
use crate::validate::{self, Issue};

use std::path::PathBuf;
use std::sync::Mutex;
use tabled::{Table, Tabled};

/// 执行 fdf 命令
pub fn execute(args: FdfArgs) -> Result<()> {
    match args.command {
        FdfCommands::Check(a) => check(a),
        FdfCommands::Show(a) => show(a),
        FdfCommands::Set(a) => set(a),
    }
}

// ─────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────

fn check(args: CheckArgs) -> Result<()> {
    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive);
    let files = collector.collect()?;

    if files.is_empty() {
        return Err(ScupError::NoFilesFound {
            pattern: format!("{}/{}", args.input.display(), args.pattern),
        });
    }

    let reports: Mutex<Vec<(PathBuf, Vec<Issue>)>> = Mutex::new(Vec::new());
    let runner = BatchRunner::new(args.jobs).with_progress(collector.is_directory());

    let result = runner.run(&files, "Checking", |path| {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => return ProcessResult::Failed(path.display().to_string(), e.to_string()),
        };
        let issues = validate::check_content(&content);
        let failed = !validate::is_valid(&issues) || (args.strict && !issues.is_empty());

        let name = path.display().to_string();
        if let Ok(mut r) = reports.lock() {
            r.push((path.clone(), issues));
        }
        if failed {
            ProcessResult::Failed(name, "invalid".to_string())
        } else {
            ProcessResult::Success(name)
        }
    })?;

    let mut reports = reports
        .into_inner()
        .map_err(|_| ScupError::Other("check results poisoned".to_string()))?;
    reports.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, issues) in &reports {
        let name = path.display().to_string();
        for issue in issues {
            output::print_issue(&name, issue);
        }
    }

    for (path, err) in &result.failures {
        if err != "invalid" {
            output::print_error(&format!("{}: {}", path, err));
        }
    }

    if result.failed > 0 {
        return Err(ScupError::Other(format!(
            "{} of {} FDF file(s) failed the check",
            result.failed,
            result.total()
        )));
    }

    output::print_done(&format!("{} FDF file(s) passed", result.success));
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// show
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

/// 已识别设置的概要，未设置的项不显示
fn settings_summary(s: &ScupSettings) -> Vec<(&'static str, String)> {
    let flags = |f: [bool; 6]| f.iter().map(|b| if *b { 'T' } else { 'F' }).collect::<String>();

    let mut out = vec![("System", s.system_name.clone())];
    let optional = [
        ("Parameter file", s.parameter_file.clone()),
        ("Supercell", s.supercell.map(|c| format!("{} x {} x {}", c[0], c[1], c[2]))),
        ("Temperature", s.temperature.map(|t| format!("{} K", t))),
        ("MC sweeps", s.nsweeps.map(|n| n.to_string())),
        ("Partial output interval", s.n_write_mc.map(|n| n.to_string())),
        ("Max displacement step", s.max_step_d.map(|d| d.to_string())),
        ("Lattice output interval", s.lattice_output_interval.map(|n| n.to_string())),
        ("Fixed strain components", s.fixed_strain.map(flags)),
        ("Run mode", s.run_mode.clone()),
        ("MC strains", s.mc_strains.map(|b| b.to_string())),
    ];
    out.extend(optional.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
    out
}

fn show(args: ShowArgs) -> Result<()> {
    let doc = parse_fdf_file(&args.input)?;
    let wanted: Vec<String> = args.key.iter().map(|k| normalize_label(k)).collect();
    let selected = |key: &str| wanted.is_empty() || wanted.contains(&normalize_label(key));

    let mut rows = Vec::new();
    for entry in &doc.entries {
        match entry {
            FdfEntry::Scalar(s) if selected(&s.key) => {
                let unit = s.unit().unwrap_or_default().to_string();
                let value = if unit.is_empty() {
                    s.raw_value()
                } else {
                    s.tokens[0].clone()
                };
                rows.push(EntryRow {
                    line: s.line,
                    key: s.key.clone(),
                    value,
                    unit,
                });
            }
            FdfEntry::Block(b) if selected(&b.name) => {
                let rows_text: Vec<String> = b.rows.iter().map(|r| r.join(" ")).collect();
                rows.push(EntryRow {
                    line: b.line,
                    key: format!("%block {}", b.name),
                    value: rows_text.join(" / "),
                    unit: String::new(),
                });
            }
            _ => {}
        }
    }

    output::print_header(&format!("FDF: {}", args.input.display()));
    for key in args.key.iter().filter(|k| !doc.contains(k.as_str())) {
        output::print_warning(&format!("'{}' not found", key));
    }
    if rows.is_empty() {
        output::print_warning("No matching settings");
        return Ok(());
    }
    println!("{}", Table::new(&rows));

    if wanted.is_empty() {
        match ScupSettings::from_document(&doc) {
            Ok(s) => {
                println!();
                for (name, value) in settings_summary(&s) {
                    output::print_info(&format!("{}: {}", name, value));
                }
            }
            Err(e) => output::print_warning(&e.to_string()),
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────
// set
// ─────────────────────────────────────────────────────────────

/// 拆分 `KEY=VALUE`
fn split_assignment(text: &str) -> Result<(&str, &str)> {
    let (key, value) = text.split_once('=').ok_or_else(|| {
        ScupError::InvalidArgument(format!("Expected KEY=VALUE, got '{}'", text))
    })?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(ScupError::InvalidArgument(format!(
            "Expected KEY=VALUE, got '{}'",
            text
        )));
    }
    Ok((key, value))
}

/// 块内容：行以 ';' 分隔，行内以空白分隔
fn parse_block_rows(value: &str) -> Vec<Vec<String>> {
    value
        .split(';')
        .map(|row| row.split_whitespace().map(String::from).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect()
}

fn set(args: SetArgs) -> Result<()> {
    if args.assignments.is_empty() && args.block.is_empty() && args.remove.is_empty() {
        return Err(ScupError::InvalidArgument(
            "Nothing to change: give KEY=VALUE, --block or --remove".to_string(),
        ));
    }

    let mut doc = parse_fdf_file(&args.input)?;

    for key in &args.remove {
        if doc.remove(key) == 0 {
            output::print_warning(&format!("'{}' not found", key));
        }
    }

    for text in &args.assignments {
        let (key, value) = split_assignment(text)?;
        let tokens: Vec<String> = value.split_whitespace().map(String::from).collect();
        if tokens.len() == 1 {
            // 单个值：保留原有单位
            doc.set_value(key, value);
        } else {
            doc.set_scalar(key, tokens);
        }
    }

    for text in &args.block {
        let (name, value) = split_assignment(text)?;
        doc.set_block(name, parse_block_rows(value));
    }

    for issue in validate::check_content(&to_fdf_string(&doc)) {
        output::print_issue("result", &issue);
    }

    let out = args.output.unwrap_or(args.input);
    write_fdf_file(&doc, &out)?;
    output::print_written("FDF", &out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_assignment() {
        assert_eq!(
            split_assignment("MC_temperature = 20 kelvin").unwrap(),
            ("MC_temperature", "20 kelvin")
        );
        assert!(split_assignment("MC_nsweeps").is_err());
        assert!(split_assignment("MC_nsweeps=").is_err());
    }

    #[test]
    fn test_settings_summary() {
        let doc = crate::parsers::fdf::parse_fdf_content(
            "System_name srtio3\nMC_nsweeps 1000\n%block fix_strain_component\nT T F F F F\n%endblock fix_strain_component\n",
            "<test>",
        )
        .unwrap();
        let summary = settings_summary(&ScupSettings::from_document(&doc).unwrap());

        assert_eq!(summary[0], ("System", "srtio3".to_string()));
        assert!(summary.contains(&("MC sweeps", "1000".to_string())));
        assert!(summary.contains(&("Fixed strain components", "TTFFFF".to_string())));
        assert!(!summary.iter().any(|(k, _)| *k == "Temperature"));
    }

    #[test]
    fn test_parse_block_rows() {
        assert_eq!(
            parse_block_rows("8 8 8"),
            vec![vec!["8".to_string(), "8".to_string(), "8".to_string()]]
        );
        assert_eq!(parse_block_rows("1 0 0; 0 1 0;").len(), 2);
    }
}
