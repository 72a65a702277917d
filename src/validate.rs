//! # FDF 输入文件检查
//!
//! 对 SCALE-UP 输入文件做结构与取值检查，一次报告全部问题而不是遇错即停。
//!
//! ## 检查项
//! - 每个 `%block X` 都有同名 `%endblock X`
//! - 非注释、非块的行均为 `<标签> <值>+`
//! - `Supercell` 块恰有一行、三个正整数
//! - `fix_strain_component` 块恰有一行、六个 T/F 标记
//! - 已知设置的值类型（警告）、重复设置（警告）
//!
//! ## 依赖关系
//! - 被 `commands/fdf.rs` 使用
//! - 使用 `parsers/fdf.rs` 的行级工具函数

use crate::models::fdf::{normalize_label, parse_bool_token, parse_float_token};
use crate::parsers::fdf::{directive, split_comment, Directive};

use std::collections::HashMap;
use std::fmt;

/// 问题级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// 单个检查问题
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(line: usize, message: impl Into<String>) -> Self {
        Issue {
            line,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(line: usize, message: impl Into<String>) -> Self {
        Issue {
            line,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// 已知设置的期望类型
#[derive(Debug, Clone, Copy)]
enum Expected {
    Integer,
    Number,
    Boolean,
}

fn expected_type(norm_key: &str) -> Option<Expected> {
    match norm_key {
        "mcnsweeps" | "nwritemc" | "printstdlatticensteps" => Some(Expected::Integer),
        "mctemperature" | "mcannealingrate" | "mcmaxstepd" => Some(Expected::Number),
        "noelectron" | "mcstrains" | "printjustgeo" => Some(Expected::Boolean),
        k if k.starts_with("printstd") => Some(Expected::Boolean),
        _ => None,
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// 正在读取的块
struct OpenBlock {
    name: String,
    line: usize,
    rows: Vec<(usize, Vec<String>)>,
}

/// 检查 FDF 文本，返回按行号排序的问题列表
pub fn check_content(content: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut open: Option<OpenBlock> = None;
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    let mut seen_blocks: HashMap<String, usize> = HashMap::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();

        if let Some(block) = open.as_mut() {
            match directive(trimmed) {
                Some(Directive::EndBlock(name)) => {
                    let name = name.unwrap_or("");
                    if normalize_label(name) != normalize_label(&block.name) {
                        issues.push(Issue::error(
                            line_no,
                            format!(
                                "'%endblock {}' does not match '%block {}' at line {}",
                                name, block.name, block.line
                            ),
                        ));
                    }
                    if let Some(done) = open.take() {
                        check_block(&done, &mut issues);
                    }
                }
                Some(Directive::Block(name)) => {
                    issues.push(Issue::error(
                        line_no,
                        format!(
                            "'%block {}' opened before '%block {}' (line {}) was closed",
                            name.unwrap_or(""),
                            block.name,
                            block.line
                        ),
                    ));
                }
                _ => {
                    let (data, _) = split_comment(trimmed);
                    let row: Vec<String> = data.split_whitespace().map(String::from).collect();
                    if !row.is_empty() {
                        block.rows.push((line_no, row));
                    }
                }
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match directive(trimmed) {
            Some(Directive::Block(Some(name))) => {
                let norm = normalize_label(name);
                if let Some(first) = seen_blocks.get(&norm) {
                    issues.push(Issue::warning(
                        line_no,
                        format!("block '{}' already defined at line {}", name, first),
                    ));
                } else {
                    seen_blocks.insert(norm, line_no);
                }
                open = Some(OpenBlock {
                    name: name.to_string(),
                    line: line_no,
                    rows: Vec::new(),
                });
            }
            Some(Directive::Block(None)) => {
                issues.push(Issue::error(line_no, "%block without a name"));
            }
            Some(Directive::EndBlock(name)) => {
                issues.push(Issue::error(
                    line_no,
                    format!(
                        "'%endblock {}' without a matching %block",
                        name.unwrap_or("")
                    ),
                ));
            }
            Some(Directive::Other(keyword)) => {
                issues.push(Issue::error(
                    line_no,
                    format!("unsupported directive '%{}'", keyword),
                ));
            }
            None => check_scalar_line(line_no, trimmed, &mut seen_keys, &mut issues),
        }
    }

    if let Some(block) = open {
        issues.push(Issue::error(
            block.line,
            format!(
                "'%block {}' is never closed (missing '%endblock {}')",
                block.name, block.name
            ),
        ));
    }

    issues.sort_by_key(|i| i.line);
    issues
}

fn check_scalar_line(
    line_no: usize,
    line: &str,
    seen_keys: &mut HashMap<String, usize>,
    issues: &mut Vec<Issue>,
) {
    let (data, _) = split_comment(line);
    let tokens: Vec<&str> = data.split_whitespace().collect();
    let Some((key, values)) = tokens.split_first() else {
        return;
    };

    if !is_identifier(key) {
        issues.push(Issue::error(
            line_no,
            format!("'{}' is not a valid setting label", key),
        ));
        return;
    }

    if values.is_empty() {
        issues.push(Issue::error(
            line_no,
            format!("setting '{}' has no value", key),
        ));
        return;
    }

    let norm = normalize_label(key);
    if let Some(first) = seen_keys.get(&norm) {
        issues.push(Issue::warning(
            line_no,
            format!("'{}' already set at line {}; the last value wins", key, first),
        ));
    } else {
        seen_keys.insert(norm.clone(), line_no);
    }

    let value = values[0];
    let ok = match expected_type(&norm) {
        Some(Expected::Integer) => value.parse::<i64>().is_ok(),
        Some(Expected::Number) => parse_float_token(value).is_some(),
        Some(Expected::Boolean) => parse_bool_token(value).is_some(),
        None => true,
    };
    if !ok {
        let wanted = match expected_type(&norm) {
            Some(Expected::Integer) => "an integer",
            Some(Expected::Number) => "a number",
            _ => "a boolean (.true./.false.)",
        };
        issues.push(Issue::warning(
            line_no,
            format!("'{}' expects {}, found '{}'", key, wanted, value),
        ));
    }
}

fn check_block(block: &OpenBlock, issues: &mut Vec<Issue>) {
    let norm = normalize_label(&block.name);

    if block.rows.is_empty() {
        let message = format!("block '{}' is empty", block.name);
        issues.push(match norm.as_str() {
            "supercell" | "fixstraincomponent" => Issue::error(block.line, message),
            _ => Issue::warning(block.line, message),
        });
        return;
    }

    match norm.as_str() {
        "supercell" => {
            if block.rows.len() != 1 {
                issues.push(Issue::error(
                    block.line,
                    format!(
                        "Supercell must hold exactly one line, found {}",
                        block.rows.len()
                    ),
                ));
            }
            let (line, row) = &block.rows[0];
            let valid = row.len() == 3
                && row
                    .iter()
                    .all(|t| t.parse::<u32>().map(|v| v > 0).unwrap_or(false));
            if !valid {
                issues.push(Issue::error(
                    *line,
                    format!(
                        "Supercell expects three positive integers, found '{}'",
                        row.join(" ")
                    ),
                ));
            }
        }
        "fixstraincomponent" => {
            if block.rows.len() != 1 {
                issues.push(Issue::error(
                    block.line,
                    format!(
                        "fix_strain_component must hold exactly one line, found {}",
                        block.rows.len()
                    ),
                ));
            }
            let (line, row) = &block.rows[0];
            let valid = row.len() == 6
                && row
                    .iter()
                    .all(|t| t.eq_ignore_ascii_case("T") || t.eq_ignore_ascii_case("F"));
            if !valid {
                issues.push(Issue::error(
                    *line,
                    format!(
                        "fix_strain_component expects six T/F flags, found '{}'",
                        row.join(" ")
                    ),
                ));
            }
        }
        _ => {}
    }
}

/// 没有 error 级问题即视为合法
pub fn is_valid(issues: &[Issue]) -> bool {
    issues.iter().all(|i| i.severity != Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
# valid deck
System_name               srtio3
MC_temperature            20 kelvin
MC_nsweeps                40000
No_electron               .true.

%block Supercell
  8 8 8
%endblock Supercell

%block fix_strain_component
  T T F F F T
%endblock fix_strain_component
"#;

    const FULL: &str = r#"
System_name               srtio3
Parameter_file            srtio3_full_lat.xml
No_electron               .true.
Print_std_lattice_nsteps  100
Print_std_energy          .true.
Print_std_polarization    .false.
Print_std_strain          .true.
Print_std_av_polarization .true.
Print_std_av_strain       .true.
run_mode                  MC
MC_strains                .true.
MC_temperature            20 kelvin     # K
MC_annealing_rate         1.0
MC_nsweeps                40000
MC_max_step_d             0.1
Print_justgeo             .false.
n_write_mc                100

%block Supercell
  4 4 4
%endblock Supercell

%block fix_strain_component
  F F F T T T
%endblock fix_strain_component
"#;

    fn errors(issues: &[Issue]) -> Vec<&Issue> {
        issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect()
    }

    #[test]
    fn test_valid_deck_has_no_issues() {
        let issues = check_content(GOOD);
        assert!(issues.is_empty(), "{:?}", issues);
        assert!(is_valid(&issues));
    }

    #[test]
    fn test_deck_with_every_known_setting() {
        let issues = check_content(FULL);
        assert!(issues.is_empty(), "{:?}", issues);

        let doc = crate::parsers::fdf::parse_fdf_content(FULL, "<full>").unwrap();
        let settings = crate::models::ScupSettings::from_document(&doc).unwrap();
        assert_eq!(settings.supercell, Some([4, 4, 4]));
        assert_eq!(
            settings.fixed_strain,
            Some([false, false, false, true, true, true])
        );
        assert_eq!(settings.lattice_output_interval, Some(100));
        assert_eq!(settings.mc_strains, Some(true));
    }

    #[test]
    fn test_empty_required_blocks_are_errors() {
        let issues = check_content(
            "System_name x\n%block Supercell\n%endblock Supercell\n%block fix_strain_component\n%endblock fix_strain_component\n%block notes\n%endblock notes\n",
        );
        assert!(!is_valid(&issues));

        let errs = errors(&issues);
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].message, "block 'Supercell' is empty");
        assert_eq!(errs[1].message, "block 'fix_strain_component' is empty");
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Warning && i.message == "block 'notes' is empty"));
    }

    #[test]
    fn test_unmatched_block_names() {
        let issues = check_content("%block Supercell\n 2 2 2\n%endblock supercel\n");
        let errs = errors(&issues);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 3);
    }

    #[test]
    fn test_unclosed_block() {
        let issues = check_content("a 1\n%block Supercell\n 2 2 2\n");
        assert_eq!(errors(&issues)[0].line, 2);
        assert!(!is_valid(&issues));
    }

    #[test]
    fn test_stray_endblock() {
        let issues = check_content("%endblock Supercell\n");
        assert_eq!(errors(&issues).len(), 1);
    }

    #[test]
    fn test_line_without_value() {
        let issues = check_content("System_name\n");
        assert_eq!(errors(&issues)[0].message, "setting 'System_name' has no value");
    }

    #[test]
    fn test_invalid_label() {
        let issues = check_content("3abc 1\n");
        assert_eq!(errors(&issues).len(), 1);
    }

    #[test]
    fn test_supercell_shape() {
        let bad_count = check_content("%block Supercell\n 2 2\n%endblock Supercell\n");
        assert_eq!(errors(&bad_count).len(), 1);

        let zero = check_content("%block Supercell\n 2 0 2\n%endblock Supercell\n");
        assert_eq!(errors(&zero).len(), 1);

        let two_lines = check_content("%block Supercell\n 2 2 2\n 2 2 2\n%endblock Supercell\n");
        assert_eq!(errors(&two_lines).len(), 1);
    }

    #[test]
    fn test_fix_strain_flags() {
        let bad = check_content(
            "%block fix_strain_component\n T T F F F X\n%endblock fix_strain_component\n",
        );
        assert_eq!(errors(&bad).len(), 1);
        assert_eq!(errors(&bad)[0].line, 2);

        let short = check_content(
            "%block fix_strain_component\n T T F\n%endblock fix_strain_component\n",
        );
        assert_eq!(errors(&short).len(), 1);
    }

    #[test]
    fn test_type_warnings_do_not_invalidate() {
        let issues = check_content("MC_nsweeps lots\nNo_electron maybe\n");
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(is_valid(&issues));
    }

    #[test]
    fn test_duplicate_key_warning() {
        let issues = check_content("MC_nsweeps 10\nmc_nsweeps 20\n");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_all_issues_reported() {
        let text = "System_name\n%block Supercell\n 1 1\n%endblock Supercell\n%endblock x\n";
        let issues = check_content(text);
        assert_eq!(errors(&issues).len(), 3);
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }
}
