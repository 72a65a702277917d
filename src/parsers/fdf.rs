//! # FDF 输入文件解析器
//!
//! 解析 SCALE-UP 使用的 FDF 输入文件。
//!
//! ## FDF 格式说明
//! ```text
//! # comment
//! System_name       srtio3
//! MC_temperature    20 kelvin      # trailing comment
//!
//! %block Supercell
//!   8 8 8
//! %endblock Supercell
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `commands/`, `sweep/` 使用
//! - 使用 `models/fdf.rs`

use crate::error::{Result, ScupError};
use crate::models::fdf::{normalize_label, FdfBlock, FdfDocument, FdfEntry, FdfScalar};
use std::fs;
use std::path::Path;

/// 块指令
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Directive<'a> {
    Block(Option<&'a str>),
    EndBlock(Option<&'a str>),
    /// 其他 `%` 指令（如 %include）
    Other(&'a str),
}

/// 识别 `%block` / `%endblock` 行（关键字不区分大小写）
pub(crate) fn directive(line: &str) -> Option<Directive<'_>> {
    let rest = line.strip_prefix('%')?;
    let mut parts = rest.split_whitespace();
    let keyword = parts.next().unwrap_or("");
    let name = parts.next();

    if keyword.eq_ignore_ascii_case("block") {
        Some(Directive::Block(name))
    } else if keyword.eq_ignore_ascii_case("endblock") {
        Some(Directive::EndBlock(name))
    } else {
        Some(Directive::Other(keyword))
    }
}

/// 拆分行尾注释
pub(crate) fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find('#') {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    }
}

/// 解析 FDF 文件
pub fn parse_fdf_file(path: &Path) -> Result<FdfDocument> {
    let content = fs::read_to_string(path).map_err(|e| ScupError::read(path, e))?;
    parse_fdf_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 FDF
pub fn parse_fdf_content(content: &str, origin: &str) -> Result<FdfDocument> {
    let syntax = |line: usize, reason: String| ScupError::FdfSyntax {
        path: origin.to_string(),
        line,
        reason,
    };

    let mut doc = FdfDocument::new();
    let mut open_block: Option<FdfBlock> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();

        // 块内部
        if let Some(block) = open_block.as_mut() {
            match directive(trimmed) {
                Some(Directive::EndBlock(name)) => {
                    if let Some(name) = name {
                        if normalize_label(name) != normalize_label(&block.name) {
                            return Err(syntax(
                                line_no,
                                format!(
                                    "'%endblock {}' closes block '{}' opened at line {}",
                                    name, block.name, block.line
                                ),
                            ));
                        }
                    }
                    if let Some(done) = open_block.take() {
                        doc.entries.push(FdfEntry::Block(done));
                    }
                }
                Some(Directive::Block(_)) => {
                    return Err(syntax(
                        line_no,
                        format!(
                            "nested %block inside '{}' (opened at line {})",
                            block.name, block.line
                        ),
                    ));
                }
                _ => {
                    let (data, comment) = split_comment(trimmed);
                    let row: Vec<String> = data.split_whitespace().map(String::from).collect();
                    if !row.is_empty() {
                        block.rows.push(row);
                        block.comments.push(comment.map(String::from));
                    }
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            doc.entries.push(FdfEntry::Blank);
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            doc.entries.push(FdfEntry::Comment(comment.to_string()));
            continue;
        }

        match directive(trimmed) {
            Some(Directive::Block(Some(name))) => {
                open_block = Some(FdfBlock {
                    name: name.to_string(),
                    rows: Vec::new(),
                    comments: Vec::new(),
                    line: line_no,
                });
            }
            Some(Directive::Block(None)) => {
                return Err(syntax(line_no, "%block without a name".to_string()));
            }
            Some(Directive::EndBlock(_)) => {
                return Err(syntax(
                    line_no,
                    "%endblock without a matching %block".to_string(),
                ));
            }
            Some(Directive::Other(keyword)) => {
                return Err(syntax(
                    line_no,
                    format!("unsupported directive '%{}'", keyword),
                ));
            }
            None => {
                let (data, comment) = split_comment(trimmed);
                let mut parts = data.split_whitespace();
                // data 非空：以 '#' 开头的行已作为注释处理
                let key = parts.next().unwrap_or_default();
                doc.entries.push(FdfEntry::Scalar(FdfScalar {
                    key: key.to_string(),
                    tokens: parts.map(String::from).collect(),
                    comment: comment.map(|c| c.to_string()),
                    line: line_no,
                }));
            }
        }
    }

    if let Some(block) = open_block {
        return Err(syntax(
            block.line,
            format!("block '{}' is never closed", block.name),
        ));
    }

    Ok(doc)
}

/// 将 FDF 文档转换为文本
pub fn to_fdf_string(doc: &FdfDocument) -> String {
    let key_width = doc
        .scalars()
        .map(|s| s.key.len())
        .max()
        .unwrap_or(0)
        .max(16);

    let mut result = String::new();

    for entry in &doc.entries {
        match entry {
            FdfEntry::Blank => result.push('\n'),
            FdfEntry::Comment(c) => {
                result.push('#');
                result.push_str(c);
                result.push('\n');
            }
            FdfEntry::Scalar(s) => {
                let mut line = if s.tokens.is_empty() {
                    s.key.clone()
                } else {
                    format!("{:width$} {}", s.key, s.raw_value(), width = key_width)
                };
                if let Some(ref c) = s.comment {
                    line.push_str("   #");
                    line.push_str(c);
                }
                result.push_str(line.trim_end());
                result.push('\n');
            }
            FdfEntry::Block(b) => {
                result.push_str(&format!("%block {}\n", b.name));
                for (i, row) in b.rows.iter().enumerate() {
                    let mut line = format!("  {}", row.join(" "));
                    if let Some(c) = b.row_comment(i) {
                        line.push_str("   #");
                        line.push_str(c);
                    }
                    result.push_str(&line);
                    result.push('\n');
                }
                result.push_str(&format!("%endblock {}\n", b.name));
            }
        }
    }

    result
}

/// 写入 FDF 文件
pub fn write_fdf_file(doc: &FdfDocument, path: &Path) -> Result<()> {
    fs::write(path, to_fdf_string(doc)).map_err(|e| ScupError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fdf::FdfValue;

    const DECK: &str = r#"
# SrTiO3 Monte Carlo run
System_name         srtio3
Parameter_file      srtio3_full_lat.xml
MC_temperature      20 kelvin     # initial temperature
MC_nsweeps          40000

%block Supercell
  8 8 8
%endblock Supercell

%BLOCK fix_strain_component
  F F F F F F   # nothing fixed
%ENDBLOCK fix_strain_component
"#;

    #[test]
    fn test_parse_scalars_and_blocks() {
        let doc = parse_fdf_content(DECK, "deck.fdf").unwrap();

        assert_eq!(doc.get_str("System_name").as_deref(), Some("srtio3"));
        assert_eq!(doc.get_f64("MC_temperature"), Some(20.0));
        assert_eq!(doc.get("MC_temperature").unwrap().unit(), Some("kelvin"));
        assert_eq!(
            doc.get("MC_temperature").unwrap().comment.as_deref(),
            Some(" initial temperature")
        );
        assert_eq!(doc.get_i64("MC_nsweeps"), Some(40000));

        let supercell = doc.get_block("supercell").unwrap();
        assert_eq!(supercell.rows, vec![vec!["8", "8", "8"]]);
        assert_eq!(supercell.line, 8);

        let fix = doc.get_block("fix_strain_component").unwrap();
        assert_eq!(fix.rows[0].len(), 6);
        assert_eq!(fix.row_comment(0), Some(" nothing fixed"));
        assert_eq!(supercell.row_comment(0), None);
    }

    #[test]
    fn test_comments_and_blanks_preserved() {
        let doc = parse_fdf_content(DECK, "deck.fdf").unwrap();
        assert_eq!(doc.entries[0], FdfEntry::Blank);
        assert_eq!(
            doc.entries[1],
            FdfEntry::Comment(" SrTiO3 Monte Carlo run".to_string())
        );
    }

    #[test]
    fn test_serialize_then_parse_keeps_entries() {
        let doc = parse_fdf_content(DECK, "deck.fdf").unwrap();
        let text = to_fdf_string(&doc);
        let again = parse_fdf_content(&text, "again.fdf").unwrap();

        let strip = |d: &FdfDocument| -> Vec<FdfEntry> {
            d.entries
                .iter()
                .cloned()
                .map(|e| match e {
                    FdfEntry::Scalar(mut s) => {
                        s.line = 0;
                        s.comment = s.comment.map(|c| c.trim().to_string());
                        FdfEntry::Scalar(s)
                    }
                    FdfEntry::Block(mut b) => {
                        b.line = 0;
                        b.comments = b
                            .comments
                            .into_iter()
                            .map(|c| c.map(|c| c.trim().to_string()))
                            .collect();
                        FdfEntry::Block(b)
                    }
                    other => other,
                })
                .collect()
        };
        assert_eq!(strip(&doc), strip(&again));
        assert!(text.contains("F F F F F F   # nothing fixed"));
    }

    #[test]
    fn test_bare_flag() {
        let doc = parse_fdf_content("Print_justgeo\n", "x").unwrap();
        assert_eq!(
            doc.get("print_justgeo").unwrap().value(),
            FdfValue::Bool(true)
        );
    }

    #[test]
    fn test_mismatched_endblock() {
        let err = parse_fdf_content("%block Supercell\n 2 2 2\n%endblock Other\n", "x.fdf")
            .unwrap_err();
        match err {
            ScupError::FdfSyntax { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unclosed_block_reports_opening_line() {
        let err = parse_fdf_content("a 1\n%block Supercell\n 2 2 2\n", "x.fdf").unwrap_err();
        match err {
            ScupError::FdfSyntax { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("never closed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_stray_endblock_and_nested_block() {
        assert!(parse_fdf_content("%endblock Supercell\n", "x").is_err());
        assert!(parse_fdf_content("%block A\n%block B\n%endblock B\n%endblock A\n", "x").is_err());
        assert!(parse_fdf_content("%block\n%endblock\n", "x").is_err());
    }

    #[test]
    fn test_endblock_without_name_is_accepted() {
        let doc = parse_fdf_content("%block Supercell\n 2 2 2\n%endblock\n", "x").unwrap();
        assert!(doc.get_block("Supercell").is_some());
    }
}
