//! # 统一错误处理模块
//!
//! 定义 scupkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// scupkit 统一错误类型
#[derive(Error, Debug)]
pub enum ScupError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("FDF syntax error in {path} at line {line}: {reason}")]
    FdfSyntax {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing required FDF setting: {0}")]
    MissingSetting(String),

    #[error("Invalid FDF setting: {0}")]
    InvalidSetting(String),

    // ─────────────────────────────────────────────────────────────
    // 几何结构错误
    // ─────────────────────────────────────────────────────────────
    #[error("Geometry in {path} does not match the loaded supercell: {reason}")]
    GeometryMismatch { path: String, reason: String },

    #[error("No partial geometry files available in {path}")]
    NotEnoughPartials { path: String },

    #[error("Atomic index {index} out of bounds (cell holds {nats} atoms)")]
    AtomIndexOutOfBounds { index: usize, nats: usize },

    #[error("Reference geometry (.REF) has not been loaded")]
    ReferenceNotLoaded,

    // ─────────────────────────────────────────────────────────────
    // 模拟错误
    // ─────────────────────────────────────────────────────────────
    #[error("No SCALE-UP executable configured (use --exec or set SCUP_EXEC)")]
    ExecutableNotConfigured,

    #[error("Output folder not found: {path}")]
    OutputFolderMissing { path: String },

    #[error("Configuration has not been simulated: {0}")]
    ConfigurationNotSimulated(String),

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid vector '{input}': expected {expected} comma-separated numbers")]
    InvalidVector { input: String, expected: usize },

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ScupError>;

impl ScupError {
    /// 构造文件读取错误
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        ScupError::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// 构造文件写入错误
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        ScupError::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}
