//! # 日志系统初始化
//!
//! 使用 `tracing` 与 `tracing-subscriber`，日志输出到 stderr，
//! 不干扰终端美化输出。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用

use tracing_subscriber::{fmt, EnvFilter};

/// 根据 `-v` 次数选择默认日志级别
fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器，优先于 `-v`
///   例如: RUST_LOG=scupkit=debug
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "debug");
        assert_eq!(default_level(5), "trace");
    }
}
