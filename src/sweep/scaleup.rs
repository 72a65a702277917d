//! # SCALE-UP 本地运行
//!
//! 在构型目录中运行 `<exec> < <run>.fdf > <run>.out`，
//! 等待结束并检查退出状态。
//!
//! 带路径的相对可执行文件（如 `./scaleup.x`）需先经 `resolve_executable`
//! 转为绝对路径，因为运行时的工作目录是构型目录。
//!
//! ## 依赖关系
//! - 被 `commands/sweep.rs` 使用
//! - 使用 `sweep/stage.rs`

use crate::error::{Result, ScupError};
use crate::sweep::stage::StagedRun;

use std::fs::{self, File};
use std::path::{Path, MAIN_SEPARATOR};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// 将含路径分隔符的相对可执行文件解析为绝对路径；纯命令名按 PATH 查找，保持不变
pub fn resolve_executable(exec: &str) -> Result<String> {
    let path = Path::new(exec);
    if path.is_absolute() || !(exec.contains('/') || exec.contains(MAIN_SEPARATOR)) {
        return Ok(exec.to_string());
    }

    let absolute = match fs::canonicalize(path) {
        Ok(p) => p,
        Err(_) => std::env::current_dir()
            .map_err(|e| ScupError::read(Path::new("."), e))?
            .join(path),
    };
    debug!(exec, resolved = %absolute.display(), "resolved executable path");
    Ok(absolute.display().to_string())
}

/// 运行单个构型
pub fn run_local(exec: &str, run: &StagedRun) -> Result<()> {
    let stdin = File::open(&run.fdf_path).map_err(|e| ScupError::read(&run.fdf_path, e))?;
    let stdout = File::create(&run.out_path).map_err(|e| ScupError::write(&run.out_path, e))?;

    debug!(exec, folder = %run.folder.display(), "launching SCALE-UP");

    let output = Command::new(exec)
        .current_dir(&run.folder)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScupError::CommandNotFound {
                command: exec.to_string(),
            },
            _ => ScupError::CommandFailed {
                command: exec.to_string(),
                stderr: e.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ScupError::CommandFailed {
            command: format!("{} < {}.fdf", exec, run.run_name),
            stderr: if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            },
        });
    }

    info!(config = %run.id.name(), temperature = run.temperature, "SCALE-UP run finished");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::ConfigId;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn staged(dir: &Path) -> StagedRun {
        let fdf_path = dir.join("srtio3T20.fdf");
        fs::write(&fdf_path, "System_name srtio3T20\n").unwrap();
        StagedRun {
            id: ConfigId {
                temp: 0,
                stress: 0,
                strain: 0,
                field: 0,
            },
            temperature: 20.0,
            folder: dir.to_path_buf(),
            run_name: "srtio3T20".to_string(),
            fdf_path,
            out_path: dir.join("srtio3T20.out"),
        }
    }

    #[test]
    fn test_stdin_is_piped_to_output() {
        let dir = TempDir::new().unwrap();
        let run = staged(dir.path());
        run_local("cat", &run).unwrap();

        let out = fs::read_to_string(&run.out_path).unwrap();
        assert_eq!(out, "System_name srtio3T20\n");
    }

    #[test]
    fn test_failed_run() {
        let dir = TempDir::new().unwrap();
        let run = staged(dir.path());
        assert!(matches!(
            run_local("false", &run),
            Err(ScupError::CommandFailed { .. })
        ));
    }

    #[test]
    fn test_resolve_executable() {
        assert_eq!(resolve_executable("scaleup.x").unwrap(), "scaleup.x");
        assert_eq!(resolve_executable("/opt/scaleup.x").unwrap(), "/opt/scaleup.x");

        let resolved = resolve_executable("./bin/scaleup.x").unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("bin/scaleup.x"));
    }

    #[test]
    fn test_relative_executable_runs_in_config_folder() {
        use std::os::unix::fs::PermissionsExt;

        // 相对于当前目录的可执行文件
        let bin = TempDir::new_in(".").unwrap();
        let script = bin.path().join("fake_scaleup.sh");
        fs::write(&script, "#!/bin/sh\ncat\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let relative = script.display().to_string();
        assert!(Path::new(&relative).is_relative());

        let dir = TempDir::new().unwrap();
        let run = staged(dir.path());
        run_local(&resolve_executable(&relative).unwrap(), &run).unwrap();
        assert_eq!(
            fs::read_to_string(&run.out_path).unwrap(),
            "System_name srtio3T20\n"
        );
    }

    #[test]
    fn test_missing_executable() {
        let dir = TempDir::new().unwrap();
        let run = staged(dir.path());
        assert!(matches!(
            run_local("/nonexistent/scaleup.x", &run),
            Err(ScupError::CommandNotFound { .. })
        ));
    }
}
