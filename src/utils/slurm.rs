//! # Slurm 脚本生成工具
//!
//! 为每个构型目录生成 sbatch 提交脚本，并可调用 `sbatch` 提交。
//!
//! ## 依赖关系
//! - 被 `commands/sweep.rs` 使用
//! - 无外部模块依赖

use crate::error::{Result, ScupError};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// sbatch 脚本文件名
pub const SBATCH_FILE: &str = "submit.sbatch";

/// Slurm 作业配置
#[derive(Debug, Clone)]
pub struct SlurmConfig {
    pub job_name: String,
    pub partition: String,
    pub constraint: Option<String>,
    pub nodes: u32,
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub mem_per_cpu: String,
    pub time_limit: String,
    pub modules: Vec<String>,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        SlurmConfig {
            job_name: "scaleup".to_string(),
            partition: "cpu".to_string(),
            constraint: None,
            nodes: 1,
            ntasks: 1,
            cpus_per_task: 1,
            mem_per_cpu: "2G".to_string(),
            time_limit: "24:00:00".to_string(),
            modules: vec![],
        }
    }
}

/// SCALE-UP 运行命令：`<exec> < <run>.fdf > <run>.out`
pub fn scaleup_command(exec: &str, run_name: &str) -> String {
    format!("{} < {}.fdf > {}.out", exec, run_name, run_name)
}

/// 生成 sbatch 脚本内容
pub fn generate_sbatch_script(config: &SlurmConfig, workdir: &Path, exec_cmd: &str) -> String {
    let constraint = config
        .constraint
        .as_ref()
        .map(|c| format!("#SBATCH --constraint \"{}\"\n", c))
        .unwrap_or_default();

    let module_loads = if config.modules.is_empty() {
        String::new()
    } else {
        let loads = config
            .modules
            .iter()
            .map(|m| format!("module load {}", m))
            .collect::<Vec<_>>()
            .join("\n");
        format!("module purge 2>&1\n{}\necho \"Loaded modules\"\n", loads)
    };

    format!(
        r#"#!/bin/bash
{}#SBATCH --partition {}
#SBATCH --nodes={}
#SBATCH --mem-per-cpu {}
#SBATCH --time {}
#SBATCH -c {}
#SBATCH -n {}
#SBATCH -J {}
#SBATCH -o slurm_logs/%x.out
#SBATCH -e slurm_logs/%x.err

set -euo pipefail

{}
cd "{}"
echo "PWD=$(pwd)"
echo "Running: {}"
{}

echo "Timings:"
sacct -o JobID,Submit,Start,End,CPUTime,State -j $SLURM_JOBID
"#,
        constraint,
        config.partition,
        config.nodes,
        config.mem_per_cpu,
        config.time_limit,
        config.cpus_per_task,
        config.ntasks,
        config.job_name,
        module_loads,
        workdir.display(),
        exec_cmd,
        exec_cmd,
    )
}

/// 在作业目录中写入 sbatch 脚本（同时创建 slurm_logs/）
pub fn write_sbatch_script(config: &SlurmConfig, workdir: &Path, exec_cmd: &str) -> Result<PathBuf> {
    let logs = workdir.join("slurm_logs");
    fs::create_dir_all(&logs).map_err(|e| ScupError::write(&logs, e))?;

    let path = workdir.join(SBATCH_FILE);
    let script = generate_sbatch_script(config, workdir, exec_cmd);
    fs::write(&path, script).map_err(|e| ScupError::write(&path, e))?;
    Ok(path)
}

/// 调用 sbatch 提交，返回 sbatch 的输出（如 "Submitted batch job 123"）
///
/// 在 `workdir` 中执行，脚本按文件名传入。
pub fn submit(sbatch: &str, script: &Path, workdir: &Path) -> Result<String> {
    let name = script.file_name().map(Path::new).unwrap_or(script);
    let out = Command::new(sbatch)
        .arg(name)
        .current_dir(workdir)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScupError::CommandNotFound {
                command: sbatch.to_string(),
            },
            _ => ScupError::CommandFailed {
                command: sbatch.to_string(),
                stderr: e.to_string(),
            },
        })?;

    if out.status.success() {
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    } else {
        Err(ScupError::CommandFailed {
            command: format!("{} {}", sbatch, name.display()),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}
