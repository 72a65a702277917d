//! # sweep 命令实现
//!
//! 按温度 / 应力 / 应变 / 电场组合批量运行 SCALE-UP。
//!
//! ## 流程
//! 1. 读取基础 FDF，应用 Monte Carlo 覆盖
//! 2. 生成扫描计划并检查输出目录
//! 3. 写入 `simulation.json`，为每个构型准备独立目录
//! 4. 本地并行运行，或生成 sbatch 脚本（可选提交）
//!
//! ## 依赖关系
//! - 使用 `cli/sweep.rs` 定义的参数
//! - 使用 `sweep/`, `models/`, `batch/`, `utils/slurm.rs`, `utils/output.rs`

use crate::batch::{BatchRunner, ProcessResult};
use crate::cli::sweep::{Scheduler, SweepArgs};
use crate::error::{Result, ScupError};
use crate::models::fdf::parse_bool_token;
use crate::models::settings::keys;
use crate::models::{Geometry, ScupSettings, SettingOverrides, SimulationSetup};
use crate::parsers::fdf::parse_fdf_file;
use crate::sweep::scaleup::{resolve_executable, run_local};
use crate::sweep::stage::absolutize_parameter_file;
use crate::sweep::{parse_temperatures, parse_vector, StageContext, StagedRun, SweepPlan};
use crate::utils::output;
use crate::utils::slurm::{self, scaleup_command, SlurmConfig};

use std::fs;
use std::path::Path;
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Tabled)]
struct StagedRow {
    #[tabled(rename = "Config")]
    config: String,
    #[tabled(rename = "T (K)")]
    temperature: f64,
    #[tabled(rename = "Folder")]
    folder: String,
}

/// 解析固定应变分量，如 "TTFFFF" 或 "T,T,F,F,F,F"
pub fn parse_strain_flags(input: &str) -> Result<Vec<bool>> {
    let tokens: Vec<String> = if input.contains([',', ' ']) {
        input
            .split([',', ' '])
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    } else {
        input.chars().map(String::from).collect()
    };

    let flags: Option<Vec<bool>> = tokens.iter().map(|t| parse_bool_token(t)).collect();
    match flags {
        Some(f) if f.len() == 6 => Ok(f),
        _ => Err(ScupError::InvalidArgument(format!(
            "Fixed strain components need six T/F flags, got '{}'",
            input
        ))),
    }
}

fn parse_vectors<const N: usize>(inputs: &[String]) -> Result<Option<Vec<[f64; N]>>> {
    if inputs.is_empty() {
        return Ok(None);
    }
    inputs
        .iter()
        .map(|s| parse_vector::<N>(s))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// 解析超胞，如 "8,8,8"
pub fn parse_supercell(input: &str) -> Result<[usize; 3]> {
    let v: [f64; 3] = parse_vector(input)?;
    if v.iter().any(|x| *x < 1.0 || x.fract() != 0.0) {
        return Err(ScupError::InvalidArgument(format!(
            "Supercell must be three positive integers, got '{}'",
            input
        )));
    }
    Ok(v.map(|x| x as usize))
}

/// 执行 sweep 命令
pub fn execute(args: SweepArgs) -> Result<()> {
    output::print_header("SCALE-UP Parameter Sweep");

    if !args.fdf.is_file() {
        return Err(ScupError::FileNotFound {
            path: args.fdf.display().to_string(),
        });
    }

    // ─── 基础 FDF ───
    let mut base = parse_fdf_file(&args.fdf)?;
    let settings = ScupSettings::from_document(&base)?;

    let overrides = SettingOverrides {
        mc_steps: args.mc_steps,
        mc_step_interval: args.mc_step_interval,
        mc_max_jump: args.mc_max_jump,
        lattice_output_interval: args.lattice_output_interval,
        fixed_strain_components: args.fix_strain.as_deref().map(parse_strain_flags).transpose()?,
    };
    overrides.apply(&mut base)?;

    let base_dir = args.fdf.parent().unwrap_or(Path::new("."));
    absolutize_parameter_file(&mut base, base_dir);

    let supercell = match &args.supercell {
        Some(s) => {
            let sc = parse_supercell(s)?;
            base.set_block(keys::SUPERCELL, vec![sc.iter().map(|n| n.to_string()).collect()]);
            Some(sc)
        }
        None => settings.supercell.map(|sc| sc.map(|n| n as usize)),
    };

    // ─── 扫描计划 ───
    let plan = SweepPlan::new(
        parse_temperatures(&args.temps)?,
        parse_vectors::<6>(&args.stress)?,
        parse_vectors::<6>(&args.strain)?,
        parse_vectors::<3>(&args.field)?,
    )?;

    let template = match (supercell, args.nats) {
        (Some(sc), Some(nats)) if !args.species.is_empty() => {
            Some(Geometry::new(sc, args.species.clone(), nats))
        }
        _ => None,
    };
    if plan.has_strain && template.is_none() {
        return Err(ScupError::InvalidArgument(
            "Strain sweeps need --species, --nats and a supercell (--supercell or the deck's Supercell block)"
                .to_string(),
        ));
    }

    let exec = match (&args.exec, args.scheduler, args.dry_run) {
        (Some(e), _, _) => Some(resolve_executable(e)?),
        (None, Scheduler::Local, true) => None,
        (None, _, _) => return Err(ScupError::ExecutableNotConfigured),
    };

    output::print_info(&format!("System: {}", settings.system_name));
    output::print_info(&format!(
        "{} temperature(s) x {} stress x {} strain x {} field = {} configuration(s)",
        plan.temperatures.len(),
        plan.stresses.len(),
        plan.strains.len(),
        plan.fields.len(),
        plan.len()
    ));

    // ─── 输出目录 ───
    if args.output.exists() {
        if !args.overwrite {
            output::print_warning(&format!(
                "Output folder '{}' already exists, skipping sweep (use --overwrite)",
                args.output.display()
            ));
            return Ok(());
        }
        fs::remove_dir_all(&args.output).map_err(|e| ScupError::write(&args.output, e))?;
        info!(path = %args.output.display(), "removed existing output folder");
    }
    fs::create_dir_all(&args.output).map_err(|e| ScupError::write(&args.output, e))?;
    // 运行与 sbatch 脚本都在构型目录中进行，需使用绝对路径
    let output_dir = fs::canonicalize(&args.output).map_err(|e| ScupError::read(&args.output, e))?;

    let setup = SimulationSetup {
        name: settings.system_name.clone(),
        supercell,
        species: args.species.clone(),
        nats: args.nats.unwrap_or(0),
        temperatures: plan.temperatures.clone(),
        stresses: plan.stresses.clone(),
        strains: plan.strains.clone(),
        fields: plan.fields.clone(),
        equilibration_steps: args.equilibration_steps,
    };
    setup.save(&output_dir)?;

    // ─── 准备构型目录 ───
    let ctx = StageContext {
        base: &base,
        system_name: &settings.system_name,
        plan: &plan,
        output_dir: &output_dir,
        geometry: template.as_ref(),
    };
    let staged: Vec<StagedRun> = plan
        .configurations()
        .into_iter()
        .map(|id| ctx.stage(id))
        .collect::<Result<_>>()?;

    let rows: Vec<StagedRow> = staged
        .iter()
        .map(|r| StagedRow {
            config: r.id.name(),
            temperature: r.temperature,
            folder: r.folder.display().to_string(),
        })
        .collect();
    println!("{}\n", Table::new(&rows));

    match (args.scheduler, exec) {
        (Scheduler::Local, _) if args.dry_run => {
            output::print_done(&format!("Staged {} configuration(s) (dry run)", staged.len()));
            Ok(())
        }
        (Scheduler::Local, Some(exec)) => run_all_local(&exec, &staged, args.jobs),
        (Scheduler::Slurm, Some(exec)) => write_slurm_jobs(&args, &exec, &staged, "sbatch"),
        (_, None) => Err(ScupError::ExecutableNotConfigured),
    }
}

/// 本地并行运行
fn run_all_local(exec: &str, staged: &[StagedRun], jobs: usize) -> Result<()> {
    let runner = BatchRunner::new(jobs);
    output::print_info(&format!(
        "Running {} configuration(s) with {} parallel job(s)",
        staged.len(),
        runner.jobs()
    ));

    let result = runner.run(staged, "Simulating", |run| match run_local(exec, run) {
        Ok(()) => ProcessResult::Success(run.id.name()),
        Err(e) => ProcessResult::Failed(run.folder.display().to_string(), e.to_string()),
    })?;

    for (folder, err) in &result.failures {
        output::print_error(&format!("{}: {}", folder, err));
    }

    if result.failed > 0 {
        return Err(ScupError::Other(format!(
            "{} of {} configuration(s) failed",
            result.failed,
            result.total()
        )));
    }

    output::print_done(&format!("{} configuration(s) simulated", result.success));
    Ok(())
}

/// 写入 sbatch 脚本并按需提交；任一提交失败时返回错误
fn write_slurm_jobs(args: &SweepArgs, exec: &str, staged: &[StagedRun], sbatch: &str) -> Result<()> {
    let mut submitted = 0;
    let mut failed = 0;

    for run in staged {
        let config = SlurmConfig {
            job_name: run
                .folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| run.run_name.clone()),
            partition: args.partition.clone(),
            constraint: args.constraint.clone(),
            nodes: 1,
            ntasks: args.ntasks,
            cpus_per_task: args.cpus_per_task,
            mem_per_cpu: args.mem_per_cpu.clone(),
            time_limit: args.time.clone(),
            modules: args.modules.clone(),
        };

        let script = slurm::write_sbatch_script(
            &config,
            &run.folder,
            &scaleup_command(exec, &run.run_name),
        )?;

        if args.submit && !args.dry_run {
            match slurm::submit(sbatch, &script, &run.folder) {
                Ok(msg) => {
                    output::print_success(&format!("{}: {}", run.id.name(), msg));
                    submitted += 1;
                }
                Err(e) => {
                    output::print_error(&format!("{}: {}", run.id.name(), e));
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        return Err(ScupError::Other(format!(
            "{} of {} submission(s) failed",
            failed,
            staged.len()
        )));
    }

    output::print_done(&format!(
        "Generated {} job script(s), submitted {}",
        staged.len(),
        submitted
    ));
    Ok(())
}
