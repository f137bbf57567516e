//! 技能树命令行工具
//!
//! 读取 YAML/JSON 技能树配置，输出评估结果、图数据或循环检查结论。

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use skill_tree::cli::{Cli, CommandRunner, Commands};
use skill_tree_shared::config::AppConfig;
use skill_tree_shared::observability;
use tracing::debug;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 统一加载配置：config/default.toml → config/{env}.toml → config/skill-tree.toml → 环境变量
    let config = AppConfig::load("skill-tree").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let mut obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    if let Some(level) = &cli.log_level {
        obs_config = obs_config.with_log_level(level.as_str());
    }
    observability::init(&obs_config)?;

    let trace_enabled = cli.trace || config.engine.trace_enabled;
    debug!(
        environment = %config.environment,
        trace_enabled,
        pretty_output = config.engine.pretty_output,
        "配置已加载"
    );

    let runner = CommandRunner::new(trace_enabled, config.engine.pretty_output);

    match cli.command {
        Commands::Evaluate { file } => runner.run_evaluate(&file)?,
        Commands::Graph { file } => runner.run_graph(&file)?,
        Commands::Check { file } => {
            if !runner.run_check(&file)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Show { file, skill } => runner.run_show(&file, &skill)?,
        Commands::SetExp {
            file,
            skill,
            points,
            write,
        } => runner.run_set_exp(&file, &skill, points, write)?,
    }

    Ok(ExitCode::SUCCESS)
}
