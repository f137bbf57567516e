//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 技能树命令行工具
///
/// 配置文件支持 YAML 和 JSON 格式。
#[derive(Parser, Debug)]
#[command(name = "skill-tree")]
#[command(version, about = "技能树需求评估工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// 在评估结果中记录评估追踪
    #[arg(long)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 评估技能树并以 JSON 输出评估结果
    Evaluate {
        /// 技能树配置文件
        file: PathBuf,
    },

    /// 输出节点/边图数据（JSON）
    Graph {
        /// 技能树配置文件
        file: PathBuf,
    },

    /// 检查依赖图是否存在循环，存在时以非零状态码退出
    Check {
        /// 技能树配置文件
        file: PathBuf,
    },

    /// 查看单个技能的需求完成情况
    Show {
        /// 技能树配置文件
        file: PathBuf,

        /// 技能 ID
        skill: String,
    },

    /// 设置技能已投入的经验
    ///
    /// 默认把更新后的配置输出到标准输出，使用 `--write` 写回原文件。
    SetExp {
        /// 技能树配置文件
        file: PathBuf,

        /// 技能 ID
        skill: String,

        /// 经验点数
        points: u64,

        /// 写回原文件
        #[arg(short, long)]
        write: bool,
    },
}
