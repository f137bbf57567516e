//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `evaluate` - 评估技能树并输出评估结果
//! - `graph` - 输出渲染层使用的节点/边数据
//! - `check` - 检查依赖图是否存在循环
//! - `show` - 查看单个技能的需求完成情况
//! - `set-exp` - 更新技能经验并输出新配置
//!
//! # 使用示例
//!
//! ```bash
//! skill-tree evaluate tree.yaml
//! skill-tree --trace graph tree.yaml
//! skill-tree check tree.yaml
//! skill-tree show tree.yaml advanced_combat
//! skill-tree set-exp tree.yaml basic_combat 20 --write
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
