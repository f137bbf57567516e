//! 技能树引擎
//!
//! 提供技能树需求的编译与评估能力，支持：
//! - 配置对象编译为规范化技能树
//! - 依赖图循环检测
//! - 按依赖顺序评估需求（经验、累计经验、技能依赖、AND/OR/SOME）
//! - 评估结果投影为节点/边图数据

pub mod cli;
pub mod compiler;
pub mod dependency_graph;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod operators;
pub mod projector;

pub use compiler::{ConfigCompiler, extract_skill_references, humanize_identifier};
pub use dependency_graph::DependencyGraph;
pub use document::SkillTreeDocument;
pub use error::{Result, SkillTreeError};
pub use evaluator::RequirementEvaluator;
pub use models::{
    ConditionProgress, EvaluatedRequirement, EvaluatedSkill, EvaluationResult, InvestedExperience,
    Position, Progress, Requirement, RequirementOutcome, Skill, SkillId, SkillTree,
};
pub use operators::LogicalOperator;
pub use projector::{GraphData, GraphEdge, GraphNode, GraphProjector, SatisfactionClass};
