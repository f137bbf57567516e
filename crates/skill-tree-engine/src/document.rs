//! 技能树文档
//!
//! 持有一份配置对象，对外提供编辑入口（带循环检测门禁）、经验/坐标更新，
//! 以及从配置到评估结果和图数据的完整流水线。文本格式的解析与序列化由调用方负责。

use crate::compiler::ConfigCompiler;
use crate::dependency_graph::DependencyGraph;
use crate::error::{Result, SkillTreeError};
use crate::evaluator::RequirementEvaluator;
use crate::models::{EvaluationResult, Position, Progress, SkillId, SkillTree};
use crate::projector::{GraphData, GraphProjector};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// 配置中未设置标题时使用的标题
pub const UNTITLED: &str = "(Untitled)";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillTreeDocument {
    config: Value,
}

impl SkillTreeDocument {
    pub fn from_value(config: Value) -> Self {
        Self { config }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Value = serde_json::from_str(json)?;
        Ok(Self { config })
    }

    /// 当前配置对象
    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn into_value(self) -> Value {
        self.config
    }

    pub fn title(&self) -> &str {
        self.config
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED)
    }

    /// 自定义布局参数；未设置或为空对象时返回 `None`，由渲染层使用默认布局
    pub fn layout(&self) -> Option<&Map<String, Value>> {
        self.config
            .get("layout")
            .and_then(Value::as_object)
            .filter(|layout| !layout.is_empty())
    }

    pub fn tree(&self) -> SkillTree {
        ConfigCompiler::compile_tree(&self.config)
    }

    pub fn progress(&self) -> Progress {
        ConfigCompiler::compile_progress(&self.config)
    }

    pub fn positions(&self) -> BTreeMap<SkillId, Position> {
        ConfigCompiler::compile_positions(&self.config)
    }

    /// 当前配置中的循环依赖路径
    pub fn find_cycle(&self) -> Option<Vec<SkillId>> {
        DependencyGraph::from_tree(&self.tree()).find_cycle()
    }

    pub fn evaluate(&self, evaluator: &RequirementEvaluator) -> Result<EvaluationResult> {
        evaluator.evaluate_all(&self.tree(), &self.progress())
    }

    /// 评估并投影成图数据（带已保存的坐标）
    pub fn graph(&self, evaluator: &RequirementEvaluator) -> Result<GraphData> {
        let result = self.evaluate(evaluator)?;
        Ok(GraphProjector::project(&result, &self.positions()))
    }

    /// 应用一次配置编辑
    ///
    /// 新配置存在循环依赖时拒绝编辑，文档保持不变。
    #[instrument(skip_all)]
    pub fn apply_edit(&mut self, candidate: Value) -> Result<()> {
        let tree = ConfigCompiler::compile_tree(&candidate);

        if let Some(path) = DependencyGraph::from_tree(&tree).find_cycle() {
            warn!(path = ?path, "拒绝包含循环依赖的配置");
            return Err(SkillTreeError::CycleDetected { path });
        }

        self.config = candidate;
        info!(skill_count = tree.len(), "配置已更新");
        Ok(())
    }

    /// 设置某技能已投入的经验，其余配置保持不变
    pub fn set_experience(&mut self, skill_id: &str, points: u64) {
        update_object_path(&mut self.config, &["progress", "experience"], |experience| {
            experience.insert(skill_id.to_string(), Value::from(points));
        });

        info!(skill_id = %skill_id, points, "经验已更新");
    }

    /// 保存某技能节点的坐标
    pub fn set_position(&mut self, skill_id: &str, position: Position) {
        let mut point = Map::new();
        point.insert("x".to_string(), Value::from(position.x));
        point.insert("y".to_string(), Value::from(position.y));

        update_object_path(&mut self.config, &["positions"], |positions| {
            positions.insert(skill_id.to_string(), Value::Object(point));
        });
    }
}

/// 沿路径逐层修改对象，途经的非对象值被替换为空对象，已有键保持原位置
fn update_object_path<F>(value: &mut Value, path: &[&str], update: F)
where
    F: FnOnce(&mut Map<String, Value>),
{
    let mut map = match std::mem::take(value) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    match path.split_first() {
        Some((key, rest)) => {
            let child = map.entry(key.to_string()).or_insert(Value::Null);
            update_object_path(child, rest, update);
        }
        None => update(&mut map),
    }

    *value = Value::Object(map);
}
