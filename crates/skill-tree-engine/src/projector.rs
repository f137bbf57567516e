//! 图投影
//!
//! 把评估结果转换成渲染层使用的节点/边结构。节点和边都带有满足状态分类，
//! 边的分类取决于被依赖的技能（source），而不是依赖它的技能。

use crate::models::{EvaluationResult, Position, SkillId};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// 满足状态分类，对应渲染层的样式类名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SatisfactionClass {
    Satisfied,
    Unsatisfied,
}

impl From<bool> for SatisfactionClass {
    fn from(satisfied: bool) -> Self {
        if satisfied {
            Self::Satisfied
        } else {
            Self::Unsatisfied
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: SkillId,
    pub label: String,
    pub classes: SatisfactionClass,
    /// 没有保存坐标时由渲染层自动布局
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// 依赖边：source 是被依赖的技能，target 是依赖它的技能
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: SkillId,
    pub target: SkillId,
    pub classes: SatisfactionClass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// 图投影器
pub struct GraphProjector;

impl GraphProjector {
    /// 生成节点和边
    ///
    /// 只为已评估的技能生成节点；引用不存在技能的依赖不会生成边，
    /// 同一技能对同一依赖的重复引用只生成一条边。
    pub fn project(result: &EvaluationResult, positions: &BTreeMap<SkillId, Position>) -> GraphData {
        let mut graph = GraphData::default();

        for (skill_id, skill) in &result.skills {
            if skill_id.is_empty() {
                continue;
            }

            let label = if skill.title.is_empty() {
                skill_id.clone()
            } else {
                skill.title.clone()
            };

            graph.nodes.push(GraphNode {
                id: skill_id.clone(),
                label,
                classes: skill.satisfied().into(),
                position: positions.get(skill_id).copied(),
            });
        }

        for node in &graph.nodes {
            let Some(skill) = result.skills.get(&node.id) else {
                continue;
            };

            let mut seen = HashSet::new();
            for dependency in skill.requirements.skill_references() {
                if !seen.insert(dependency) {
                    continue;
                }

                let Some(dep_skill) = result.skills.get(dependency) else {
                    continue;
                };
                if dependency.is_empty() {
                    continue;
                }

                graph.edges.push(GraphEdge {
                    source: dependency.to_string(),
                    target: node.id.clone(),
                    classes: dep_skill.satisfied().into(),
                });
            }
        }

        debug!(
            node_count = graph.nodes.len(),
            edge_count = graph.edges.len(),
            "图投影完成"
        );

        graph
    }
}
