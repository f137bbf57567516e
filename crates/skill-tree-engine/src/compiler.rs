//! 配置编译器
//!
//! 将已解析的配置对象（`serde_json::Value`）编译成规范化的技能树。
//! 编译是 fail-open 的：无法识别的条件编译为 `Unknown`，缺失的数值取默认值，
//! 任何输入都不会导致编译失败。

use crate::models::{Position, Progress, Requirement, Skill, SkillId, SkillTree};
use crate::operators::LogicalOperator;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// `max_depth` 缺失或为 0 时使用的值（不限深度）
pub const UNLIMITED_DEPTH: i64 = -1;

/// 配置编译器
pub struct ConfigCompiler;

impl ConfigCompiler {
    /// 编译整棵技能树
    ///
    /// 每个技能的标题优先使用配置中的 `title`，否则由技能 ID 生成。
    #[instrument(skip(config))]
    pub fn compile_tree(config: &Value) -> SkillTree {
        let mut tree = SkillTree::new();

        let Some(skills) = config.get("skills").and_then(Value::as_object) else {
            debug!("配置中没有 skills，返回空技能树");
            return tree;
        };

        for (id, skill_config) in skills {
            tree.insert(id.clone(), Self::compile_skill(id, skill_config));
        }

        debug!(skill_count = tree.len(), "技能树编译完成");
        tree
    }

    fn compile_skill(id: &str, config: &Value) -> Skill {
        let title = config
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| humanize_identifier(id));

        let description = config
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let requires = config
            .get("requires")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        Skill {
            title,
            description,
            requirements: Self::compile_requirements(requires),
        }
    }

    /// 编译条件列表
    ///
    /// 单个条件直接返回，不包 AND；空列表返回 `Unknown`；多个条件按 AND 组合。
    pub fn compile_requirements(configs: &[Value]) -> Requirement {
        Self::combine(LogicalOperator::And, Self::compile_list(configs), 0)
    }

    fn compile_list(configs: &[Value]) -> Vec<Requirement> {
        configs.iter().map(Self::compile_condition).collect()
    }

    fn combine(operator: LogicalOperator, mut conditions: Vec<Requirement>, required: u64) -> Requirement {
        match operator {
            LogicalOperator::And => match conditions.len() {
                0 => Requirement::Unknown,
                1 => conditions.pop().unwrap_or(Requirement::Unknown),
                _ => Requirement::And { conditions },
            },
            LogicalOperator::Or => Requirement::Or { conditions },
            LogicalOperator::Some => Requirement::Some {
                conditions,
                required,
            },
        }
    }

    /// 编译单个条件
    ///
    /// 按 exp、total_exp、skill、or、and、some 的顺序识别键。
    fn compile_condition(config: &Value) -> Requirement {
        let Some(entry) = config.as_object() else {
            return Requirement::Unknown;
        };

        if let Some(required) = entry.get("exp") {
            return Requirement::Experience {
                required: points_or_zero(required),
            };
        }

        if let Some(required) = entry.get("total_exp") {
            let max_depth = entry
                .get("max_depth")
                .and_then(as_integer)
                .filter(|depth| *depth != 0)
                .unwrap_or(UNLIMITED_DEPTH);
            return Requirement::TotalExperience {
                required: points_or_zero(required),
                max_depth,
            };
        }

        if let Some(skill) = entry.get("skill") {
            return match skill_reference(skill) {
                Some(skill_id) => Requirement::Skill { skill_id },
                None => Requirement::Unknown,
            };
        }

        if let Some(inner) = entry.get("or") {
            return Self::combine(LogicalOperator::Or, Self::compile_list(as_list(inner)), 0);
        }

        if let Some(inner) = entry.get("and") {
            return Self::combine(LogicalOperator::And, Self::compile_list(as_list(inner)), 0);
        }

        if let Some(inner) = entry.get("some") {
            let (of, required) = some_arguments(entry, inner);
            return Self::combine(LogicalOperator::Some, Self::compile_list(of), required);
        }

        debug!(keys = ?entry.keys().collect::<Vec<_>>(), "无法识别的条件配置");
        Requirement::Unknown
    }

    /// 读取进度快照，无法解析的条目会被跳过
    pub fn compile_progress(config: &Value) -> Progress {
        let mut progress = Progress::new();

        let Some(experience) = config
            .get("progress")
            .and_then(|p| p.get("experience"))
            .and_then(Value::as_object)
        else {
            return progress;
        };

        for (id, points) in experience {
            match as_points(points) {
                Some(points) => {
                    progress.experience.insert(id.clone(), points);
                }
                None => debug!(skill_id = %id, value = %points, "忽略无效的经验值"),
            }
        }

        progress
    }

    /// 读取已保存的节点坐标，无法解析的条目会被跳过
    pub fn compile_positions(config: &Value) -> BTreeMap<SkillId, Position> {
        let Some(positions) = config.get("positions").and_then(Value::as_object) else {
            return BTreeMap::new();
        };

        positions
            .iter()
            .filter_map(|(id, value)| match serde_json::from_value::<Position>(value.clone()) {
                Ok(position) => Some((id.clone(), position)),
                Err(e) => {
                    debug!(skill_id = %id, error = %e, "忽略无效的节点坐标");
                    None
                }
            })
            .collect()
    }
}

/// 收集需求树中所有被引用的技能 ID（可能重复）
pub fn extract_skill_references(node: &Requirement) -> Vec<SkillId> {
    node.skill_references()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// 将下划线分隔的标识符转换为标题形式
///
/// `"total_exp"` -> `"Total Exp"`，首尾和重复的下划线会被忽略。
pub fn humanize_identifier(id: &str) -> String {
    id.split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `some` 条件的参数
///
/// 标准形式为 `{some: {of: [...], required: N}}`，
/// 也兼容旧的平铺形式 `{some: ..., of: [...], required: N}`。
fn some_arguments<'a>(entry: &'a Map<String, Value>, inner: &'a Value) -> (&'a [Value], u64) {
    let source = match inner.as_object() {
        Some(nested) if nested.contains_key("of") => nested,
        _ => entry,
    };

    let of = source.get("of").map(as_list).unwrap_or(&[]);
    let required = source.get("required").map(points_or_zero).unwrap_or(0);
    (of, required)
}

fn as_list(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn skill_reference(value: &Value) -> Option<SkillId> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}

/// 将数值解析为经验点数，负数截断为 0
fn as_points(value: &Value) -> Option<u64> {
    as_integer(value).map(|n| n.max(0) as u64)
}

fn points_or_zero(value: &Value) -> u64 {
    as_points(value).unwrap_or(0)
}
