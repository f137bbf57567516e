//! 需求评估器
//!
//! 按依赖顺序评估技能树中每个技能的需求树。
//! 评估顺序由依赖图的拓扑排序一次性确定，每个技能只评估一次；
//! 存在循环依赖时直接返回错误，而不是无限等待依赖就绪。

use crate::dependency_graph::DependencyGraph;
use crate::error::Result;
use crate::models::{
    EvaluatedRequirement, EvaluatedSkill, EvaluationResult, InvestedExperience, Progress,
    Requirement, RequirementOutcome, SkillId, SkillTree,
};
use crate::operators::LogicalOperator;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, instrument};

/// 需求评估器
#[derive(Debug, Clone, Default)]
pub struct RequirementEvaluator {
    /// 是否记录评估追踪
    trace_enabled: bool,
}

impl RequirementEvaluator {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 评估整棵技能树
    ///
    /// 结果中每个技能恰好出现一次。技能树存在循环依赖时返回
    /// [`SkillTreeError::CycleDetected`](crate::SkillTreeError::CycleDetected)。
    #[instrument(skip_all, fields(skill_count = tree.len()))]
    pub fn evaluate_all(&self, tree: &SkillTree, progress: &Progress) -> Result<EvaluationResult> {
        let start = Instant::now();
        let order = DependencyGraph::from_tree(tree).topological_order()?;

        let mut result = EvaluationResult::new(progress.clone());

        for skill_id in order {
            let Some(skill) = tree.get(&skill_id) else {
                continue;
            };

            let requirements =
                Self::evaluate_node(&skill_id, &skill.requirements, progress, &result.skills, tree);

            if self.trace_enabled {
                result.evaluation_trace.push(format!(
                    "{}: {} ({})",
                    skill_id,
                    if requirements.satisfied {
                        "SATISFIED"
                    } else {
                        "UNSATISFIED"
                    },
                    requirements.progress()
                ));
            }

            result.skills.insert(
                skill_id,
                EvaluatedSkill {
                    title: skill.title.clone(),
                    description: skill.description.clone(),
                    requirements,
                },
            );
        }

        debug!(
            satisfied_count = result.skills.values().filter(|s| s.satisfied()).count(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "技能树评估完成"
        );

        Ok(result)
    }

    /// 递归评估单个需求节点
    ///
    /// `owner` 是需求所属的技能，`results` 中必须已包含所有被引用技能的评估结果，
    /// 缺失的引用按不满足处理。
    pub fn evaluate_node(
        owner: &str,
        node: &Requirement,
        progress: &Progress,
        results: &BTreeMap<SkillId, EvaluatedSkill>,
        tree: &SkillTree,
    ) -> EvaluatedRequirement {
        match node {
            Requirement::Skill { skill_id } => {
                let satisfied = results.get(skill_id).is_some_and(EvaluatedSkill::satisfied);
                EvaluatedRequirement::new(
                    satisfied,
                    RequirementOutcome::Skill {
                        skill_id: skill_id.clone(),
                    },
                )
            }
            Requirement::Experience { required } => {
                let invested = progress.invested(owner);
                EvaluatedRequirement::new(
                    invested >= *required,
                    RequirementOutcome::Experience {
                        required: *required,
                        invested,
                    },
                )
            }
            Requirement::TotalExperience {
                required,
                max_depth,
            } => {
                let details = Self::accumulate(owner, progress, tree, *max_depth);
                let accumulated = details
                    .iter()
                    .map(|d| d.invested)
                    .fold(0u64, u64::saturating_add);
                EvaluatedRequirement::new(
                    accumulated >= *required,
                    RequirementOutcome::TotalExperience {
                        required: *required,
                        max_depth: *max_depth,
                        accumulated,
                        details,
                    },
                )
            }
            Requirement::And { conditions } => Self::evaluate_group(
                LogicalOperator::And,
                conditions,
                0,
                owner,
                progress,
                results,
                tree,
            ),
            Requirement::Or { conditions } => Self::evaluate_group(
                LogicalOperator::Or,
                conditions,
                0,
                owner,
                progress,
                results,
                tree,
            ),
            Requirement::Some {
                conditions,
                required,
            } => Self::evaluate_group(
                LogicalOperator::Some,
                conditions,
                *required,
                owner,
                progress,
                results,
                tree,
            ),
            Requirement::Unknown => EvaluatedRequirement::unknown(),
        }
    }

    /// 评估逻辑组
    ///
    /// 不做短路求值：每个子条件的评估结果都会保留下来用于展示。
    fn evaluate_group(
        operator: LogicalOperator,
        conditions: &[Requirement],
        required: u64,
        owner: &str,
        progress: &Progress,
        results: &BTreeMap<SkillId, EvaluatedSkill>,
        tree: &SkillTree,
    ) -> EvaluatedRequirement {
        let conditions: Vec<EvaluatedRequirement> = conditions
            .iter()
            .map(|c| Self::evaluate_node(owner, c, progress, results, tree))
            .collect();

        let completed = conditions.iter().filter(|c| c.satisfied).count();
        let satisfied = operator.is_satisfied(completed, conditions.len(), required);

        let outcome = match operator {
            LogicalOperator::And => RequirementOutcome::And { conditions },
            LogicalOperator::Or => RequirementOutcome::Or { conditions },
            LogicalOperator::Some => RequirementOutcome::Some {
                conditions,
                required,
                completed,
            },
        };

        EvaluatedRequirement::new(satisfied, outcome)
    }

    /// 累计依赖闭包中投入的经验
    ///
    /// 从 `owner` 的直接依赖（深度 1）开始广度优先遍历，每个技能最多记录一次；
    /// `max_depth > 0` 时跳过超过该深度的技能。
    pub fn accumulate(
        owner: &str,
        progress: &Progress,
        tree: &SkillTree,
        max_depth: i64,
    ) -> Vec<InvestedExperience> {
        let mut queue: VecDeque<(&str, i64)> = tree
            .dependencies_of(owner)
            .into_iter()
            .map(|id| (id, 1))
            .collect();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut details = Vec::new();

        while let Some((skill_id, depth)) = queue.pop_front() {
            if visited.contains(skill_id) {
                continue;
            }
            if max_depth > 0 && depth > max_depth {
                continue;
            }

            visited.insert(skill_id);
            queue.extend(
                tree.dependencies_of(skill_id)
                    .into_iter()
                    .map(|dep| (dep, depth + 1)),
            );
            details.push(InvestedExperience {
                skill_id: skill_id.to_string(),
                invested: progress.invested(skill_id),
            });
        }

        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillTreeError;
    use crate::models::Skill;

    fn skill_ref(id: &str) -> Requirement {
        Requirement::Skill {
            skill_id: id.to_string(),
        }
    }

    fn exp(required: u64) -> Requirement {
        Requirement::Experience { required }
    }

    /// a, b 各需要 10 经验；c 依赖 a 和 b；d 需要累计 15 经验并依赖 c
    fn sample_tree() -> SkillTree {
        SkillTree::new()
            .with_skill("a", Skill::new("A", exp(10)))
            .with_skill("b", Skill::new("B", exp(10)))
            .with_skill(
                "c",
                Skill::new(
                    "C",
                    Requirement::And {
                        conditions: vec![skill_ref("a"), skill_ref("b")],
                    },
                ),
            )
    }

    fn evaluate(tree: &SkillTree, progress: &Progress) -> EvaluationResult {
        RequirementEvaluator::new()
            .evaluate_all(tree, progress)
            .unwrap()
    }

    #[test]
    fn test_experience_threshold() {
        let tree = sample_tree();
        let progress = Progress::new().with_experience("a", 10).with_experience("b", 5);
        let result = evaluate(&tree, &progress);

        assert!(result.is_satisfied("a"));
        assert!(!result.is_satisfied("b"));
        assert!(!result.is_satisfied("c"));

        match &result.skills["b"].requirements.outcome {
            RequirementOutcome::Experience { required, invested } => {
                assert_eq!(*required, 10);
                assert_eq!(*invested, 5);
            }
            other => panic!("Expected Experience, got {other:?}"),
        }
    }

    #[test]
    fn test_all_satisfied() {
        let tree = sample_tree();
        let progress = Progress::new().with_experience("a", 10).with_experience("b", 10);
        let result = evaluate(&tree, &progress);

        assert!(result.is_satisfied("a"));
        assert!(result.is_satisfied("b"));
        assert!(result.is_satisfied("c"));
    }

    #[test]
    fn test_every_skill_evaluated_once() {
        let tree = sample_tree().with_skill("lonely", Skill::new("Lonely", Requirement::Unknown));
        let result = evaluate(&tree, &Progress::new());

        assert_eq!(result.skills.len(), tree.len());
        for id in tree.skills.keys() {
            assert!(result.skills.contains_key(id));
        }
    }

    #[test]
    fn test_some_boundary() {
        let tree = SkillTree::new()
            .with_skill("x", Skill::new("X", exp(1)))
            .with_skill("y", Skill::new("Y", exp(1)))
            .with_skill("z", Skill::new("Z", exp(1)))
            .with_skill(
                "target",
                Skill::new(
                    "Target",
                    Requirement::Some {
                        conditions: vec![skill_ref("x"), skill_ref("y"), skill_ref("z")],
                        required: 2,
                    },
                ),
            );

        let two = Progress::new().with_experience("x", 1).with_experience("y", 1);
        let result = evaluate(&tree, &two);
        assert!(result.is_satisfied("target"));
        match &result.skills["target"].requirements.outcome {
            RequirementOutcome::Some { completed, .. } => assert_eq!(*completed, 2),
            other => panic!("Expected Some, got {other:?}"),
        }

        let one = Progress::new().with_experience("x", 1);
        assert!(!evaluate(&tree, &one).is_satisfied("target"));
    }

    #[test]
    fn test_or_requires_any() {
        let tree = sample_tree().with_skill(
            "either",
            Skill::new(
                "Either",
                Requirement::Or {
                    conditions: vec![skill_ref("a"), skill_ref("b")],
                },
            ),
        );

        let progress = Progress::new().with_experience("b", 10);
        assert!(evaluate(&tree, &progress).is_satisfied("either"));
        assert!(!evaluate(&tree, &Progress::new()).is_satisfied("either"));
    }

    #[test]
    fn test_unknown_and_missing_reference_are_unsatisfied() {
        let tree = SkillTree::new()
            .with_skill("u", Skill::new("U", Requirement::Unknown))
            .with_skill("ghost_dep", Skill::new("Ghost", skill_ref("ghost")));

        let result = evaluate(&tree, &Progress::new());
        assert!(!result.is_satisfied("u"));
        assert!(!result.is_satisfied("ghost_dep"));
    }

    #[test]
    fn test_total_experience_depth_limit() {
        // top -> mid -> base
        let tree = SkillTree::new()
            .with_skill("base", Skill::new("Base", exp(0)))
            .with_skill("mid", Skill::new("Mid", skill_ref("base")))
            .with_skill(
                "top",
                Skill::new(
                    "Top",
                    Requirement::And {
                        conditions: vec![
                            skill_ref("mid"),
                            Requirement::TotalExperience {
                                required: 0,
                                max_depth: 1,
                            },
                        ],
                    },
                ),
            );
        let progress = Progress::new()
            .with_experience("base", 7)
            .with_experience("mid", 3);

        let direct = RequirementEvaluator::accumulate("top", &progress, &tree, 1);
        assert_eq!(
            direct,
            vec![InvestedExperience {
                skill_id: "mid".to_string(),
                invested: 3
            }]
        );

        let all = RequirementEvaluator::accumulate("top", &progress, &tree, -1);
        assert_eq!(all.iter().map(|d| d.invested).sum::<u64>(), 10);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_total_experience_saturates() {
        let huge = 9_000_000_000_000_000_000u64;
        let tree = SkillTree::new()
            .with_skill("a", Skill::new("A", exp(0)))
            .with_skill("b", Skill::new("B", exp(0)))
            .with_skill("c", Skill::new("C", exp(0)))
            .with_skill(
                "d",
                Skill::new(
                    "D",
                    Requirement::And {
                        conditions: vec![
                            skill_ref("a"),
                            skill_ref("b"),
                            skill_ref("c"),
                            Requirement::TotalExperience {
                                required: 1,
                                max_depth: -1,
                            },
                        ],
                    },
                ),
            );
        let progress = Progress::new()
            .with_experience("a", huge)
            .with_experience("b", huge)
            .with_experience("c", huge);

        let result = evaluate(&tree, &progress);
        assert!(result.is_satisfied("d"));

        let RequirementOutcome::And { conditions } = &result.skills["d"].requirements.outcome else {
            panic!("Expected And");
        };
        let RequirementOutcome::TotalExperience { accumulated, .. } = &conditions[3].outcome else {
            panic!("Expected TotalExperience");
        };
        assert_eq!(*accumulated, u64::MAX);
    }

    #[test]
    fn test_total_experience_counts_diamond_once() {
        // d -> {b, c} -> a
        let tree = SkillTree::new()
            .with_skill("a", Skill::new("A", exp(0)))
            .with_skill("b", Skill::new("B", skill_ref("a")))
            .with_skill("c", Skill::new("C", skill_ref("a")))
            .with_skill(
                "d",
                Skill::new(
                    "D",
                    Requirement::And {
                        conditions: vec![
                            Requirement::Or {
                                conditions: vec![skill_ref("b"), skill_ref("c")],
                            },
                            Requirement::TotalExperience {
                                required: 15,
                                max_depth: -1,
                            },
                        ],
                    },
                ),
            );
        let progress = Progress::new()
            .with_experience("a", 10)
            .with_experience("b", 3)
            .with_experience("c", 2);

        let result = evaluate(&tree, &progress);
        let RequirementOutcome::And { conditions } = &result.skills["d"].requirements.outcome else {
            panic!("Expected And");
        };
        match &conditions[1].outcome {
            RequirementOutcome::TotalExperience {
                accumulated,
                details,
                ..
            } => {
                assert_eq!(*accumulated, 15);
                assert_eq!(details.len(), 3);
                assert_eq!(details.iter().filter(|d| d.skill_id == "a").count(), 1);
            }
            other => panic!("Expected TotalExperience, got {other:?}"),
        }
        assert!(conditions[1].satisfied);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let tree = SkillTree::new()
            .with_skill("a", Skill::new("A", skill_ref("b")))
            .with_skill("b", Skill::new("B", skill_ref("a")));

        let err = RequirementEvaluator::new()
            .evaluate_all(&tree, &Progress::new())
            .unwrap_err();
        assert!(matches!(err, SkillTreeError::CycleDetected { .. }));
    }

    #[test]
    fn test_accumulate_terminates_on_cycle() {
        let tree = SkillTree::new()
            .with_skill("a", Skill::new("A", skill_ref("b")))
            .with_skill("b", Skill::new("B", skill_ref("a")));
        let progress = Progress::new().with_experience("a", 1).with_experience("b", 2);

        let details = RequirementEvaluator::accumulate("a", &progress, &tree, -1);
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn test_trace() {
        let tree = sample_tree();
        let progress = Progress::new().with_experience("a", 10);
        let result = RequirementEvaluator::new()
            .with_trace()
            .evaluate_all(&tree, &progress)
            .unwrap();

        assert_eq!(result.evaluation_trace.len(), 3);
        assert!(result
            .evaluation_trace
            .contains(&"c: UNSATISFIED (Satisfied 1 / 2 conditions)".to_string()));
    }
}
