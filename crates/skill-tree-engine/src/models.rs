//! 技能树领域模型

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 技能 ID，技能树内唯一
pub type SkillId = String;

/// 需求节点（编译后、未评估）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// 依赖另一个技能已满足
    Skill { skill_id: SkillId },
    /// 在本技能投入的经验 >= required
    Experience { required: u64 },
    /// 依赖闭包内累计经验 >= required，max_depth <= 0 表示不限深度
    TotalExperience { required: u64, max_depth: i64 },
    And { conditions: Vec<Requirement> },
    Or { conditions: Vec<Requirement> },
    /// 至少 required 个子条件满足
    Some {
        conditions: Vec<Requirement>,
        required: u64,
    },
    /// 无法识别的配置，永远不满足
    Unknown,
}

impl Requirement {
    /// 收集所有 `Skill` 叶子引用的技能 ID（可能重复）
    pub fn skill_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::Skill { skill_id } => refs.push(skill_id),
            Self::And { conditions } | Self::Or { conditions } | Self::Some { conditions, .. } => {
                for condition in conditions {
                    condition.collect_references(refs);
                }
            }
            Self::Experience { .. } | Self::TotalExperience { .. } | Self::Unknown => {}
        }
    }
}

/// 技能定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requirements: Requirement,
}

impl Skill {
    pub fn new(title: impl Into<String>, requirements: Requirement) -> Self {
        Self {
            title: title.into(),
            description: None,
            requirements,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// 技能树：技能 ID 到技能的有序映射
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTree {
    #[serde(default)]
    pub skills: BTreeMap<SkillId, Skill>,
}

impl SkillTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<SkillId>, skill: Skill) {
        self.skills.insert(id.into(), skill);
    }

    pub fn with_skill(mut self, id: impl Into<SkillId>, skill: Skill) -> Self {
        self.insert(id, skill);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkillId, &Skill)> {
        self.skills.iter()
    }

    /// 某技能直接依赖的技能 ID；技能不存在时为空
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.get(id)
            .map(|skill| skill.requirements.skill_references())
            .unwrap_or_default()
    }
}

/// 进度快照：每个技能已投入的经验
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub experience: BTreeMap<SkillId, u64>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experience(mut self, id: impl Into<SkillId>, points: u64) -> Self {
        self.experience.insert(id.into(), points);
        self
    }

    /// 已投入经验，未记录时为 0
    pub fn invested(&self, id: &str) -> u64 {
        self.experience.get(id).copied().unwrap_or(0)
    }
}

/// 节点在画布上的坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 累计经验明细：某个依赖技能贡献的经验
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestedExperience {
    pub skill_id: SkillId,
    pub invested: u64,
}

/// 评估后的需求节点
///
/// 与 [`Requirement`] 平行的一棵树，每个节点都带有满足状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedRequirement {
    pub satisfied: bool,
    #[serde(flatten)]
    pub outcome: RequirementOutcome,
}

/// 各类需求的评估明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequirementOutcome {
    Skill {
        skill_id: SkillId,
    },
    Experience {
        required: u64,
        invested: u64,
    },
    TotalExperience {
        required: u64,
        max_depth: i64,
        accumulated: u64,
        details: Vec<InvestedExperience>,
    },
    And {
        conditions: Vec<EvaluatedRequirement>,
    },
    Or {
        conditions: Vec<EvaluatedRequirement>,
    },
    Some {
        conditions: Vec<EvaluatedRequirement>,
        required: u64,
        completed: usize,
    },
    Unknown,
}

impl EvaluatedRequirement {
    pub fn new(satisfied: bool, outcome: RequirementOutcome) -> Self {
        Self { satisfied, outcome }
    }

    pub fn unknown() -> Self {
        Self::new(false, RequirementOutcome::Unknown)
    }

    /// 收集评估树中所有 `Skill` 叶子引用的技能 ID（可能重复）
    pub fn skill_references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match &self.outcome {
            RequirementOutcome::Skill { skill_id } => refs.push(skill_id),
            RequirementOutcome::And { conditions }
            | RequirementOutcome::Or { conditions }
            | RequirementOutcome::Some { conditions, .. } => {
                for condition in conditions {
                    condition.collect_references(refs);
                }
            }
            _ => {}
        }
    }

    /// 顶层条件完成情况
    ///
    /// AND 组按直接子条件计数，其余节点视为单个条件。
    pub fn progress(&self) -> ConditionProgress {
        match &self.outcome {
            RequirementOutcome::And { conditions } => ConditionProgress {
                done: conditions.iter().filter(|c| c.satisfied).count(),
                total: conditions.len(),
            },
            _ => ConditionProgress {
                done: usize::from(self.satisfied),
                total: 1,
            },
        }
    }
}

/// 顶层条件完成计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionProgress {
    pub done: usize,
    pub total: usize,
}

impl fmt::Display for ConditionProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.total == 1 { "" } else { "s" };
        write!(
            f,
            "Satisfied {} / {} condition{}",
            self.done, self.total, plural
        )
    }
}

/// 评估后的技能
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedSkill {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub requirements: EvaluatedRequirement,
}

impl EvaluatedSkill {
    pub fn satisfied(&self) -> bool {
        self.requirements.satisfied
    }
}

/// 评估结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub skills: BTreeMap<SkillId, EvaluatedSkill>,
    pub progress: Progress,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

impl EvaluationResult {
    pub fn new(progress: Progress) -> Self {
        Self {
            skills: BTreeMap::new(),
            progress,
            evaluation_trace: Vec::new(),
        }
    }

    /// 技能是否满足，未评估的技能视为不满足
    pub fn is_satisfied(&self, id: &str) -> bool {
        self.skills.get(id).is_some_and(EvaluatedSkill::satisfied)
    }
}
