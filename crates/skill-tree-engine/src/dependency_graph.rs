//! 技能依赖图
//!
//! 由技能树中 `Skill` 类型的需求推导出依赖关系，提供循环检测和拓扑排序。
//! 编辑配置前必须用 [`DependencyGraph::has_cycle`] 做门禁；
//! 评估器内部也通过 [`DependencyGraph::topological_order`] 再次保证无环。

use crate::error::{Result, SkillTreeError};
use crate::models::{SkillId, SkillTree};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// 依赖图：技能 ID -> 该技能直接依赖的技能 ID
///
/// 邻接表中可能包含技能树里不存在的 ID，这些节点被视为没有出边的叶子。
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    adjacency: BTreeMap<SkillId, Vec<SkillId>>,
}

/// DFS 三色标记（未访问的节点不在表中）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    OnStack,
    Done,
}

impl DependencyGraph {
    /// 从技能树构建依赖图
    pub fn from_tree(tree: &SkillTree) -> Self {
        let adjacency = tree
            .iter()
            .map(|(id, skill)| {
                let deps = skill
                    .requirements
                    .skill_references()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (id.clone(), deps)
            })
            .collect();

        Self { adjacency }
    }

    /// 获取某技能的直接依赖
    pub fn dependencies(&self, id: &str) -> &[SkillId] {
        self.adjacency
            .get(id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// 检查依赖图是否为空
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// 是否存在循环依赖
    pub fn has_cycle(&self) -> bool {
        self.depth_first().is_err()
    }

    /// 查找一个循环，返回首尾相同的路径，如 `[a, b, a]`
    pub fn find_cycle(&self) -> Option<Vec<SkillId>> {
        self.depth_first().err()
    }

    /// 拓扑排序：依赖总是排在被依赖者之前
    ///
    /// 只包含图中的节点（即技能树中存在的技能），引用的未知 ID 被忽略。
    pub fn topological_order(&self) -> Result<Vec<SkillId>> {
        self.depth_first().map_err(|path| {
            debug!(path = ?path, "检测到循环依赖");
            SkillTreeError::CycleDetected { path }
        })
    }

    /// 迭代式 DFS
    ///
    /// 成功时返回后序遍历结果，遇到指向栈上节点的边时返回循环路径。
    fn depth_first(&self) -> std::result::Result<Vec<SkillId>, Vec<SkillId>> {
        let mut state: HashMap<&str, VisitState> = HashMap::with_capacity(self.adjacency.len());
        let mut order = Vec::with_capacity(self.adjacency.len());

        for root in self.adjacency.keys() {
            if state.contains_key(root.as_str()) {
                continue;
            }

            // (节点, 下一个待访问的邻居下标)
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            state.insert(root.as_str(), VisitState::OnStack);

            while let Some(&(node, index)) = stack.last() {
                match self.dependencies(node).get(index) {
                    Some(next) => {
                        if let Some(top) = stack.last_mut() {
                            top.1 += 1;
                        }

                        match state.get(next.as_str()) {
                            Some(VisitState::OnStack) => {
                                let start = stack
                                    .iter()
                                    .position(|(n, _)| *n == next.as_str())
                                    .unwrap_or(0);
                                let mut path: Vec<SkillId> =
                                    stack[start..].iter().map(|(n, _)| n.to_string()).collect();
                                path.push(next.clone());
                                return Err(path);
                            }
                            Some(VisitState::Done) => {}
                            None => {
                                state.insert(next.as_str(), VisitState::OnStack);
                                stack.push((next.as_str(), 0));
                            }
                        }
                    }
                    None => {
                        state.insert(node, VisitState::Done);
                        if self.adjacency.contains_key(node) {
                            order.push(node.to_string());
                        }
                        stack.pop();
                    }
                }
            }
        }

        Ok(order)
    }
}

impl FromIterator<(SkillId, Vec<SkillId>)> for DependencyGraph {
    fn from_iter<I: IntoIterator<Item = (SkillId, Vec<SkillId>)>>(iter: I) -> Self {
        Self {
            adjacency: iter.into_iter().collect(),
        }
    }
}
