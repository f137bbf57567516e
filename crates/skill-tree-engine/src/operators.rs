//! 逻辑组合操作符定义

/// 条件组合方式
///
/// 配置中的条件列表默认按 AND 组合，`or` / `some` 会强制改变组合方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    Some,
}

impl LogicalOperator {
    /// 根据满足的子条件数量判断整个组是否满足
    ///
    /// `required` 仅对 `Some` 有意义。
    pub fn is_satisfied(self, completed: usize, total: usize, required: u64) -> bool {
        match self {
            Self::And => completed == total,
            Self::Or => completed > 0,
            Self::Some => completed as u64 >= required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_requires_all() {
        assert!(LogicalOperator::And.is_satisfied(3, 3, 0));
        assert!(!LogicalOperator::And.is_satisfied(2, 3, 0));
    }

    #[test]
    fn test_or_requires_one() {
        assert!(LogicalOperator::Or.is_satisfied(1, 3, 0));
        assert!(!LogicalOperator::Or.is_satisfied(0, 3, 0));
        assert!(!LogicalOperator::Or.is_satisfied(0, 0, 0));
    }

    #[test]
    fn test_some_threshold() {
        assert!(LogicalOperator::Some.is_satisfied(2, 3, 2));
        assert!(!LogicalOperator::Some.is_satisfied(1, 3, 2));
        // required 为 0 时空组也视为满足
        assert!(LogicalOperator::Some.is_satisfied(0, 0, 0));
    }
}
