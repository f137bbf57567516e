//! 技能树引擎错误类型
//!
//! 编译阶段是 fail-open 的，不会产生错误；唯一会暴露给调用方的业务错误是循环依赖。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillTreeError {
    #[error("检测到循环依赖: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SkillTreeError {
    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::JsonError(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SkillTreeError>;
