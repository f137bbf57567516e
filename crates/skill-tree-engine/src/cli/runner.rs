//! 命令执行器
//!
//! 负责执行各 CLI 子命令的具体逻辑：读取配置文件、运行评估流水线、输出结果。
//! 文本格式（YAML / JSON）的解析和序列化只发生在这一层。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::document::SkillTreeDocument;
use crate::evaluator::RequirementEvaluator;
use crate::models::SkillId;

/// 命令执行器
pub struct CommandRunner {
    evaluator: RequirementEvaluator,
    pretty_output: bool,
}

impl CommandRunner {
    pub fn new(trace_enabled: bool, pretty_output: bool) -> Self {
        let evaluator = if trace_enabled {
            RequirementEvaluator::new().with_trace()
        } else {
            RequirementEvaluator::new()
        };

        Self {
            evaluator,
            pretty_output,
        }
    }

    /// 执行 evaluate 命令
    pub fn run_evaluate(&self, file: &Path) -> Result<()> {
        let document = load_document(file)?;
        println!("{}", self.render_evaluation(&document)?);
        Ok(())
    }

    /// 执行 graph 命令
    pub fn run_graph(&self, file: &Path) -> Result<()> {
        let document = load_document(file)?;
        println!("{}", self.render_graph(&document)?);
        Ok(())
    }

    /// 执行 check 命令
    ///
    /// 返回 `true` 表示依赖图无环。
    pub fn run_check(&self, file: &Path) -> Result<bool> {
        let document = load_document(file)?;
        match document.find_cycle() {
            Some(path) => {
                warn!(path = ?path, "依赖图存在循环");
                println!("cycle detected: {}", describe_cycle(&path));
                Ok(false)
            }
            None => {
                println!("ok: {} skills, no cycles", document.tree().len());
                Ok(true)
            }
        }
    }

    /// 执行 show 命令
    pub fn run_show(&self, file: &Path, skill: &str) -> Result<()> {
        let document = load_document(file)?;
        println!("{}", self.render_skill(&document, skill)?);
        Ok(())
    }

    /// 执行 set-exp 命令
    pub fn run_set_exp(&self, file: &Path, skill: &str, points: u64, write: bool) -> Result<()> {
        let mut document = load_document(file)?;
        if !document.tree().contains(skill) {
            warn!(skill_id = %skill, "技能不存在，仍然写入经验");
        }
        document.set_experience(skill, points);

        let output = serialize_like(file, document.config())?;
        if write {
            fs::write(file, output)
                .with_context(|| format!("写入配置文件失败: {}", file.display()))?;
            info!(file = %file.display(), "配置文件已更新");
        } else {
            print!("{}", output);
        }
        Ok(())
    }

    pub fn render_evaluation(&self, document: &SkillTreeDocument) -> Result<String> {
        let result = document.evaluate(&self.evaluator)?;
        self.to_json(&result)
    }

    pub fn render_graph(&self, document: &SkillTreeDocument) -> Result<String> {
        let graph = document.graph(&self.evaluator)?;
        self.to_json(&graph)
    }

    /// 单个技能的摘要：标题、描述、投入经验与条件完成情况
    pub fn render_skill(&self, document: &SkillTreeDocument, skill_id: &str) -> Result<String> {
        let result = document.evaluate(&self.evaluator)?;
        let Some(skill) = result.skills.get(skill_id) else {
            bail!("技能不存在: {}", skill_id);
        };

        let mut lines = vec![format!("{} ({})", skill.title, skill_id)];
        if let Some(description) = &skill.description {
            lines.push(description.clone());
        }
        lines.push(format!(
            "Experience Points: {}",
            result.progress.invested(skill_id)
        ));
        lines.push(format!("{}:", skill.requirements.progress()));
        lines.push(
            if skill.satisfied() {
                "Satisfied"
            } else {
                "Unsatisfied"
            }
            .to_string(),
        );

        Ok(lines.join("\n"))
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty_output {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

/// 读取 YAML 或 JSON 配置文件
pub fn load_document(path: &Path) -> Result<SkillTreeDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    parse_document(&text).with_context(|| format!("解析配置文件失败: {}", path.display()))
}

/// 解析配置文本（YAML 是 JSON 的超集，统一按 YAML 解析）
pub fn parse_document(text: &str) -> Result<SkillTreeDocument> {
    let config: Value = serde_yaml::from_str(text)?;
    Ok(SkillTreeDocument::from_value(config))
}

/// 按原文件格式序列化配置
fn serialize_like(path: &Path, config: &Value) -> Result<String> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let mut json = serde_json::to_string_pretty(config)?;
        json.push('\n');
        Ok(json)
    } else {
        Ok(serde_yaml::to_string(config)?)
    }
}

/// 配置中的循环路径，供调用方展示
pub fn describe_cycle(path: &[SkillId]) -> String {
    path.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const DEFAULT_CONFIG: &str = r#"
title: Skill Tree Editor
skills:
  a:
    requires:
    - exp: 10
  b:
    requires:
    - exp: 10
  c:
    description: Needs both
    requires:
    - skill: a
    - skill: b
progress:
  experience:
    a: 10
    b: 5
"#;

    #[test]
    fn test_parse_yaml_document() {
        let document = parse_document(DEFAULT_CONFIG).unwrap();
        assert_eq!(document.title(), "Skill Tree Editor");
        assert_eq!(document.tree().len(), 3);
        assert_eq!(document.progress().invested("b"), 5);
    }

    #[test]
    fn test_parse_json_document() {
        let document = parse_document(r#"{"skills": {"a": {"requires": [{"exp": 1}]}}}"#).unwrap();
        assert_eq!(document.tree().len(), 1);
    }

    #[test]
    fn test_render_evaluation() {
        let runner = CommandRunner::new(false, false);
        let document = parse_document(DEFAULT_CONFIG).unwrap();
        let json: Value = serde_json::from_str(&runner.render_evaluation(&document).unwrap()).unwrap();

        assert_eq!(json["skills"]["a"]["requirements"]["satisfied"], true);
        assert_eq!(json["skills"]["c"]["requirements"]["satisfied"], false);
        assert!(json.get("evaluation_trace").is_none());
    }

    #[test]
    fn test_render_evaluation_with_trace() {
        let runner = CommandRunner::new(true, true);
        let document = parse_document(DEFAULT_CONFIG).unwrap();
        let json: Value = serde_json::from_str(&runner.render_evaluation(&document).unwrap()).unwrap();

        assert_eq!(json["evaluation_trace"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_render_graph() {
        let runner = CommandRunner::new(false, false);
        let document = parse_document(DEFAULT_CONFIG).unwrap();
        let json: Value = serde_json::from_str(&runner.render_graph(&document).unwrap()).unwrap();

        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(json["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_render_skill() {
        let runner = CommandRunner::new(false, false);
        let document = parse_document(DEFAULT_CONFIG).unwrap();
        let summary = runner.render_skill(&document, "c").unwrap();

        assert!(summary.starts_with("C (c)"));
        assert!(summary.contains("Needs both"));
        assert!(summary.contains("Satisfied 1 / 2 conditions:"));
        assert!(summary.ends_with("Unsatisfied"));

        assert!(runner.render_skill(&document, "missing").is_err());
    }

    #[test]
    fn test_serialize_like_extension() {
        let config = serde_json::json!({"title": "x"});
        let json = serialize_like(&PathBuf::from("tree.JSON"), &config).unwrap();
        assert!(json.trim_start().starts_with('{'));

        let yaml = serialize_like(&PathBuf::from("tree.yaml"), &config).unwrap();
        assert_eq!(yaml.trim(), "title: x");
    }

    #[test]
    fn test_describe_cycle() {
        let path = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert_eq!(describe_cycle(&path), "a -> b -> a");
    }
}
