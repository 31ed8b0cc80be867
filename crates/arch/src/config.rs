//! 分析器配置 - 关系类型到语义角色的显式映射

use crate::analyzer::{ArchError, Result};
use archimate::RelationshipKind;
use serde::Deserialize;
use std::path::Path;

/// 分析器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// 服务 -> 流程 的关系类型
    pub service_link_kinds: Vec<RelationshipKind>,
    /// 组件 -> 服务 的关系类型
    pub realization_kinds: Vec<RelationshipKind>,
    /// 组件直接 serving 流程时也视为闭合路径
    pub direct_component_serving: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            service_link_kinds: vec![RelationshipKind::Serving],
            realization_kinds: vec![RelationshipKind::Assignment, RelationshipKind::Realization],
            direct_component_serving: false,
        }
    }
}

impl AnalyzerConfig {
    /// 从 TOML 文件加载，缺省字段取默认值
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ArchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 用 `ARCHI_*` 环境变量覆盖
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    #[doc(hidden)]
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("ARCHI_DIRECT_SERVING") {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.direct_component_serving = true,
                "0" | "false" | "no" | "off" => self.direct_component_serving = false,
                other => tracing::warn!("Ignoring ARCHI_DIRECT_SERVING={}", other),
            }
        }

        if let Some(kinds) = lookup("ARCHI_SERVICE_LINKS").and_then(|v| parse_kinds(&v)) {
            self.service_link_kinds = kinds;
        }

        if let Some(kinds) = lookup("ARCHI_REALIZATION_KINDS").and_then(|v| parse_kinds(&v)) {
            self.realization_kinds = kinds;
        }

        self
    }

    pub fn with_direct_component_serving(mut self, enabled: bool) -> Self {
        self.direct_component_serving = enabled;
        self
    }

    pub fn with_service_link_kinds(mut self, kinds: Vec<RelationshipKind>) -> Self {
        self.service_link_kinds = kinds;
        self
    }

    pub fn with_realization_kinds(mut self, kinds: Vec<RelationshipKind>) -> Self {
        self.realization_kinds = kinds;
        self
    }

    /// 两个角色都必须至少有一种关系类型
    pub fn validate(&self) -> Result<()> {
        if self.service_link_kinds.is_empty() {
            return Err(ArchError::Config(
                "service_link_kinds must not be empty".to_string(),
            ));
        }
        if self.realization_kinds.is_empty() {
            return Err(ArchError::Config(
                "realization_kinds must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// 逗号分隔的关系类型列表；空列表返回 None
fn parse_kinds(value: &str) -> Option<Vec<RelationshipKind>> {
    let kinds: Vec<RelationshipKind> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RelationshipKind::from_tag)
        .collect();
    if kinds.is_empty() {
        None
    } else {
        Some(kinds)
    }
}
