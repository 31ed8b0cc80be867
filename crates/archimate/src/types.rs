use serde::{Deserialize, Serialize};
use std::fmt;

/// 元素类型 - `xsi:type` 标签
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    BusinessProcess,
    ApplicationComponent,
    ApplicationService,
    /// 分析器不关心的其他层元素
    Other(String),
}

impl ElementType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BusinessProcess => "BusinessProcess",
            Self::ApplicationComponent => "ApplicationComponent",
            Self::ApplicationService => "ApplicationService",
            Self::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "BusinessProcess" => Self::BusinessProcess,
            "ApplicationComponent" => Self::ApplicationComponent,
            "ApplicationService" => Self::ApplicationService,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 关系类型 (Archimate 3 关系集合)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipKind {
    Serving,
    Assignment,
    Realization,
    Composition,
    Aggregation,
    Access,
    Influence,
    Triggering,
    Flow,
    Specialization,
    Association,
    Other(String),
}

impl RelationshipKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Serving => "Serving",
            Self::Assignment => "Assignment",
            Self::Realization => "Realization",
            Self::Composition => "Composition",
            Self::Aggregation => "Aggregation",
            Self::Access => "Access",
            Self::Influence => "Influence",
            Self::Triggering => "Triggering",
            Self::Flow => "Flow",
            Self::Specialization => "Specialization",
            Self::Association => "Association",
            Self::Other(tag) => tag,
        }
    }

    /// 解析关系标签，大小写不敏感 (配置文件和环境变量里常写成小写)
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "serving" => Self::Serving,
            "assignment" => Self::Assignment,
            "realization" => Self::Realization,
            "composition" => Self::Composition,
            "aggregation" => Self::Aggregation,
            "access" => Self::Access,
            "influence" => Self::Influence,
            "triggering" => Self::Triggering,
            "flow" => Self::Flow,
            "specialization" => Self::Specialization,
            "association" => Self::Association,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl From<String> for RelationshipKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<RelationshipKind> for String {
    fn from(kind: RelationshipKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 元素句柄 - 指向 ModelGraph 元素数组的稳定下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub(crate) u32);

impl ElementHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 关系句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipHandle(pub(crate) u32);

impl RelationshipHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 模型元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub element_type: ElementType,
    pub name: String,
}

impl Element {
    pub fn new(id: impl Into<String>, element_type: ElementType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type,
            name: name.into(),
        }
    }
}

/// 有向关系 source -> target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: RelationshipKind,
    pub source: String,
    pub target: String,
    /// 关系名称可选
    pub name: Option<String>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        kind: RelationshipKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            source: source.into(),
            target: target.into(),
            name: None,
        }
    }

    pub fn touches(&self, element_id: &str) -> bool {
        self.source == element_id || self.target == element_id
    }
}
