//! archimate - Archimate 模型加载与索引
//!
//! XML exchange format 解析、类型化元素/关系、只读模型图

mod error;
mod graph;
mod loader;
mod types;

pub use error::{ModelError, Result};
pub use graph::{GraphStats, ModelGraph};
pub use loader::{ModelLoader, ParsedModel};
pub use types::{
    Element, ElementHandle, ElementType, Relationship, RelationshipHandle, RelationshipKind,
};
