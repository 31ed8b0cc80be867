use thiserror::Error;

/// 模型加载/查询错误
#[derive(Error, Debug)]
pub enum ModelError {
    /// XML 不合法
    #[error("XML parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },
    /// 结构合法但缺少领域属性
    #[error("Schema error: {node} {} at line {line} is missing `{attribute}`", .id.as_deref().unwrap_or("<no id>"))]
    Schema {
        node: &'static str,
        id: Option<String>,
        line: usize,
        attribute: &'static str,
    },
    #[error("Integrity error: {0}")]
    Integrity(String),
    #[error("Element not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
