//! arch - 架构关系分析
//!
//! 业务流程覆盖分析、组件服务映射、报表组装

mod analyzer;
mod config;
mod report;

pub use analyzer::{AnalysisResult, ArchError, ElementRef, RelationshipAnalyzer, Result};
pub use config::AnalyzerConfig;
pub use report::{ReportAssembler, ReportKind};
