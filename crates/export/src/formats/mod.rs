//! 导出格式注册表

mod console;
mod csv;
mod html;
mod json;
mod markdown;

use crate::error::{ExportError, Result};
use crate::table::Table;
use std::collections::HashSet;
use std::io::Write;

/// 渲染函数
pub type RenderFn = fn(&Table, &mut dyn Write) -> Result<()>;

/// 一种导出格式
#[derive(Clone, Copy)]
pub struct Exporter {
    pub id: &'static str,
    /// 文件扩展名
    pub extension: &'static str,
    pub description: &'static str,
    /// 默认输出到终端而非文件
    pub interactive: bool,
    render: RenderFn,
}

impl Exporter {
    pub const fn new(
        id: &'static str,
        extension: &'static str,
        description: &'static str,
        render: RenderFn,
    ) -> Self {
        Self {
            id,
            extension,
            description,
            interactive: false,
            render,
        }
    }

    pub const fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn render(&self, table: &Table, out: &mut dyn Write) -> Result<()> {
        (self.render)(table, out)
    }

    /// 先渲染到内存，失败时不会产生任何输出
    pub fn render_to_vec(&self, table: &Table) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.render(table, &mut buf)?;
        Ok(buf)
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("id", &self.id)
            .field("extension", &self.extension)
            .field("interactive", &self.interactive)
            .finish()
    }
}

/// 格式 id -> 导出器
#[derive(Debug, Clone, Default)]
pub struct ExporterRegistry {
    exporters: Vec<Exporter>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置格式，启动时校验
    pub fn builtin() -> Result<Self> {
        let registry = Self::new()
            .with(console::EXPORTER)
            .with(csv::EXPORTER)
            .with(json::EXPORTER)
            .with(html::EXPORTER)
            .with(markdown::EXPORTER);
        registry.validate()?;
        Ok(registry)
    }

    pub fn with(mut self, exporter: Exporter) -> Self {
        self.exporters.push(exporter);
        self
    }

    /// id 非空、唯一，扩展名非空
    pub fn validate(&self) -> Result<()> {
        if self.exporters.is_empty() {
            return Err(ExportError::Registry("no exporters registered".to_string()));
        }

        let mut seen = HashSet::new();
        for exporter in &self.exporters {
            if exporter.id.trim().is_empty() {
                return Err(ExportError::Registry("exporter with empty id".to_string()));
            }
            if exporter.extension.trim().is_empty() {
                return Err(ExportError::Registry(format!(
                    "exporter `{}` has no file extension",
                    exporter.id
                )));
            }
            if !seen.insert(exporter.id) {
                return Err(ExportError::Registry(format!(
                    "duplicate exporter id `{}`",
                    exporter.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Exporter> {
        self.exporters
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| ExportError::UnknownFormat {
                format: id.to_string(),
                available: self.ids().join(", "),
            })
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.exporters.iter().map(|e| e.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exporter> {
        self.exporters.iter()
    }
}
