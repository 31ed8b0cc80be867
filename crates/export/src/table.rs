//! 表格契约 - 报表层和导出层之间唯一的数据形状

use crate::error::{ExportError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// 单元格标量
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Self::Integer(n as i64)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// 一行: 列名 -> 值
pub type Row = BTreeMap<String, Cell>;

/// 表格: 标题 + 有序列名 + 有序行
///
/// 行在加入时按列顺序校验并存储，导出器拿到的表总是完整的。
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// 列名必须非空且唯一
    pub fn new<I, S>(title: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ExportError::Validation("table has no columns".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.trim().is_empty() {
                return Err(ExportError::Validation("empty column name".to_string()));
            }
            if !seen.insert(column.as_str()) {
                return Err(ExportError::Validation(format!(
                    "duplicate column `{}`",
                    column
                )));
            }
        }

        Ok(Self {
            title: title.into(),
            columns,
            rows: Vec::new(),
        })
    }

    /// 加入一行；缺列或多出未声明的列都会报 Validation
    pub fn push_row(&mut self, mut row: Row) -> Result<()> {
        let mut cells = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let cell = row.remove(column).ok_or_else(|| {
                ExportError::Validation(format!(
                    "row {} is missing column `{}`",
                    self.rows.len() + 1,
                    column
                ))
            })?;
            cells.push(cell);
        }

        if let Some(extra) = row.keys().next() {
            return Err(ExportError::Validation(format!(
                "row {} has undeclared column `{}`",
                self.rows.len() + 1,
                extra
            )));
        }

        self.rows.push(cells);
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 按列顺序排列的行
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 取单元格
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}
