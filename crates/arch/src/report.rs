//! 报表组装 - 分析结果 -> Table

use crate::analyzer::{AnalysisResult, ArchError, ElementRef};
use export::{Cell, Row, Table};
use std::collections::BTreeSet;
use std::str::FromStr;

/// 报表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// 已被服务的业务流程
    ServedProcesses,
    /// 未被服务的业务流程
    UnservedProcesses,
    /// 应用组件及其服务的流程
    ComponentProcesses,
    /// 全部流程的覆盖状态
    Coverage,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        Self::ServedProcesses,
        Self::UnservedProcesses,
        Self::ComponentProcesses,
        Self::Coverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServedProcesses => "served-processes",
            Self::UnservedProcesses => "unserved-processes",
            Self::ComponentProcesses => "component-processes",
            Self::Coverage => "coverage",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ServedProcesses => "Process Status Report: Served Business Processes",
            Self::UnservedProcesses => "Process Status Report: Unserved Business Processes",
            Self::ComponentProcesses => "Application Components and Their Served Processes",
            Self::Coverage => "Business Process Coverage",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::ServedProcesses => &[PROCESS_NAME, PROCESS_ID, SERVING_COMPONENTS],
            Self::UnservedProcesses => &[PROCESS_NAME, PROCESS_ID],
            Self::ComponentProcesses => &[APPLICATION_COMPONENT, PROCESS_NAME, PROCESS_COUNT],
            Self::Coverage => &[PROCESS_NAME, STATUS, SERVING_COMPONENTS],
        }
    }
}

impl FromStr for ReportKind {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ArchError::UnknownReport {
                report: s.to_string(),
                available: Self::ALL.map(|kind| kind.as_str()).join(", "),
            })
    }
}

pub const PROCESS_NAME: &str = "Process Name";
pub const PROCESS_ID: &str = "Process ID";
pub const SERVING_COMPONENTS: &str = "Serving Components";
pub const APPLICATION_COMPONENT: &str = "Application Component";
pub const PROCESS_COUNT: &str = "Process Count";
pub const STATUS: &str = "Status";

/// 报表组装器
pub struct ReportAssembler {
    separator: String,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self {
            separator: ", ".to_string(),
        }
    }

    /// 多个组件名之间的分隔符
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    pub fn assemble(&self, kind: ReportKind, analysis: &AnalysisResult) -> export::Result<Table> {
        let mut table = Table::new(kind.title(), kind.columns().iter().copied())?;

        match kind {
            ReportKind::ServedProcesses => {
                let serving = analysis.process_to_components();
                for process in &analysis.served_processes {
                    table.push_row(row([
                        (PROCESS_NAME, Cell::from(process.name.as_str())),
                        (PROCESS_ID, Cell::from(process.id.as_str())),
                        (SERVING_COMPONENTS, self.join(serving.get(process))),
                    ]))?;
                }
            }
            ReportKind::UnservedProcesses => {
                for process in &analysis.unserved_processes {
                    table.push_row(row([
                        (PROCESS_NAME, Cell::from(process.name.as_str())),
                        (PROCESS_ID, Cell::from(process.id.as_str())),
                    ]))?;
                }
            }
            ReportKind::ComponentProcesses => {
                for (component, processes) in &analysis.component_to_processes {
                    let count = Cell::from(processes.len());
                    if processes.is_empty() {
                        // 没有服务流程的组件也保留一行
                        table.push_row(row([
                            (APPLICATION_COMPONENT, Cell::from(component.name.as_str())),
                            (PROCESS_NAME, Cell::from("")),
                            (PROCESS_COUNT, count),
                        ]))?;
                        continue;
                    }
                    for process in processes {
                        table.push_row(row([
                            (APPLICATION_COMPONENT, Cell::from(component.name.as_str())),
                            (PROCESS_NAME, Cell::from(process.name.as_str())),
                            (PROCESS_COUNT, count.clone()),
                        ]))?;
                    }
                }
            }
            ReportKind::Coverage => {
                let serving = analysis.process_to_components();
                let mut all: Vec<(&ElementRef, &str)> = analysis
                    .served_processes
                    .iter()
                    .map(|p| (p, "served"))
                    .chain(analysis.unserved_processes.iter().map(|p| (p, "unserved")))
                    .collect();
                all.sort();
                for (process, status) in all {
                    table.push_row(row([
                        (PROCESS_NAME, Cell::from(process.name.as_str())),
                        (STATUS, Cell::from(status)),
                        (SERVING_COMPONENTS, self.join(serving.get(process))),
                    ]))?;
                }
            }
        }

        tracing::debug!("Assembled {} report with {} rows", kind.as_str(), table.len());
        Ok(table)
    }

    fn join(&self, components: Option<&BTreeSet<&ElementRef>>) -> Cell {
        let names: Vec<&str> = components
            .into_iter()
            .flatten()
            .map(|c| c.name.as_str())
            .collect();
        Cell::from(names.join(&self.separator))
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn row<const N: usize>(cells: [(&str, Cell); N]) -> Row {
    cells
        .into_iter()
        .map(|(column, cell)| (column.to_string(), cell))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn r(id: &str, name: &str) -> ElementRef {
        ElementRef::new(id, name)
    }

    fn sample() -> AnalysisResult {
        let order = r("P1", "Order Processing");
        let invoice = r("P2", "Invoice Generation");
        let review = r("P3", "Manual Review");

        let mut component_to_processes = BTreeMap::new();
        component_to_processes.insert(
            r("C1", "Order System"),
            BTreeSet::from([order.clone(), invoice.clone()]),
        );
        component_to_processes.insert(r("C2", "Billing System"), BTreeSet::from([invoice.clone()]));
        component_to_processes.insert(r("C3", "Legacy"), BTreeSet::new());

        AnalysisResult {
            served_processes: BTreeSet::from([order, invoice]),
            unserved_processes: BTreeSet::from([review]),
            component_to_processes,
        }
    }

    fn text(table: &Table, row: usize, column: &str) -> String {
        table.cell(row, column).map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_report_kind_from_str() {
        assert_eq!("coverage".parse::<ReportKind>().ok(), Some(ReportKind::Coverage));
        assert_eq!(
            "Served-Processes".parse::<ReportKind>().ok(),
            Some(ReportKind::ServedProcesses)
        );
        match "bogus".parse::<ReportKind>() {
            Err(ArchError::UnknownReport { report, available }) => {
                assert_eq!(report, "bogus");
                assert!(available.contains("unserved-processes"));
            }
            other => panic!("expected unknown report, got {other:?}"),
        }
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn test_served_report() {
        let table = ReportAssembler::new()
            .assemble(ReportKind::ServedProcesses, &sample())
            .unwrap();
        assert_eq!(table.title(), "Process Status Report: Served Business Processes");
        assert_eq!(table.len(), 2);
        // 按名称排序
        assert_eq!(text(&table, 0, PROCESS_NAME), "Invoice Generation");
        assert_eq!(text(&table, 0, SERVING_COMPONENTS), "Billing System, Order System");
        assert_eq!(text(&table, 1, PROCESS_NAME), "Order Processing");
        assert_eq!(text(&table, 1, SERVING_COMPONENTS), "Order System");
    }

    #[test]
    fn test_unserved_report() {
        let table = ReportAssembler::new()
            .assemble(ReportKind::UnservedProcesses, &sample())
            .unwrap();
        assert_eq!(table.columns(), &[PROCESS_NAME, PROCESS_ID]);
        assert_eq!(table.len(), 1);
        assert_eq!(text(&table, 0, PROCESS_NAME), "Manual Review");
        assert_eq!(text(&table, 0, PROCESS_ID), "P3");
    }

    #[test]
    fn test_component_report_keeps_empty_components() {
        let table = ReportAssembler::new()
            .assemble(ReportKind::ComponentProcesses, &sample())
            .unwrap();
        let rows: Vec<(String, String, String)> = (0..table.len())
            .map(|i| {
                (
                    text(&table, i, APPLICATION_COMPONENT),
                    text(&table, i, PROCESS_NAME),
                    text(&table, i, PROCESS_COUNT),
                )
            })
            .collect();
        let expected: Vec<(String, String, String)> = vec![
            ("Billing System".into(), "Invoice Generation".into(), "1".into()),
            ("Legacy".into(), "".into(), "0".into()),
            ("Order System".into(), "Invoice Generation".into(), "2".into()),
            ("Order System".into(), "Order Processing".into(), "2".into()),
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_coverage_report() {
        let table = ReportAssembler::new()
            .with_separator(" / ")
            .assemble(ReportKind::Coverage, &sample())
            .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(text(&table, 0, PROCESS_NAME), "Invoice Generation");
        assert_eq!(text(&table, 0, SERVING_COMPONENTS), "Billing System / Order System");
        assert_eq!(text(&table, 1, PROCESS_NAME), "Manual Review");
        assert_eq!(text(&table, 1, STATUS), "unserved");
        assert_eq!(text(&table, 1, SERVING_COMPONENTS), "");
        assert_eq!(text(&table, 2, STATUS), "served");
    }

    #[test]
    fn test_empty_analysis() {
        for kind in ReportKind::ALL {
            let table = ReportAssembler::new()
                .assemble(kind, &AnalysisResult::default())
                .unwrap();
            assert!(table.is_empty());
            assert_eq!(table.columns().len(), kind.columns().len());
        }
    }
}
