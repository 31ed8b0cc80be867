use crate::config::AnalyzerConfig;
use archimate::{ElementHandle, ElementType, ModelError, ModelGraph, RelationshipKind};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unknown report `{report}` (available: {available})")]
    UnknownReport { report: String, available: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArchError>;

/// 元素引用 (id + 名称)，分析结果和报表之间传递的最小信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub id: String,
    pub name: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// 先按名称、再按 id 排序，报表输出即按名称排列
impl Ord for ElementRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for ElementRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 分析结果
///
/// `served_processes` 与 `unserved_processes` 划分全部业务流程；
/// 每个应用组件都出现在 `component_to_processes` 中，没有服务的组件对应空集合。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub served_processes: BTreeSet<ElementRef>,
    pub unserved_processes: BTreeSet<ElementRef>,
    pub component_to_processes: BTreeMap<ElementRef, BTreeSet<ElementRef>>,
}

impl AnalysisResult {
    /// 反查: 流程 -> 服务它的组件
    pub fn process_to_components(&self) -> BTreeMap<&ElementRef, BTreeSet<&ElementRef>> {
        let mut result: BTreeMap<&ElementRef, BTreeSet<&ElementRef>> = BTreeMap::new();
        for (component, processes) in &self.component_to_processes {
            for process in processes {
                result.entry(process).or_default().insert(component);
            }
        }
        result
    }

    pub fn is_served(&self, process_id: &str) -> bool {
        self.served_processes.iter().any(|p| p.id == process_id)
    }

    pub fn total_processes(&self) -> usize {
        self.served_processes.len() + self.unserved_processes.len()
    }
}

/// 关系分析器
///
/// 两遍构建映射：服务 -> 流程，组件 -> 服务；
/// 组件实现的服务所服务的流程即该组件服务的流程，闭合 组件 -> 服务 -> 流程 路径的流程为 served。
#[derive(Debug, Clone, Default)]
pub struct RelationshipAnalyzer {
    config: AnalyzerConfig,
}

impl RelationshipAnalyzer {
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn analyze(&self, graph: &ModelGraph) -> Result<AnalysisResult> {
        graph.check_integrity()?;

        let processes = graph.handles_of_type(&ElementType::BusinessProcess);
        let services = graph.handles_of_type(&ElementType::ApplicationService);
        let components = graph.handles_of_type(&ElementType::ApplicationComponent);

        // 第一遍: 服务 -> 流程
        let service_to_processes: HashMap<ElementHandle, BTreeSet<ElementHandle>> = services
            .iter()
            .map(|&service| {
                let targets = linked_targets(
                    graph,
                    service,
                    &self.config.service_link_kinds,
                    &ElementType::BusinessProcess,
                );
                (service, targets)
            })
            .collect();

        let linked: HashSet<ElementHandle> =
            service_to_processes.values().flatten().copied().collect();
        tracing::debug!(
            "{} services link to {} of {} processes",
            services.len(),
            linked.len(),
            processes.len()
        );

        // 第二遍: 组件 -> 服务 -> 流程
        let mut component_to_processes: Vec<(ElementHandle, BTreeSet<ElementHandle>)> =
            Vec::with_capacity(components.len());
        let mut served: HashSet<ElementHandle> = HashSet::new();

        for &component in components {
            let realized = linked_targets(
                graph,
                component,
                &self.config.realization_kinds,
                &ElementType::ApplicationService,
            );

            let mut reached: BTreeSet<ElementHandle> = realized
                .iter()
                .filter_map(|service| service_to_processes.get(service))
                .flatten()
                .copied()
                .collect();

            if self.config.direct_component_serving {
                reached.extend(linked_targets(
                    graph,
                    component,
                    &self.config.service_link_kinds,
                    &ElementType::BusinessProcess,
                ));
            }

            tracing::debug!(
                "Component {} realizes {} services, serves {} processes",
                graph.element(component).id,
                realized.len(),
                reached.len()
            );

            served.extend(reached.iter().copied());
            component_to_processes.push((component, reached));
        }

        let to_ref = |handle: ElementHandle| {
            let element = graph.element(handle);
            ElementRef::new(element.id.clone(), element.name.clone())
        };

        let mut result = AnalysisResult::default();
        for &process in processes {
            if served.contains(&process) {
                result.served_processes.insert(to_ref(process));
            } else {
                result.unserved_processes.insert(to_ref(process));
            }
        }
        for (component, reached) in component_to_processes {
            result
                .component_to_processes
                .insert(to_ref(component), reached.into_iter().map(to_ref).collect());
        }

        tracing::info!(
            "Analysis complete: {} served, {} unserved processes, {} components",
            result.served_processes.len(),
            result.unserved_processes.len(),
            result.component_to_processes.len()
        );

        Ok(result)
    }
}

/// 从 `from` 出发、类型在 `kinds` 中、终点类型为 `target_type` 的关系终点集合
fn linked_targets(
    graph: &ModelGraph,
    from: ElementHandle,
    kinds: &[RelationshipKind],
    target_type: &ElementType,
) -> BTreeSet<ElementHandle> {
    graph
        .outgoing(from)
        .iter()
        .filter(|&&rel| kinds.contains(&graph.relationship(rel).kind))
        .map(|&rel| graph.target_of(rel))
        .filter(|&target| graph.element(target).element_type == *target_type)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimate::{Element, Relationship};

    fn process(id: &str) -> Element {
        Element::new(id, ElementType::BusinessProcess, format!("Process {}", id))
    }

    fn service(id: &str) -> Element {
        Element::new(id, ElementType::ApplicationService, format!("Service {}", id))
    }

    fn component(id: &str) -> Element {
        Element::new(id, ElementType::ApplicationComponent, format!("Component {}", id))
    }

    fn rel(id: &str, kind: RelationshipKind, source: &str, target: &str) -> Relationship {
        Relationship::new(id, kind, source, target)
    }

    fn analyze(elements: Vec<Element>, relationships: Vec<Relationship>) -> AnalysisResult {
        let graph = ModelGraph::build(elements, relationships).unwrap();
        RelationshipAnalyzer::new().analyze(&graph).unwrap()
    }

    fn ids(set: &BTreeSet<ElementRef>) -> Vec<&str> {
        set.iter().map(|e| e.id.as_str()).collect()
    }

    fn processes_of<'a>(result: &'a AnalysisResult, component_id: &str) -> Option<Vec<&'a str>> {
        result
            .component_to_processes
            .iter()
            .find(|(c, _)| c.id == component_id)
            .map(|(_, p)| ids(p))
    }

    #[test]
    fn test_full_path_is_served() {
        let result = analyze(
            vec![process("P1"), service("S1"), component("C1")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Realization, "C1", "S1"),
            ],
        );
        assert_eq!(ids(&result.served_processes), vec!["P1"]);
        assert!(result.unserved_processes.is_empty());
        assert_eq!(processes_of(&result, "C1"), Some(vec!["P1"]));
    }

    #[test]
    fn test_service_without_component_is_unserved() {
        let result = analyze(
            vec![process("P2"), service("S2")],
            vec![rel("R1", RelationshipKind::Serving, "S2", "P2")],
        );
        assert!(result.served_processes.is_empty());
        assert_eq!(ids(&result.unserved_processes), vec!["P2"]);
    }

    #[test]
    fn test_process_without_serving_is_unserved() {
        let result = analyze(
            vec![process("P1"), process("P3"), service("S1"), component("C1")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Assignment, "C1", "S1"),
                rel("R3", RelationshipKind::Flow, "P1", "P3"),
            ],
        );
        assert_eq!(ids(&result.served_processes), vec!["P1"]);
        assert_eq!(ids(&result.unserved_processes), vec!["P3"]);
    }

    #[test]
    fn test_component_dedupes_processes() {
        let result = analyze(
            vec![process("P4"), service("S3"), service("S4"), component("C2")],
            vec![
                rel("R1", RelationshipKind::Serving, "S3", "P4"),
                rel("R2", RelationshipKind::Serving, "S4", "P4"),
                rel("R3", RelationshipKind::Realization, "C2", "S3"),
                rel("R4", RelationshipKind::Assignment, "C2", "S4"),
            ],
        );
        assert_eq!(processes_of(&result, "C2"), Some(vec!["P4"]));
        assert_eq!(result.served_processes.len(), 1);
    }

    #[test]
    fn test_redundant_edges_do_not_double_count() {
        let result = analyze(
            vec![process("P1"), service("S1"), component("C1")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Serving, "S1", "P1"),
                rel("R3", RelationshipKind::Realization, "C1", "S1"),
                rel("R4", RelationshipKind::Realization, "C1", "S1"),
            ],
        );
        assert_eq!(result.served_processes.len(), 1);
        assert_eq!(processes_of(&result, "C1"), Some(vec!["P1"]));
    }

    #[test]
    fn test_component_without_services_maps_to_empty_set() {
        let result = analyze(
            vec![process("P1"), component("C1"), component("C2"), service("S1")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Realization, "C1", "S1"),
            ],
        );
        assert_eq!(processes_of(&result, "C2"), Some(vec![]));
        assert_eq!(result.component_to_processes.len(), 2);
    }

    #[test]
    fn test_process_shared_by_components() {
        let result = analyze(
            vec![process("P1"), service("S1"), service("S2"), component("C1"), component("C2")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Serving, "S2", "P1"),
                rel("R3", RelationshipKind::Realization, "C1", "S1"),
                rel("R4", RelationshipKind::Realization, "C2", "S2"),
            ],
        );
        assert_eq!(processes_of(&result, "C1"), Some(vec!["P1"]));
        assert_eq!(processes_of(&result, "C2"), Some(vec!["P1"]));
        assert_eq!(result.served_processes.len(), 1);

        let inverse = result.process_to_components();
        let p1 = result.served_processes.iter().next().unwrap();
        assert_eq!(inverse[p1].len(), 2);
    }

    #[test]
    fn test_mixed_services_served_if_any_path_closes() {
        let result = analyze(
            vec![process("P1"), service("S1"), service("S2"), component("C1")],
            vec![
                rel("R1", RelationshipKind::Serving, "S1", "P1"),
                rel("R2", RelationshipKind::Serving, "S2", "P1"),
                rel("R3", RelationshipKind::Realization, "C1", "S1"),
            ],
        );
        assert!(result.is_served("P1"));
    }

    #[test]
    fn test_wrong_direction_and_kind_ignored() {
        let result = analyze(
            vec![process("P1"), service("S1"), component("C1")],
            vec![
                // 方向相反
                rel("R1", RelationshipKind::Serving, "P1", "S1"),
                rel("R2", RelationshipKind::Realization, "S1", "C1"),
                // 类型不在角色映射中
                rel("R3", RelationshipKind::Association, "C1", "S1"),
            ],
        );
        assert!(result.served_processes.is_empty());
        assert_eq!(processes_of(&result, "C1"), Some(vec![]));
    }

    #[test]
    fn test_direct_component_serving_is_opt_in() {
        let elements = vec![process("P1"), component("C1")];
        let relationships = vec![rel("R1", RelationshipKind::Serving, "C1", "P1")];
        let graph = ModelGraph::build(elements, relationships).unwrap();

        let strict = RelationshipAnalyzer::new().analyze(&graph).unwrap();
        assert!(!strict.is_served("P1"));

        let config = AnalyzerConfig::default().with_direct_component_serving(true);
        let direct = RelationshipAnalyzer::new()
            .with_config(config)
            .analyze(&graph)
            .unwrap();
        assert!(direct.is_served("P1"));
        assert_eq!(processes_of(&direct, "C1"), Some(vec!["P1"]));
    }

    #[test]
    fn test_unknown_types_ignored() {
        let result = analyze(
            vec![
                process("P1"),
                Element::new("N1", ElementType::from_tag("Node"), "Server"),
                Element::new("F1", ElementType::from_tag("ApplicationFunction"), "Fn"),
            ],
            vec![
                rel("R1", RelationshipKind::Serving, "N1", "P1"),
                rel("R2", RelationshipKind::Serving, "F1", "P1"),
            ],
        );
        assert_eq!(ids(&result.unserved_processes), vec!["P1"]);
        assert!(result.component_to_processes.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let result = analyze(vec![], vec![]);
        assert_eq!(result, AnalysisResult::default());
        assert_eq!(result.total_processes(), 0);
    }

    #[test]
    fn test_element_ref_orders_by_name_then_id() {
        let a = ElementRef::new("2", "Alpha");
        let b = ElementRef::new("1", "Beta");
        let a2 = ElementRef::new("3", "Alpha");
        let mut refs = vec![b.clone(), a2.clone(), a.clone()];
        refs.sort();
        assert_eq!(refs, vec![a, a2, b]);
    }
}
