//! 模型图 - 只读索引，建一次、查多次

use crate::error::{ModelError, Result};
use crate::types::{
    Element, ElementHandle, ElementType, Relationship, RelationshipHandle, RelationshipKind,
};
use std::collections::{BTreeMap, HashMap};

/// 模型图
///
/// 元素和关系按文档顺序存放在数组中，句柄即下标。
/// 构建时校验 id 唯一和关系端点可解析，之后不可变。
#[derive(Debug)]
pub struct ModelGraph {
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    /// element id -> handle
    by_id: HashMap<String, ElementHandle>,
    by_type: HashMap<ElementType, Vec<ElementHandle>>,
    by_kind: HashMap<RelationshipKind, Vec<RelationshipHandle>>,
    /// relationship handle -> (source, target)
    endpoints: Vec<(ElementHandle, ElementHandle)>,
    outgoing: Vec<Vec<RelationshipHandle>>,
    incoming: Vec<Vec<RelationshipHandle>>,
}

/// 图统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStats {
    pub elements: usize,
    pub relationships: usize,
    pub elements_by_type: BTreeMap<String, usize>,
}

impl ModelGraph {
    /// 建图并校验完整性
    pub fn build(elements: Vec<Element>, relationships: Vec<Relationship>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(elements.len());
        let mut by_type: HashMap<ElementType, Vec<ElementHandle>> = HashMap::new();

        for (idx, element) in elements.iter().enumerate() {
            let handle = ElementHandle(idx as u32);
            if by_id.insert(element.id.clone(), handle).is_some() {
                return Err(ModelError::Integrity(format!(
                    "duplicate element id `{}`",
                    element.id
                )));
            }
            by_type
                .entry(element.element_type.clone())
                .or_default()
                .push(handle);
        }

        let mut by_kind: HashMap<RelationshipKind, Vec<RelationshipHandle>> = HashMap::new();
        let mut endpoints = Vec::with_capacity(relationships.len());
        let mut outgoing = vec![Vec::new(); elements.len()];
        let mut incoming = vec![Vec::new(); elements.len()];
        let mut rel_ids = std::collections::HashSet::with_capacity(relationships.len());

        for (idx, rel) in relationships.iter().enumerate() {
            let handle = RelationshipHandle(idx as u32);
            if !rel_ids.insert(rel.id.clone()) {
                return Err(ModelError::Integrity(format!(
                    "duplicate relationship id `{}`",
                    rel.id
                )));
            }

            let source = *by_id.get(&rel.source).ok_or_else(|| dangling(rel, &rel.source))?;
            let target = *by_id.get(&rel.target).ok_or_else(|| dangling(rel, &rel.target))?;

            endpoints.push((source, target));
            outgoing[source.index()].push(handle);
            incoming[target.index()].push(handle);
            by_kind.entry(rel.kind.clone()).or_default().push(handle);
        }

        let graph = Self {
            elements,
            relationships,
            by_id,
            by_type,
            by_kind,
            endpoints,
            outgoing,
            incoming,
        };

        tracing::info!(
            "Model graph built: {} elements, {} relationships",
            graph.elements.len(),
            graph.relationships.len()
        );

        Ok(graph)
    }

    /// 按 id 解析元素
    pub fn resolve(&self, element_id: &str) -> Result<&Element> {
        self.handle_of(element_id)
            .map(|h| self.element(h))
            .ok_or_else(|| ModelError::NotFound(element_id.to_string()))
    }

    pub fn handle_of(&self, element_id: &str) -> Option<ElementHandle> {
        self.by_id.get(element_id).copied()
    }

    /// 指定类型的所有元素 (文档顺序)
    pub fn elements_of_type(&self, element_type: &ElementType) -> Vec<&Element> {
        self.handles_of_type(element_type)
            .iter()
            .map(|h| self.element(*h))
            .collect()
    }

    /// 指定类型的所有关系 (文档顺序)
    pub fn relationships_of_kind(&self, kind: &RelationshipKind) -> Vec<&Relationship> {
        self.by_kind
            .get(kind)
            .map(|handles| handles.iter().map(|h| self.relationship(*h)).collect())
            .unwrap_or_default()
    }

    /// 以该元素为起点或终点的关系；自环只出现一次，未知 id 返回空
    pub fn relationships_touching(&self, element_id: &str) -> Vec<&Relationship> {
        let Some(handle) = self.handle_of(element_id) else {
            return Vec::new();
        };

        let mut handles: Vec<RelationshipHandle> = self
            .outgoing(handle)
            .iter()
            .chain(self.incoming(handle))
            .copied()
            .collect();
        handles.sort_unstable();
        handles.dedup();

        handles.into_iter().map(|h| self.relationship(h)).collect()
    }

    pub fn handles_of_type(&self, element_type: &ElementType) -> &[ElementHandle] {
        self.by_type
            .get(element_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn element(&self, handle: ElementHandle) -> &Element {
        &self.elements[handle.index()]
    }

    pub fn relationship(&self, handle: RelationshipHandle) -> &Relationship {
        &self.relationships[handle.index()]
    }

    pub fn source_of(&self, handle: RelationshipHandle) -> ElementHandle {
        self.endpoints[handle.index()].0
    }

    pub fn target_of(&self, handle: RelationshipHandle) -> ElementHandle {
        self.endpoints[handle.index()].1
    }

    /// 出边
    pub fn outgoing(&self, handle: ElementHandle) -> &[RelationshipHandle] {
        &self.outgoing[handle.index()]
    }

    /// 入边
    pub fn incoming(&self, handle: ElementHandle) -> &[RelationshipHandle] {
        &self.incoming[handle.index()]
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// 重新校验所有关系端点 (build 已保证，分析前再确认一次)
    pub fn check_integrity(&self) -> Result<()> {
        if self.endpoints.len() != self.relationships.len() {
            return Err(ModelError::Integrity(format!(
                "{} relationships but {} resolved endpoints",
                self.relationships.len(),
                self.endpoints.len()
            )));
        }

        for (rel, (source, target)) in self.relationships.iter().zip(&self.endpoints) {
            let resolved = self.elements.get(source.index()).map(|e| e.id.as_str())
                == Some(rel.source.as_str())
                && self.elements.get(target.index()).map(|e| e.id.as_str())
                    == Some(rel.target.as_str());
            if !resolved {
                return Err(ModelError::Integrity(format!(
                    "relationship `{}` endpoints do not resolve",
                    rel.id
                )));
            }
        }

        Ok(())
    }

    pub fn stats(&self) -> GraphStats {
        let elements_by_type = self
            .by_type
            .iter()
            .map(|(t, handles)| (t.to_string(), handles.len()))
            .collect();

        GraphStats {
            elements: self.elements.len(),
            relationships: self.relationships.len(),
            elements_by_type,
        }
    }
}

fn dangling(rel: &Relationship, endpoint: &str) -> ModelError {
    ModelError::Integrity(format!(
        "relationship `{}` references unknown element `{}`",
        rel.id, endpoint
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelGraph {
        let elements = vec![
            Element::new("P1", ElementType::BusinessProcess, "Order"),
            Element::new("S1", ElementType::ApplicationService, "Ordering"),
            Element::new("C1", ElementType::ApplicationComponent, "Shop"),
            Element::new("D1", ElementType::from_tag("DataObject"), "Order Data"),
        ];
        let relationships = vec![
            Relationship::new("R1", RelationshipKind::Serving, "S1", "P1"),
            Relationship::new("R2", RelationshipKind::Realization, "C1", "S1"),
            Relationship::new("R3", RelationshipKind::Access, "C1", "D1"),
        ];
        ModelGraph::build(elements, relationships).unwrap()
    }

    #[test]
    fn test_elements_of_type() {
        let graph = sample();
        let processes = graph.elements_of_type(&ElementType::BusinessProcess);
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].id, "P1");
        assert!(graph
            .elements_of_type(&ElementType::from_tag("Node"))
            .is_empty());
    }

    #[test]
    fn test_relationships_of_kind() {
        let graph = sample();
        let serving = graph.relationships_of_kind(&RelationshipKind::Serving);
        assert_eq!(serving.len(), 1);
        assert_eq!(serving[0].id, "R1");
        assert!(graph.relationships_of_kind(&RelationshipKind::Flow).is_empty());
    }

    #[test]
    fn test_relationships_touching() {
        let graph = sample();
        let ids: Vec<_> = graph
            .relationships_touching("C1")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["R2", "R3"]);

        let ids: Vec<_> = graph
            .relationships_touching("S1")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["R1", "R2"]);

        assert!(graph.relationships_touching("missing").is_empty());
    }

    #[test]
    fn test_self_loop_reported_once() {
        let graph = ModelGraph::build(
            vec![Element::new("P1", ElementType::BusinessProcess, "Loop")],
            vec![Relationship::new("R1", RelationshipKind::Triggering, "P1", "P1")],
        )
        .unwrap();
        assert_eq!(graph.relationships_touching("P1").len(), 1);
    }

    #[test]
    fn test_resolve() {
        let graph = sample();
        assert_eq!(graph.resolve("S1").unwrap().name, "Ordering");
        match graph.resolve("nope") {
            Err(ModelError::NotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let result = ModelGraph::build(
            vec![Element::new("P1", ElementType::BusinessProcess, "Order")],
            vec![Relationship::new("R1", RelationshipKind::Serving, "S9", "P1")],
        );
        match result {
            Err(ModelError::Integrity(msg)) => assert!(msg.contains("S9")),
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = ModelGraph::build(
            vec![
                Element::new("P1", ElementType::BusinessProcess, "A"),
                Element::new("P1", ElementType::BusinessProcess, "B"),
            ],
            vec![],
        );
        assert!(matches!(result, Err(ModelError::Integrity(_))));

        let result = ModelGraph::build(
            vec![
                Element::new("P1", ElementType::BusinessProcess, "A"),
                Element::new("S1", ElementType::ApplicationService, "B"),
            ],
            vec![
                Relationship::new("R1", RelationshipKind::Serving, "S1", "P1"),
                Relationship::new("R1", RelationshipKind::Flow, "S1", "P1"),
            ],
        );
        assert!(matches!(result, Err(ModelError::Integrity(_))));
    }

    #[test]
    fn test_handles_and_adjacency() {
        let graph = sample();
        let c1 = graph.handle_of("C1").unwrap();
        let out = graph.outgoing(c1);
        assert_eq!(out.len(), 2);
        assert_eq!(graph.element(graph.target_of(out[0])).id, "S1");
        assert_eq!(graph.source_of(out[0]), c1);
        assert!(graph.incoming(c1).is_empty());
    }

    #[test]
    fn test_check_integrity_and_stats() {
        let graph = sample();
        assert!(graph.check_integrity().is_ok());

        let stats = graph.stats();
        assert_eq!(stats.elements, 4);
        assert_eq!(stats.relationships, 3);
        assert_eq!(stats.elements_by_type.get("BusinessProcess"), Some(&1));
        assert_eq!(stats.elements_by_type.get("DataObject"), Some(&1));
    }
}
