//! XML 加载器 - Archimate exchange format -> ModelGraph

use crate::error::{ModelError, Result};
use crate::graph::ModelGraph;
use crate::types::{Element, ElementType, Relationship, RelationshipKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashSet;
use std::path::Path;

/// 模型加载器
///
/// 默认 fail-fast：任何缺少必需属性的节点都会中止加载。
/// 宽松模式下跳过这类节点并记录警告，XML 合法性和引用完整性检查不受影响。
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    lenient: bool,
}

/// 已解析但尚未建图的节点
#[derive(Debug, Default)]
pub struct ParsedModel {
    pub elements: Vec<Element>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug)]
struct PendingElement {
    id: Option<String>,
    tag: Option<String>,
    name: Option<String>,
    line: usize,
    depth: usize,
}

#[derive(Debug)]
struct PendingRelationship {
    id: Option<String>,
    tag: Option<String>,
    source: Option<String>,
    target: Option<String>,
    name: Option<String>,
    line: usize,
    depth: usize,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self { lenient: false }
    }

    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// 从文件加载并建图
    pub fn load_file(&self, path: &Path) -> Result<ModelGraph> {
        let xml = std::fs::read_to_string(path)?;
        tracing::info!("Loading model from {}", path.display());
        self.load_str(&xml)
    }

    /// 解析 XML 并建图
    pub fn load_str(&self, xml: &str) -> Result<ModelGraph> {
        let parsed = self.parse_str(xml)?;
        ModelGraph::build(parsed.elements, parsed.relationships)
    }

    /// 仅做结构提取，不检查引用完整性
    pub fn parse_str(&self, xml: &str) -> Result<ParsedModel> {
        let mut reader = Reader::from_str(xml);
        let lines = LineIndex::new(xml);

        let mut model = ParsedModel::default();
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut seen_root = false;
        let mut root_closed = false;
        // 宽松模式下被跳过的元素 id
        let mut skipped: HashSet<String> = HashSet::new();

        let mut element: Option<PendingElement> = None;
        let mut relationship: Option<PendingRelationship> = None;
        // 正在读取的 <name> 文本
        let mut name_buf: Option<String> = None;

        loop {
            let offset = reader.buffer_position() as usize;
            let event = reader
                .read_event()
                .map_err(|e| parse_error(&lines, reader.error_position() as usize, e))?;

            match event {
                Event::Start(e) => {
                    if root_closed {
                        return Err(misplaced(&lines, offset, "second root element"));
                    }
                    seen_root = true;
                    let local = e.local_name().as_ref().to_vec();
                    let parent = stack.last().map(|p| p.as_slice());
                    let depth = stack.len();

                    match (local.as_slice(), parent) {
                        (b"element", Some(b"elements")) => {
                            element = Some(read_element(&lines, &reader, &e, offset, depth)?);
                        }
                        (b"relationship", Some(b"relationships")) => {
                            relationship = Some(read_relationship(&lines, &reader, &e, offset, depth)?);
                        }
                        (b"name", _) => {
                            let owner_depth = element
                                .as_ref()
                                .filter(|p| p.name.is_none())
                                .map(|p| p.depth)
                                .or_else(|| {
                                    relationship
                                        .as_ref()
                                        .filter(|p| p.name.is_none())
                                        .map(|p| p.depth)
                                });
                            if owner_depth == Some(depth.wrapping_sub(1)) {
                                name_buf = Some(String::new());
                            }
                        }
                        _ => {}
                    }
                    stack.push(local);
                }
                Event::Empty(e) => {
                    if root_closed {
                        return Err(misplaced(&lines, offset, "second root element"));
                    }
                    if stack.is_empty() {
                        // 自闭合的根元素
                        root_closed = true;
                    }
                    seen_root = true;
                    let local = e.local_name();
                    let parent = stack.last().map(|p| p.as_slice());
                    let depth = stack.len();

                    match (local.as_ref(), parent) {
                        (b"element", Some(b"elements")) => {
                            let pending = read_element(&lines, &reader, &e, offset, depth)?;
                            self.finish_element(pending, &mut model, &mut skipped)?;
                        }
                        (b"relationship", Some(b"relationships")) => {
                            let pending = read_relationship(&lines, &reader, &e, offset, depth)?;
                            self.finish_relationship(pending, &mut model)?;
                        }
                        (b"name", _) => {
                            // <name/> 视为空名称
                            if let Some(p) = element.as_mut().filter(|p| p.depth + 1 == depth) {
                                p.name.get_or_insert_with(String::new);
                            } else if let Some(p) =
                                relationship.as_mut().filter(|p| p.depth + 1 == depth)
                            {
                                p.name.get_or_insert_with(String::new);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    if stack.is_empty() && !t.iter().all(u8::is_ascii_whitespace) {
                        return Err(misplaced(&lines, offset, "text outside the root element"));
                    }
                    if let Some(buf) = name_buf.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| parse_error(&lines, offset, e))?;
                        buf.push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if stack.is_empty() {
                        return Err(misplaced(&lines, offset, "CDATA outside the root element"));
                    }
                    if let Some(buf) = name_buf.as_mut() {
                        buf.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Event::End(e) => {
                    stack.pop();
                    let depth = stack.len();
                    if depth == 0 {
                        root_closed = true;
                    }

                    match e.local_name().as_ref() {
                        b"name" => {
                            if let Some(text) = name_buf.take() {
                                if let Some(p) = element.as_mut().filter(|p| p.depth + 1 == depth) {
                                    p.name = Some(text);
                                } else if let Some(p) =
                                    relationship.as_mut().filter(|p| p.depth + 1 == depth)
                                {
                                    p.name = Some(text);
                                }
                            }
                        }
                        b"element" if element.as_ref().is_some_and(|p| p.depth == depth) => {
                            if let Some(pending) = element.take() {
                                self.finish_element(pending, &mut model, &mut skipped)?;
                            }
                        }
                        b"relationship"
                            if relationship.as_ref().is_some_and(|p| p.depth == depth) =>
                        {
                            if let Some(pending) = relationship.take() {
                                self.finish_relationship(pending, &mut model)?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => {
                    if let Some(open) = stack.last() {
                        let (line, column) = lines.locate(xml.len());
                        return Err(ModelError::Parse {
                            line,
                            column,
                            message: format!(
                                "unexpected end of document, <{}> is not closed",
                                String::from_utf8_lossy(open)
                            ),
                        });
                    }
                    if !seen_root {
                        return Err(ModelError::Parse {
                            line: 1,
                            column: 1,
                            message: "document has no root element".to_string(),
                        });
                    }
                    break;
                }
                _ => {}
            }
        }

        if !skipped.is_empty() {
            model.relationships.retain(|rel| {
                let dangling = skipped.iter().any(|id| rel.touches(id));
                if dangling {
                    tracing::warn!(
                        "Skipping relationship {}: endpoint {} -> {} was skipped",
                        rel.id,
                        rel.source,
                        rel.target
                    );
                }
                !dangling
            });
        }

        tracing::debug!(
            "Parsed {} elements, {} relationships",
            model.elements.len(),
            model.relationships.len()
        );

        Ok(model)
    }

    fn finish_element(
        &self,
        pending: PendingElement,
        model: &mut ParsedModel,
        skipped: &mut HashSet<String>,
    ) -> Result<()> {
        let missing = if pending.id.is_none() {
            Some("identifier")
        } else if pending.tag.is_none() {
            Some("xsi:type")
        } else if pending.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            Some("name")
        } else {
            None
        };

        match (missing, pending) {
            (
                None,
                PendingElement {
                    id: Some(id),
                    tag: Some(tag),
                    name: Some(name),
                    ..
                },
            ) => {
                model
                    .elements
                    .push(Element::new(id, ElementType::from_tag(&tag), name.trim()));
                Ok(())
            }
            (attribute, pending) => {
                let id = pending.id.clone();
                self.reject(ModelError::Schema {
                    node: "element",
                    id: pending.id,
                    line: pending.line,
                    attribute: attribute.unwrap_or("name"),
                })?;
                skipped.extend(id);
                Ok(())
            }
        }
    }

    fn finish_relationship(
        &self,
        pending: PendingRelationship,
        model: &mut ParsedModel,
    ) -> Result<()> {
        match pending {
            PendingRelationship {
                id: Some(id),
                tag: Some(tag),
                source: Some(source),
                target: Some(target),
                name,
                ..
            } => {
                let mut rel = Relationship::new(id, RelationshipKind::from_tag(&tag), source, target);
                rel.name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
                model.relationships.push(rel);
                Ok(())
            }
            pending => {
                let attribute = if pending.id.is_none() {
                    "identifier"
                } else if pending.tag.is_none() {
                    "xsi:type"
                } else if pending.source.is_none() {
                    "source"
                } else {
                    "target"
                };
                self.reject(ModelError::Schema {
                    node: "relationship",
                    id: pending.id,
                    line: pending.line,
                    attribute,
                })
            }
        }
    }

    fn reject(&self, err: ModelError) -> Result<()> {
        if self.lenient {
            tracing::warn!("Skipping node: {}", err);
            Ok(())
        } else {
            Err(err)
        }
    }
}

fn read_element(
    lines: &LineIndex<'_>,
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    offset: usize,
    depth: usize,
) -> Result<PendingElement> {
    let mut pending = PendingElement {
        id: None,
        tag: None,
        name: None,
        line: lines.locate(offset).0,
        depth,
    };
    for (key, value) in attributes(lines, reader, start)? {
        match key.as_str() {
            "identifier" => pending.id = Some(value),
            "type" => pending.tag = Some(value),
            _ => {}
        }
    }
    Ok(pending)
}

fn read_relationship(
    lines: &LineIndex<'_>,
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    offset: usize,
    depth: usize,
) -> Result<PendingRelationship> {
    let mut pending = PendingRelationship {
        id: None,
        tag: None,
        source: None,
        target: None,
        name: None,
        line: lines.locate(offset).0,
        depth,
    };
    for (key, value) in attributes(lines, reader, start)? {
        match key.as_str() {
            "identifier" => pending.id = Some(value),
            "type" => pending.tag = Some(value),
            "source" => pending.source = Some(value),
            "target" => pending.target = Some(value),
            _ => {}
        }
    }
    Ok(pending)
}

/// 读取属性 (按本地名)，空值视为缺失
fn attributes(
    lines: &LineIndex<'_>,
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Vec<(String, String)>> {
    let mut result = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(lines, reader.buffer_position() as usize, e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| parse_error(lines, reader.buffer_position() as usize, e))?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        result.push((key, value.to_string()));
    }
    Ok(result)
}

fn misplaced(lines: &LineIndex<'_>, offset: usize, what: &str) -> ModelError {
    let (line, column) = lines.locate(offset);
    ModelError::Parse {
        line,
        column,
        message: format!("{} is not allowed", what),
    }
}

fn parse_error(lines: &LineIndex<'_>, offset: usize, err: impl std::fmt::Display) -> ModelError {
    let (line, column) = lines.locate(offset);
    ModelError::Parse {
        line,
        column,
        message: err.to_string(),
    }
}

/// 换行符索引，用于把字节偏移换算成行列
pub(crate) struct LineIndex<'a> {
    src: &'a str,
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(src: &'a str) -> Self {
        let newlines = src
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self { src, newlines }
    }

    /// 字节偏移 -> (行, 列)，均从 1 开始
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let mut end = offset.min(self.src.len());
        while !self.src.is_char_boundary(end) {
            end -= 1;
        }
        let line_idx = self.newlines.partition_point(|&nl| nl < end);
        let line_start = if line_idx == 0 { 0 } else { self.newlines[line_idx - 1] + 1 };
        let column = self.src[line_start..end].chars().count() + 1;
        (line_idx + 1, column)
    }
}
