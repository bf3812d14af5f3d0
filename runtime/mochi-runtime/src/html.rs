//! `html` namespace over kuchikiki (html5ever + CSS selectors).
//!
//! A handle names a [`HtmlSelection`]: an ordered list of nodes plus the
//! base URI they were parsed under. Navigation returns new selections and
//! never modifies the one it started from.

use std::collections::HashSet;
use std::fmt;

use kuchikiki::traits::TendrilSink;
use kuchikiki::{Node, NodeRef, parse_html};
use mochi_obj_model::{Fault, Handle};
use url::Url;

use crate::error::HostError;
use crate::value::{HostArena, HostValue};

const ABS_PREFIX: &str = "abs:";

#[derive(Clone, Default)]
pub struct HtmlSelection {
    nodes: Vec<NodeRef>,
    base_uri: Option<Url>,
}

impl fmt::Debug for HtmlSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlSelection")
            .field("nodes", &self.nodes.len())
            .field("base_uri", &self.base_uri.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Nodes in first-seen order, each at most once.
#[derive(Default)]
struct UniqueNodes {
    seen: HashSet<*const Node>,
    nodes: Vec<NodeRef>,
}

impl UniqueNodes {
    fn push(&mut self, node: NodeRef) {
        if self.seen.insert(&*node as *const Node) {
            self.nodes.push(node);
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses markup as body content and returns the resulting top-level nodes,
/// detached and ready to be inserted elsewhere.
fn fragment_nodes(markup: &str) -> Vec<NodeRef> {
    let document = parse_html().one(markup);
    let Ok(body) = document.select_first("body") else {
        return Vec::new();
    };
    let children: Vec<NodeRef> = body.as_node().children().collect();
    for child in &children {
        child.detach();
    }
    children
}

impl HtmlSelection {
    pub fn new(nodes: Vec<NodeRef>, base_uri: Option<Url>) -> Self {
        Self { nodes, base_uri }
    }

    pub fn parse(markup: &str, base_uri: Option<Url>) -> Self {
        Self::new(vec![parse_html().one(markup)], base_uri)
    }

    /// Parses markup as a body fragment; the selection is the `body`
    /// element holding it.
    pub fn parse_fragment(markup: &str, base_uri: Option<Url>) -> Self {
        let document = parse_html().one(markup);
        let nodes = match document.select_first("body") {
            Ok(body) => vec![body.as_node().clone()],
            Err(()) => vec![document],
        };
        Self::new(nodes, base_uri)
    }

    fn derive(&self, nodes: Vec<NodeRef>) -> Self {
        Self::new(nodes, self.base_uri.clone())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    fn first_node(&self) -> Result<&NodeRef, Fault> {
        self.nodes
            .first()
            .ok_or_else(|| Fault::missing("selection is empty"))
    }

    pub fn select(&self, selector: &str) -> Result<Self, HostError> {
        let mut found = UniqueNodes::default();
        for node in &self.nodes {
            let matches = node
                .select(selector)
                .map_err(|()| HostError::Selector(selector.to_string()))?;
            for element in matches {
                found.push(element.as_node().clone());
            }
        }
        Ok(self.derive(found.nodes))
    }

    /// Value of `key` on the first node that has it, or an empty string.
    /// An `abs:` prefix resolves the value against the base URI.
    pub fn attr(&self, key: &str) -> String {
        if let Some(key) = key.strip_prefix(ABS_PREFIX) {
            return self.absolute_attr(key);
        }
        self.nodes
            .iter()
            .find_map(|node| {
                let element = node.as_element()?;
                let attributes = element.attributes.borrow();
                attributes.get(key).map(str::to_owned)
            })
            .unwrap_or_default()
    }

    fn absolute_attr(&self, key: &str) -> String {
        let raw = self.attr(key);
        if raw.is_empty() {
            return raw;
        }
        let resolved = match &self.base_uri {
            Some(base) => base.join(&raw),
            None => Url::parse(&raw),
        };
        resolved.map(String::from).unwrap_or_default()
    }

    pub fn set_attr(&self, key: &str, value: &str) {
        for node in &self.nodes {
            if let Some(element) = node.as_element() {
                element
                    .attributes
                    .borrow_mut()
                    .insert(key, value.to_string());
            }
        }
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.nodes.iter().any(|node| {
            node.as_element()
                .is_some_and(|element| element.attributes.borrow().contains(key))
        })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.nodes.iter().any(|node| {
            node.as_element().is_some_and(|element| {
                element
                    .attributes
                    .borrow()
                    .get("class")
                    .is_some_and(|classes| classes.split_whitespace().any(|name| name == class))
            })
        })
    }

    /// Inner markup of every node, one node per line.
    pub fn html(&self) -> String {
        self.nodes
            .iter()
            .map(|node| node.children().map(|child| child.to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn outer_html(&self) -> String {
        self.nodes
            .iter()
            .map(NodeRef::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn set_html(&self, markup: &str) {
        for node in &self.nodes {
            let old: Vec<NodeRef> = node.children().collect();
            for child in old {
                child.detach();
            }
            for child in fragment_nodes(markup) {
                node.append(child);
            }
        }
    }

    /// Replaces every node with the parsed markup. The selection keeps
    /// pointing at the detached originals.
    pub fn set_outer_html(&self, markup: &str) {
        for node in &self.nodes {
            if node.parent().is_none() {
                continue;
            }
            for replacement in fragment_nodes(markup) {
                node.insert_before(replacement);
            }
            node.detach();
        }
    }

    pub fn first(&self) -> Self {
        self.derive(self.nodes.first().cloned().into_iter().collect())
    }

    pub fn last(&self) -> Self {
        self.derive(self.nodes.last().cloned().into_iter().collect())
    }

    pub fn next(&self) -> Self {
        let mut found = UniqueNodes::default();
        for node in &self.nodes {
            let mut sibling = node.next_sibling();
            while let Some(candidate) = sibling {
                if candidate.as_element().is_some() {
                    found.push(candidate);
                    break;
                }
                sibling = candidate.next_sibling();
            }
        }
        self.derive(found.nodes)
    }

    pub fn previous(&self) -> Self {
        let mut found = UniqueNodes::default();
        for node in &self.nodes {
            let mut sibling = node.previous_sibling();
            while let Some(candidate) = sibling {
                if candidate.as_element().is_some() {
                    found.push(candidate);
                    break;
                }
                sibling = candidate.previous_sibling();
            }
        }
        self.derive(found.nodes)
    }

    pub fn parent(&self) -> Self {
        let mut found = UniqueNodes::default();
        for node in &self.nodes {
            if let Some(parent) = node.parent().filter(|parent| parent.as_element().is_some()) {
                found.push(parent);
            }
        }
        self.derive(found.nodes)
    }

    /// Text of all nodes with whitespace runs collapsed and trimmed.
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|node| normalize_whitespace(&node.text_contents()))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn untrimmed_text(&self) -> String {
        self.nodes.iter().map(NodeRef::text_contents).collect()
    }

    /// Text of direct text children only.
    pub fn own_text(&self) -> String {
        let raw: String = self
            .nodes
            .iter()
            .flat_map(|node| node.children())
            .filter_map(|child| child.as_text().map(|text| text.borrow().clone()))
            .collect();
        normalize_whitespace(&raw)
    }

    pub fn id(&self) -> Result<String, Fault> {
        self.first_node()?;
        Ok(self.first().attr("id"))
    }

    pub fn class_name(&self) -> Result<String, Fault> {
        self.first_node()?;
        Ok(self.first().attr("class"))
    }

    pub fn tag_name(&self) -> Result<String, Fault> {
        let node = self.first_node()?;
        Ok(match node.as_element() {
            Some(element) => element.name.local.to_string(),
            None if node.as_document().is_some() => "#document".to_string(),
            None => "#text".to_string(),
        })
    }

    /// One single-node selection per node.
    pub fn split(&self) -> Vec<HtmlSelection> {
        self.nodes
            .iter()
            .map(|node| self.derive(vec![node.clone()]))
            .collect()
    }
}

pub fn escape(text: &str) -> String {
    NodeRef::new_text(text).to_string()
}

/// Decodes character references. The text is parsed as RCDATA so markup in
/// it stays literal; `<` is pre-escaped so no end tag can close it early.
pub fn unescape(text: &str) -> String {
    // The parser drops one newline directly after `<textarea>`.
    let guarded = text.replace('<', "&lt;");
    let document = parse_html().one(format!("<textarea>\n{guarded}</textarea>"));
    document
        .select_first("textarea")
        .map(|area| area.as_node().text_contents())
        .unwrap_or_default()
}

fn selection(arena: &HostArena, handle: Handle) -> Result<HtmlSelection, HostError> {
    Ok(arena.with(handle, |value| value.expect_html().cloned())??)
}

fn add_selection(arena: &HostArena, selection: HtmlSelection) -> Handle {
    arena.add(HostValue::Html(selection))
}

fn add_string(arena: &HostArena, text: String) -> Handle {
    arena.add(HostValue::String(text))
}

fn base(base_uri: Option<&str>) -> Option<Url> {
    base_uri.and_then(|raw| Url::parse(raw).ok())
}

pub fn parse(arena: &HostArena, markup: &str, base_uri: Option<&str>) -> Handle {
    add_selection(arena, HtmlSelection::parse(markup, base(base_uri)))
}

pub fn parse_fragment(arena: &HostArena, markup: &str, base_uri: Option<&str>) -> Handle {
    add_selection(arena, HtmlSelection::parse_fragment(markup, base(base_uri)))
}

pub fn select(arena: &HostArena, handle: Handle, selector: &str) -> Result<Handle, HostError> {
    let found = selection(arena, handle)?.select(selector)?;
    Ok(add_selection(arena, found))
}

pub fn attr(arena: &HostArena, handle: Handle, key: &str) -> Result<Handle, HostError> {
    let value = selection(arena, handle)?.attr(key);
    Ok(add_string(arena, value))
}

pub fn set_attr(arena: &HostArena, handle: Handle, key: &str, value: &str) -> Result<(), HostError> {
    selection(arena, handle)?.set_attr(key, value);
    Ok(())
}

pub fn html(arena: &HostArena, handle: Handle) -> Result<Handle, HostError> {
    let markup = selection(arena, handle)?.html();
    Ok(add_string(arena, markup))
}

pub fn set_html(arena: &HostArena, handle: Handle, markup: &str) -> Result<(), HostError> {
    selection(arena, handle)?.set_html(markup);
    Ok(())
}

pub fn outer_html(arena: &HostArena, handle: Handle) -> Result<Handle, HostError> {
    let markup = selection(arena, handle)?.outer_html();
    Ok(add_string(arena, markup))
}

pub fn set_outer_html(arena: &HostArena, handle: Handle, markup: &str) -> Result<(), HostError> {
    selection(arena, handle)?.set_outer_html(markup);
    Ok(())
}

/// Navigation ops that map one selection to another.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    First,
    Last,
    Next,
    Previous,
    Parent,
}

pub fn navigate(arena: &HostArena, handle: Handle, step: Step) -> Result<Handle, HostError> {
    let current = selection(arena, handle)?;
    let next = match step {
        Step::First => current.first(),
        Step::Last => current.last(),
        Step::Next => current.next(),
        Step::Previous => current.previous(),
        Step::Parent => current.parent(),
    };
    Ok(add_selection(arena, next))
}

/// Text ops that produce a string.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextOp {
    Text,
    UntrimmedText,
    OwnText,
    Id,
    TagName,
    ClassName,
}

pub fn text(arena: &HostArena, handle: Handle, op: TextOp) -> Result<Handle, HostError> {
    let current = selection(arena, handle)?;
    let text = match op {
        TextOp::Text => current.text(),
        TextOp::UntrimmedText => current.untrimmed_text(),
        TextOp::OwnText => current.own_text(),
        TextOp::Id => current.id()?,
        TextOp::TagName => current.tag_name()?,
        TextOp::ClassName => current.class_name()?,
    };
    Ok(add_string(arena, text))
}

pub fn has_class(arena: &HostArena, handle: Handle, class: &str) -> Result<i32, HostError> {
    Ok(i32::from(selection(arena, handle)?.has_class(class)))
}

pub fn has_attr(arena: &HostArena, handle: Handle, key: &str) -> Result<i32, HostError> {
    Ok(i32::from(selection(arena, handle)?.has_attr(key)))
}

pub fn size(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    let len = selection(arena, handle)?.len();
    Ok(i32::try_from(len).unwrap_or(i32::MAX))
}

pub fn array(arena: &HostArena, handle: Handle) -> Result<Handle, HostError> {
    let items = selection(arena, handle)?
        .split()
        .into_iter()
        .map(HostValue::Html)
        .collect();
    Ok(arena.add(HostValue::Array(items)))
}
