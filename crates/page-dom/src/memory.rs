//! In-memory document implementing [`PageDom`].
//!
//! Built from HTML with `scraper`, then held as a mutable arena. Every dispatched event is
//! recorded so callers can assert on the exact sequence a fill produced. Framework overlays
//! (options rendered some time after a trigger click) are simulated with [`MemoryPage::bind_overlay`];
//! pending renders materialise lazily against the tokio clock, so paused-time tests drive them
//! deterministically.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use scraper::Html;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::DomError;
use crate::node::{EventKind, NodeId, Notification, Scope, SelectOption};
use crate::page::PageDom;
use crate::selector::{Selector, SelectorTarget};

const ROOT: usize = 0;

#[derive(Debug)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    value: Option<String>,
    checked: bool,
    detached: bool,
}

#[derive(Debug)]
struct OverlayBinding {
    trigger: usize,
    delay: Duration,
    options: Vec<String>,
}

#[derive(Debug)]
struct PendingRender {
    trigger: usize,
    due: Instant,
}

#[derive(Debug)]
struct OpenOverlay {
    trigger: usize,
    container: usize,
}

#[derive(Debug, Default)]
struct Document {
    nodes: Vec<Node>,
    bindings: Vec<OverlayBinding>,
    pending: Vec<PendingRender>,
    open: Vec<OpenOverlay>,
    events: Vec<(NodeId, EventKind)>,
    notification: Option<Notification>,
    rejected_writes: Vec<usize>,
}

impl Document {
    fn new() -> Self {
        let mut doc = Document::default();
        doc.nodes.push(Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
            value: None,
            checked: false,
            detached: false,
        });
        doc
    }

    fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Document::new();
        let mut index = HashMap::new();
        for node in html.tree.root().descendants() {
            let kind = match node.value() {
                scraper::Node::Document => {
                    index.insert(node.id(), ROOT);
                    continue;
                }
                scraper::Node::Element(element) => NodeKind::Element {
                    tag: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                        .collect(),
                },
                scraper::Node::Text(text) => NodeKind::Text((**text).to_owned()),
                _ => continue,
            };
            let Some(parent) = node.parent().and_then(|p| index.get(&p.id()).copied()) else {
                continue;
            };
            let idx = doc.append(parent, kind);
            index.insert(node.id(), idx);
        }
        doc
    }

    fn append(&mut self, parent: usize, kind: NodeKind) -> usize {
        let checked = matches!(&kind, NodeKind::Element { attrs, .. }
            if attrs.iter().any(|(name, _)| name == "checked"));
        let idx = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            value: None,
            checked,
            detached: false,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    fn append_element(&mut self, parent: usize, tag: &str, attrs: &[(&str, &str)]) -> usize {
        self.append(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attrs: attrs
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            },
        )
    }

    fn live(&self, node: NodeId) -> Result<usize, DomError> {
        let idx = node.0 as usize;
        match self.nodes.get(idx) {
            Some(entry) if !entry.detached && idx != ROOT => Ok(idx),
            _ => Err(DomError::Detached(node)),
        }
    }

    fn tag(&self, idx: usize) -> Option<&str> {
        match &self.nodes[idx].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn attr(&self, idx: usize, name: &str) -> Option<&str> {
        match &self.nodes[idx].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    fn parent_element_of(&self, idx: usize) -> Option<usize> {
        self.nodes[idx]
            .parent
            .filter(|parent| self.tag(*parent).is_some())
    }

    fn body(&self) -> Option<usize> {
        self.preorder(ROOT)
            .into_iter()
            .find(|idx| self.tag(*idx) == Some("body"))
    }

    /// Descendants of `root` in document order, excluding `root`.
    fn preorder(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    fn text_of(&self, idx: usize) -> String {
        if let NodeKind::Text(text) = &self.nodes[idx].kind {
            return text.clone();
        }
        self.preorder(idx)
            .into_iter()
            .filter_map(|child| match &self.nodes[child].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn option_entries(&self, select: usize) -> Vec<(usize, SelectOption)> {
        self.preorder(select)
            .into_iter()
            .filter(|idx| self.tag(*idx) == Some("option"))
            .map(|idx| {
                let text = collapse_whitespace(&self.text_of(idx));
                let value = self
                    .attr(idx, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| text.clone());
                (idx, SelectOption { text, value })
            })
            .collect()
    }

    fn value_of(&self, idx: usize) -> String {
        if let Some(value) = &self.nodes[idx].value {
            return value.clone();
        }
        match self.tag(idx) {
            Some("select") => {
                let entries = self.option_entries(idx);
                entries
                    .iter()
                    .find(|(option, _)| self.attr(*option, "selected").is_some())
                    .or_else(|| entries.first())
                    .map(|(_, option)| option.value.clone())
                    .unwrap_or_default()
            }
            Some("textarea") => self.text_of(idx),
            _ => self.attr(idx, "value").unwrap_or_default().to_string(),
        }
    }

    fn input_type_of(&self, idx: usize) -> String {
        match self.tag(idx) {
            Some("input") => self
                .attr(idx, "type")
                .map(|raw| raw.trim().to_ascii_lowercase())
                .filter(|raw| !raw.is_empty())
                .unwrap_or_else(|| "text".to_string()),
            Some("select") if self.attr(idx, "multiple").is_some() => {
                "select-multiple".to_string()
            }
            Some("select") => "select-one".to_string(),
            Some(tag) => tag.to_string(),
            None => String::new(),
        }
    }

    fn set_checked(&mut self, idx: usize, checked: bool) {
        self.nodes[idx].checked = checked;
        if !checked || self.input_type_of(idx) != "radio" {
            return;
        }
        let Some(name) = self.attr(idx, "name").map(str::to_string) else {
            return;
        };
        for other in self.preorder(ROOT) {
            if other != idx
                && !self.nodes[other].detached
                && self.tag(other) == Some("input")
                && self.attr(other, "name") == Some(name.as_str())
                && self.input_type_of(other) == "radio"
            {
                self.nodes[other].checked = false;
            }
        }
    }

    fn detach(&mut self, idx: usize) {
        if let Some(parent) = self.nodes[idx].parent {
            self.nodes[parent].children.retain(|child| *child != idx);
        }
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            self.nodes[current].detached = true;
            stack.extend(self.nodes[current].children.iter().copied());
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: usize, node: usize) -> bool {
        let mut cursor = Some(node);
        while let Some(idx) = cursor {
            if idx == ancestor {
                return true;
            }
            cursor = self.nodes[idx].parent;
        }
        false
    }

    fn close_overlays(&mut self) {
        self.pending.clear();
        for overlay in std::mem::take(&mut self.open) {
            self.detach(overlay.container);
        }
    }

    /// Renders every pending overlay whose delay has elapsed.
    fn materialize(&mut self, now: Instant) {
        if self.pending.is_empty() {
            return;
        }
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|render| render.due <= now);
        self.pending = waiting;
        for render in due {
            self.render_overlay(render.trigger);
        }
    }

    fn render_overlay(&mut self, trigger: usize) {
        let Some(options) = self
            .bindings
            .iter()
            .find(|binding| binding.trigger == trigger)
            .map(|binding| binding.options.clone())
        else {
            return;
        };
        let Some(body) = self.body() else {
            return;
        };
        let container = self.append_element(body, "div", &[("class", "cdk-overlay-pane")]);
        let panel = self.append_element(
            container,
            "div",
            &[("class", "mat-select-panel"), ("role", "listbox")],
        );
        for text in &options {
            let option = self.append_element(
                panel,
                "mat-option",
                &[("class", "mat-option"), ("role", "option")],
            );
            let label = self.append_element(option, "span", &[("class", "mat-option-text")]);
            self.append(label, NodeKind::Text(text.clone()));
        }
        debug!(trigger, options = options.len(), "overlay rendered");
        self.open.push(OpenOverlay { trigger, container });
    }

    fn click(&mut self, idx: usize, now: Instant) {
        self.events.push((NodeId(idx as u64), EventKind::Click));

        if self.tag(idx) == Some("input") {
            match self.input_type_of(idx).as_str() {
                "radio" => self.set_checked(idx, true),
                "checkbox" => {
                    let flipped = !self.nodes[idx].checked;
                    self.set_checked(idx, flipped);
                }
                _ => {}
            }
        }

        if let Some(pos) = self
            .open
            .iter()
            .position(|overlay| self.is_inclusive_ancestor(overlay.container, idx))
        {
            let overlay = self.open.remove(pos);
            let option = self.closest_option(idx).unwrap_or(idx);
            let chosen = collapse_whitespace(&self.text_of(option));
            self.nodes[overlay.trigger].value = Some(chosen);
            self.detach(overlay.container);
            return;
        }

        if let Some(delay) = self
            .bindings
            .iter()
            .find(|binding| binding.trigger == idx)
            .map(|binding| binding.delay)
        {
            self.pending.retain(|render| render.trigger != idx);
            let stale: Vec<usize> = self
                .open
                .iter()
                .filter(|overlay| overlay.trigger == idx)
                .map(|overlay| overlay.container)
                .collect();
            self.open.retain(|overlay| overlay.trigger != idx);
            for container in stale {
                self.detach(container);
            }
            self.pending.push(PendingRender {
                trigger: idx,
                due: now + delay,
            });
        }
    }

    fn closest_option(&self, idx: usize) -> Option<usize> {
        let mut cursor = Some(idx);
        while let Some(current) = cursor {
            if self.tag(current) == Some("mat-option") {
                return Some(current);
            }
            cursor = self.parent_element_of(current);
        }
        None
    }

    fn query(&self, root: usize, selector: &Selector) -> Vec<NodeId> {
        self.preorder(root)
            .into_iter()
            .filter(|idx| self.tag(*idx).is_some() && !self.nodes[*idx].detached)
            .filter(|idx| selector.matches(self, NodeId(*idx as u64)))
            .map(|idx| NodeId(idx as u64))
            .collect()
    }
}

impl SelectorTarget for Document {
    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0 as usize).and_then(|_| self.tag(node.0 as usize))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0 as usize)
            .and_then(|_| self.attr(node.0 as usize, name))
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.nodes
            .get(node.0 as usize)
            .and_then(|_| self.parent_element_of(node.0 as usize))
            .map(|idx| NodeId(idx as u64))
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// In-memory page. Cheap to construct from an HTML fixture.
#[derive(Debug)]
pub struct MemoryPage {
    doc: Mutex<Document>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::from_html("")
    }
}

impl MemoryPage {
    pub fn from_html(source: &str) -> Self {
        Self {
            doc: Mutex::new(Document::parse(source)),
        }
    }

    /// Simulates a framework overlay bound to `trigger`: each click on the trigger renders
    /// `options` as `mat-option` nodes once `delay` has elapsed.
    pub fn bind_overlay<I, S>(&self, trigger: NodeId, delay: Duration, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = self.doc.lock();
        let trigger = trigger.0 as usize;
        doc.bindings.retain(|binding| binding.trigger != trigger);
        doc.bindings.push(OverlayBinding {
            trigger,
            delay,
            options: options.into_iter().map(Into::into).collect(),
        });
    }

    /// First element matching `selector`, or `None` when nothing matches or the selector is
    /// outside the supported subset.
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        self.find_all(selector).into_iter().next()
    }

    pub fn find_all(&self, selector: &str) -> Vec<NodeId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        let mut doc = self.doc.lock();
        doc.materialize(Instant::now());
        doc.query(ROOT, &selector)
    }

    pub fn value_of(&self, node: NodeId) -> String {
        let doc = self.doc.lock();
        match doc.nodes.get(node.0 as usize) {
            Some(_) => doc.value_of(node.0 as usize),
            None => String::new(),
        }
    }

    pub fn attribute_of(&self, node: NodeId, name: &str) -> Option<String> {
        let doc = self.doc.lock();
        SelectorTarget::attribute(&*doc, node, name).map(str::to_string)
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        let doc = self.doc.lock();
        doc.nodes
            .get(node.0 as usize)
            .map(|entry| entry.checked)
            .unwrap_or(false)
    }

    pub fn events(&self) -> Vec<(NodeId, EventKind)> {
        self.doc.lock().events.clone()
    }

    pub fn events_for(&self, node: NodeId) -> Vec<EventKind> {
        self.doc
            .lock()
            .events
            .iter()
            .filter(|(target, _)| *target == node)
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn clear_events(&self) {
        self.doc.lock().events.clear();
    }

    pub fn notification(&self) -> Option<Notification> {
        self.doc.lock().notification.clone()
    }

    /// Whether an overlay is rendered or scheduled to render.
    pub fn overlay_open(&self) -> bool {
        let mut doc = self.doc.lock();
        doc.materialize(Instant::now());
        !doc.open.is_empty() || !doc.pending.is_empty()
    }

    /// Makes every later `set_value` on `node` fail, as a page whose script throws would.
    pub fn reject_writes(&self, node: NodeId) {
        self.doc.lock().rejected_writes.push(node.0 as usize);
    }

    /// Removes `node` and its subtree, as a page re-render would.
    pub fn remove(&self, node: NodeId) {
        let mut doc = self.doc.lock();
        if let Ok(idx) = doc.live(node) {
            doc.detach(idx);
        }
    }

    fn with_doc<T>(
        &self,
        op: impl FnOnce(&mut Document, Instant) -> Result<T, DomError>,
    ) -> Result<T, DomError> {
        let now = Instant::now();
        let mut doc = self.doc.lock();
        doc.materialize(now);
        op(&mut doc, now)
    }
}

#[async_trait]
impl PageDom for MemoryPage {
    async fn query_all(
        &self,
        scope: Scope,
        selector: &Selector,
    ) -> Result<Vec<NodeId>, DomError> {
        self.with_doc(|doc, _| {
            let root = match scope {
                Scope::Document => ROOT,
                Scope::Element(node) => doc.live(node)?,
            };
            Ok(doc.query(root, selector))
        })
    }

    async fn tag_name(&self, node: NodeId) -> Result<String, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.tag(idx).unwrap_or_default().to_string())
        })
    }

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.attr(idx, name).map(str::to_string))
        })
    }

    async fn input_type(&self, node: NodeId) -> Result<String, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.input_type_of(idx))
        })
    }

    async fn value(&self, node: NodeId) -> Result<String, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.value_of(idx))
        })
    }

    async fn text_content(&self, node: NodeId) -> Result<String, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.text_of(idx))
        })
    }

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            Ok(doc.parent_element_of(idx).map(|p| NodeId(p as u64)))
        })
    }

    async fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            let Some(parent) = doc.nodes[idx].parent else {
                return Ok(None);
            };
            let siblings = &doc.nodes[parent].children;
            let next = siblings
                .iter()
                .skip_while(|child| **child != idx)
                .skip(1)
                .find(|child| doc.tag(**child).is_some())
                .map(|child| NodeId(*child as u64));
            Ok(next)
        })
    }

    async fn closest(
        &self,
        node: NodeId,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        self.with_doc(|doc, _| {
            let mut cursor = Some(doc.live(node)?);
            while let Some(idx) = cursor {
                let id = NodeId(idx as u64);
                if selector.matches(&*doc, id) {
                    return Ok(Some(id));
                }
                cursor = doc.parent_element_of(idx);
            }
            Ok(None)
        })
    }

    async fn options(&self, node: NodeId) -> Result<Vec<SelectOption>, DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            if doc.tag(idx) != Some("select") {
                return Ok(Vec::new());
            }
            Ok(doc
                .option_entries(idx)
                .into_iter()
                .map(|(_, option)| option)
                .collect())
        })
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            if doc.rejected_writes.contains(&idx) {
                return Err(DomError::Script(format!("value write to node {node} rejected")));
            }
            let stored = if doc.tag(idx) == Some("select") {
                let known = doc
                    .option_entries(idx)
                    .into_iter()
                    .any(|(_, option)| option.value == value);
                if known {
                    value.to_string()
                } else {
                    String::new()
                }
            } else {
                value.to_string()
            };
            doc.nodes[idx].value = Some(stored);
            Ok(())
        })
    }

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            if let NodeKind::Element { attrs, .. } = &mut doc.nodes[idx].kind {
                attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
            }
            Ok(())
        })
    }

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            let idx = doc.live(node)?;
            doc.set_checked(idx, checked);
            Ok(())
        })
    }

    async fn dispatch_event(&self, node: NodeId, kind: EventKind) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            doc.live(node)?;
            doc.events.push((node, kind));
            Ok(())
        })
    }

    async fn click(&self, node: NodeId) -> Result<(), DomError> {
        self.with_doc(|doc, now| {
            let idx = doc.live(node)?;
            doc.click(idx, now);
            Ok(())
        })
    }

    async fn focus(&self, node: NodeId) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            doc.live(node)?;
            doc.events.push((node, EventKind::Focus));
            Ok(())
        })
    }

    async fn click_body(&self) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            let body = doc.body().ok_or(DomError::NoBody)?;
            doc.events.push((NodeId(body as u64), EventKind::Click));
            doc.close_overlays();
            Ok(())
        })
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            doc.notification = Some(notification.clone());
            Ok(())
        })
    }

    async fn dismiss_notification(&self) -> Result<(), DomError> {
        self.with_doc(|doc, _| {
            doc.notification = None;
            Ok(())
        })
    }
}
