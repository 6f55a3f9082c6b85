//! Arena-backed page document.
//!
//! [`Document`] holds the nodes of one page in a `Vec` slot arena indexed
//! by [`NodeId`], plus an id → node index for `getElementById`-style
//! lookups. Removed nodes free their slot; stale [`NodeId`]s are ignored by
//! every mutator.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use super::events::{EventKind, Listener, UiAction};
use crate::error::ClientError;

/// Elements serialized without a closing tag.
const VOID_TAGS: [&str; 5] = ["img", "input", "br", "hr", "meta"];

/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single element.
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    id: Option<String>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    text: Option<String>,
    hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            text: None,
            hidden: false,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Returns the lowercase tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the element id, if set.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the class list.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns the text content set directly on this node.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns `true` if the node is hidden (`display: none`).
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Returns the child handles in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the registered listeners.
    #[must_use]
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }
}

/// An in-memory page.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    ids: HashMap<String, NodeId>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document containing only an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new("body"))],
            ids: HashMap::new(),
            body: NodeId(0),
        }
    }

    /// Returns the `body` node.
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Returns the number of live nodes, `body` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns `true` if the document holds nothing but `body`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Returns a live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(tag)));
        id
    }

    /// Creates an element and appends it to `parent`.
    pub fn append_new(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let child = self.create_element(tag);
        self.append_child(parent, child);
        child
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(old_parent) = self.node(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.node_mut(old_parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Returns the children of a node, or an empty slice for stale handles.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[][..], Node::children)
    }

    /// Sets the element id, re-pointing the id index at this node.
    pub fn set_id(&mut self, node: NodeId, element_id: &str) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        let previous = n.id.replace(element_id.to_string());
        if let Some(previous) = previous
            && self.ids.get(&previous) == Some(&node)
        {
            self.ids.remove(&previous);
        }
        self.ids.insert(element_id.to_string(), node);
    }

    /// Looks up an element by id.
    #[must_use]
    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.ids.get(element_id).copied()
    }

    /// Looks up an element that the document contract requires.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if no element has this id.
    pub fn require(&self, element_id: &str) -> Result<NodeId, ClientError> {
        self.get_element_by_id(element_id)
            .ok_or_else(|| ClientError::MissingElement(element_id.to_string()))
    }

    /// Looks up `{root}-{use_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if the element is absent.
    pub fn tagged(&self, root: &str, use_id: &str) -> Result<NodeId, ClientError> {
        let element_id = format!("{root}-{use_id}");
        tracing::trace!(element = %element_id, "retrieving tagged element");
        self.require(&element_id)
    }

    /// Sets an attribute. `id` and `class` are routed to their dedicated
    /// setters.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        match name {
            "id" => self.set_id(node, value),
            "class" => {
                for class in value.split_whitespace() {
                    self.add_class(node, class);
                }
            }
            _ => {
                if let Some(n) = self.node_mut(node) {
                    n.attributes.insert(name.to_string(), value.to_string());
                }
            }
        }
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).and_then(|n| n.attribute(name))
    }

    /// Returns the `value` attribute of a form control, or `""`.
    #[must_use]
    pub fn value(&self, node: NodeId) -> &str {
        self.attribute(node, "value").unwrap_or_default()
    }

    /// Sets the `value` attribute of a form control.
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.set_attribute(node, "value", value);
    }

    /// Adds a class if not already present.
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(n) = self.node_mut(node)
            && !n.classes.iter().any(|c| c == class)
        {
            n.classes.push(class.to_string());
        }
    }

    /// Returns `true` if the node carries `class`.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    /// Replaces the text content set directly on the node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.node_mut(node) {
            n.text = Some(text.to_string());
        }
    }

    /// Returns the text content set directly on the node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.node(node).and_then(Node::text)
    }

    /// Shows the node.
    pub fn show(&mut self, node: NodeId) {
        if let Some(n) = self.node_mut(node) {
            n.hidden = false;
        }
    }

    /// Hides the node.
    pub fn hide(&mut self, node: NodeId) {
        if let Some(n) = self.node_mut(node) {
            n.hidden = true;
        }
    }

    /// Flips the node's visibility.
    pub fn toggle(&mut self, node: NodeId) {
        if let Some(n) = self.node_mut(node) {
            n.hidden = !n.hidden;
        }
    }

    /// Returns `true` if the node is hidden. Stale handles count as hidden.
    #[must_use]
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.node(node).is_none_or(Node::is_hidden)
    }

    /// Removes a node and its subtree from the document.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(freed) = self.nodes.get_mut(current.0).and_then(Option::take) else {
                continue;
            };
            if let Some(element_id) = freed.id
                && self.ids.get(&element_id) == Some(&current)
            {
                self.ids.remove(&element_id);
            }
            stack.extend(freed.children);
        }
    }

    /// Removes every child subtree of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = self.children(node).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    /// Registers a listener on a node.
    pub fn add_listener(&mut self, node: NodeId, listener: Listener) {
        if let Some(n) = self.node_mut(node) {
            n.listeners.push(listener);
        }
    }

    /// Fires `event` on `node`, applying every matching listener's action.
    ///
    /// Returns the number of listeners that ran.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingElement`] if a listener targets an
    /// element that is not in the document.
    pub fn dispatch(&mut self, node: NodeId, event: EventKind) -> Result<usize, ClientError> {
        let actions: Vec<UiAction> = self
            .node(node)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|l| l.event == event)
                    .map(|l| l.action.clone())
                    .collect()
            })
            .unwrap_or_default();

        for action in &actions {
            let target = self.require(action.target())?;
            match action {
                UiAction::Show { .. } => self.show(target),
                UiAction::Hide { .. } => self.hide(target),
                UiAction::Toggle { .. } => self.toggle(target),
                UiAction::Focus { src, .. } => {
                    self.set_attribute(target, "src", src);
                    self.show(target);
                }
            }
        }
        Ok(actions.len())
    }

    /// Serializes the whole document, starting at `body`.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.outer_html(self.body)
    }

    /// Serializes one node and its subtree.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.node(node) else {
            return;
        };
        out.push('<');
        out.push_str(&n.tag);
        if let Some(id) = &n.id {
            let _ = write!(out, " id=\"{}\"", escape_html(id));
        }
        if !n.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&n.classes.join(" ")));
        }
        for (name, value) in &n.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape_html(value));
        }
        if n.hidden {
            out.push_str(" style=\"display: none\"");
        }
        for listener in &n.listeners {
            let _ = write!(
                out,
                " data-on-{}=\"{}\"",
                listener.event.as_str(),
                escape_html(listener.action.target())
            );
        }
        out.push('>');
        if VOID_TAGS.contains(&n.tag.as_str()) {
            return;
        }
        if let Some(text) = &n.text {
            out.push_str(&escape_html(text));
        }
        for child in &n.children {
            self.write_node(*child, out);
        }
        let _ = write!(out, "</{}>", n.tag);
    }
}

/// Escapes text for use in element content and quoted attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
