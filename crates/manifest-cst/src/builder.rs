//! Marker-based tree builder.
//!
//! The parser opens nodes with [`TreeBuilder::mark`] before it knows what
//! they will be, appends tokens, and closes them with [`Marker::done`] or
//! [`Marker::error`]. A closed node can later be wrapped by a new parent
//! with [`CompletedMarker::precede`], which is how a parsed value becomes the
//! left side of an attribute once the `=` shows up.
//!
//! Nodes live in an arena until [`TreeBuilder::finish`] replays them into a
//! rowan green tree.

use manifest_lexer::Span;
use rowan::{GreenNode, GreenNodeBuilder};

use crate::parser::{ParseError, ParseErrorKind};
use crate::syntax_kind::SyntaxKind;

/// Index of a node in the builder arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
enum Child {
    Token { kind: SyntaxKind, span: Span },
    Node(NodeId),
}

#[derive(Debug)]
struct NodeData {
    /// `None` while the node is still open.
    kind: Option<SyntaxKind>,
    start: u32,
    end: u32,
    parent: Option<NodeId>,
    children: Vec<Child>,
    error: Option<ParseErrorKind>,
}

/// Arena of nodes under construction.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    /// Open nodes, innermost last.
    open: Vec<NodeId>,
    /// End of the last token appended.
    pos: u32,
}

/// An open node. Close it with [`Marker::done`] or [`Marker::error`].
#[derive(Debug)]
#[must_use = "an open marker must be closed"]
pub struct Marker {
    id: NodeId,
}

/// A closed node.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    id: NodeId,
}

impl TreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a node at the current position, as the last child of the
    /// innermost open node.
    pub fn mark(&mut self) -> Marker {
        let parent = self.open.last().copied();
        let id = self.alloc(parent, self.pos);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(Child::Node(id));
        }
        self.open.push(id);
        Marker { id }
    }

    /// Append a token to the innermost open node.
    pub fn token(&mut self, kind: SyntaxKind, span: Span) {
        debug_assert!(kind.is_token(), "{kind:?} is not a token kind");
        debug_assert_eq!(span.start, self.pos, "tokens must be contiguous");
        match self.open.last() {
            Some(id) => {
                self.nodes[id.0].children.push(Child::Token { kind, span });
                self.pos = span.end;
            }
            None => debug_assert!(false, "token {kind:?} outside of any node"),
        }
    }

    /// Byte offset just past the last token appended.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Replay the arena into a green tree rooted at `root`, collecting the
    /// errors of every node in source order.
    pub fn finish(self, root: CompletedMarker, source: &str) -> (GreenNode, Vec<ParseError>) {
        debug_assert!(self.open.is_empty(), "unclosed markers at finish");

        let mut green = GreenNodeBuilder::new();
        let mut errors = Vec::new();
        self.emit(root.id, source, &mut green, &mut errors);
        errors.sort_by_key(|e: &ParseError| e.span.start);

        (green.finish(), errors)
    }

    fn alloc(&mut self, parent: Option<NodeId>, start: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: None,
            start,
            end: start,
            parent,
            children: Vec::new(),
            error: None,
        });
        id
    }

    fn close(&mut self, id: NodeId, kind: SyntaxKind, error: Option<ParseErrorKind>) {
        // Anything still open inside `id` is closed with it.
        while let Some(top) = self.open.pop() {
            if top == id {
                break;
            }
            debug_assert!(false, "marker closed out of order");
            let node = &mut self.nodes[top.0];
            node.kind = Some(SyntaxKind::ERROR);
            node.end = self.pos;
        }

        let node = &mut self.nodes[id.0];
        node.kind = Some(kind);
        node.end = self.pos;
        node.error = error;
    }

    fn emit(
        &self,
        id: NodeId,
        source: &str,
        green: &mut GreenNodeBuilder<'static>,
        errors: &mut Vec<ParseError>,
    ) {
        let node = &self.nodes[id.0];
        let kind = node.kind.unwrap_or(SyntaxKind::ERROR);

        if let Some(error) = &node.error {
            errors.push(ParseError::new(
                error.clone(),
                Span::new(node.start, node.end),
                kind,
            ));
        }

        green.start_node(kind.into());
        for child in &node.children {
            match *child {
                Child::Token { kind, span } => {
                    green.token(kind.into(), span.slice(source));
                }
                Child::Node(child) => self.emit(child, source, green, errors),
            }
        }
        green.finish_node();
    }
}

impl Marker {
    /// Close the node with the given kind.
    pub fn done(self, builder: &mut TreeBuilder, kind: SyntaxKind) -> CompletedMarker {
        debug_assert!(kind.is_node(), "{kind:?} is not a node kind");
        builder.close(self.id, kind, None);
        CompletedMarker { id: self.id }
    }

    /// Close the node as an [`SyntaxKind::ERROR`] node carrying `error`.
    pub fn error(self, builder: &mut TreeBuilder, error: ParseErrorKind) -> CompletedMarker {
        builder.close(self.id, SyntaxKind::ERROR, Some(error));
        CompletedMarker { id: self.id }
    }
}

impl CompletedMarker {
    /// Open a new node in place of this one, with this node as its first
    /// child.
    ///
    /// Siblings appended after this node move into the new node as well, so
    /// children stay in source order. The parent of this node must be the
    /// innermost open node.
    pub fn precede(self, builder: &mut TreeBuilder) -> Marker {
        let parent = builder.nodes[self.id.0].parent;
        let start = builder.nodes[self.id.0].start;
        let id = builder.alloc(parent, start);

        let adopted = match parent {
            Some(parent) => {
                debug_assert_eq!(builder.open.last(), Some(&parent));
                let siblings = &mut builder.nodes[parent.0].children;
                let index = siblings
                    .iter()
                    .position(|c| matches!(c, Child::Node(n) if *n == self.id))
                    .unwrap_or(siblings.len());
                let adopted: Vec<Child> = siblings.drain(index..).collect();
                siblings.push(Child::Node(id));
                adopted
            }
            None => vec![Child::Node(self.id)],
        };

        for child in &adopted {
            if let Child::Node(n) = child {
                builder.nodes[n.0].parent = Some(id);
            }
        }
        builder.nodes[id.0].children = adopted;
        builder.open.push(id);
        Marker { id }
    }

    /// Attach an error to this node without changing its kind.
    pub fn set_error(self, builder: &mut TreeBuilder, error: ParseErrorKind) {
        builder.nodes[self.id.0].error = Some(error);
    }
}
