//! Abstract syntax tree (spec §3.2).
//!
//! Nodes live in a flat arena (`Ast`) and reference each other by index
//! rather than by `Rc`/`Box`, so that a node can carry a back-link to its
//! parent (spec §9 "Cyclic parent links") without creating a genuine
//! reference cycle. `end` and `:` resolve their meaning by walking these
//! parent links up to the nearest enclosing `Idx` node (spec §4.1).

use crate::error::CodeLoc;
use crate::value::{ClassTag, QuoteStyle};

pub type NodeId = usize;

/// Which bracket pair a matrix/list literal was written with — `[...]`
/// forms a MultiArray, `{...}` forms a cell array (spec §3.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Bracket,
    Brace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    MulElem,
    Div,
    DivElem,
    LeftDiv,
    LeftDivElem,
    Pow,
    PowElem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    AndShort,
    OrShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    Transpose,
    CTranspose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A numeric literal (spec §3.2 leaf).
    Number(f64),
    /// A string literal, keeping the quote style it was written with.
    Str(String, QuoteStyle),
    /// A bare identifier reference.
    Ident(String),
    /// The context-sensitive `end` sentinel; only valid inside an `Idx`.
    EndSentinel,
    /// The context-sensitive whole-dimension `:` subscript.
    ColonSentinel,
    /// `~`, the output-omission wildcard in a multi-assignment list.
    WildcardSentinel,

    Binary(BinOp, NodeId, NodeId),
    Unary(UnOp, NodeId),
    /// A parenthesized sub-expression, kept so the unparser can reproduce
    /// the original grouping (spec §4.5).
    Paren(NodeId),

    /// `start:stop` or `start:stride:stop`.
    Range { start: NodeId, stride: Option<NodeId>, stop: NodeId },

    /// A comma/semicolon-delimited literal: `[rows...]` or `{rows...}`,
    /// each row a list of element node ids (spec §3.2, §4.3).
    MatrixLiteral { rows: Vec<Vec<NodeId>>, delim: Delimiter },

    /// `target(args)` — subscripted read, function call, or (resolved
    /// during evaluation) the left side of rule 5's function-definition
    /// vs. indexed-assignment disambiguation.
    Idx { target: NodeId, args: Vec<NodeId>, delim: Delimiter },

    /// `target.field` / `target.(dynamicExpr)`.
    Field { target: NodeId, name: FieldName },

    /// A left-hand-side list for multi-assignment: `[a, b] = f()`.
    List { elements: Vec<NodeId> },

    Assign { lhs: NodeId, rhs: NodeId },

    If { branches: Vec<(NodeId, Vec<NodeId>)>, else_body: Vec<NodeId> },

    /// A bare command-word statement: `clear x y`, `hold on`.
    CmdWList { name: String, args: Vec<String> },

    /// `[a, b] = f(...)` adapter: wraps the call so evaluation can request
    /// a specific `(expected, index)` slice of a RETLIST.
    RetListSelect { call: NodeId, expected: usize, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldName {
    Static(String),
    Dynamic(NodeId),
}

/// One parsed statement and its source position (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct Statement {
    pub root: NodeId,
    pub loc: CodeLoc,
    /// Trailing `;` suppresses the `ans` echo (spec §4.1).
    pub suppressed: bool,
}

/// The node arena for one parsed program. Parent links and positional
/// indices are filled in by `Ast::link_parents` once the whole tree is
/// built, mirroring how a recursive-descent parser finishes each
/// production before its caller can know the parent id.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    pub statements: Vec<Statement>,
}

impl Ast {
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.parents.push(None);
        self.nodes.len() - 1
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id]
    }

    /// Walks up from `id` to the nearest enclosing `Idx` node, returning
    /// that node's id and which argument position `id` descends from
    /// (needed to resolve `end`/`:` against the right dimension, spec
    /// §4.1).
    pub fn enclosing_idx(&self, mut id: NodeId) -> Option<(NodeId, usize)> {
        loop {
            let parent = self.parents[id]?;
            if let Node::Idx { args, .. } = &self.nodes[parent] {
                if let Some(pos) = args.iter().position(|&a| a == id) {
                    return Some((parent, pos));
                }
            }
            id = parent;
        }
    }

    /// Recomputes every parent link from scratch. Call once after the
    /// whole tree (or a freshly spliced subtree) is built.
    pub fn link_parents(&mut self) {
        self.parents.clear();
        self.parents.resize(self.nodes.len(), None);
        let ids: Vec<NodeId> = (0..self.nodes.len()).collect();
        for id in ids {
            for child in self.children(id) {
                self.parents[child] = Some(id);
            }
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.nodes[id] {
            Node::Binary(_, a, b) => vec![*a, *b],
            Node::Unary(_, a) => vec![*a],
            Node::Paren(a) => vec![*a],
            Node::Range { start, stride, stop } => {
                let mut v = vec![*start, *stop];
                if let Some(s) = stride {
                    v.push(*s);
                }
                v
            }
            Node::MatrixLiteral { rows, .. } => rows.iter().flatten().copied().collect(),
            Node::Idx { target, args, .. } => {
                let mut v = vec![*target];
                v.extend(args.iter().copied());
                v
            }
            Node::Field { target, name } => {
                let mut v = vec![*target];
                if let FieldName::Dynamic(d) = name {
                    v.push(*d);
                }
                v
            }
            Node::List { elements } => elements.clone(),
            Node::Assign { lhs, rhs } => vec![*lhs, *rhs],
            Node::If { branches, else_body } => {
                let mut v = Vec::new();
                for (cond, body) in branches {
                    v.push(*cond);
                    v.extend(body.iter().copied());
                }
                v.extend(else_body.iter().copied());
                v
            }
            Node::RetListSelect { call, .. } => vec![*call],
            Node::Number(_)
            | Node::Str(_, _)
            | Node::Ident(_)
            | Node::EndSentinel
            | Node::ColonSentinel
            | Node::WildcardSentinel
            | Node::CmdWList { .. } => vec![],
        }
    }
}
