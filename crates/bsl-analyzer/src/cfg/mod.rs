//! Control-flow graphs for method bodies.
//!
//! Blocks live in an arena (`Vec`) and edges carry integer block indices,
//! so loop back-edges never form ownership cycles. Statement order inside
//! a block is exactly source order; compound statements (`If`, loops,
//! `Try`) contribute structure, their leaf statements populate blocks.

use crate::ast::Statement;

/// Arena index of a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Sequential fall-through.
    Normal,
    /// One arm of a conditional or a loop entry/exit decision.
    Branch,
    /// Loop back-edge to the header.
    Back,
    /// Transfer into an exception handler.
    Exception,
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub to: BlockId,
    pub kind: EdgeKind,
}

/// A basic block: an ordered run of statements plus successor edges.
#[derive(Debug, Default)]
pub struct BasicBlock<'a> {
    pub statements: Vec<&'a Statement>,
    pub edges: Vec<Edge>,
}

/// The CFG of one method body. Built once, read-only afterward.
#[derive(Debug)]
pub struct Cfg<'a> {
    blocks: Vec<BasicBlock<'a>>,
    entry: BlockId,
    exit: BlockId,
}

impl<'a> Cfg<'a> {
    pub fn build(body: &'a [Statement]) -> Cfg<'a> {
        let mut builder = Builder {
            blocks: vec![BasicBlock::default(), BasicBlock::default()],
            exit: BlockId(1),
            loops: Vec::new(),
        };
        let entry = BlockId(0);
        let last = builder.lower_seq(entry, body);
        builder.edge(last, builder.exit, EdgeKind::Normal);
        Cfg {
            blocks: builder.blocks,
            entry,
            exit: builder.exit,
        }
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock<'a> {
        &self.blocks[id.0]
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock<'a>)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (BlockId(i), b))
    }

    /// Reachability of every block from the entry block.
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.blocks.len()];
        let mut queue = vec![self.entry];
        seen[self.entry.0] = true;
        while let Some(id) = queue.pop() {
            for edge in &self.blocks[id.0].edges {
                if !seen[edge.to.0] {
                    seen[edge.to.0] = true;
                    queue.push(edge.to);
                }
            }
        }
        seen
    }
}

struct LoopCtx {
    header: BlockId,
    exit: BlockId,
}

struct Builder<'a> {
    blocks: Vec<BasicBlock<'a>>,
    exit: BlockId,
    loops: Vec<LoopCtx>,
}

impl<'a> Builder<'a> {
    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::default());
        id
    }

    fn edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        self.blocks[from.0].edges.push(Edge { to, kind });
    }

    fn push(&mut self, block: BlockId, stmt: &'a Statement) {
        self.blocks[block.0].statements.push(stmt);
    }

    /// Lower a statement sequence starting in `current`; returns the block
    /// left open at the end of the sequence.
    fn lower_seq(&mut self, mut current: BlockId, stmts: &'a [Statement]) -> BlockId {
        for stmt in stmts {
            current = self.lower(current, stmt);
        }
        current
    }

    fn lower(&mut self, current: BlockId, stmt: &'a Statement) -> BlockId {
        match stmt {
            Statement::VarDecl(_)
            | Statement::Assignment { .. }
            | Statement::Call { .. }
            | Statement::Goto { .. }
            | Statement::Label { .. } => {
                self.push(current, stmt);
                current
            }
            Statement::Return { .. } => {
                self.push(current, stmt);
                self.edge(current, self.exit, EdgeKind::Normal);
                self.new_block()
            }
            Statement::Raise { .. } => {
                self.push(current, stmt);
                self.edge(current, self.exit, EdgeKind::Exception);
                self.new_block()
            }
            Statement::Break { span: _ } => {
                self.push(current, stmt);
                if let Some(ctx) = self.loops.last() {
                    let to = ctx.exit;
                    self.edge(current, to, EdgeKind::Branch);
                }
                self.new_block()
            }
            Statement::Continue { span: _ } => {
                self.push(current, stmt);
                if let Some(ctx) = self.loops.last() {
                    let header = ctx.header;
                    self.edge(current, header, EdgeKind::Back);
                }
                self.new_block()
            }
            Statement::If {
                branches,
                else_body,
                ..
            } => {
                let join = self.new_block();
                for branch in branches {
                    let body_entry = self.new_block();
                    self.edge(current, body_entry, EdgeKind::Branch);
                    let body_end = self.lower_seq(body_entry, &branch.body);
                    self.edge(body_end, join, EdgeKind::Normal);
                }
                if else_body.is_empty() {
                    // No else: condition can fall through directly.
                    self.edge(current, join, EdgeKind::Branch);
                } else {
                    let else_entry = self.new_block();
                    self.edge(current, else_entry, EdgeKind::Branch);
                    let else_end = self.lower_seq(else_entry, else_body);
                    self.edge(else_end, join, EdgeKind::Normal);
                }
                join
            }
            Statement::While { body, .. }
            | Statement::For { body, .. }
            | Statement::ForEach { body, .. } => {
                let header = self.new_block();
                let after = self.new_block();
                self.edge(current, header, EdgeKind::Normal);
                self.edge(header, after, EdgeKind::Branch);
                let body_entry = self.new_block();
                self.edge(header, body_entry, EdgeKind::Branch);
                self.loops.push(LoopCtx {
                    header,
                    exit: after,
                });
                let body_end = self.lower_seq(body_entry, body);
                self.loops.pop();
                self.edge(body_end, header, EdgeKind::Back);
                after
            }
            Statement::TryExcept { body, handler, .. } => {
                let try_entry = self.new_block();
                self.edge(current, try_entry, EdgeKind::Normal);
                let try_end = self.lower_seq(try_entry, body);

                let handler_entry = self.new_block();
                let join = self.new_block();
                // Two successors from the try region's last block: the
                // normal exit and the exception path into the handler.
                self.edge(try_end, join, EdgeKind::Normal);
                self.edge(try_end, handler_entry, EdgeKind::Exception);
                let handler_end = self.lower_seq(handler_entry, handler);
                self.edge(handler_end, join, EdgeKind::Normal);
                join
            }
        }
    }
}
