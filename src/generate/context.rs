use fnv::FnvHashMap;

use crate::{ast::NodeKind, typing::ty::Ty};

/// Bookkeeping threaded down the generation recursion. Every update returns
/// a new value, so a subtree that is abandoned leaves no trace in the
/// counters its siblings see.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    counts: FnvHashMap<NodeKind, usize>,
    /// Statement kinds emitted so far, one list per open block.
    history: Vec<Vec<NodeKind>>,
    budget: usize,
    required: Ty,
    return_ty: Ty,
    previous: Option<NodeKind>,
    function: String,
    entry: bool,
    receiver: Option<String>,
}

impl Context {
    /// Context for the body of `main`.
    pub fn new(max_depth: usize) -> Context {
        Context {
            counts: FnvHashMap::default(),
            history: vec![vec![]],
            budget: max_depth,
            required: Ty::Unit,
            return_ty: Ty::Unit,
            previous: None,
            function: str!("main"),
            entry: true,
            receiver: None,
        }
    }

    /// Context for the body of a newly synthesized function. Occurrence
    /// counts and the recursion budget carry over from the call site.
    pub fn for_function(&self, name: &str, return_ty: Ty, receiver: Option<String>) -> Context {
        Context {
            counts: self.counts.clone(),
            history: vec![vec![]],
            budget: self.budget,
            required: return_ty.clone(),
            return_ty,
            previous: None,
            function: name.to_string(),
            entry: false,
            receiver,
        }
    }

    pub fn with_required_ty(&self, ty: Ty) -> Context {
        let mut ctx = self.clone();
        ctx.required = ty;
        ctx
    }

    /// Records that `kind` was chosen for the current hole. Recursive kinds
    /// also spend one unit of the recursion budget.
    pub fn increment(&self, kind: NodeKind) -> Context {
        let mut ctx = self.clone();
        *ctx.counts.entry(kind).or_insert(0) += 1;
        ctx.previous = Some(kind);
        if kind.is_recursive() {
            ctx.budget = ctx.budget.saturating_sub(1);
        }
        ctx
    }

    /// Records that a statement of `kind` was emitted in the current block.
    pub fn increment_statement(&self, kind: NodeKind) -> Context {
        let mut ctx = self.clone();
        match ctx.history.last_mut() {
            Some(block) => block.push(kind),
            None => ctx.history.push(vec![kind]),
        }
        ctx
    }

    pub fn enter_scope(&self) -> Context {
        let mut ctx = self.clone();
        ctx.history.push(vec![]);
        ctx
    }

    /// Occurrences of every kind in `kind`'s family on the path to this
    /// hole.
    pub fn depth_of(&self, kind: NodeKind) -> usize {
        NodeKind::members(kind.family())
            .map(|k| self.counts.get(&k).copied().unwrap_or(0))
            .sum()
    }

    pub fn statements_in_block(&self, kind: NodeKind) -> usize {
        self.history
            .last()
            .map(|block| block.iter().filter(|k| **k == kind).count())
            .unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.budget
    }

    pub fn required(&self) -> &Ty {
        &self.required
    }

    pub fn return_ty(&self) -> &Ty {
        &self.return_ty
    }

    pub fn previous(&self) -> Option<NodeKind> {
        self.previous
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn is_entry(&self) -> bool {
        self.entry
    }

    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }
}

#[cfg(test)]
mod context_tests {
    use super::Context;
    use crate::{ast::NodeKind, typing::ty::Ty};

    #[test]
    fn test_increment_returns_new_value() {
        let ctx = Context::new(20);
        let added = ctx.increment(NodeKind::Add);
        assert_eq!(ctx.depth_of(NodeKind::Add), 0);
        assert_eq!(ctx.remaining(), 20);
        assert_eq!(added.depth_of(NodeKind::Add), 1);
        assert_eq!(added.remaining(), 19);
        assert_eq!(added.previous(), Some(NodeKind::Add));
    }

    #[test]
    fn test_depth_sums_over_family() {
        let ctx = Context::new(20)
            .increment(NodeKind::Add)
            .increment(NodeKind::Sub)
            .increment(NodeKind::Mul)
            .increment(NodeKind::Eq);
        assert_eq!(ctx.depth_of(NodeKind::Div), 3);
        assert_eq!(ctx.depth_of(NodeKind::Lt), 1);
        assert_eq!(ctx.depth_of(NodeKind::And), 0);
    }

    #[test]
    fn test_terminals_do_not_spend_budget() {
        let ctx = Context::new(1).increment(NodeKind::IntLiteral);
        assert_eq!(ctx.remaining(), 1);
        let ctx = ctx.increment(NodeKind::TupleLiteral).increment(NodeKind::Add);
        assert_eq!(ctx.remaining(), 0);
    }

    #[test]
    fn test_statement_history_is_per_block() {
        let ctx = Context::new(20)
            .increment_statement(NodeKind::Declaration)
            .increment_statement(NodeKind::Declaration);
        assert_eq!(ctx.statements_in_block(NodeKind::Declaration), 2);

        let inner = ctx.increment(NodeKind::IfElse).enter_scope();
        assert_eq!(inner.statements_in_block(NodeKind::Declaration), 0);
        assert_eq!(inner.depth_of(NodeKind::ForLoop), 1);
        assert_eq!(ctx.statements_in_block(NodeKind::Declaration), 2);
    }

    #[test]
    fn test_function_reset_keeps_counters() {
        let ctx = Context::new(20)
            .increment_statement(NodeKind::Assignment)
            .increment(NodeKind::FunctionCall);
        let body = ctx.for_function("fun0", Ty::Bool, None);
        assert_eq!(body.statements_in_block(NodeKind::Assignment), 0);
        assert_eq!(body.depth_of(NodeKind::MethodCall), 1);
        assert_eq!(body.remaining(), 19);
        assert_eq!(body.previous(), None);
        assert_eq!(body.return_ty(), &Ty::Bool);
        assert_eq!(body.required(), &Ty::Bool);
        let hole = body.with_required_ty(Ty::i32());
        assert_eq!(hole.required(), &Ty::i32());
        assert_eq!(hole.return_ty(), &Ty::Bool);
        assert_eq!(body.function(), "fun0");
        assert!(!body.is_entry());
        assert!(Context::new(20).is_entry());
    }
}
