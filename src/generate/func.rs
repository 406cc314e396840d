use std::mem;

use log::debug;
use rand::Rng;

use crate::{
    ast::{Block, FunctionDef, Stmt},
    errors::SmithResult,
    generate::{ident, Context, Generator},
    sema::{FunctionSig, Scope},
    typing::ty::Ty,
};

impl Generator {
    /// Name of a complete function (or method of `receiver`) returning `ret`.
    /// A new one is synthesized when none exists, or at random while the
    /// function cap allows it.
    pub(super) fn callee(
        &mut self,
        ctx: &Context,
        ret: &Ty,
        receiver: Option<&str>,
    ) -> SmithResult<Option<String>> {
        let existing = self
            .functions
            .random_complete(&mut self.rng, ret, receiver)
            .map(|sig| sig.name.clone());
        let can_grow = self.functions.len() < self.options.max_functions;

        match existing {
            Some(name) if !can_grow || self.rng.gen_bool(0.5) => Ok(Some(name)),
            _ if can_grow => self
                .synthesize_function(ctx, ret, receiver.map(str::to_string), None)
                .map(Some),
            existing => Ok(existing),
        }
    }

    /// Registers a new function, generates its body in a fresh scope and
    /// marks it complete. Parameter types are drawn at random unless given.
    pub(super) fn synthesize_function(
        &mut self,
        ctx: &Context,
        ret: &Ty,
        receiver: Option<String>,
        params: Option<Vec<Ty>>,
    ) -> SmithResult<String> {
        let name = self.idents.function();
        let params = match params {
            Some(params) => params,
            None => {
                let count = self.rng.gen_range(0..=self.options.max_params);
                (0..count)
                    .map(|_| self.random_type(true))
                    .collect::<SmithResult<Vec<_>>>()?
            }
        };
        self.functions.register(FunctionSig::new(
            name.clone(),
            params.clone(),
            ret.clone(),
            receiver.clone(),
        ));
        debug!(
            "synthesizing {}{}({}) -> {}",
            receiver
                .as_ref()
                .map(|r| format!("{}::", r))
                .unwrap_or_default(),
            name,
            params.len(),
            ret
        );

        let outer_scope = mem::replace(&mut self.scope, Scope::new());
        let outer_pending = mem::take(&mut self.pending);
        let params = params
            .into_iter()
            .enumerate()
            .map(|(idx, ty)| {
                let param = ident::param(idx);
                self.scope.declare(&param, ty.clone(), false);
                (param, ty)
            })
            .collect::<Vec<_>>();

        let body_ctx = ctx.for_function(&name, ret.clone(), receiver.clone());
        let count = self.rng.gen_range(1..=self.options.max_block_statements.max(1));
        let body = self.generate_block(&body_ctx, count, Some(body_ctx.return_ty()));
        self.scope = outer_scope;
        self.pending = outer_pending;

        let body = match body {
            Ok(body) => body,
            Err(err) => {
                self.functions.unregister(&name);
                return Err(err);
            }
        };

        if let Some(owner) = receiver.as_deref() {
            if let Some(def) = self.globals.struct_def_mut(owner) {
                def.method_count += 1;
            }
        }
        self.functions.complete(FunctionDef {
            name: name.clone(),
            params,
            ret: ret.clone(),
            receiver,
            body,
        });
        Ok(name)
    }

    /// Generates `main`: the argument prologue, the configured number of
    /// statements and the dump of every owned printable variable.
    pub fn generate_main(&mut self) -> SmithResult<FunctionDef> {
        let ctx = Context::new(self.options.max_depth);
        let body = self.generate_block(&ctx, self.options.statements, None)?;

        let vars = self
            .scope
            .current_variables()
            .into_iter()
            .filter(|name| {
                self.scope
                    .binding(name)
                    .map_or(false, |b| b.ty.is_printable())
            })
            .collect();

        let mut stmts = Vec::with_capacity(body.stmts.len() + 2);
        stmts.push(Stmt::CliArgs(self.globals.cli_args().to_vec()));
        stmts.extend(body.stmts);
        stmts.push(Stmt::Output {
            seed: self.seed,
            vars,
        });

        Ok(FunctionDef {
            name: str!("main"),
            params: vec![],
            ret: Ty::Unit,
            receiver: None,
            body: Block::new(stmts, None),
        })
    }
}
