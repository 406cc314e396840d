use crate::{ast::Expr, typing::ty::Ty, utils::indent};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl {
        name: String,
        ty: Ty,
        mutable: bool,
        value: Expr,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then: Block,
        otherwise: Option<Block>,
    },
    For {
        iterations: u32,
        body: Block,
    },
    /// Binds every requested command-line argument, in request order.
    CliArgs(Vec<(String, Ty)>),
    /// Prints the seed and then the debug form of each named variable.
    Output {
        seed: u64,
        vars: Vec<String>,
    },
}

impl Stmt {
    /// Calls `f` on every expression in this statement and in nested blocks,
    /// in evaluation order.
    pub fn walk_exprs<F: FnMut(&Expr)>(&self, f: &mut F) {
        match self {
            Stmt::Decl { value, .. } | Stmt::Assign { value, .. } | Stmt::Expr(value) => {
                value.walk(f)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                cond.walk(f);
                then.walk_exprs(f);
                if let Some(otherwise) = otherwise {
                    otherwise.walk_exprs(f);
                }
            }
            Stmt::For { body, .. } => body.walk_exprs(f),
            Stmt::CliArgs(_) | Stmt::Output { .. } => {}
        }
    }
}

impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Decl {
                name,
                ty,
                mutable,
                value,
            } => write!(
                f,
                "let {}{}: {} = {};",
                if *mutable { "mut " } else { "" },
                name,
                ty,
                value
            ),
            Stmt::Assign { name, value } => write!(f, "{} = {};", name, value),
            Stmt::Expr(e) => write!(f, "{};", e),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                write!(f, "if {} {{\n{}\n}}", cond, indent(then.to_string(), 1))?;
                if let Some(otherwise) = otherwise {
                    write!(f, " else {{\n{}\n}}", indent(otherwise.to_string(), 1))?;
                }
                Ok(())
            }
            Stmt::For { iterations, body } => write!(
                f,
                "for _ in 0..{}u32 {{\n{}\n}}",
                iterations,
                indent(body.to_string(), 1)
            ),
            Stmt::CliArgs(args) => {
                if args.is_empty() {
                    return Ok(());
                }
                write!(f, "let cli_args: Vec<String> = std::env::args().collect();")?;
                for (i, (name, ty)) in args.iter().enumerate() {
                    write!(
                        f,
                        "\nlet {}: {} = cli_args.get({}).and_then(|arg| arg.parse::<{}>().ok()).unwrap_or_default();",
                        name,
                        ty,
                        i + 1,
                        ty
                    )?;
                }
                Ok(())
            }
            Stmt::Output { seed, vars } => {
                write!(f, "println!(\"Program Seed: {{:?}}\", {}u64);", seed)?;
                for var in vars {
                    write!(f, "\nprintln!(\"{{:?}}\", {});", var)?;
                }
                Ok(())
            }
        }
    }
}

/// A braced sequence of statements with an optional trailing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub tail: Option<Expr>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, tail: Option<Expr>) -> Block {
        Block { stmts, tail }
    }

    pub fn walk_exprs<F: FnMut(&Expr)>(&self, f: &mut F) {
        for stmt in self.stmts.iter() {
            stmt.walk_exprs(f);
        }
        if let Some(tail) = &self.tail {
            tail.walk(f);
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lines = self
            .stmts
            .iter()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if let Some(tail) = &self.tail {
            lines.push(tail.to_string());
        }
        write!(f, "{}", lines.join("\n"))
    }
}
