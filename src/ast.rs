//! The minimal RevLang module/statement/expression contract consumed by the
//! lowering engine. The parser and semantic analyzer that produce these
//! values are out of scope (spec §1); this module only defines the shape
//! synthesis traverses, considered immutable once handed to a
//! [`crate::driver::SynthesisDriver`].

use rustc_hash::FxHashMap;

pub type LoopMap = FxHashMap<String, i64>;

/// A compile-time-evaluable integer expression: loop bounds, shift amounts
/// and numeric-literal values are all built from this, resolved against the
/// currently active loop variable bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberExpr {
    Literal(i64),
    LoopVariable(String),
    Neg(Box<NumberExpr>),
    BinOp(Box<NumberExpr>, NumOp, Box<NumberExpr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl NumberExpr {
    pub fn literal(value: i64) -> Self {
        NumberExpr::Literal(value)
    }

    pub fn evaluate(&self, loop_map: &LoopMap) -> i64 {
        match self {
            NumberExpr::Literal(v) => *v,
            NumberExpr::LoopVariable(name) => *loop_map.get(name).unwrap_or(&0),
            NumberExpr::Neg(inner) => -inner.evaluate(loop_map),
            NumberExpr::BinOp(lhs, op, rhs) => {
                let (l, r) = (lhs.evaluate(loop_map), rhs.evaluate(loop_map));
                match op {
                    NumOp::Add => l + r,
                    NumOp::Sub => l - r,
                    NumOp::Mul => l * r,
                    NumOp::Div => l / r,
                }
            }
        }
    }
}

/// The five RevLang variable kinds (spec §3's "originating RevLang variable",
/// generalized from SyReC's `in`/`out`/`inout`/`wire`/`state`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    In,
    Out,
    InOut,
    Wire,
    State,
}

impl VariableKind {
    /// `In` parameters and `Wire` locals never need their final value read
    /// back by the caller.
    pub fn is_garbage(self) -> bool {
        matches!(self, VariableKind::In | VariableKind::Wire)
    }

    /// Locals (`Wire`/`State`) get an anonymized internal qubit label so that
    /// inlining the same module body at different call sites never clashes;
    /// parameters keep their declared name since only the entry module's
    /// parameters ever get real qubits (nested calls alias instead).
    pub fn is_local(self) -> bool {
        matches!(self, VariableKind::Wire | VariableKind::State)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub dimensions: Vec<usize>,
    pub bitwidth: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableAccess {
    pub name: String,
    pub indices: Vec<NumberExpr>,
    pub range: Option<(NumberExpr, NumberExpr)>,
}

impl VariableAccess {
    pub fn whole(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            indices: Vec::new(),
            range: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Invert,
    Increment,
    Decrement,
}

impl UnaryOp {
    fn inverse(self) -> Self {
        match self {
            UnaryOp::Invert => UnaryOp::Invert,
            UnaryOp::Increment => UnaryOp::Decrement,
            UnaryOp::Decrement => UnaryOp::Increment,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Add,
    Subtract,
    Xor,
}

impl AssignOp {
    fn inverse(self) -> Self {
        match self {
            AssignOp::Add => AssignOp::Subtract,
            AssignOp::Subtract => AssignOp::Add,
            AssignOp::Xor => AssignOp::Xor,
        }
    }

}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Xor,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    LogicalAnd,
    LogicalOr,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,
    Equals,
    NotEquals,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryExprOp {
    BitwiseNot,
    LogicalNot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    Numeric {
        bitwidth: usize,
        value: NumberExpr,
    },
    Variable(VariableAccess),
    Binary {
        op: BinaryOp,
        bitwidth: usize,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Shift {
        op: ShiftOp,
        bitwidth: usize,
        lhs: Box<Expression>,
        amount: NumberExpr,
    },
    Unary {
        op: UnaryExprOp,
        bitwidth: usize,
        expr: Box<Expression>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatementKind {
    Skip,
    Swap {
        lhs: VariableAccess,
        rhs: VariableAccess,
    },
    Unary {
        op: UnaryOp,
        var: VariableAccess,
    },
    Assign {
        lhs: VariableAccess,
        op: AssignOp,
        rhs: Expression,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    For {
        from: Option<NumberExpr>,
        to: NumberExpr,
        step: Option<NumberExpr>,
        loop_variable: Option<String>,
        body: Vec<Statement>,
    },
    Call {
        target_module: String,
        args: Vec<String>,
    },
    Uncall {
        target_module: String,
        args: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub source_line: Option<usize>,
}

impl Statement {
    pub fn new(kind: StatementKind, source_line: Option<usize>) -> Self {
        Self { kind, source_line }
    }

    /// The semantic inverse used when lowering the body of an `Uncall`
    /// (spec §6's inversion table). `Skip`/`Swap`/bitwise-`Invert` are their
    /// own inverse; `For` swaps its bounds; `If`/`For` bodies are inverted
    /// statement-by-statement but NOT reversed here — the caller (the
    /// execution-order machinery in §4.9) is responsible for the reverse
    /// traversal of a module's top-level statement list. Nested blocks
    /// (`If`'s branches, `For`'s body) are reversed as part of inversion
    /// itself, since they are not re-visited by the outer traversal.
    pub fn inverse(&self) -> Statement {
        let kind = match &self.kind {
            StatementKind::Skip => StatementKind::Skip,
            StatementKind::Swap { lhs, rhs } => StatementKind::Swap {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            },
            StatementKind::Unary { op, var } => StatementKind::Unary {
                op: op.inverse(),
                var: var.clone(),
            },
            StatementKind::Assign { lhs, op, rhs } => StatementKind::Assign {
                lhs: lhs.clone(),
                op: op.inverse(),
                rhs: rhs.clone(),
            },
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => StatementKind::If {
                condition: condition.clone(),
                then_branch: invert_block(then_branch),
                else_branch: invert_block(else_branch),
            },
            StatementKind::For {
                from,
                to,
                step,
                loop_variable,
                body,
            } => StatementKind::For {
                from: Some(to.clone()),
                to: from.clone().unwrap_or(NumberExpr::Literal(1)),
                step: step.clone(),
                loop_variable: loop_variable.clone(),
                body: invert_block(body),
            },
            StatementKind::Call { target_module, args } => StatementKind::Uncall {
                target_module: target_module.clone(),
                args: args.clone(),
            },
            StatementKind::Uncall { target_module, args } => StatementKind::Call {
                target_module: target_module.clone(),
                args: args.clone(),
            },
        };
        Statement {
            kind,
            source_line: self.source_line,
        }
    }
}

fn invert_block(block: &[Statement]) -> Vec<Statement> {
    block.iter().rev().map(Statement::inverse).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub variables: Vec<Variable>,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub modules: Vec<Module>,
}

impl Program {
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}
