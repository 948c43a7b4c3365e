//! Statement lowering: the dispatch table of spec §4.8, plus call/uncall
//! inlining (spec §4.9).
//!
//! Every statement is lowered through [`StatementLowerer::lower`], which sets
//! the `associated_statement_line_number` global annotation before dispatch
//! (spec §6) so every gate the statement produces is labelled, matching
//! `onStatement`'s `setOrUpdateGlobalQuantumOperationAnnotation` call in
//! `syrec_synthesis.cpp`. `lower_module_body` is the execution-order-aware
//! entry point used both by the driver (always `Sequential`) and by call/
//! uncall lowering (possibly `InvertedReverse`).

use crate::ast::{AssignOp, Expression, Module, Statement, StatementKind, UnaryOp, VariableAccess};
use crate::call_stack::{CallFrame, CallStack};
use crate::error::{Error, Result};
use crate::execution_order::Order;
use crate::expr_lowerer::ExpressionLowerer;
use crate::context::LoweringContext;
use crate::{arithmetic, ast::Program};

pub struct StatementLowerer<'p> {
    program: &'p Program,
    expr: ExpressionLowerer,
}

impl<'p> StatementLowerer<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            expr: ExpressionLowerer::new(),
        }
    }

    /// Lowers a module body under the execution order currently on top of
    /// `ctx.execution_order` (`Sequential` unless called from within an
    /// active `Uncall`): forward in order, or reversed with each statement's
    /// semantic inverse substituted (spec §4.9 step 6).
    pub fn lower_module_body(&self, ctx: &mut LoweringContext, body: &[Statement]) -> Result<()> {
        match ctx.execution_order.current() {
            Order::Sequential => self.lower_block(ctx, body),
            Order::InvertedReverse => {
                for stmt in body.iter().rev() {
                    self.lower(ctx, &stmt.inverse())?;
                }
                Ok(())
            }
        }
    }

    /// Lowers a fixed statement list in its given order, with no execution-
    /// order substitution — used for `If`/`For` bodies, which were already
    /// reversed (if needed) by [`Statement::inverse`] at the point they were
    /// captured.
    fn lower_block(&self, ctx: &mut LoweringContext, block: &[Statement]) -> Result<()> {
        for stmt in block {
            self.lower(ctx, stmt)?;
        }
        Ok(())
    }

    pub fn lower(&self, ctx: &mut LoweringContext, stmt: &Statement) -> Result<()> {
        if let Some(line) = stmt.source_line {
            ctx.computation
                .set_global_annotation("associated_statement_line_number", line.to_string());
        }
        match &stmt.kind {
            StatementKind::Skip => Ok(()),
            StatementKind::Swap { lhs, rhs } => self.lower_swap(ctx, lhs, rhs),
            StatementKind::Unary { op, var } => self.lower_unary(ctx, *op, var),
            StatementKind::Assign { lhs, op, rhs } => self.lower_assign(ctx, lhs, *op, rhs),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(ctx, condition, then_branch, else_branch),
            StatementKind::For {
                from,
                to,
                step,
                loop_variable,
                body,
            } => self.lower_for(ctx, from.as_ref(), to, step.as_ref(), loop_variable.as_deref(), body),
            StatementKind::Call { target_module, args } => {
                self.lower_call(ctx, target_module, args, false, stmt.source_line)
            }
            StatementKind::Uncall { target_module, args } => {
                self.lower_call(ctx, target_module, args, true, stmt.source_line)
            }
        }
    }

    fn lower_swap(&self, ctx: &mut LoweringContext, lhs: &VariableAccess, rhs: &VariableAccess) -> Result<()> {
        let lhs_q = self.expr.resolve_access(ctx, lhs)?;
        let rhs_q = self.expr.resolve_access(ctx, rhs)?;
        arithmetic::swap_vectors(&mut ctx.computation, &ctx.control_stack, &lhs_q, &rhs_q)
    }

    fn lower_unary(&self, ctx: &mut LoweringContext, op: UnaryOp, var: &VariableAccess) -> Result<()> {
        let target = self.expr.resolve_access(ctx, var)?;
        match op {
            UnaryOp::Invert => arithmetic::bitwise_negation(&mut ctx.computation, &ctx.control_stack, &target),
            UnaryOp::Increment => arithmetic::increment(&mut ctx.computation, &mut ctx.control_stack, &target),
            UnaryOp::Decrement => arithmetic::decrement(&mut ctx.computation, &mut ctx.control_stack, &target),
        }
    }

    /// Resolves `lhs`, lowers `rhs` (which may itself allocate ancillaries
    /// for sub-expressions through [`ExpressionLowerer`]), then applies the
    /// in-place combiner: `increase`/`decrease`/bitwise-CNOT directly into
    /// the already-existing `lhs` qubits rather than a fresh destination —
    /// this is what keeps `a += b` down to the bare ripple-carry adder with
    /// no extra ancillaries (spec §8 scenario 1).
    fn lower_assign(&self, ctx: &mut LoweringContext, lhs: &VariableAccess, op: AssignOp, rhs: &Expression) -> Result<()> {
        let lhs_q = self.expr.resolve_access(ctx, lhs)?;
        let rhs_q = self.expr.lower(ctx, rhs)?;
        match op {
            AssignOp::Add => arithmetic::increase(&mut ctx.computation, &ctx.control_stack, &rhs_q, &lhs_q, None),
            AssignOp::Subtract => arithmetic::decrease(&mut ctx.computation, &ctx.control_stack, &rhs_q, &lhs_q),
            AssignOp::Xor => arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &lhs_q, &rhs_q),
        }
    }

    /// Guard-copy-then-scope-toggle pattern (spec §4.8, `onStatement(const
    /// IfStatement&)`): a plain-variable condition is copied through a CNOT
    /// into a fresh ancillary first, since either branch might otherwise
    /// write through the original condition qubit while it's an active
    /// control of this very scope.
    fn lower_if(&self, ctx: &mut LoweringContext, condition: &Expression, then_branch: &[Statement], else_branch: &[Statement]) -> Result<()> {
        let guard_q = self.expr.lower(ctx, condition)?;
        if guard_q.len() != 1 {
            return Err(Error::UnsupportedOperation(format!(
                "if condition must lower to a single qubit, got {}",
                guard_q.len()
            )));
        }
        let mut guard = guard_q[0];

        if matches!(condition, Expression::Variable(_)) {
            let inline_stack = ctx.inline_stack();
            let helper = ctx
                .allocator
                .allocate_ancillary(&mut ctx.computation, &mut ctx.control_stack, false, inline_stack)?;
            ctx.computation.emit_cnot(guard, helper, &ctx.control_stack)?;
            guard = helper;
        }

        ctx.control_stack.enter_scope();
        let result = (|| {
            ctx.control_stack.register(guard)?;
            self.lower_block(ctx, then_branch)?;
            ctx.control_stack.deregister(guard)?;
            ctx.computation.emit_not(guard, &ctx.control_stack)?;

            ctx.control_stack.register(guard)?;
            self.lower_block(ctx, else_branch)?;
            ctx.control_stack.deregister(guard)?;
            ctx.computation.emit_not(guard, &ctx.control_stack)?;
            Ok(())
        })();
        ctx.control_stack.leave_scope();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_for(
        &self,
        ctx: &mut LoweringContext,
        from: Option<&crate::ast::NumberExpr>,
        to: &crate::ast::NumberExpr,
        step: Option<&crate::ast::NumberExpr>,
        loop_variable: Option<&str>,
        body: &[Statement],
    ) -> Result<()> {
        let from = from.map_or(1, |e| e.evaluate(&ctx.loop_map));
        let to = to.evaluate(&ctx.loop_map);
        let step = step.map_or(1, |e| e.evaluate(&ctx.loop_map)).abs();
        if step == 0 {
            return Err(Error::UnsupportedOperation("for loop step must not be zero".into()));
        }

        let mut i = from;
        if from <= to {
            while i <= to {
                if let Some(name) = loop_variable {
                    ctx.loop_map.insert(name.to_string(), i);
                }
                self.lower_block(ctx, body)?;
                i += step;
            }
        } else {
            while i >= to {
                if let Some(name) = loop_variable {
                    ctx.loop_map.insert(name.to_string(), i);
                }
                self.lower_block(ctx, body)?;
                i -= step;
            }
        }
        if let Some(name) = loop_variable {
            ctx.loop_map.remove(name);
        }
        Ok(())
    }

    /// Inlines `target_module`'s body at the call site (spec §4.9). Formal
    /// parameters alias the caller's actual arguments; locals get their own
    /// fresh qubits; the call stack is snapshotted, a frame pushed, used for
    /// the duration of this call, then discarded so sibling calls never see
    /// it (see [`crate::call_stack`]'s module doc).
    fn lower_call(&self, ctx: &mut LoweringContext, target_module: &str, args: &[String], is_uncall: bool, source_line: Option<usize>) -> Result<()> {
        let callee = self.resolve_module(target_module)?;
        if args.len() != callee.parameters.len() {
            return Err(Error::UnsupportedOperation(format!(
                "{} to {target_module:?} passed {} argument(s) but the module declares {}",
                if is_uncall { "uncall" } else { "call" },
                args.len(),
                callee.parameters.len()
            )));
        }

        ctx.enter_module(target_module)?;

        let caller_frame = ctx.bindings.current_frame_index();
        ctx.bindings.push_frame();
        for (param, actual) in callee.parameters.iter().zip(args.iter()) {
            ctx.bindings.bind_alias(param.name.clone(), caller_frame, actual.clone())?;
        }
        for local in &callee.variables {
            let inline_stack = ctx.inline_stack();
            let base = ctx.allocator.allocate_variable(
                &mut ctx.computation,
                &mut ctx.control_stack,
                &local.name,
                local.kind.is_garbage(),
                local.kind.is_local(),
                &local.dimensions,
                local.bitwidth,
                inline_stack,
            )?;
            ctx.bindings
                .bind_direct(local.name.clone(), base, local.dimensions.clone(), local.bitwidth)?;
        }

        let previous_call_stack = ctx.call_stack.clone();
        if let Some(base) = &previous_call_stack {
            ctx.call_stack = Some(CallStack::push(
                base,
                CallFrame {
                    target_module: target_module.to_string(),
                    is_call: Some(!is_uncall),
                    source_line,
                },
            ));
        }

        let mark = if is_uncall { Order::InvertedReverse } else { Order::Sequential };
        ctx.execution_order.push(mark);

        let result = self.lower_module_body(ctx, &callee.statements);

        ctx.execution_order.pop();
        // Discarding the pushed stack (rather than mutating `previous_call_stack`
        // in place) is what keeps a later sibling call from seeing this frame.
        ctx.call_stack = previous_call_stack;
        ctx.bindings.pop_frame();
        ctx.leave_module(target_module);

        result
    }

    fn resolve_module(&self, name: &str) -> Result<&'p Module> {
        self.program
            .find_module(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))
    }
}
