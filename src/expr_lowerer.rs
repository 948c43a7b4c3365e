//! Expression lowering: turns an [`Expression`](crate::ast::Expression) into
//! the qubit vector holding its value (spec §4.6).
//!
//! Every variant except `Variable` allocates a fresh, zero-initialized result
//! register and synthesizes into it; `Variable` resolves directly to the
//! qubits already backing that binding, no allocation involved. Matches
//! `onExpression`'s dispatch in the original engine, generalized to the
//! `BinaryOp`/`ShiftOp`/`UnaryExprOp` enumerations defined here.

use crate::arithmetic;
use crate::ast::{BinaryOp, Expression, ShiftOp, UnaryExprOp, VariableAccess};
use crate::context::LoweringContext;
use crate::error::{Error, Result};
use crate::qubit::QubitId;

pub struct ExpressionLowerer;

impl ExpressionLowerer {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn resolve_access(&self, ctx: &LoweringContext, access: &VariableAccess) -> Result<Vec<QubitId>> {
        let indices: Vec<usize> = access
            .indices
            .iter()
            .map(|expr| {
                let value = expr.evaluate(&ctx.loop_map);
                usize::try_from(value)
                    .map_err(|_| Error::UnsupportedOperation(format!("negative index {value} for {:?}", access.name)))
            })
            .collect::<Result<_>>()?;
        let bit_range = match &access.range {
            Some((lo, hi)) => {
                let lo = usize::try_from(lo.evaluate(&ctx.loop_map))
                    .map_err(|_| Error::UnsupportedOperation("negative bit-range bound".into()))?;
                let hi = usize::try_from(hi.evaluate(&ctx.loop_map))
                    .map_err(|_| Error::UnsupportedOperation("negative bit-range bound".into()))?;
                Some((lo, hi))
            }
            None => None,
        };
        ctx.bindings.resolve(&access.name, &indices, bit_range)
    }

    fn fresh_zero(&self, ctx: &mut LoweringContext, bitwidth: usize) -> Result<Vec<QubitId>> {
        let inline_stack = ctx.inline_stack();
        ctx.allocator
            .allocate_constant_lines(&mut ctx.computation, &mut ctx.control_stack, bitwidth, 0, inline_stack)
    }

    pub fn lower(&self, ctx: &mut LoweringContext, expr: &Expression) -> Result<Vec<QubitId>> {
        match expr {
            Expression::Numeric { bitwidth, value } => {
                let raw = value.evaluate(&ctx.loop_map);
                let inline_stack = ctx.inline_stack();
                ctx.allocator.allocate_constant_lines(
                    &mut ctx.computation,
                    &mut ctx.control_stack,
                    *bitwidth,
                    raw as u64,
                    inline_stack,
                )
            }
            Expression::Variable(access) => self.resolve_access(ctx, access),
            Expression::Binary { op, bitwidth, lhs, rhs } => self.lower_binary(ctx, *op, *bitwidth, lhs, rhs),
            Expression::Shift { op, bitwidth, lhs, amount } => self.lower_shift(ctx, *op, *bitwidth, lhs, amount),
            Expression::Unary { op, bitwidth, expr } => self.lower_unary(ctx, *op, *bitwidth, expr),
        }
    }

    fn lower_binary(
        &self,
        ctx: &mut LoweringContext,
        op: BinaryOp,
        bitwidth: usize,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Vec<QubitId>> {
        let lhs_q = self.lower(ctx, lhs)?;
        let rhs_q = self.lower(ctx, rhs)?;

        if let Some(cached) = ctx.find_repeat(op, &lhs_q, &rhs_q) {
            return Ok(cached);
        }

        let result = match op {
            BinaryOp::Add => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &dest, &rhs_q)?;
                arithmetic::increase(&mut ctx.computation, &ctx.control_stack, &lhs_q, &dest, None)?;
                dest
            }
            BinaryOp::Subtract => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q)?;
                arithmetic::decrease(&mut ctx.computation, &ctx.control_stack, &rhs_q, &dest)?;
                dest
            }
            BinaryOp::Xor => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q)?;
                arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &dest, &rhs_q)?;
                dest
            }
            BinaryOp::Multiply => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::multiplication(&mut ctx.computation, &mut ctx.control_stack, &dest, &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::Divide | BinaryOp::Modulo => {
                let quotient = self.fresh_zero(ctx, bitwidth)?;
                let remainder = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::division(&mut ctx.computation, &mut ctx.control_stack, &lhs_q, &rhs_q, &quotient, &remainder)?;
                if op == BinaryOp::Divide {
                    quotient
                } else {
                    remainder
                }
            }
            BinaryOp::BitwiseAnd | BinaryOp::LogicalAnd => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::bitwise_and(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::BitwiseOr | BinaryOp::LogicalOr => {
                let dest = self.fresh_zero(ctx, bitwidth)?;
                arithmetic::bitwise_or(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::LessThan => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::less_than(&mut ctx.computation, &mut ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::GreaterThan => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::greater_than(&mut ctx.computation, &mut ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::LessEquals => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::less_equals(&mut ctx.computation, &mut ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::GreaterEquals => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::greater_equals(&mut ctx.computation, &mut ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::Equals => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::equals(&mut ctx.computation, &ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
            BinaryOp::NotEquals => {
                let dest = self.fresh_zero(ctx, 1)?;
                arithmetic::not_equals(&mut ctx.computation, &ctx.control_stack, dest[0], &lhs_q, &rhs_q)?;
                dest
            }
        };

        ctx.record_repeat(op, lhs_q, rhs_q, result.clone());
        Ok(result)
    }

    fn lower_shift(
        &self,
        ctx: &mut LoweringContext,
        op: ShiftOp,
        bitwidth: usize,
        lhs: &Expression,
        amount: &crate::ast::NumberExpr,
    ) -> Result<Vec<QubitId>> {
        let lhs_q = self.lower(ctx, lhs)?;
        let amount = usize::try_from(amount.evaluate(&ctx.loop_map))
            .map_err(|_| Error::UnsupportedOperation("negative shift amount".into()))?;
        let dest = self.fresh_zero(ctx, bitwidth)?;
        match op {
            ShiftOp::Left => arithmetic::left_shift(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q, amount)?,
            ShiftOp::Right => arithmetic::right_shift(&mut ctx.computation, &ctx.control_stack, &dest, &lhs_q, amount)?,
        }
        Ok(dest)
    }

    fn lower_unary(&self, ctx: &mut LoweringContext, op: UnaryExprOp, bitwidth: usize, expr: &Expression) -> Result<Vec<QubitId>> {
        let inner = self.lower(ctx, expr)?;
        if op == UnaryExprOp::LogicalNot && inner.len() != 1 {
            return Err(Error::UnsupportedOperation(format!(
                "logical negation requires a single-bit operand, got {}",
                inner.len()
            )));
        }
        let dest = self.fresh_zero(ctx, bitwidth)?;
        arithmetic::bitwise_cnot(&mut ctx.computation, &ctx.control_stack, &dest, &inner)?;
        match op {
            UnaryExprOp::BitwiseNot | UnaryExprOp::LogicalNot => {
                arithmetic::bitwise_negation(&mut ctx.computation, &ctx.control_stack, &dest)?;
            }
        }
        Ok(dest)
    }
}

impl Default for ExpressionLowerer {
    fn default() -> Self {
        Self::new()
    }
}
