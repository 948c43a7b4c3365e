//! Synthesis entry point (spec §4.10): resolve the entry module, allocate its
//! parameters and locals, lower its body, freeze ancillaries, and report the
//! `runtime` statistic.

use std::time::Instant;

use log::debug;

use crate::ast::{Module, Program};
use crate::call_stack::{CallFrame, CallStack};
use crate::computation::QuantumComputation;
use crate::context::LoweringContext;
use crate::error::{Error, Result};
use crate::properties::{self, Properties};
use crate::stmt_lowerer::StatementLowerer;

pub struct SynthesisDriver;

impl SynthesisDriver {
    /// Synthesizes `program` into a [`QuantumComputation`], consulting
    /// `settings` for the two documented configuration keys and writing the
    /// `runtime` statistic into `statistics` on success.
    pub fn synthesize(program: &Program, settings: &Properties, statistics: &mut Properties) -> Result<QuantumComputation> {
        let mut ctx = LoweringContext::new(settings.get_or(properties::GENERATE_INLINE_DEBUG_INFORMATION, false));

        if !ctx.execution_order.is_empty() {
            return Err(Error::UnsupportedOperation("execution order stack must be empty/Sequential at synthesis start".into()));
        }

        let entry_name = resolve_entry_module_name(program, settings)?;
        let entry = program
            .find_module(&entry_name)
            .ok_or_else(|| Error::UnknownModule(entry_name.clone()))?;

        if ctx.debug_info {
            ctx.call_stack = Some(CallStack::seed(CallFrame {
                target_module: entry_name.clone(),
                is_call: None,
                source_line: None,
            }));
        }

        let start = Instant::now();

        ctx.enter_module(&entry_name)?;
        Self::allocate_entry_variables(&mut ctx, entry)?;

        let lowerer = StatementLowerer::new(program);
        let lowering_result = lowerer.lower_module_body(&mut ctx, &entry.statements);
        ctx.leave_module(&entry_name);
        lowering_result?;

        ctx.allocator.freeze(&mut ctx.computation);

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        statistics.set(properties::RUNTIME, elapsed_ms);

        Ok(ctx.computation)
    }

    fn allocate_entry_variables(ctx: &mut LoweringContext, entry: &Module) -> Result<()> {
        for param in &entry.parameters {
            let inline_stack = ctx.inline_stack();
            let base = ctx.allocator.allocate_variable(
                &mut ctx.computation,
                &mut ctx.control_stack,
                &param.name,
                param.kind.is_garbage(),
                false,
                &param.dimensions,
                param.bitwidth,
                inline_stack,
            )?;
            ctx.bindings
                .bind_direct(param.name.clone(), base, param.dimensions.clone(), param.bitwidth)?;
        }
        for local in &entry.variables {
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
        Ok(())
    }
}

/// Entry module resolution (spec §4.10 step 2): an explicit
/// `main_module_identifier` setting wins; otherwise fall back to a module
/// literally named `main`; otherwise the first module declared in the
/// program.
fn resolve_entry_module_name(program: &Program, settings: &Properties) -> Result<String> {
    if let Some(name) = settings.get::<String>(properties::MAIN_MODULE_IDENTIFIER) {
        return if program.find_module(&name).is_some() {
            Ok(name)
        } else {
            Err(Error::UnknownModule(name))
        };
    }
    if program.find_module("main").is_some() {
        debug!("no {} configured; resolving entry module to \"main\"", properties::MAIN_MODULE_IDENTIFIER);
        return Ok("main".to_string());
    }
    program
        .modules
        .first()
        .map(|m| m.name.clone())
        .ok_or_else(|| Error::UnknownModule("<program has no modules>".into()))
}
