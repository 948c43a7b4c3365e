//! End-to-end synthesis of `for` loops through [`SynthesisDriver::synthesize`]
//! (spec §4.8's loop-bound/step resolution against the active loop-variable
//! map).

mod test_utils;

use revsynth::ast::{AssignOp, Expression, Module, NumberExpr, Program, Statement, StatementKind, UnaryOp, VariableAccess, VariableKind};
use revsynth::properties::Properties;
use revsynth::SynthesisDriver;
use test_utils::{module, qrange, simulate, value_of, var};

fn run(m: Module) -> revsynth::computation::QuantumComputation {
    let program = Program { modules: vec![m] };
    let settings = Properties::new();
    let mut stats = Properties::new();
    SynthesisDriver::synthesize(&program, &settings, &mut stats).unwrap()
}

#[test]
fn forward_loop_accumulates_the_loop_variable_each_iteration() {
    // for i = 1 to 3 step 1 do sum += i od, sum := 1 + 2 + 3 = 6.
    let body = vec![Statement::new(
        StatementKind::Assign {
            lhs: VariableAccess::whole("sum"),
            op: AssignOp::Add,
            rhs: Expression::Numeric {
                bitwidth: 4,
                value: NumberExpr::LoopVariable("i".into()),
            },
        },
        None,
    )];
    let m = module(
        "main",
        vec![var("sum", VariableKind::InOut, 4)],
        vec![],
        vec![Statement::new(
            StatementKind::For {
                from: Some(NumberExpr::literal(1)),
                to: NumberExpr::literal(3),
                step: None,
                loop_variable: Some("i".into()),
                body,
            },
            None,
        )],
    );
    let qc = run(m);
    let sum = qrange(0, 4);
    let state = simulate(&qc, &[]);
    assert_eq!(value_of(&state, &sum), 6);
}

#[test]
fn backward_loop_with_explicit_step_runs_the_right_number_of_times() {
    // for i = 6 to 0 step 2 do ++= counter od runs at i = 6, 4, 2, 0: 4 times.
    let body = vec![Statement::new(
        StatementKind::Unary {
            op: UnaryOp::Increment,
            var: VariableAccess::whole("counter"),
        },
        None,
    )];
    let m = module(
        "main",
        vec![var("counter", VariableKind::InOut, 4)],
        vec![],
        vec![Statement::new(
            StatementKind::For {
                from: Some(NumberExpr::literal(6)),
                to: NumberExpr::literal(0),
                step: Some(NumberExpr::literal(2)),
                loop_variable: Some("i".into()),
                body,
            },
            None,
        )],
    );
    let qc = run(m);
    let counter = qrange(0, 4);
    let state = simulate(&qc, &[]);
    assert_eq!(value_of(&state, &counter), 4);
}

#[test]
fn negative_step_is_treated_as_its_unsigned_magnitude() {
    let body = vec![Statement::new(
        StatementKind::Unary {
            op: UnaryOp::Increment,
            var: VariableAccess::whole("counter"),
        },
        None,
    )];
    let m = module(
        "main",
        vec![var("counter", VariableKind::InOut, 4)],
        vec![],
        vec![Statement::new(
            StatementKind::For {
                from: Some(NumberExpr::literal(0)),
                to: NumberExpr::literal(4),
                step: Some(NumberExpr::Neg(Box::new(NumberExpr::literal(2)))),
                loop_variable: None,
                body,
            },
            None,
        )],
    );
    let qc = run(m);
    let counter = qrange(0, 4);
    // 0, 2, 4: 3 iterations, same as step = 2.
    let state = simulate(&qc, &[]);
    assert_eq!(value_of(&state, &counter), 3);
}

#[test]
fn nested_for_loops_multiply_iteration_counts() {
    let inner_body = vec![Statement::new(
        StatementKind::Unary {
            op: UnaryOp::Increment,
            var: VariableAccess::whole("counter"),
        },
        None,
    )];
    let outer_body = vec![Statement::new(
        StatementKind::For {
            from: Some(NumberExpr::literal(1)),
            to: NumberExpr::literal(3),
            step: None,
            loop_variable: None,
            body: inner_body,
        },
        None,
    )];
    let m = module(
        "main",
        vec![var("counter", VariableKind::InOut, 4)],
        vec![],
        vec![Statement::new(
            StatementKind::For {
                from: Some(NumberExpr::literal(1)),
                to: NumberExpr::literal(2),
                step: None,
                loop_variable: None,
                body: outer_body,
            },
            None,
        )],
    );
    let qc = run(m);
    let counter = qrange(0, 4);
    let state = simulate(&qc, &[]);
    assert_eq!(value_of(&state, &counter), 6, "2 outer iterations x 3 inner each");
}
