//! End-to-end tests against a real solver.
//!
//! Each test skips silently when no z3 binary is on PATH, so the suite stays
//! green on machines without a solver installed.

use kestrel_ir::{Expr, Namespace, StructComponent, StructDefinition, Type};
use kestrel_smt::{find_executable, CheckSatResponse, IncrementalSolver, SolverConfig};

fn solver_config() -> Option<SolverConfig> {
    find_executable("z3").map(SolverConfig::with_solver)
}

fn u8_symbol(name: &str) -> Expr {
    Expr::symbol(name, Type::UnsignedBv(8))
}

fn u8_literal(value: u8) -> Expr {
    Expr::bv_literal(value, Type::UnsignedBv(8))
}

#[test]
fn satisfiable_equality_produces_the_asserted_value() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let x = u8_symbol("x");
    solver
        .set_to(&Expr::equal(x.clone(), u8_literal(3)), true)
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(solver.get(&x).unwrap(), u8_literal(3));
}

#[test]
fn contradictory_equalities_are_unsatisfiable() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let x = u8_symbol("x");
    solver
        .set_to(&Expr::equal(x.clone(), u8_literal(3)), true)
        .unwrap();
    solver
        .set_to(&Expr::equal(x, u8_literal(4)), true)
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Unsat);
    assert_eq!(solver.number_of_solver_calls(), 1);
}

#[test]
fn popping_a_scope_discards_its_assertions() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let x = u8_symbol("x");
    solver
        .set_to(&Expr::equal(x.clone(), u8_literal(3)), true)
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);

    solver.push().unwrap();
    solver
        .set_to(&Expr::equal(x.clone(), u8_literal(4)), true)
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Unsat);
    solver.pop().unwrap();

    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(solver.get(&x).unwrap(), u8_literal(3));
    assert_eq!(solver.number_of_solver_calls(), 3);
}

#[test]
fn handles_are_reusable_across_checks() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let x = u8_symbol("x");
    let condition = Expr::equal(x.clone(), u8_literal(3));
    let handle = solver.handle(&condition).unwrap();

    solver.set_to(&handle, true).unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(solver.get(&handle).unwrap(), Expr::bool_literal(true));

    solver.push().unwrap();
    solver.set_to(&handle, false).unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    let other = solver.get(&x).unwrap();
    assert_ne!(other, u8_literal(3));
    solver.pop().unwrap();
}

#[test]
fn struct_members_survive_an_update_round_trip() {
    let Some(config) = solver_config() else {
        return;
    };
    let mut ns = Namespace::new();
    ns.declare_struct(
        "packet",
        StructDefinition::new(vec![
            StructComponent::new("a", Type::UnsignedBv(8)),
            StructComponent::new("b", Type::UnsignedBv(8)),
            StructComponent::new("c", Type::UnsignedBv(16)),
        ]),
    );
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let p = Expr::symbol("p", Type::StructTag("packet".into()));
    let q = Expr::symbol("q", Type::StructTag("packet".into()));

    // q is p with b overwritten; a and c pass through, b reads back as
    // written.
    let updated = Expr::update(
        p.clone(),
        vec![("b".into(), u8_literal(9))],
        &ns,
    );
    solver.set_to(&Expr::equal(q.clone(), updated), true).unwrap();
    solver
        .set_to(
            &Expr::equal(Expr::member(p.clone(), "a", &ns), u8_literal(1)),
            true,
        )
        .unwrap();
    solver
        .set_to(
            &Expr::equal(
                Expr::member(p, "c", &ns),
                Expr::bv_literal(513u16, Type::UnsignedBv(16)),
            ),
            true,
        )
        .unwrap();

    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(
        solver.get(&Expr::member(q.clone(), "a", &ns)).unwrap(),
        u8_literal(1)
    );
    assert_eq!(
        solver.get(&Expr::member(q.clone(), "b", &ns)).unwrap(),
        u8_literal(9)
    );
    assert_eq!(
        solver.get(&Expr::member(q, "c", &ns)).unwrap(),
        Expr::bv_literal(513u16, Type::UnsignedBv(16))
    );
}

#[test]
fn object_sizes_constrain_the_model() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let x = Expr::symbol("x", Type::UnsignedBv(32));
    let size = Expr::object_size(Expr::address_of(x));
    solver
        .set_to(
            &Expr::equal(size.clone(), Expr::bv_literal(4u8, Type::size_type())),
            true,
        )
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(
        solver.get(&size).unwrap(),
        Expr::bv_literal(4u8, Type::size_type())
    );

    // The size is pinned by the first association, so a contradiction is
    // unsatisfiable.
    solver
        .set_to(
            &Expr::equal(size, Expr::bv_literal(8u8, Type::size_type())),
            true,
        )
        .unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Unsat);
}

#[test]
fn dump_mode_writes_the_command_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.smt2");
    let config = SolverConfig {
        dump_path: Some(path.clone()),
        ..SolverConfig::default()
    };

    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();
    let x = u8_symbol("x");
    solver
        .set_to(&Expr::equal(x, u8_literal(3)), true)
        .unwrap();
    // No solver is attached, so checking is unavailable.
    assert!(solver.solve().is_err());
    drop(solver);

    let dumped = std::fs::read_to_string(path).unwrap();
    assert_eq!(
        dumped.lines().collect::<Vec<_>>(),
        [
            "(set-option :produce-models true)",
            "(set-logic QF_AUFBV)",
            "(declare-fun x () (_ BitVec 8))",
            "(assert (= x (_ bv3 8)))",
            "(check-sat)"
        ]
    );
}

#[test]
fn arrays_read_back_stored_elements() {
    let Some(config) = solver_config() else {
        return;
    };
    let ns = Namespace::new();
    let mut solver = IncrementalSolver::new(&ns, &config).unwrap();

    let array = Expr::symbol("arr", Type::array(Type::UnsignedBv(8), 4));
    let index = Expr::bv_literal(2u8, Type::UnsignedBv(64));
    let stored = Expr::array_update(array, index.clone(), u8_literal(7));
    let read = Expr::index(stored, index);
    solver.set_to(&Expr::equal(read.clone(), u8_literal(7)), true).unwrap();
    assert_eq!(solver.solve().unwrap(), CheckSatResponse::Sat);
    assert_eq!(solver.get(&read).unwrap(), u8_literal(7));
}
