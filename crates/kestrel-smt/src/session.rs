//! Incremental decision procedure
//!
//! One session owns one solver subprocess and a monotone stream of SMT-LIB
//! commands. Expressions are lowered through the struct encoding and the
//! term converter, identifiers are declared on first sight, and repeated
//! subexpressions are bound once to generated `define-fun` names so later
//! assertions and model queries can refer to them by name.
//!
//! Assertion scopes map directly onto solver `push`/`pop`. Definitions and
//! declarations made inside a scope are rolled back with it, keeping the
//! client caches aligned with what the solver still knows.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use kestrel_ir::{Expr, Namespace, Type};

use crate::config::SolverConfig;
use crate::convert::ConversionContext;
use crate::error::{SmtError, SmtResult};
use crate::smtlib::{parse_check_sat_response, parse_value_response, CheckSatResponse, Command, ModelValue};
use crate::solver::{SolverDriver, SolverProcess};
use crate::struct_encoding::StructEncoding;
use crate::term::{Identifier, Term};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// No result is available for model queries
    NoResult,
    /// The last check returned a result
    Checked(CheckSatResponse),
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    defined_len: usize,
    declared_len: usize,
}

/// An incremental solver session over one namespace.
pub struct IncrementalSolver<'ns> {
    ns: &'ns Namespace,
    encoding: StructEncoding<'ns>,
    context: ConversionContext,
    driver: SolverDriver,
    /// Expressions bound to a generated `define-fun` name
    defined: FxHashMap<Expr, Identifier>,
    defined_journal: Vec<Expr>,
    /// Constant names already declared to the solver
    declared: FxHashSet<String>,
    declared_journal: Vec<String>,
    scopes: Vec<Scope>,
    sequence: u64,
    solver_calls: u64,
    state: SessionState,
    object_sizes_declared: bool,
}

impl<'ns> IncrementalSolver<'ns> {
    /// Launch the configured solver and perform the handshake. When the
    /// config names a dump path, commands are written there instead of to a
    /// solver and satisfiability checks become unavailable.
    pub fn new(ns: &'ns Namespace, config: &SolverConfig) -> SmtResult<Self> {
        let driver = match &config.dump_path {
            Some(path) => SolverDriver::Dump(Box::new(std::fs::File::create(path)?)),
            None => SolverDriver::Process(SolverProcess::spawn(&config.command)?),
        };
        Self::with_driver(ns, driver, &config.logic)
    }

    /// Build a session over an existing driver and perform the handshake.
    /// This is how tests observe the command stream.
    pub fn with_driver(
        ns: &'ns Namespace,
        driver: SolverDriver,
        logic: &str,
    ) -> SmtResult<Self> {
        let mut session = Self {
            ns,
            encoding: StructEncoding::new(ns),
            context: ConversionContext::new(),
            driver,
            defined: FxHashMap::default(),
            defined_journal: Vec::new(),
            declared: FxHashSet::default(),
            declared_journal: Vec::new(),
            scopes: Vec::new(),
            sequence: 0,
            solver_calls: 0,
            state: SessionState::NoResult,
            object_sizes_declared: false,
        };
        session.driver.send(&Command::SetOptionProduceModels(true))?;
        session.driver.send(&Command::SetLogic(logic.to_string()))?;
        Ok(session)
    }

    /// Commands sent so far, when the driver records them.
    pub fn sent_commands(&self) -> &[String] {
        self.driver.sent_commands()
    }

    /// Number of `check-sat` commands issued so far.
    pub fn number_of_solver_calls(&self) -> u64 {
        self.solver_calls
    }

    /// Assert that `expr` takes the given boolean value.
    pub fn set_to(&mut self, expr: &Expr, value: bool) -> SmtResult<()> {
        assert_eq!(expr.ty, Type::Bool, "set_to requires a boolean expression");
        debug!(%expr, value, "assert");
        let term = self.lower(expr)?;
        let term = if value { term } else { Term::not(term) };
        self.driver.send(&Command::Assert(term))?;
        self.state = SessionState::NoResult;
        Ok(())
    }

    /// Bind `expr` to a generated name and return an expression standing for
    /// it. Later assertions and model queries over the handle refer to the
    /// one definition instead of repeating the lowering.
    pub fn handle(&mut self, expr: &Expr) -> SmtResult<Expr> {
        let identifier = self.define_function(expr)?;
        let ty = self.encoding.encode_type(&expr.ty)?;
        Ok(Expr::symbol(identifier.name, ty))
    }

    /// Bind `expr` to a generated `define-fun` name, sending the definition
    /// on first sight and reusing it afterwards.
    pub fn define_function(&mut self, expr: &Expr) -> SmtResult<Identifier> {
        if let Some(identifier) = self.defined.get(expr) {
            return Ok(identifier.clone());
        }
        let term = self.lower(expr)?;
        let identifier = Identifier::new(format!("B{}", self.sequence), term.sort());
        self.sequence += 1;
        self.driver.send(&Command::DefineFun {
            identifier: identifier.clone(),
            body: term,
        })?;
        self.defined.insert(expr.clone(), identifier.clone());
        self.defined_journal.push(expr.clone());
        Ok(identifier)
    }

    /// Open one assertion scope.
    pub fn push(&mut self) -> SmtResult<()> {
        self.scopes.push(Scope {
            defined_len: self.defined_journal.len(),
            declared_len: self.declared_journal.len(),
        });
        self.driver.send(&Command::Push)?;
        self.state = SessionState::NoResult;
        Ok(())
    }

    /// Close the innermost assertion scope, discarding the assertions,
    /// definitions and declarations made inside it.
    pub fn pop(&mut self) -> SmtResult<()> {
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| panic!("pop without a matching push"));
        for expr in self.defined_journal.drain(scope.defined_len..) {
            self.defined.remove(&expr);
        }
        for name in self.declared_journal.drain(scope.declared_len..) {
            self.declared.remove(&name);
        }
        self.driver.send(&Command::Pop)?;
        self.state = SessionState::NoResult;
        Ok(())
    }

    /// Check satisfiability of the current assertion set.
    pub fn solve(&mut self) -> SmtResult<CheckSatResponse> {
        self.driver.send(&Command::CheckSat)?;
        self.solver_calls += 1;
        let line = self.driver.receive_line()?;
        let response = parse_check_sat_response(&line)?;
        debug!(?response, calls = self.solver_calls, "check-sat");
        self.state = SessionState::Checked(response);
        Ok(response)
    }

    /// Query the model value of `expr` after a satisfiable check. The result
    /// is a literal expression of the lowered type.
    pub fn get(&mut self, expr: &Expr) -> SmtResult<Expr> {
        if self.state != SessionState::Checked(CheckSatResponse::Sat) {
            return Err(SmtError::NoModel);
        }
        let term = match self.defined.get(expr) {
            Some(identifier) => Term::identifier(identifier.clone()),
            None => self.lower(expr)?,
        };
        // Lowering a fresh pointer expression asserts size constraints the
        // checked model never saw.
        if self.state != SessionState::Checked(CheckSatResponse::Sat) {
            return Err(SmtError::NoModel);
        }
        let sort = term.sort();
        self.driver.send(&Command::GetValue(term))?;
        let response = self.driver.receive_balanced()?;
        let ty = self.encoding.encode_type(&expr.ty)?;
        match parse_value_response(&response, &sort)? {
            ModelValue::Bool(value) => Ok(Expr::bool_literal(value)),
            ModelValue::BitVector { value, width } => {
                // Pointer-typed queries come back as their bitvector
                // encoding.
                let ty = if ty.is_bitvector() {
                    ty
                } else {
                    Type::UnsignedBv(width)
                };
                Ok(Expr::bv_literal(value, ty))
            }
        }
    }

    /// Encode, convert and declare everything `expr` needs.
    fn lower(&mut self, expr: &Expr) -> SmtResult<Term> {
        let encoded = self.encoding.encode_expr(expr)?;
        let term = self.context.convert_expr_to_term(&encoded, self.ns)?;
        if self.context.uses_object_sizes() && !self.object_sizes_declared {
            self.driver.send(&self.context.object_size_declaration())?;
            self.object_sizes_declared = true;
        }
        self.declare_identifiers(&term)?;
        let constraints = self.context.take_side_constraints();
        if !constraints.is_empty() {
            self.state = SessionState::NoResult;
        }
        for constraint in constraints {
            self.declare_identifiers(&constraint)?;
            self.driver.send(&Command::Assert(constraint))?;
        }
        Ok(term)
    }

    fn declare_identifiers(&mut self, term: &Term) -> SmtResult<()> {
        let mut fresh = Vec::new();
        term.for_each_identifier(&mut |identifier| {
            if !self.declared.contains(&identifier.name) && !self.defined_name(&identifier.name) {
                fresh.push(identifier.clone());
            }
        });
        for identifier in fresh {
            if !self.declared.insert(identifier.name.clone()) {
                continue;
            }
            self.declared_journal.push(identifier.name.clone());
            self.driver.send(&Command::DeclareFun {
                identifier,
                parameters: vec![],
            })?;
        }
        Ok(())
    }

    /// Whether `name` is one of the generated `define-fun` names, which must
    /// not be re-declared as constants when a handle is lowered again.
    fn defined_name(&self, name: &str) -> bool {
        self.defined.values().any(|identifier| identifier.name == name)
    }
}

impl std::fmt::Debug for IncrementalSolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalSolver")
            .field("defined", &self.defined.len())
            .field("declared", &self.declared.len())
            .field("scopes", &self.scopes.len())
            .field("solver_calls", &self.solver_calls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_ir::{StructComponent, StructDefinition};

    fn recording_session<'ns>(
        ns: &'ns Namespace,
        responses: &[&str],
    ) -> IncrementalSolver<'ns> {
        let driver = SolverDriver::recording(responses.iter().map(|s| s.to_string()));
        IncrementalSolver::with_driver(ns, driver, "QF_AUFBV").unwrap()
    }

    fn x_equals_3() -> Expr {
        Expr::equal(
            Expr::symbol("x", Type::UnsignedBv(8)),
            Expr::bv_literal(3u8, Type::UnsignedBv(8)),
        )
    }

    // ==================== Handshake Tests ====================

    #[test]
    fn test_handshake_precedes_everything() {
        let ns = Namespace::new();
        let session = recording_session(&ns, &[]);
        assert_eq!(
            session.sent_commands(),
            ["(set-option :produce-models true)", "(set-logic QF_AUFBV)"]
        );
    }

    // ==================== Assertion Tests ====================

    #[test]
    fn test_set_to_declares_then_asserts() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        session.set_to(&x_equals_3(), true).unwrap();
        assert_eq!(
            &session.sent_commands()[2..],
            [
                "(declare-fun x () (_ BitVec 8))",
                "(assert (= x (_ bv3 8)))"
            ]
        );
    }

    #[test]
    fn test_set_to_false_negates() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        session.set_to(&x_equals_3(), false).unwrap();
        assert_eq!(
            session.sent_commands().last().unwrap(),
            "(assert (not (= x (_ bv3 8))))"
        );
    }

    #[test]
    fn test_symbols_declared_once() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        session.set_to(&x_equals_3(), true).unwrap();
        session.set_to(&x_equals_3(), true).unwrap();
        let declarations = session
            .sent_commands()
            .iter()
            .filter(|command| command.starts_with("(declare-fun"))
            .count();
        assert_eq!(declarations, 1);
    }

    #[test]
    #[should_panic(expected = "boolean expression")]
    fn test_set_to_rejects_non_boolean() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let _ = session.set_to(&Expr::symbol("x", Type::UnsignedBv(8)), true);
    }

    // ==================== Definition Tests ====================

    #[test]
    fn test_define_function_is_memoized() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let first = session.define_function(&x_equals_3()).unwrap();
        let second = session.define_function(&x_equals_3()).unwrap();
        assert_eq!(first, second);
        let definitions = session
            .sent_commands()
            .iter()
            .filter(|command| command.starts_with("(define-fun"))
            .count();
        assert_eq!(definitions, 1);
    }

    #[test]
    fn test_distinct_expressions_get_distinct_names() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let y = Expr::equal(
            Expr::symbol("y", Type::UnsignedBv(8)),
            Expr::bv_literal(4u8, Type::UnsignedBv(8)),
        );
        let first = session.define_function(&x_equals_3()).unwrap();
        let second = session.define_function(&y).unwrap();
        assert_eq!(first.name, "B0");
        assert_eq!(second.name, "B1");
    }

    #[test]
    fn test_handle_is_usable_in_later_assertions() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let handle = session.handle(&x_equals_3()).unwrap();
        assert_eq!(handle.ty, Type::Bool);
        session.set_to(&handle, true).unwrap();
        assert_eq!(session.sent_commands().last().unwrap(), "(assert B0)");
    }

    // ==================== Scope Tests ====================

    #[test]
    fn test_push_pop_send_stack_commands() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        session.push().unwrap();
        session.pop().unwrap();
        assert_eq!(&session.sent_commands()[2..], ["(push 1)", "(pop 1)"]);
    }

    #[test]
    #[should_panic(expected = "pop without a matching push")]
    fn test_unbalanced_pop_panics() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let _ = session.pop();
    }

    #[test]
    fn test_pop_discards_scoped_definitions() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        session.push().unwrap();
        session.define_function(&x_equals_3()).unwrap();
        session.pop().unwrap();
        // The definition left with its scope, so it is sent again.
        session.define_function(&x_equals_3()).unwrap();
        let definitions = session
            .sent_commands()
            .iter()
            .filter(|command| command.starts_with("(define-fun"))
            .count();
        assert_eq!(definitions, 2);
    }

    // ==================== Solve and Model Tests ====================

    #[test]
    fn test_solve_counts_calls() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &["sat", "unsat"]);
        assert_eq!(session.number_of_solver_calls(), 0);
        assert_eq!(session.solve().unwrap(), CheckSatResponse::Sat);
        assert_eq!(session.solve().unwrap(), CheckSatResponse::Unsat);
        assert_eq!(session.number_of_solver_calls(), 2);
    }

    #[test]
    fn test_get_without_sat_result_is_an_error() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &["unsat"]);
        let x = Expr::symbol("x", Type::UnsignedBv(8));
        assert!(matches!(session.get(&x), Err(SmtError::NoModel)));
        session.solve().unwrap();
        assert!(matches!(session.get(&x), Err(SmtError::NoModel)));
    }

    #[test]
    fn test_get_returns_a_literal() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &["sat", "((x #x03))"]);
        session.set_to(&x_equals_3(), true).unwrap();
        session.solve().unwrap();
        let x = Expr::symbol("x", Type::UnsignedBv(8));
        let value = session.get(&x).unwrap();
        assert_eq!(value, Expr::bv_literal(3u8, Type::UnsignedBv(8)));
    }

    #[test]
    fn test_assertion_invalidates_the_model() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &["sat"]);
        session.set_to(&x_equals_3(), true).unwrap();
        session.solve().unwrap();
        session.set_to(&x_equals_3(), true).unwrap();
        let x = Expr::symbol("x", Type::UnsignedBv(8));
        assert!(matches!(session.get(&x), Err(SmtError::NoModel)));
    }

    #[test]
    fn test_get_on_a_fresh_pointer_expression_needs_a_recheck() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &["sat"]);
        session.set_to(&x_equals_3(), true).unwrap();
        session.solve().unwrap();
        // Lowering this asserts a size constraint the model never saw.
        let y = Expr::symbol("y", Type::UnsignedBv(32));
        let size = Expr::object_size(Expr::address_of(y));
        assert!(matches!(session.get(&size), Err(SmtError::NoModel)));
        let get_values = session
            .sent_commands()
            .iter()
            .filter(|command| command.starts_with("(get-value"))
            .count();
        assert_eq!(get_values, 0);
    }

    // ==================== Struct Lowering Tests ====================

    #[test]
    fn test_struct_member_assertions_lower_to_extractions() {
        let mut ns = Namespace::new();
        ns.declare_struct(
            "pair",
            StructDefinition::new(vec![
                StructComponent::new("a", Type::UnsignedBv(8)),
                StructComponent::new("b", Type::UnsignedBv(8)),
            ]),
        );
        let mut session = recording_session(&ns, &[]);
        let p = Expr::symbol("p", Type::StructTag("pair".into()));
        let member = Expr::member(p, "a", &ns);
        let assertion = Expr::equal(member, Expr::bv_literal(7u8, Type::UnsignedBv(8)));
        session.set_to(&assertion, true).unwrap();
        assert_eq!(
            &session.sent_commands()[2..],
            [
                "(declare-fun p () (_ BitVec 16))",
                "(assert (= ((_ extract 15 8) p) (_ bv7 8)))"
            ]
        );
    }

    #[test]
    fn test_pointer_assertions_emit_size_constraints() {
        let ns = Namespace::new();
        let mut session = recording_session(&ns, &[]);
        let x = Expr::symbol("x", Type::UnsignedBv(32));
        let p = Expr::address_of(x);
        let size = Expr::object_size(p);
        let assertion = Expr::equal(size, Expr::bv_literal(4u8, Type::size_type()));
        session.set_to(&assertion, true).unwrap();
        let commands = session.sent_commands();
        assert!(commands
            .iter()
            .any(|command| command.starts_with("(declare-fun size_of_object")));
        assert!(commands
            .iter()
            .any(|command| command.starts_with("(assert (= (size_of_object")));
    }
}
