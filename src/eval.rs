//! Tree-walking evaluator.
//!
//! Runs a program in process with the same semantics as the generated code:
//! 64-bit two's complement arithmetic that wraps on overflow, truncating
//! signed division, and zero-initialised variables. The two inputs on which
//! `idiv` faults are reported as errors instead.

use std::collections::HashMap;

use snafu::Snafu;

use crate::parser::{BinaryOp, Expr, Program, Stmt};

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum EvalError {
  #[snafu(display("division by zero"))]
  DivisionByZero,

  #[snafu(display("division overflow: {dividend} / -1"))]
  DivisionOverflow { dividend: i64 },
}

/// Execute the program and return every printed value, in order.
#[tracing::instrument(level = "trace", skip_all)]
pub fn run(program: &Program) -> EvalResult<Vec<i64>> {
  let mut vars: HashMap<&str, i64> = HashMap::new();
  let mut output = Vec::new();

  for stmt in &program.stmts {
    match stmt {
      Stmt::Assign { name, expr } => {
        let value = eval_expr(expr, &vars)?;
        vars.insert(name.as_str(), value);
      }
      Stmt::Print { expr } => output.push(eval_expr(expr, &vars)?),
    }
  }

  Ok(output)
}

fn eval_expr(node: &Expr, vars: &HashMap<&str, i64>) -> EvalResult<i64> {
  match node {
    Expr::Num { value } => Ok(*value),
    Expr::Var { name } => Ok(vars.get(name.as_str()).copied().unwrap_or(0)),
    Expr::Binary { op, lhs, rhs } => {
      let lhs = eval_expr(lhs, vars)?;
      let rhs = eval_expr(rhs, vars)?;
      match op {
        BinaryOp::Add => Ok(lhs.wrapping_add(rhs)),
        BinaryOp::Sub => Ok(lhs.wrapping_sub(rhs)),
        BinaryOp::Mul => Ok(lhs.wrapping_mul(rhs)),
        BinaryOp::Div => match rhs {
          0 => DivisionByZeroSnafu.fail(),
          -1 if lhs == i64::MIN => DivisionOverflowSnafu { dividend: lhs }.fail(),
          _ => Ok(lhs / rhs),
        },
      }
    }
    Expr::Error => Ok(0),
  }
}
