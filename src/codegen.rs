//! Code generation: lower the parsed program into AT&T x86-64 assembly.
//!
//! Every expression leaves its value in `%rax`. A binary operation evaluates
//! its left operand, parks it on the machine stack, evaluates the right
//! operand, moves that into `%rdi` and pops the left value back into `%rax`
//! before combining the two. Variables are global `.quad` cells addressed
//! relative to `%rip`; printing goes through libc's `printf`.

use tracing::debug;

use crate::parser::{BinaryOp, Expr, Program, Stmt};

/// Emit a complete assembly file for the program.
#[tracing::instrument(level = "trace", skip_all)]
pub fn generate(program: &Program) -> String {
  let mut asm = String::new();
  asm.push_str(".text\n");
  asm.push_str(".globl main\n");
  asm.push_str("main:\n");
  asm.push_str("    push %rbp\n");
  asm.push_str("    mov %rsp, %rbp\n");

  for stmt in &program.stmts {
    emit_stmt(stmt, &mut asm);
  }

  asm.push_str("    pop %rbp\n");
  asm.push_str("    xor %eax, %eax\n");
  asm.push_str("    ret\n");
  asm.push('\n');

  let variables = program.variables();
  asm.push_str(".data\n");
  for name in &variables {
    asm.push_str(&format!("{name}: .quad 0\n"));
  }
  asm.push_str(".Lfmt: .string \"%ld\\n\"\n");
  asm.push_str(".section .note.GNU-stack,\"\",@progbits\n");

  debug!(
    statements = program.stmts.len(),
    variables = variables.len(),
    bytes = asm.len(),
    "generated assembly"
  );
  asm
}

/// Emit the code for one statement.
pub fn emit_stmt(stmt: &Stmt, asm: &mut String) {
  match stmt {
    Stmt::Assign { name, expr } => {
      emit_expr(expr, asm);
      asm.push_str(&format!("    movq %rax, {name}(%rip)\n"));
    }
    Stmt::Print { expr } => {
      emit_expr(expr, asm);
      asm.push_str("    movq %rax, %rsi\n");
      asm.push_str("    leaq .Lfmt(%rip), %rdi\n");
      // Variadic call: %al holds the number of vector registers used.
      asm.push_str("    xor %eax, %eax\n");
      asm.push_str("    call printf\n");
    }
  }
}

/// Emit code that leaves the value of `node` in `%rax`.
pub fn emit_expr(node: &Expr, asm: &mut String) {
  match node {
    Expr::Num { value } => {
      if i32::try_from(*value).is_ok() {
        asm.push_str(&format!("    movq ${value}, %rax\n"));
      } else {
        asm.push_str(&format!("    movabsq ${value}, %rax\n"));
      }
    }
    Expr::Var { name } => {
      asm.push_str(&format!("    movq {name}(%rip), %rax\n"));
    }
    Expr::Binary { op, lhs, rhs } => {
      emit_expr(lhs, asm);
      asm.push_str("    push %rax\n");
      emit_expr(rhs, asm);
      asm.push_str("    movq %rax, %rdi\n");
      asm.push_str("    pop %rax\n");
      match op {
        BinaryOp::Add => asm.push_str("    addq %rdi, %rax\n"),
        BinaryOp::Sub => asm.push_str("    subq %rdi, %rax\n"),
        BinaryOp::Mul => asm.push_str("    imulq %rdi, %rax\n"),
        BinaryOp::Div => {
          asm.push_str("    cqto\n");
          asm.push_str("    idivq %rdi\n");
        }
      }
    }
    Expr::Error => {
      asm.push_str("    # invalid expression\n");
      asm.push_str("    movq $0, %rax\n");
    }
  }
}
