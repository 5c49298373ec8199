//! Assembles, links and runs the generated code with the system C compiler.
//! Each test returns early when no `cc` is installed.
#![cfg(all(target_arch = "x86_64", target_os = "linux"))]

use std::fs;
use std::process::Command;

use calcc::{Options, compile, eval};

fn run_native(source: &str) -> Option<String> {
  let compilation = compile(source, &Options::default()).unwrap();
  let dir = tempfile::tempdir().unwrap();
  let asm_path = dir.path().join("out.s");
  let exe_path = dir.path().join("prog");
  fs::write(&asm_path, &compilation.assembly).unwrap();

  let Ok(cc) = Command::new("cc")
    .arg("-o")
    .arg(&exe_path)
    .arg(&asm_path)
    .output()
  else {
    eprintln!("cc not available, skipping");
    return None;
  };
  assert!(
    cc.status.success(),
    "cc failed:\n{}\n{}",
    String::from_utf8_lossy(&cc.stderr),
    compilation.assembly
  );

  let run = Command::new(&exe_path).output().unwrap();
  assert!(run.status.success());
  Some(String::from_utf8(run.stdout).unwrap())
}

fn interpreted(source: &str) -> String {
  let program = compile(source, &Options::default()).unwrap().program;
  eval::run(&program)
    .unwrap()
    .iter()
    .map(|value| format!("{value}\n"))
    .collect()
}

#[test]
fn division_truncates_at_runtime() {
  if let Some(stdout) = run_native("print 7 / 2\n") {
    assert_eq!(stdout, "3\n");
  }
}

#[test]
fn native_output_matches_the_evaluator() {
  let source = "x = 7 / 2\ny = (x + 1) * 10 - 3 - 2\nprint x\nprint y\nprint 100 / 7 / 2\n";
  if let Some(stdout) = run_native(source) {
    assert_eq!(stdout, "3\n35\n7\n");
    assert_eq!(stdout, interpreted(source));
  }
}

#[test]
fn variable_named_fmt_links_and_prints() {
  if let Some(stdout) = run_native("fmt = 21\nprint fmt * 2\n") {
    assert_eq!(stdout, "42\n");
  }
}

#[test]
fn wide_literals_survive_assembly() {
  if let Some(stdout) = run_native("big = 5000000000\nprint big + 1\n") {
    assert_eq!(stdout, "5000000001\n");
  }
}
