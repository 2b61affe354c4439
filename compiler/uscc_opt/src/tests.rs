//! End-to-end tests: liveness and DCE together on lowered-looking code.

use pretty_assertions::assert_eq;
use uscc_ir::{verify, BinOp, CmpOp, Function, FunctionBuilder, Opcode, Type, Value};

use crate::test_helpers::count_opcode;
use crate::{
    compute_liveness, eliminate_dead_code, eliminate_dead_code_with, init_tracing, OptConfig,
};

/// ```c
/// int main() {
///     int a = 1;        // dead: overwritten on both paths
///     int b = getchar();
///     int unused = b * 2;
///     if (b < 10) { a = b; } else { a = 2; }
///     return a;
/// }
/// ```
fn lowered_main() -> Function {
    let mut fb = FunctionBuilder::new("main");
    let entry = fb.create_block("entry");
    let then_block = fb.create_block("if.then");
    let else_block = fb.create_block("if.else");
    let end = fb.create_block("if.end");

    fb.switch_to(entry);
    let a = fb.alloca("a.addr", Type::I32);
    let b = fb.alloca("b.addr", Type::I32);
    let unused = fb.alloca("unused.addr", Type::I32);
    fb.store(Value::i32(1), a);
    let ch = fb.call("getchar", Type::I32, &[]);
    fb.store(ch, b);
    let b1 = fb.load(Type::I32, b);
    let doubled = fb.binary(BinOp::Mul, b1, Value::i32(2));
    fb.store(doubled, unused);
    let b2 = fb.load(Type::I32, b);
    let cond = fb.cmp(CmpOp::Lt, b2, Value::i32(10));
    fb.cond_br(cond, then_block, else_block);

    fb.switch_to(then_block);
    let b3 = fb.load(Type::I32, b);
    fb.store(b3, a);
    fb.br(end);

    fb.switch_to(else_block);
    fb.store(Value::i32(2), a);
    fb.br(end);

    fb.switch_to(end);
    let result = fb.load(Type::I32, a);
    fb.ret(Some(result.into()));

    fb.finish()
}

#[test]
fn pipeline_removes_only_dead_code() {
    init_tracing();
    let mut func = lowered_main();
    assert_eq!(verify(&func), Ok(()));

    let stats = eliminate_dead_code_with(&mut func, &OptConfig::default());
    // `a = 1` and `unused = b * 2` (with its load and multiply).
    assert_eq!(stats.stores, 2);
    assert_eq!(stats.producers, 2);
    assert_eq!(stats.allocas, 1);
    assert_eq!(verify(&func), Ok(()));

    let expected = "\
define @main() {
entry:
  %a.addr = alloca i32
  %b.addr = alloca i32
  %4 = call i32 @getchar()
  store i32 %4, ptr %b.addr
  %9 = load i32, ptr %b.addr
  %10 = icmp slt i32 %9, 10
  br i1 %10, label %if.then, label %if.else
if.then:
  %12 = load i32, ptr %b.addr
  store i32 %12, ptr %a.addr
  br label %if.end
if.else:
  store i32 2, ptr %a.addr
  br label %if.end
if.end:
  %17 = load i32, ptr %a.addr
  ret i32 %17
}
";
    assert_eq!(func.to_string(), expected);
}

/// After DCE no store is dead and the live sets are a fixed point again.
#[test]
fn pipeline_reaches_a_clean_state() {
    let mut func = lowered_main();
    eliminate_dead_code(&mut func);

    let liveness = compute_liveness(&func);
    for inst in func.insts() {
        if func.inst(inst).opcode() == Opcode::Store {
            assert!(!liveness.is_dead(&func, inst));
        }
    }
    assert!(!eliminate_dead_code(&mut func));
    assert_eq!(count_opcode(&func, Opcode::Call), 1);
}

#[test]
fn init_tracing_is_reentrant() {
    init_tracing();
    init_tracing();
}
