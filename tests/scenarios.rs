//! End-to-end processor scenarios, one test per numbered case in the
//! instruction-set design notes.

use bali_vm::prelude::*;
use uuid::Uuid;

fn frame(literals: Vec<Value>, variable_count: usize, bytecode: Vec<Instruction>) -> ProcedureContext {
    let definition = ProcedureDefinition {
        name: "scenario".to_string(),
        literal_values: literals,
        variable_count,
        bytecode,
    };
    ProcedureContext::new(Reference::draft("Scenario", "v1"), &definition, Value::none(), Vec::new())
}

fn task(frame: ProcedureContext, balance: u64) -> TaskContext {
    TaskContext::new(Uuid::nil(), Uuid::nil(), balance, frame)
}

type Vm = Interpreter<MemoryRepository, MemoryEventSink, MemoryIntrinsicTable>;

fn vm_with_repository(task: TaskContext, repository: MemoryRepository) -> Vm {
    Interpreter::new(task, repository, MemoryEventSink::new(), MemoryIntrinsicTable::new())
}

fn vm(task: TaskContext) -> Vm {
    vm_with_repository(task, MemoryRepository::new())
}

#[test]
fn s1_noop_advances_then_suspends_on_program_end() {
    let noop = Instruction::encode(Operation::Jump, Modifier::from_bits(0), 0);
    let mut interpreter = vm(task(frame(Vec::new(), 0, vec![noop]), 10));

    interpreter.step().unwrap();
    assert_eq!(interpreter.task().account_balance, 9);
    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Active);
    assert_eq!(interpreter.task().procedure_stack[0].next_address, 2);

    interpreter.run().unwrap();
    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Active);
}

#[test]
fn s2_unconditional_jump_skips_invalid_word() {
    use bali_vm::instruction::{handle, jump};
    let jump_ins = Instruction::encode(Operation::Jump, Modifier::from_bits(jump::ALWAYS), 3);
    let reserved = Instruction::from_word(0xFFFF);
    let result = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);

    let mut interpreter = vm(task(frame(Vec::new(), 0, vec![jump_ins, reserved, result]), 10));
    interpreter.task_mut().component_stack.push(Value::symbol("carried"));
    interpreter.run().unwrap();

    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Done);
    assert_eq!(interpreter.task().outcome, Some(Outcome::Result(Value::symbol("carried"))));
}

#[test]
fn s3_push_element_then_handle_result() {
    use bali_vm::instruction::{handle, push};
    let push_hello = Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 1);
    let result = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);

    let mut interpreter = vm(task(frame(vec![Value::symbol("hello")], 0, vec![push_hello, result]), 10));
    interpreter.run().unwrap();

    assert_eq!(interpreter.task().outcome, Some(Outcome::Result(Value::symbol("hello"))));
}

#[test]
fn s4_exception_unwinds_to_installed_handler() {
    use bali_vm::instruction::{handle, push};
    let literals = vec![Value::symbol("boom"), Value::symbol("recovered")];
    let bytecode = vec![
        Instruction::encode(Operation::Push, Modifier::from_bits(push::HANDLER), 4),
        Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 1),
        Instruction::encode(Operation::Handle, Modifier::from_bits(handle::EXCEPTION), 0),
        Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 2),
        Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0),
    ];

    let mut interpreter = vm(task(frame(literals, 0, bytecode), 10));
    interpreter.run().unwrap();

    assert_eq!(interpreter.task().outcome, Some(Outcome::Result(Value::symbol("recovered"))));
}

#[test]
fn s5_conditional_jump_on_false_taken() {
    use bali_vm::instruction::{handle, jump, push};
    let literals = vec![Value::symbol("good"), Value::falsy(), Value::symbol("bad")];
    let bytecode = vec![
        Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 1), // $good
        Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 2), // FALSE
        Instruction::encode(Operation::Jump, Modifier::from_bits(jump::ON_FALSE), 5),
        Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 3), // $bad, skipped
        Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0),
    ];

    let mut interpreter = vm(task(frame(literals, 0, bytecode), 10));
    interpreter.run().unwrap();

    assert_eq!(interpreter.task().outcome, Some(Outcome::Result(Value::symbol("good"))));
}

#[test]
fn s6_queue_wait_suspends_and_registers_on_wait_queue() {
    use bali_vm::instruction::load_symbol;
    let load_message = Instruction::encode(Operation::Load, Modifier::from_bits(load_symbol::MESSAGE), 1);
    let mut entry = frame(Vec::new(), 1, vec![load_message]);
    entry.set_variable(1, Value::symbol("empty-queue"));

    let mut interpreter = vm(task(entry, 10));
    interpreter.run().unwrap();

    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Waiting);
    assert_eq!(interpreter.task().procedure_stack[0].next_address, 1);
}

#[test]
fn s7_gas_exhaustion_suspends_not_errors() {
    let noop = Instruction::encode(Operation::Jump, Modifier::from_bits(0), 0);
    let bytecode = vec![noop; 50];
    let mut interpreter = vm(task(frame(Vec::new(), 0, bytecode), 5));

    let outcome = interpreter.run();
    assert!(outcome.is_ok());
    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Active);
    assert_eq!(interpreter.task().account_balance, 0);
}

#[test]
fn s8_stack_underflow_is_recoverable_via_handler() {
    use bali_vm::instruction::{handle, pop, push};
    let bytecode_with_handler = vec![
        Instruction::encode(Operation::Push, Modifier::from_bits(push::HANDLER), 3),
        Instruction::encode(Operation::Pop, Modifier::from_bits(pop::COMPONENT), 0),
        Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0),
    ];
    let mut interpreter = vm(task(frame(Vec::new(), 0, bytecode_with_handler), 10));
    interpreter.run().unwrap();
    assert_eq!(interpreter.task().outcome, Some(Outcome::Result(Value::symbol("stackUnderflow"))));

    let bytecode_without_handler = vec![Instruction::encode(Operation::Pop, Modifier::from_bits(pop::COMPONENT), 0)];
    let mut interpreter = vm(task(frame(Vec::new(), 0, bytecode_without_handler), 10));
    interpreter.run().unwrap();
    assert_eq!(interpreter.task().processor_status, ProcessorStatus::Done);
    assert_eq!(interpreter.task().outcome, Some(Outcome::Exception(Value::symbol("stackUnderflow"))));
}

#[test]
fn s9_document_round_trip_preserves_mid_execution_state() {
    use bali_vm::instruction::push;
    let outer = frame(vec![Value::symbol("x")], 1, vec![Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 1)]);
    let inner = frame(Vec::new(), 0, Vec::new());

    let mut original = task(outer, 42);
    original.procedure_stack.push(inner);
    original.component_stack.push(Value::number_from_literal("7"));
    original.handler_stack.push(HandlerEntry { address: 1, frame_depth: 1 });

    let document = serde_json::to_value(&original).unwrap();
    let restored: TaskContext = serde_json::from_value(document).unwrap();
    assert_eq!(original, restored);
}

#[test]
fn s10_procedure_stack_depth_limit_halts_rather_than_overflowing() {
    let citation = Reference::draft("Recur", "v1");
    let recursive_bytecode = vec![
        Instruction::encode(Operation::Push, Modifier::from_bits(1), 1),
        Instruction::encode(Operation::Execute, Modifier::from_bits(0), 1),
    ];
    let procedure = Value::Catalog(vec![
        ("$procedureName".to_string(), Value::symbol("recur")),
        ("literalValues".to_string(), Value::List(vec![Value::Reference(citation.clone())])),
        ("$variableCount".to_string(), Value::number_from_literal("0")),
        (
            "$bytecodeInstructions".to_string(),
            Value::List(recursive_bytecode.iter().map(|i| Value::number_from_literal(i.word().to_string())).collect()),
        ),
    ]);
    let type_document = Value::Catalog(vec![("$procedureDefinitions".to_string(), Value::List(vec![procedure]))]);

    let mut repository = MemoryRepository::new();
    repository.save_draft("Recur", "v1", type_document).unwrap();

    let entry = frame(
        vec![Value::Reference(citation)],
        0,
        vec![
            Instruction::encode(Operation::Push, Modifier::from_bits(1), 1),
            Instruction::encode(Operation::Execute, Modifier::from_bits(0), 1),
        ],
    );

    let mut interpreter = Interpreter::with_limits(
        task(entry, 10_000),
        repository,
        MemoryEventSink::new(),
        MemoryIntrinsicTable::new(),
        ProcessorLimits::new(4, 10_000),
    );
    let err = interpreter.run().unwrap_err();
    assert!(matches!(err, HaltReason::ProcedureStackOverflow));
}
