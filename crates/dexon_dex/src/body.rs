//! Method bodies: instruction streams and exception handler tables.
//!
//! Branch targets and handler addresses are instruction indices rather than
//! pointers into the stream, so a derived `Clone` of a [`MethodBody`] is a
//! complete, independent copy.

use serde::{Deserialize, Serialize};

use crate::reference::{FieldRef, MethodRef};
use crate::types::TypeRef;

/// Instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Opcode {
    Nop,
    Move,
    MoveResult,
    MoveException,
    ReturnVoid,
    Return,
    Const,
    ConstString,
    ConstClass,
    CheckCast,
    InstanceOf,
    NewInstance,
    NewArray,
    ArrayLength,
    Throw,
    Goto,
    IfEq,
    IfNe,
    IfLt,
    IfGe,
    Aget,
    Aput,
    Iget,
    Iput,
    Sget,
    Sput,
    InvokeVirtual,
    InvokeSuper,
    InvokeDirect,
    InvokeStatic,
    InvokeInterface,
    Add,
    Sub,
    Mul,
}

/// The operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// No operand.
    None,
    /// An integer literal.
    Literal(i64),
    /// A string constant.
    String(String),
    /// A type, for `const-class`, `check-cast`, `new-instance` and friends.
    Type(TypeRef),
    /// A method, for invocations.
    Method(MethodRef),
    /// A field, for field access.
    Field(FieldRef),
    /// A branch target, as an index into the instruction stream.
    Target(u32),
}

/// A single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The opcode.
    pub opcode: Opcode,
    /// Register operands.
    pub registers: Vec<u16>,
    /// The non-register operand.
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction.
    pub fn new(opcode: Opcode, registers: Vec<u16>, operand: Operand) -> Self {
        Self {
            opcode,
            registers,
            operand,
        }
    }
}

/// A typed catch clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catch {
    /// The caught exception type.
    pub exception_type: TypeRef,
    /// Index of the first handler instruction.
    pub handler: u32,
}

/// A protected range with its catch clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionHandler {
    /// Index of the first protected instruction.
    pub try_start: u32,
    /// Index one past the last protected instruction.
    pub try_end: u32,
    /// Typed catch clauses, tried in order.
    pub catches: Vec<Catch>,
    /// Handler for any other exception.
    pub catch_all: Option<u32>,
}

/// The body of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    /// Number of registers used by the method.
    pub registers_size: u16,
    /// Number of registers holding incoming arguments.
    pub incoming_args: u16,
    /// Number of registers needed for outgoing call arguments.
    pub outgoing_args: u16,
    /// The instruction stream.
    pub instructions: Vec<Instruction>,
    /// The exception handler table.
    pub exceptions: Vec<ExceptionHandler>,
}

impl MethodBody {
    /// Creates a body with the given register count and instructions, and no
    /// exception handlers.
    pub fn new(registers_size: u16, instructions: Vec<Instruction>) -> Self {
        Self {
            registers_size,
            incoming_args: 0,
            outgoing_args: 0,
            instructions,
            exceptions: Vec::new(),
        }
    }

    /// Iterates over every typed catch clause in the handler table.
    pub fn catches_mut(&mut self) -> impl Iterator<Item = &mut Catch> {
        self.exceptions.iter_mut().flat_map(|h| h.catches.iter_mut())
    }
}
