//! 16-bit instruction word codec.
//!
//! <https://github.com/craterdog-bali/bali-nebula-virtual-machine/wiki/instruction-set>

use crate::consts::*;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The eight operations addressable by the 3-bit opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
pub enum Operation {
    /// Transfer control, conditionally or unconditionally.
    Jump = 0,
    /// Push a value or handler address onto a stack.
    Push = 1,
    /// Pop a value or handler address off a stack.
    Pop = 2,
    /// Load a value from a symbol table onto the component stack.
    Load = 3,
    /// Store the top of the component stack into a symbol table.
    Store = 4,
    /// Invoke an intrinsic function by index.
    Invoke = 5,
    /// Execute a procedure, pushing a new call frame.
    Execute = 6,
    /// Install a handler or return a result/exception.
    Handle = 7,
}

impl Operation {
    /// Decode an operation from its 3-bit representation. Infallible: every
    /// 3-bit value names one of the eight operations.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Jump,
            1 => Self::Push,
            2 => Self::Pop,
            3 => Self::Load,
            4 => Self::Store,
            5 => Self::Invoke,
            6 => Self::Execute,
            _ => Self::Handle,
        }
    }

    /// The 3-bit representation of this operation.
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Short mnemonic used in disassembly.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Jump => "JUMP",
            Self::Push => "PUSH",
            Self::Pop => "POP",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Invoke => "INVOKE",
            Self::Execute => "EXECUTE",
            Self::Handle => "HANDLE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// The four modifier values a 2-bit sub-opcode field can hold. Each
/// [`Operation`] interprets these independently — see the per-operation
/// mnemonic tables in [`Instruction::mnemonic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifier(u8);

impl Modifier {
    /// Construct a modifier from its 2-bit representation.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x03)
    }

    /// The 2-bit representation of this modifier.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// `JUMP` modifiers: which template the popped condition must match.
pub mod jump {
    /// Unconditional jump (or, with a zero operand, `SKIP`).
    pub const ALWAYS: u8 = 0;
    /// Taken when the popped value is the `NONE` template.
    pub const ON_NONE: u8 = 1;
    /// Taken when the popped value is the `TRUE` template.
    pub const ON_TRUE: u8 = 2;
    /// Taken when the popped value is the `FALSE` template.
    pub const ON_FALSE: u8 = 3;
}

/// `PUSH`/`POP` modifiers.
pub mod push {
    /// Push a handler address onto the handler stack.
    pub const HANDLER: u8 = 0;
    /// Push a literal-table element onto the component stack.
    pub const ELEMENT: u8 = 1;
    /// Push a literal-table procedure body onto the component stack.
    pub const CODE: u8 = 2;
}

/// `POP` modifiers.
pub mod pop {
    /// Pop the top of the handler stack.
    pub const HANDLER: u8 = 0;
    /// Pop the top of the component stack.
    pub const COMPONENT: u8 = 1;
}

/// `LOAD` modifiers: which symbol table class the index selects. `LOAD` and
/// `STORE` assign different meanings to modifier value 1 — `PARAMETER` only
/// makes sense when reading (parameters are immutable once the call is
/// entered), so `STORE` reuses that slot for `DRAFT` instead. See
/// [`store_symbol`].
pub mod load_symbol {
    /// The procedure's local variable table.
    pub const VARIABLE: u8 = 0;
    /// The procedure's parameter table.
    pub const PARAMETER: u8 = 1;
    /// A document, addressed by a citation held in a variable; fetched as a
    /// draft when the citation carries no content digest, otherwise fetched
    /// as a committed document.
    pub const DOCUMENT: u8 = 2;
    /// A named message queue.
    pub const MESSAGE: u8 = 3;
}

/// `STORE` modifiers. See [`load_symbol`] for why value 1 differs from
/// `LOAD`'s assignment.
pub mod store_symbol {
    /// The procedure's local variable table.
    pub const VARIABLE: u8 = 0;
    /// Save as a draft under the citation held in the variable.
    pub const DRAFT: u8 = 1;
    /// Commit the document under the citation held in the variable.
    pub const DOCUMENT: u8 = 2;
    /// A named message queue.
    pub const MESSAGE: u8 = 3;
}

/// `HANDLE` modifiers.
pub mod handle {
    /// Unwind to the nearest installed handler with the exception on top of
    /// the component stack.
    pub const EXCEPTION: u8 = 0;
    /// Return the top of the component stack as the caller's result.
    pub const RESULT: u8 = 1;
}

/// A decoded 16-bit instruction word: `opcode(3) | modifier(2) | operand(11)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instruction(u16);

impl Instruction {
    /// Size of an encoded instruction, in bytes.
    pub const LEN: usize = 2;

    /// Build an instruction word from its three fields. The operand is
    /// truncated silently to 11 bits; callers that need validation should
    /// follow up with [`Instruction::is_valid`].
    pub const fn encode(op: Operation, modifier: Modifier, operand: u16) -> Self {
        let word = ((op.bits() as u16) << OPCODE_SHIFT)
            | ((modifier.bits() as u16) << MODCODE_SHIFT)
            | (operand & OPERAND_MASK);
        Self(word)
    }

    /// Wrap a raw 16-bit word without validating it.
    pub const fn from_word(word: u16) -> Self {
        Self(word)
    }

    /// The raw 16-bit representation.
    pub const fn word(self) -> u16 {
        self.0
    }

    /// The operation named by bits 15-13.
    pub const fn op(self) -> Operation {
        Operation::from_bits(((self.0 & OPCODE_MASK) >> OPCODE_SHIFT) as u8)
    }

    /// The modifier named by bits 12-11.
    pub const fn modifier(self) -> Modifier {
        Modifier::from_bits(((self.0 & MODCODE_MASK) >> MODCODE_SHIFT) as u8)
    }

    /// The operand named by bits 10-0.
    pub const fn operand(self) -> u16 {
        self.0 & OPERAND_MASK
    }

    /// `true` if, for this instruction's operation and modifier, the operand
    /// denotes a bytecode address rather than a table index.
    pub const fn operand_is_address(self) -> bool {
        match self.op() {
            Operation::Jump => true,
            Operation::Push => self.modifier().bits() == push::HANDLER,
            _ => false,
        }
    }

    /// `true` if, for this instruction's operation and modifier, the operand
    /// denotes a 1-based table index.
    pub const fn operand_is_index(self) -> bool {
        match self.op() {
            Operation::Push => !self.operand_is_address(),
            Operation::Load | Operation::Store | Operation::Invoke | Operation::Execute => true,
            _ => false,
        }
    }

    /// Validate that this word's (operation, modifier, operand) triple is one
    /// of the ≈23 defined slots, per the classification table in §4.A.
    pub const fn is_valid(self) -> bool {
        let m = self.modifier().bits();
        let operand = self.operand();
        match self.op() {
            Operation::Jump => operand > 0 || m == jump::ALWAYS,
            Operation::Push => operand > 0 && m <= push::CODE,
            Operation::Pop => operand == 0 && m <= pop::COMPONENT,
            Operation::Load => operand > 0,
            Operation::Store => operand > 0,
            Operation::Invoke => operand > 0,
            Operation::Execute => operand > 0,
            Operation::Handle => operand == 0 && m <= handle::RESULT,
        }
    }

    /// `true` for the distinguished `JUMP ALWAYS, 0` no-op.
    pub const fn is_noop(self) -> bool {
        matches!(self.op(), Operation::Jump) && self.modifier().bits() == jump::ALWAYS && self.operand() == 0
    }

    /// Render the mnemonic for this instruction, e.g. `JUMP ON TRUE` or
    /// `PUSH ELEMENT`. Undefined (op, modifier) combinations render as
    /// `<reserved>`.
    pub fn mnemonic(self) -> String {
        if !self.is_valid() {
            return "<reserved>".to_string();
        }
        if self.is_noop() {
            return "SKIP".to_string();
        }
        let m = self.modifier().bits();
        match self.op() {
            Operation::Jump => match m {
                jump::ALWAYS => "JUMP".to_string(),
                jump::ON_NONE => "JUMP ON NONE".to_string(),
                jump::ON_TRUE => "JUMP ON TRUE".to_string(),
                _ => "JUMP ON FALSE".to_string(),
            },
            Operation::Push => match m {
                push::HANDLER => "PUSH HANDLER".to_string(),
                push::ELEMENT => "PUSH ELEMENT".to_string(),
                _ => "PUSH CODE".to_string(),
            },
            Operation::Pop => match m {
                pop::HANDLER => "POP HANDLER".to_string(),
                _ => "POP COMPONENT".to_string(),
            },
            Operation::Load => match m {
                load_symbol::VARIABLE => "LOAD VARIABLE".to_string(),
                load_symbol::PARAMETER => "LOAD PARAMETER".to_string(),
                load_symbol::DOCUMENT => "LOAD DOCUMENT".to_string(),
                _ => "LOAD MESSAGE".to_string(),
            },
            Operation::Store => match m {
                store_symbol::VARIABLE => "STORE VARIABLE".to_string(),
                store_symbol::DRAFT => "STORE DRAFT".to_string(),
                store_symbol::DOCUMENT => "STORE DOCUMENT".to_string(),
                _ => "STORE MESSAGE".to_string(),
            },
            Operation::Invoke => format!("INVOKE WITH {} PARAMETERS", m),
            Operation::Execute => match m {
                0 => "EXECUTE".to_string(),
                1 => "EXECUTE WITH PARAMETERS".to_string(),
                2 => "EXECUTE ON TARGET".to_string(),
                _ => "EXECUTE ON TARGET WITH PARAMETERS".to_string(),
            },
            Operation::Handle => match m {
                handle::EXCEPTION => "HANDLE EXCEPTION".to_string(),
                _ => "HANDLE RESULT".to_string(),
            },
        }
    }

    /// Render a single disassembly row: `[addr]:  WWWW  O M  OPER  MNEMONIC`.
    pub fn disassemble(self, address: Option<u16>) -> String {
        let label = address.map(|a| format!("[{:03X}]", a)).unwrap_or_else(|| "[---]".to_string());
        let operand = self.operand();
        let operand_str = if self.operand_is_address() {
            format!("[{:03X}]", operand)
        } else {
            format!("{}", operand)
        };
        format!(
            "{}:  {:04X}  {} {}  {:>5}  {}",
            label,
            self.word(),
            self.op().bits(),
            self.modifier().bits(),
            operand_str,
            self.mnemonic()
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble(None))
    }
}

/// Render a whole bytecode array as a disassembly listing with a header row.
pub fn disassemble_bytecode(bytecode: &[Instruction]) -> String {
    let mut out = String::from("ADDR   WORD  O M  OPER   MNEMONIC\n");
    for (i, instruction) in bytecode.iter().enumerate() {
        out.push_str(&instruction.disassemble(Some((i + 1) as u16)));
        out.push('\n');
    }
    out
}

/// Pack a big-endian bytecode byte string into instruction words, per the
/// wire format in §6: two bytes per word, high byte first.
pub fn words_from_bytes(bytes: &[u8]) -> Vec<Instruction> {
    bytes
        .chunks(2)
        .map(|pair| {
            let hi = pair[0];
            let lo = *pair.get(1).unwrap_or(&0);
            Instruction::from_word(u16::from_be_bytes([hi, lo]))
        })
        .collect()
}

/// Unpack instruction words back into a big-endian byte string.
pub fn bytes_from_words(words: &[Instruction]) -> Vec<u8> {
    words.iter().flat_map(|i| i.word().to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn encode_decode_roundtrip() {
        for op in Operation::iter() {
            for m in 0..4u8 {
                for operand in [0u16, 1, 2, 2047] {
                    let i = Instruction::encode(op, Modifier::from_bits(m), operand);
                    assert_eq!(i.op(), op);
                    assert_eq!(i.modifier().bits(), m);
                    assert_eq!(i.operand(), operand);
                }
            }
        }
    }

    #[test]
    fn noop_is_jump_zero_zero() {
        let i = Instruction::encode(Operation::Jump, Modifier::from_bits(0), 0);
        assert!(i.is_noop());
        assert!(i.is_valid());
        assert_eq!(i.word(), 0x0000);
    }

    #[test]
    fn jump_zero_operand_nonzero_modifier_is_invalid() {
        let i = Instruction::encode(Operation::Jump, Modifier::from_bits(1), 0);
        assert!(!i.is_valid());
    }

    #[test]
    fn push_handler_operand_is_address() {
        let i = Instruction::encode(Operation::Push, Modifier::from_bits(push::HANDLER), 5);
        assert!(i.operand_is_address());
        assert!(!i.operand_is_index());
    }

    #[test]
    fn push_zero_operand_is_invalid() {
        let i = Instruction::encode(Operation::Push, Modifier::from_bits(push::ELEMENT), 0);
        assert!(!i.is_valid());
    }

    #[test]
    fn pop_requires_zero_operand() {
        let valid = Instruction::encode(Operation::Pop, Modifier::from_bits(pop::COMPONENT), 0);
        let invalid = Instruction::encode(Operation::Pop, Modifier::from_bits(pop::COMPONENT), 1);
        assert!(valid.is_valid());
        assert!(!invalid.is_valid());
    }

    #[test]
    fn store_reuses_modifier_one_for_draft() {
        let i = Instruction::encode(Operation::Store, Modifier::from_bits(store_symbol::DRAFT), 1);
        assert!(i.is_valid());
        assert_eq!(i.mnemonic(), "STORE DRAFT");
    }

    #[test]
    fn handle_requires_zero_operand() {
        let valid = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 0);
        let invalid = Instruction::encode(Operation::Handle, Modifier::from_bits(handle::RESULT), 3);
        assert!(valid.is_valid());
        assert!(!invalid.is_valid());
    }

    #[test]
    fn word_byte_packing_is_big_endian() {
        let bytes = [0x12, 0x34, 0xAB];
        let words = words_from_bytes(&bytes);
        assert_eq!(words[0].word(), 0x1234);
        assert_eq!(words[1].word(), 0xAB00);
        assert_eq!(bytes_from_words(&words[..1]), vec![0x12, 0x34]);
    }

    #[quickcheck_macros::quickcheck]
    fn prop_encode_decode_identity(op_bits: u8, mod_bits: u8, operand: u16) -> bool {
        let op = Operation::from_bits(op_bits);
        let modifier = Modifier::from_bits(mod_bits);
        let operand = operand & OPERAND_MASK;
        let i = Instruction::encode(op, modifier, operand);
        i.op() == op && i.modifier().bits() == modifier.bits() && i.operand() == operand
    }
}
