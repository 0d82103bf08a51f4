use crate::debugger::Error;
use capstone::prelude::*;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use strum_macros::{Display as StrumDisplay, EnumString};

/// Assembly syntax of disassembled instructions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, StrumDisplay, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Syntax {
    #[default]
    Att,
    Intel,
}

/// Single assembly instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Address in debugee memory.
    pub address: u64,
    /// Instruction mnemonic.
    pub mnemonic: String,
    /// Operands string representation.
    pub operands: Option<String>,
}

/// Render an instruction in `<address> <mnemonic> <operands>` form.
impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x} {}", self.address, self.mnemonic)?;
        if let Some(operands) = &self.operands {
            write!(f, " {operands}")?;
        }
        Ok(())
    }
}

/// x86-64 machine code disassembler.
pub struct Disassembler {
    cs: Capstone,
}

impl Disassembler {
    /// Longest possible x86 instruction in bytes.
    pub const MAX_INSTRUCTION_LEN: usize = 15;

    /// Create a new [`Disassembler`].
    pub fn new(syntax: Syntax) -> Result<Self, Error> {
        let syntax = match syntax {
            Syntax::Att => arch::x86::ArchSyntax::Att,
            Syntax::Intel => arch::x86::ArchSyntax::Intel,
        };

        Ok(Self {
            cs: Capstone::new()
                .x86()
                .mode(arch::x86::ArchMode::Mode64)
                .syntax(syntax)
                .build()
                .map_err(Error::DisAsmInit)?,
        })
    }

    /// Disassemble at most `count` instructions from `code`.
    ///
    /// # Arguments
    ///
    /// * `code`: machine code
    /// * `address`: address of the first byte of `code`
    /// * `count`: instructions count
    pub fn disasm(&self, code: &[u8], address: u64, count: usize) -> Result<Vec<Instruction>, Error> {
        let instructions = self
            .cs
            .disasm_count(code, address, count)
            .map_err(Error::DisAsm)?
            .iter()
            .map(|i| Instruction {
                address: i.address(),
                mnemonic: i.mnemonic().unwrap_or("(bad)").to_string(),
                operands: i
                    .op_str()
                    .filter(|op| !op.is_empty())
                    .map(ToString::to_string),
            })
            .collect();
        Ok(instructions)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    // push %rbp; mov %rsp,%rbp; nop
    const PROLOGUE: [u8; 5] = [0x55, 0x48, 0x89, 0xe5, 0x90];

    #[test]
    fn test_disasm_intel() {
        let disasm = Disassembler::new(Syntax::Intel).unwrap();
        let instructions = disasm.disasm(&PROLOGUE, 0x401000, 3).unwrap();

        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].to_string(), "0x401000 push rbp");
        assert_eq!(instructions[1].to_string(), "0x401001 mov rbp, rsp");
        assert_eq!(instructions[2].to_string(), "0x401004 nop");
        assert_eq!(instructions[2].operands, None);
    }

    #[test]
    fn test_disasm_att() {
        let disasm = Disassembler::new(Syntax::Att).unwrap();
        let instructions = disasm.disasm(&PROLOGUE, 0x401000, 1).unwrap();

        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].address, 0x401000);
        assert!(instructions[0].mnemonic.starts_with("push"));
        assert_eq!(instructions[0].operands.as_deref(), Some("%rbp"));
    }

    #[test]
    fn test_disasm_truncated_code() {
        let disasm = Disassembler::new(Syntax::Intel).unwrap();
        // second instruction is cut
        let instructions = disasm.disasm(&PROLOGUE[..3], 0, 2).unwrap();
        assert_eq!(instructions.len(), 1);
    }

    #[test]
    fn test_instruction_display() {
        let insn = Instruction {
            address: 0x5555_5555_5129,
            mnemonic: "movl".to_string(),
            operands: Some("$0x0, -0x4(%rbp)".to_string()),
        };
        assert_eq!(insn.to_string(), "0x555555555129 movl $0x0, -0x4(%rbp)");
        assert_eq!(insn.to_string().split_whitespace().nth(1), Some("movl"));
    }

    #[test]
    fn test_syntax_parse() {
        assert_eq!(Syntax::from_str("intel").unwrap(), Syntax::Intel);
        assert_eq!(Syntax::from_str("att").unwrap(), Syntax::Att);
        assert!(Syntax::from_str("masm").is_err());
        assert_eq!(Syntax::Intel.to_string(), "intel");
    }
}
