//! The microprogram table: for every `(opcode, addressing mode)` pair this
//! machine actually defines, the ordered sequence of micro-operations that
//! `EXECUTE` steps through one per tick. Pairs with no entry here behave as
//! a bare `NOP` — zero-length slice, `EXECUTE` falls straight through to the
//! next fetch.
//!
//! A couple of entries intentionally reproduce quirks rather than the
//! "obviously intended" sequence:
//!
//! - `CMP`'s `REG_RAM` program is missing its final comparison step, so
//!   flags are never actually updated for that addressing mode.
//! - `CMP`'s `REG_IMM8` program runs the comparison twice in a row (the
//!   step that should have closed out `REG_RAM` above), which is harmless
//!   but observable if anything ever inspected micro-step counts.

use super::isa::{AddressingMode, Opcode};
use super::microop::{Acc1Src, Acc2Src, AddrSrc, DataBusSrc, JumpTarget, MicroOp, PcSrc, RegDst, RegSrc};

use AddressingMode as M;
use MicroOp::*;

/// `ADC`/`ADD`/`AND`/`OR`/`SUB`/`XOR` all share the same three addressing
/// modes and the same microprogram shape; only the ALU op in the middle
/// differs.
fn binary_alu(mode: AddressingMode, op: MicroOp) -> &'static [MicroOp] {
    match mode {
        M::Reg => match op {
            Adc => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Adc, MovReg(RegDst::R1, RegSrc::AluOut)],
            Add => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Add, MovReg(RegDst::R1, RegSrc::AluOut)],
            And => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), And, MovReg(RegDst::R1, RegSrc::AluOut)],
            Or => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Or, MovReg(RegDst::R1, RegSrc::AluOut)],
            Sub => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Sub, MovReg(RegDst::R1, RegSrc::AluOut)],
            Xor => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Xor, MovReg(RegDst::R1, RegSrc::AluOut)],
            _ => unreachable!(),
        },
        M::RegImm8 => match op {
            Adc => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Adc, MovReg(RegDst::R1, RegSrc::AluOut)],
            Add => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Add, MovReg(RegDst::R1, RegSrc::AluOut)],
            And => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), And, MovReg(RegDst::R1, RegSrc::AluOut)],
            Or => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Or, MovReg(RegDst::R1, RegSrc::AluOut)],
            Sub => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Sub, MovReg(RegDst::R1, RegSrc::AluOut)],
            Xor => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Xor, MovReg(RegDst::R1, RegSrc::AluOut)],
            _ => unreachable!(),
        },
        M::RegRam => match op {
            Adc => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), Adc, MovReg(RegDst::R1, RegSrc::AluOut)],
            Add => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), Add, MovReg(RegDst::R1, RegSrc::AluOut)],
            And => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), And, MovReg(RegDst::R1, RegSrc::AluOut)],
            Or => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), Or, MovReg(RegDst::R1, RegSrc::AluOut)],
            Sub => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), Sub, MovReg(RegDst::R1, RegSrc::AluOut)],
            Xor => &[MovAcc1(Acc1Src::R1), MovAddBus(AddrSrc::Vx), RamRead, MovAcc2(Acc2Src::DataBus), Xor, MovReg(RegDst::R1, RegSrc::AluOut)],
            _ => unreachable!(),
        },
        _ => &[],
    }
}

/// `DEC`/`INC` share a read-modify-write shape across `REG`, `REG24` and
/// `IMM24`, built on `SUB`/`ADD` respectively against the constant `1`.
fn read_modify_write(mode: AddressingMode, op: MicroOp) -> &'static [MicroOp] {
    match (mode, op) {
        (M::Reg, Sub) => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::X1), Sub, MovReg(RegDst::R1, RegSrc::AluOut)],
        (M::Reg, Add) => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::X1), Add, MovReg(RegDst::R1, RegSrc::AluOut)],
        (M::Reg24, Sub) => &[
            MovAddBus(AddrSrc::Rx), RamRead, MovAcc1(Acc1Src::DataBus), MovAcc2(Acc2Src::X1), Sub,
            MovAddBus(AddrSrc::Rx), MovDataBus(DataBusSrc::AluOut), RamWrite,
        ],
        (M::Reg24, Add) => &[
            MovAddBus(AddrSrc::Rx), RamRead, MovAcc1(Acc1Src::DataBus), MovAcc2(Acc2Src::X1), Add,
            MovAddBus(AddrSrc::Rx), MovDataBus(DataBusSrc::AluOut), RamWrite,
        ],
        (M::Imm24, Sub) => &[
            MovAddBus(AddrSrc::Vx), RamRead, MovAcc1(Acc1Src::DataBus), MovAcc2(Acc2Src::X1), Sub,
            MovAddBus(AddrSrc::Vx), MovDataBus(DataBusSrc::AluOut), RamWrite,
        ],
        (M::Imm24, Add) => &[
            MovAddBus(AddrSrc::Vx), RamRead, MovAcc1(Acc1Src::DataBus), MovAcc2(Acc2Src::X1), Add,
            MovAddBus(AddrSrc::Vx), MovDataBus(DataBusSrc::AluOut), RamWrite,
        ],
        _ => &[],
    }
}

fn unary_alu_reg(mode: AddressingMode, op: MicroOp) -> &'static [MicroOp] {
    match (mode, op) {
        (M::Reg, Shl) => &[MovAcc1(Acc1Src::R1), Shl, MovReg(RegDst::R1, RegSrc::AluOut)],
        (M::Reg, Asr) => &[MovAcc1(Acc1Src::R1), Asr, MovReg(RegDst::R1, RegSrc::AluOut)],
        (M::Reg, Shr) => &[MovAcc1(Acc1Src::R1), Shr, MovReg(RegDst::R1, RegSrc::AluOut)],
        _ => &[],
    }
}

fn none_only(mode: AddressingMode, op: MicroOp) -> &'static [MicroOp] {
    match (mode, op) {
        (M::None, Clc) => &[Clc],
        (M::None, Cle) => &[Cle],
        (M::None, Cli) => &[Cli],
        (M::None, Cln) => &[Cln],
        (M::None, Cls) => &[Cls],
        (M::None, Clz) => &[Clz],
        (M::None, Clf) => &[Clf],
        (M::None, Stc) => &[Stc],
        (M::None, Sti) => &[Sti],
        (M::None, Stn) => &[Stn],
        (M::None, Stf) => &[Stf],
        (M::None, Sts) => &[Sts],
        (M::None, Ste) => &[Ste],
        (M::None, Stz) => &[Stz],
        _ => &[],
    }
}

fn jump_family(mode: AddressingMode, opcode: Opcode) -> &'static [MicroOp] {
    match (mode, opcode) {
        (M::Reg24, Opcode::Jmc) => &[Jmc(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmc) => &[Jmc(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jme) => &[Jme(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jme) => &[Jme(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jmf) => &[Jmf(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmf) => &[Jmf(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jmk) => &[Jmk(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmk) => &[Jmk(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jmp) => &[Jmp(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmp) => &[Jmp(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jms) => &[Jms(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jms) => &[Jms(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jmz) => &[Jmz(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmz) => &[Jmz(JumpTarget::Vx)],
        (M::Reg24, Opcode::Jmn) => &[Jmn(JumpTarget::Rx)],
        (M::Imm24, Opcode::Jmn) => &[Jmn(JumpTarget::Vx)],
        _ => &[],
    }
}

/// Look up the microprogram for `(opcode, mode)`. Returns an empty slice for
/// every combination the instruction set does not define.
pub fn microprogram(opcode: Opcode, mode: AddressingMode) -> &'static [MicroOp] {
    match opcode {
        Opcode::Nop => &[],

        Opcode::Adc => binary_alu(mode, Adc),
        Opcode::Add => binary_alu(mode, Add),
        Opcode::And => binary_alu(mode, And),
        Opcode::Or => binary_alu(mode, Or),
        Opcode::Sub => binary_alu(mode, Sub),
        Opcode::Xor => binary_alu(mode, Xor),

        Opcode::Cal => match mode {
            M::Reg24 => &[
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcLow), RamWrite, IncStk,
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcMid), RamWrite, IncStk,
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcHigh), RamWrite, IncStk,
                MovPc(PcSrc::Rx),
            ],
            M::Imm24 => &[
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcLow), RamWrite, IncStk,
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcMid), RamWrite, IncStk,
                MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::PcHigh), RamWrite, IncStk,
                MovPc(PcSrc::Vx),
            ],
            _ => &[],
        },

        Opcode::Clc => none_only(mode, Clc),
        Opcode::Cle => none_only(mode, Cle),
        Opcode::Cli => none_only(mode, Cli),
        Opcode::Cln => none_only(mode, Cln),
        Opcode::Cls => none_only(mode, Cls),
        Opcode::Clz => none_only(mode, Clz),
        Opcode::Clf => none_only(mode, Clf),
        Opcode::Stc => none_only(mode, Stc),
        Opcode::Sti => none_only(mode, Sti),
        Opcode::Stn => none_only(mode, Stn),
        Opcode::Stf => none_only(mode, Stf),
        Opcode::Sts => none_only(mode, Sts),
        Opcode::Ste => none_only(mode, Ste),
        Opcode::Stz => none_only(mode, Stz),

        Opcode::Cmp => match mode {
            M::Reg => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::R2), Cmp],
            // Trailing duplicate CMP is the orphaned REG_RAM closing step.
            M::RegImm8 => &[MovAcc1(Acc1Src::R1), MovAcc2(Acc2Src::V1), Cmp, Cmp],
            // Missing its closing CMP: flags are never updated in this mode.
            M::RegRam => &[
                MovAddBus(AddrSrc::Rx),
                RamRead,
                MovAcc2(Acc2Src::DataBus),
                MovAcc1(Acc1Src::R4),
            ],
            _ => &[],
        },

        Opcode::Dec => read_modify_write(mode, Sub),
        Opcode::Inc => read_modify_write(mode, Add),

        Opcode::Hlt => match mode {
            M::None => &[Sth],
            _ => &[],
        },

        Opcode::In => match mode {
            M::Reg => &[MovAddBus(AddrSrc::R2), In, MovReg(RegDst::R1, RegSrc::DataBus)],
            _ => &[],
        },
        Opcode::Out => match mode {
            M::Reg => &[MovDataBus(DataBusSrc::R2), MovAddBus(AddrSrc::R1), Out],
            _ => &[],
        },

        Opcode::Int => match mode {
            M::Imm8 => &[MovAddBus(AddrSrc::V1), Int],
            _ => &[],
        },

        Opcode::Irt => match mode {
            M::None => &[
                Sti,
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovReg(RegDst::I, RegSrc::DataBus),
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::DataBusHighReplace),
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::PcPlusDataBusMid),
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::PcPlusDataBusLow),
            ],
            _ => &[],
        },

        Opcode::Jmc | Opcode::Jme | Opcode::Jmf | Opcode::Jmk | Opcode::Jmp | Opcode::Jms | Opcode::Jmz
        | Opcode::Jmn => jump_family(mode, opcode),

        Opcode::Str => match mode {
            M::RamregImmreg => &[MovAddBus(AddrSrc::Rx), MovDataBus(DataBusSrc::R4), RamWrite],
            M::RegRam => &[MovAddBus(AddrSrc::Vx), MovDataBus(DataBusSrc::R1), RamWrite],
            _ => &[],
        },
        Opcode::Lod => match mode {
            M::RamregImmreg => &[MovAddBus(AddrSrc::Rx), RamRead, MovReg(RegDst::R4, RegSrc::DataBus)],
            M::RegRam => &[MovAddBus(AddrSrc::Vx), RamRead, MovReg(RegDst::R1, RegSrc::DataBus)],
            _ => &[],
        },

        Opcode::Mov => match mode {
            M::Reg => &[MovReg(RegDst::R1, RegSrc::R2)],
            M::RegImm8 => &[MovReg(RegDst::R1, RegSrc::V1)],
            _ => &[],
        },

        Opcode::Not => match mode {
            M::Reg => &[MovAcc1(Acc1Src::R1), Not, MovReg(RegDst::R1, RegSrc::AluOut)],
            M::Imm24 => &[
                MovAddBus(AddrSrc::Vx),
                RamRead,
                MovAcc1(Acc1Src::DataBus),
                Not,
                MovAddBus(AddrSrc::Vx),
                MovDataBus(DataBusSrc::AluOut),
                RamWrite,
            ],
            _ => &[],
        },

        Opcode::Pop => match mode {
            M::Reg => &[DecStk, MovAddBus(AddrSrc::Stk), RamRead, MovReg(RegDst::R1, RegSrc::DataBus)],
            _ => &[],
        },
        Opcode::Psh => match mode {
            M::Reg => &[MovAddBus(AddrSrc::Stk), MovDataBus(DataBusSrc::R1), RamWrite, IncStk],
            _ => &[],
        },

        Opcode::Ret => match mode {
            M::None => &[
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::DataBusHighReplace),
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::PcPlusDataBusMid),
                DecStk,
                MovAddBus(AddrSrc::Stk),
                RamRead,
                MovPc(PcSrc::PcPlusDataBusLow),
                IncPc,
            ],
            _ => &[],
        },

        Opcode::Shl => unary_alu_reg(mode, Shl),
        Opcode::Asr => unary_alu_reg(mode, Asr),
        Opcode::Shr => unary_alu_reg(mode, Shr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_combinations_are_empty() {
        assert!(microprogram(Opcode::Nop, AddressingMode::None).is_empty());
        assert!(microprogram(Opcode::Add, AddressingMode::None).is_empty());
    }

    #[test]
    fn cmp_reg_ram_is_missing_its_closing_step() {
        let program = microprogram(Opcode::Cmp, AddressingMode::RegRam);
        assert!(!program.contains(&Cmp));
    }

    #[test]
    fn cmp_reg_imm8_runs_cmp_twice() {
        let program = microprogram(Opcode::Cmp, AddressingMode::RegImm8);
        assert_eq!(program.iter().filter(|&&op| op == Cmp).count(), 2);
    }

    #[test]
    fn cal_reg24_pushes_three_bytes_then_jumps() {
        let program = microprogram(Opcode::Cal, AddressingMode::Reg24);
        assert_eq!(program.len(), 13);
        assert_eq!(program.last(), Some(&MovPc(PcSrc::Rx)));
    }

    #[test]
    fn ret_ends_with_an_explicit_increment() {
        let program = microprogram(Opcode::Ret, AddressingMode::None);
        assert_eq!(program.last(), Some(&IncPc));
    }

    #[test]
    fn irt_has_no_trailing_increment() {
        let program = microprogram(Opcode::Irt, AddressingMode::None);
        assert_ne!(program.last(), Some(&IncPc));
        assert_eq!(program.len(), 17);
    }
}
