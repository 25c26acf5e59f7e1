//! Micro-operations: the vocabulary a microprogram is built from. Each
//! variant mirrors one of the CPU's internal data-movement or ALU pulses;
//! `Cpu::apply_microop` is the only place that gives them meaning.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc1Src {
    AluOut,
    DataBus,
    R1,
    R2,
    R4,
    V1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc2Src {
    /// Hardwired constant `1`, used by `INC`/`DEC` to drive the adder/subtractor.
    X1,
    AluOut,
    DataBus,
    R1,
    R2,
    R4,
    V1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegDst {
    R1,
    R2,
    R4,
    /// The interrupt-cause register, only ever targeted by `IRT`.
    I,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegSrc {
    AluOut,
    DataBus,
    R1,
    R2,
    R4,
    V1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBusSrc {
    AluOut,
    R1,
    R2,
    R4,
    V1,
    /// Bits 23..16 of the program counter.
    PcHigh,
    /// Bits 15..8 of the program counter.
    PcMid,
    /// Bits 7..0 of the program counter.
    PcLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrSrc {
    V1,
    R1,
    R2,
    Rx,
    Vx,
    /// The current stack pointer, widened to a 24-bit address in page 0.
    Stk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcSrc {
    Rx,
    Vx,
    /// Replace PC's top byte with `data_bus << 16`, discarding the rest of PC.
    DataBusHighReplace,
    /// Add `data_bus << 8` to the current PC.
    PcPlusDataBusMid,
    /// Add `data_bus` to the current PC.
    PcPlusDataBusLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    Rx,
    Vx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    MovAcc1(Acc1Src),
    MovAcc2(Acc2Src),
    MovReg(RegDst, RegSrc),
    MovDataBus(DataBusSrc),
    MovAddBus(AddrSrc),
    MovPc(PcSrc),
    RamRead,
    RamWrite,
    IncStk,
    DecStk,
    IncPc,
    In,
    Out,
    /// Latches a software interrupt request; serviced at the next `FETCH_1`.
    Int,

    Adc,
    Add,
    Sub,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Asr,
    Shr,
    Cmp,

    Clc,
    Cle,
    Cli,
    Cln,
    Cls,
    Clz,
    Clf,
    Sth,
    Stc,
    Sti,
    Stn,
    Stf,
    Sts,
    Ste,
    Stz,

    Jmc(JumpTarget),
    Jme(JumpTarget),
    Jmf(JumpTarget),
    /// Unconditional relative jump: adds the target to PC instead of
    /// replacing it, and wraps only on a strict `>` comparison against the
    /// end of work memory (every other jump wraps on `>=`).
    Jmk(JumpTarget),
    Jmp(JumpTarget),
    Jms(JumpTarget),
    Jmz(JumpTarget),
    Jmn(JumpTarget),
}
