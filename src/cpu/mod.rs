//! The central processing unit: a fetch/decode/execute state machine driven
//! one clock cycle at a time by [`Cpu::tick`], reading and writing nothing
//! but the shared [`Motherboard`](crate::motherboard::Motherboard).

pub mod alu;
pub mod decode;
pub mod flags;
pub mod isa;
pub mod microcode;
pub mod microop;

use crate::constants::{ivt_entry_address, ADDRESS_MASK, INSTRUCTION_BYTES, STACK_START, WORK_MEMORY_END, WORK_MEMORY_START};
use crate::core::Component;
use crate::motherboard::Motherboard;

use decode::{decode, DecodedInstruction};
use flags::Flags;
use isa::{Register, REGISTER_COUNT};
use microop::{Acc1Src, Acc2Src, AddrSrc, DataBusSrc, JumpTarget, MicroOp, PcSrc, RegDst, RegSrc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch1,
    Fetch2,
    Fetch3,
    Fetch4,
    Fetch5,
    Decode,
    Execute,
    /// Never entered by this instruction set; `HLT` is implemented as the
    /// `HALT` flag instead, not a dedicated step.
    Stop,
    Interrupt1,
    Interrupt2,
    Interrupt3,
    Interrupt4,
    Interrupt5,
    Interrupt6,
    Interrupt7,
    Interrupt8,
}

pub struct Cpu {
    registers: [u8; REGISTER_COUNT],
    flags: Flags,
    pc: u32,
    sp: u8,
    accu1: u8,
    accu2: u8,
    alu_out: u8,

    step: Step,
    micro_pc: usize,
    jump: bool,
    software_interrupt: bool,

    fetch_bytes: [u8; 5],
    decoded: Option<DecodedInstruction>,

    interrupt_port: u8,
    interrupt_data: u8,
    interrupt_vector: u32,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        let mut flags = Flags::empty();
        // The CPU is always ready to service interrupts out of reset; there
        // would otherwise be no way to get it started.
        flags.insert(Flags::INTERRUPT);

        Self {
            registers: [0; REGISTER_COUNT],
            flags,
            pc: WORK_MEMORY_START,
            sp: STACK_START,
            accu1: 0,
            accu2: 0,
            alu_out: 0,
            step: Step::Fetch1,
            micro_pc: 0,
            jump: false,
            software_interrupt: false,
            fetch_bytes: [0; 5],
            decoded: None,
            interrupt_port: 0,
            interrupt_data: 0,
            interrupt_vector: 0,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.registers[reg.index()]
    }

    pub fn current_step(&self) -> Step {
        self.step
    }

    /// Latch a software interrupt request, honored at the next `FETCH_1`
    /// once the CPU is between instructions. Used by `INT` and by host code
    /// that wants to kick off interrupt handling without a real device.
    pub fn request_software_interrupt(&mut self) {
        self.software_interrupt = true;
    }

    fn push_pc_byte(&mut self, mb: &mut Motherboard, byte: u8) {
        mb.set_address_bus(self.sp as u32);
        mb.set_data_bus(byte);
        mb.set_rw(true);
        mb.set_re(true);
        self.sp = self.sp.wrapping_add(1);
    }

    fn advance_pc_by_instruction(&mut self) {
        self.pc = self.pc.wrapping_add(INSTRUCTION_BYTES);
        if self.pc >= WORK_MEMORY_END {
            self.pc = 0;
        }
    }

    pub fn step(&mut self, mb: &mut Motherboard) -> bool {
        if self.flags.contains(Flags::HALT) {
            // Always ready to handle interrupts while halted, otherwise
            // there would be no way to wake back up.
            self.flags.insert(Flags::INTERRUPT);

            if self.step != Step::Fetch1 {
                self.step = Step::Fetch1;
                self.micro_pc = 0;
                self.advance_pc_by_instruction();
            } else if mb.int() {
                self.step = Step::Interrupt1;
                mb.set_inr(true);
                self.flags.remove(Flags::HALT);
            }
            return false;
        }

        match self.step {
            Step::Interrupt1 => {
                mb.set_inr(false);
                // No new interrupts serviced until IRT runs, or STI sets the
                // flag back early.
                self.flags.remove(Flags::INTERRUPT);

                self.interrupt_port = (mb.address_bus() & 0xFF) as u8;
                self.interrupt_data = mb.data_bus();

                let low = (self.pc & 0xFF) as u8;
                self.push_pc_byte(mb, low);

                self.step = Step::Interrupt2;
                false
            }
            Step::Interrupt2 => {
                let mid = ((self.pc >> 8) & 0xFF) as u8;
                self.push_pc_byte(mb, mid);
                self.step = Step::Interrupt3;
                false
            }
            Step::Interrupt3 => {
                let high = ((self.pc >> 16) & 0xFF) as u8;
                self.push_pc_byte(mb, high);
                self.step = Step::Interrupt4;
                false
            }
            Step::Interrupt4 => {
                if !self.software_interrupt {
                    let i = self.registers[Register::I.index()];
                    self.push_pc_byte(mb, i);
                } else {
                    self.software_interrupt = false;
                }
                self.registers[Register::I.index()] = self.interrupt_data;
                self.step = Step::Interrupt5;
                false
            }
            Step::Interrupt5 => {
                mb.set_address_bus(ivt_entry_address(self.interrupt_port));
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Interrupt6;
                false
            }
            Step::Interrupt6 => {
                self.interrupt_vector = (mb.data_bus() as u32) << 16;
                mb.set_address_bus(ivt_entry_address(self.interrupt_port) + 1);
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Interrupt7;
                false
            }
            Step::Interrupt7 => {
                self.interrupt_vector += (mb.data_bus() as u32) << 8;
                mb.set_address_bus(ivt_entry_address(self.interrupt_port) + 2);
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Interrupt8;
                false
            }
            Step::Interrupt8 => {
                self.interrupt_vector += mb.data_bus() as u32;
                self.pc = self.interrupt_vector & ADDRESS_MASK;
                log::debug!("interrupt vector loaded, resuming at pc={:#08x}", self.pc);
                self.step = Step::Fetch1;
                false
            }

            Step::Fetch1 => {
                if self.flags.contains(Flags::INTERRUPT) && (mb.int() || self.software_interrupt) {
                    log::debug!(
                        "servicing {} interrupt at pc={:#08x}",
                        if self.software_interrupt { "software" } else { "hardware" },
                        self.pc
                    );
                    self.step = Step::Interrupt1;
                    mb.set_inr(!self.software_interrupt);
                } else {
                    mb.set_address_bus(self.pc);
                    mb.set_rw(false);
                    mb.set_re(true);
                    self.step = Step::Fetch2;
                }
                false
            }
            Step::Fetch2 => {
                self.fetch_bytes[0] = mb.data_bus();
                mb.set_address_bus(self.pc.wrapping_add(1));
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Fetch3;
                false
            }
            Step::Fetch3 => {
                self.fetch_bytes[1] = mb.data_bus();
                mb.set_address_bus(self.pc.wrapping_add(2));
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Fetch4;
                false
            }
            Step::Fetch4 => {
                self.fetch_bytes[2] = mb.data_bus();
                mb.set_address_bus(self.pc.wrapping_add(3));
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Fetch5;
                false
            }
            Step::Fetch5 => {
                self.fetch_bytes[3] = mb.data_bus();
                mb.set_address_bus(self.pc.wrapping_add(4));
                mb.set_rw(false);
                mb.set_re(true);
                self.step = Step::Decode;
                false
            }
            Step::Decode => {
                self.fetch_bytes[4] = mb.data_bus();
                let decoded = decode(self.fetch_bytes, &self.registers);
                log::debug!(
                    "decoded opcode={:?} mode={:?} at pc={:#08x}",
                    decoded.opcode,
                    decoded.mode,
                    self.pc
                );
                self.decoded = Some(decoded);
                self.step = Step::Execute;
                self.micro_pc = 0;
                false
            }
            Step::Execute => {
                let decoded = self.decoded.expect("EXECUTE reached without a decoded instruction");
                let program = microcode::microprogram(decoded.opcode, decoded.mode);

                if self.micro_pc >= program.len() {
                    self.step = Step::Fetch1;
                    self.micro_pc = 0;
                    if !self.jump {
                        self.advance_pc_by_instruction();
                    } else {
                        self.jump = false;
                    }
                    true
                } else {
                    let op = program[self.micro_pc];
                    log::trace!("micro_pc={} op={:?}", self.micro_pc, op);
                    self.apply_microop(op, decoded, mb);
                    self.micro_pc += 1;
                    false
                }
            }
            Step::Stop => false,
        }
    }

    fn jump_target(&self, target: JumpTarget, d: DecodedInstruction) -> u32 {
        match target {
            JumpTarget::Rx => d.rx,
            JumpTarget::Vx => d.vx,
        }
    }

    fn conditional_jump(&mut self, target: JumpTarget, d: DecodedInstruction, flag: Flags) {
        if self.flags.contains(flag) {
            let addr = self.jump_target(target, d);
            self.pc = addr & ADDRESS_MASK;
            self.jump = true;
        }
    }

    fn apply_microop(&mut self, op: MicroOp, d: DecodedInstruction, mb: &mut Motherboard) {
        match op {
            MicroOp::MovAcc1(src) => {
                self.accu1 = match src {
                    Acc1Src::AluOut => self.alu_out,
                    Acc1Src::DataBus => mb.data_bus(),
                    Acc1Src::R1 => self.registers[d.r1.index()],
                    Acc1Src::R2 => self.registers[d.r2.index()],
                    Acc1Src::R4 => self.registers[d.r4.index()],
                    Acc1Src::V1 => d.v1,
                };
            }
            MicroOp::MovAcc2(src) => {
                self.accu2 = match src {
                    Acc2Src::X1 => 1,
                    Acc2Src::AluOut => self.alu_out,
                    Acc2Src::DataBus => mb.data_bus(),
                    Acc2Src::R1 => self.registers[d.r1.index()],
                    Acc2Src::R2 => self.registers[d.r2.index()],
                    Acc2Src::R4 => self.registers[d.r4.index()],
                    Acc2Src::V1 => d.v1,
                };
            }
            MicroOp::MovReg(dst, src) => {
                let value = match src {
                    RegSrc::AluOut => self.alu_out,
                    RegSrc::DataBus => mb.data_bus(),
                    RegSrc::R1 => self.registers[d.r1.index()],
                    RegSrc::R2 => self.registers[d.r2.index()],
                    RegSrc::R4 => self.registers[d.r4.index()],
                    RegSrc::V1 => d.v1,
                };
                let idx = match dst {
                    RegDst::R1 => d.r1.index(),
                    RegDst::R2 => d.r2.index(),
                    RegDst::R4 => d.r4.index(),
                    RegDst::I => Register::I.index(),
                };
                self.registers[idx] = value;
            }
            MicroOp::MovDataBus(src) => {
                let value = match src {
                    DataBusSrc::AluOut => self.alu_out,
                    DataBusSrc::R1 => self.registers[d.r1.index()],
                    DataBusSrc::R2 => self.registers[d.r2.index()],
                    DataBusSrc::R4 => self.registers[d.r4.index()],
                    DataBusSrc::V1 => d.v1,
                    DataBusSrc::PcHigh => ((self.pc >> 16) & 0xFF) as u8,
                    DataBusSrc::PcMid => ((self.pc >> 8) & 0xFF) as u8,
                    DataBusSrc::PcLow => (self.pc & 0xFF) as u8,
                };
                mb.set_data_bus(value);
            }
            MicroOp::MovAddBus(src) => {
                let value = match src {
                    AddrSrc::V1 => d.v1 as u32,
                    AddrSrc::R1 => self.registers[d.r1.index()] as u32,
                    AddrSrc::R2 => self.registers[d.r2.index()] as u32,
                    AddrSrc::Rx => d.rx,
                    AddrSrc::Vx => d.vx,
                    AddrSrc::Stk => self.sp as u32,
                };
                mb.set_address_bus(value);
            }
            MicroOp::MovPc(src) => {
                let value = match src {
                    PcSrc::Rx => d.rx,
                    PcSrc::Vx => d.vx,
                    PcSrc::DataBusHighReplace => (mb.data_bus() as u32) << 16,
                    PcSrc::PcPlusDataBusMid => self.pc.wrapping_add((mb.data_bus() as u32) << 8),
                    PcSrc::PcPlusDataBusLow => self.pc.wrapping_add(mb.data_bus() as u32),
                };
                self.pc = value & ADDRESS_MASK;
                self.jump = true;
            }
            MicroOp::RamRead => {
                mb.set_rw(false);
                mb.set_re(true);
            }
            MicroOp::RamWrite => {
                mb.set_rw(true);
                mb.set_re(true);
            }
            MicroOp::IncStk => self.sp = self.sp.wrapping_add(1),
            MicroOp::DecStk => self.sp = self.sp.wrapping_sub(1),
            MicroOp::IncPc => self.advance_pc_by_instruction(),
            MicroOp::In => {
                mb.set_rw(false);
                mb.set_ie(true);
            }
            MicroOp::Out => {
                mb.set_rw(true);
                mb.set_ie(true);
            }
            MicroOp::Int => self.software_interrupt = true,

            MicroOp::Adc => {
                let r = alu::adc(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Add => {
                let r = alu::add(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Sub => {
                let r = alu::sub(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::And => {
                let r = alu::and(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Or => {
                let r = alu::or(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Xor => {
                let r = alu::xor(self.accu1, self.accu2, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Not => {
                let r = alu::not(self.accu1, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Shl => {
                let r = alu::shl(self.accu1, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Asr => {
                let r = alu::asr(self.accu1, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Shr => {
                let r = alu::shr(self.accu1, self.flags);
                self.alu_out = r.out;
                self.flags = r.flags;
            }
            MicroOp::Cmp => self.flags = alu::cmp(self.accu1, self.accu2, self.flags),

            MicroOp::Clc => self.flags.remove(Flags::CARRY),
            MicroOp::Cle => self.flags.remove(Flags::EQUAL),
            MicroOp::Cli => self.flags.remove(Flags::INTERRUPT),
            MicroOp::Cln => self.flags.remove(Flags::NEGATIVE),
            MicroOp::Cls => self.flags.remove(Flags::SUPERIOR),
            MicroOp::Clz => self.flags.remove(Flags::ZERO),
            MicroOp::Clf => self.flags.remove(Flags::INFERIOR),
            MicroOp::Sth => self.flags.insert(Flags::HALT),
            MicroOp::Stc => self.flags.insert(Flags::CARRY),
            MicroOp::Sti => self.flags.insert(Flags::INTERRUPT),
            MicroOp::Stn => self.flags.insert(Flags::NEGATIVE),
            MicroOp::Stf => self.flags.insert(Flags::INFERIOR),
            MicroOp::Sts => self.flags.insert(Flags::SUPERIOR),
            MicroOp::Ste => self.flags.insert(Flags::EQUAL),
            MicroOp::Stz => self.flags.insert(Flags::ZERO),

            MicroOp::Jmc(t) => self.conditional_jump(t, d, Flags::CARRY),
            MicroOp::Jme(t) => self.conditional_jump(t, d, Flags::EQUAL),
            MicroOp::Jmf(t) => self.conditional_jump(t, d, Flags::INFERIOR),
            MicroOp::Jms(t) => self.conditional_jump(t, d, Flags::SUPERIOR),
            MicroOp::Jmz(t) => self.conditional_jump(t, d, Flags::ZERO),
            MicroOp::Jmn(t) => self.conditional_jump(t, d, Flags::NEGATIVE),
            MicroOp::Jmp(t) => {
                let addr = self.jump_target(t, d);
                self.pc = addr & ADDRESS_MASK;
                self.jump = true;
            }
            MicroOp::Jmk(t) => {
                let addr = self.jump_target(t, d);
                self.pc = self.pc.wrapping_add(addr);
                if self.pc > WORK_MEMORY_END {
                    self.pc = 0;
                }
                self.jump = true;
            }
        }
    }
}

/// The per-cycle advance needs a [`Motherboard`] (see [`Cpu::step`]), so the
/// generic [`Component`] hook is a deliberate no-op — mirrors the pattern
/// used by [`crate::ram::Ram`] and [`crate::iod::Iod`].
impl Component for Cpu {
    fn tick(&mut self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ram::Ram;

    /// Encode one 5-byte instruction word.
    fn encode(opcode: u8, mode: u8, r1: u8, r2: u8, v1: u8, v2: u8, ex: u8) -> [u8; 5] {
        let b0 = (opcode << 2) | (mode >> 2);
        let b1 = ((mode & 0x03) << 6) | ((r1 & 0x07) << 3) | (r2 & 0x07);
        [b0, b1, v1, v2, ex]
    }

    fn run_until_fetch1(cpu: &mut Cpu, mb: &mut Motherboard, ram: &mut Ram) {
        loop {
            cpu.step(mb);
            ram.step(mb);
            if cpu.current_step() == Step::Fetch1 {
                break;
            }
        }
    }

    #[test]
    fn add_reg_reg_updates_destination_and_flags() {
        let mut mb = Motherboard::new();
        let mut ram = Ram::new();
        let mut cpu = Cpu::new();

        // ADD A, B with A=0xF0, B=0x20 (wraps, sets CARRY).
        let word = encode(isa::Opcode::Add as u8, isa::AddressingMode::Reg as u8, 0, 1, 0, 0, 0);
        ram.load(WORK_MEMORY_START, &word).unwrap();
        cpu.registers[Register::A.index()] = 0xF0;
        cpu.registers[Register::B.index()] = 0x20;

        run_until_fetch1(&mut cpu, &mut mb, &mut ram);

        assert_eq!(cpu.register(Register::A), 0x10);
        assert!(cpu.flags().contains(Flags::CARRY));
        assert_eq!(cpu.pc(), WORK_MEMORY_START + INSTRUCTION_BYTES);
    }

    #[test]
    fn cal_then_ret_lands_on_the_instruction_after_the_call() {
        let mut mb = Motherboard::new();
        let mut ram = Ram::new();
        let mut cpu = Cpu::new();

        let target = WORK_MEMORY_START + 0x100;
        let call = encode(isa::Opcode::Cal as u8, isa::AddressingMode::Imm24 as u8, 0, 0, (target >> 16) as u8, (target >> 8) as u8, target as u8);
        ram.load(WORK_MEMORY_START, &call).unwrap();
        let ret = encode(isa::Opcode::Ret as u8, isa::AddressingMode::None as u8, 0, 0, 0, 0, 0);
        ram.load(target, &ret).unwrap();

        run_until_fetch1(&mut cpu, &mut mb, &mut ram); // CAL
        assert_eq!(cpu.pc(), target);

        run_until_fetch1(&mut cpu, &mut mb, &mut ram); // RET
        assert_eq!(cpu.pc(), WORK_MEMORY_START + INSTRUCTION_BYTES);
        assert_eq!(cpu.sp(), STACK_START);
    }

    #[test]
    fn halt_sets_flag_and_parks_on_fetch1() {
        let mut mb = Motherboard::new();
        let mut ram = Ram::new();
        let mut cpu = Cpu::new();

        let hlt = encode(isa::Opcode::Hlt as u8, isa::AddressingMode::None as u8, 0, 0, 0, 0, 0);
        ram.load(WORK_MEMORY_START, &hlt).unwrap();

        run_until_fetch1(&mut cpu, &mut mb, &mut ram);
        assert!(cpu.flags().contains(Flags::HALT));

        // Halted ticks do not advance PC further once parked on FETCH_1.
        let pc_before = cpu.pc();
        cpu.step(&mut mb);
        assert_eq!(cpu.pc(), pc_before);
    }

    #[test]
    fn hardware_interrupt_pushes_return_address_and_i_register() {
        let mut mb = Motherboard::new();
        let mut ram = Ram::new();
        let mut cpu = Cpu::new();

        // IVT entry for port 3 points at 0x000500.
        ram.load_ivt_entry(3, WORK_MEMORY_START + 0x100).unwrap();
        let nop = [0u8; 5];
        ram.load(WORK_MEMORY_START, &nop).unwrap();

        mb.set_int(true);
        mb.set_address_bus(3);
        mb.set_data_bus(0x77);

        // Drive ticks until the vector has been loaded and fetch resumes.
        for _ in 0..12 {
            cpu.step(&mut mb);
            ram.step(&mut mb);
        }

        assert_eq!(cpu.pc(), WORK_MEMORY_START + 0x100);
        assert_eq!(cpu.register(Register::I), 0x77);
        assert!(!cpu.flags().contains(Flags::INTERRUPT));
    }
}
