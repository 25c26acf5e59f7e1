mod common;

use common::{encode, run_to_fetch1, init_logging};
use hbc_core::cpu::flags::Flags;
use hbc_core::cpu::isa::{AddressingMode, Opcode, Register};
use hbc_core::machine::Machine;

/// Round-trip push/pop: `PSH R` then `POP R'` restores the byte, leaves `SP`
/// unchanged, and touches no flag.
#[test]
fn push_then_pop_round_trips_through_the_stack() {
    init_logging();
    let mut m = Machine::new();

    let mov = encode(Opcode::Mov as u8, AddressingMode::RegImm8 as u8, Register::C.index() as u8, 0, 0x9A, 0, 0);
    m.load_ram_image(0x000400, &mov).unwrap();
    let psh = encode(Opcode::Psh as u8, AddressingMode::Reg as u8, Register::C.index() as u8, 0, 0, 0, 0);
    m.load_ram_image(0x000405, &psh).unwrap();
    let pop = encode(Opcode::Pop as u8, AddressingMode::Reg as u8, Register::D.index() as u8, 0, 0, 0, 0);
    m.load_ram_image(0x00040A, &pop).unwrap();

    let sp_before = m.cpu().sp();
    let flags_before = m.cpu().flags();

    run_to_fetch1(&mut m); // MOV C, 0x9A
    run_to_fetch1(&mut m); // PSH C
    run_to_fetch1(&mut m); // POP D

    assert_eq!(m.cpu().register(Register::D), 0x9A);
    assert_eq!(m.cpu().sp(), sp_before);
    assert_eq!(m.cpu().flags(), flags_before);
}

/// Idempotent flag sets: `STC; STC` leaves the same state as a single `STC`.
#[test]
fn repeated_set_flag_is_idempotent() {
    init_logging();
    let mut m = Machine::new();
    let stc = encode(Opcode::Stc as u8, AddressingMode::None as u8, 0, 0, 0, 0, 0);
    m.load_ram_image(0x000400, &stc).unwrap();
    m.load_ram_image(0x000405, &stc).unwrap();

    run_to_fetch1(&mut m);
    let after_one = m.cpu().flags();
    run_to_fetch1(&mut m);
    assert_eq!(m.cpu().flags(), after_one);
    assert!(m.cpu().flags().contains(Flags::CARRY));
}

/// Jump determinism: `JMP addr` followed by the next fetch reads from `addr`.
#[test]
fn jmp_is_deterministic() {
    init_logging();
    let mut m = Machine::new();
    let target: u32 = 0x000900;
    let jmp = encode(
        Opcode::Jmp as u8,
        AddressingMode::Imm24 as u8,
        0,
        0,
        (target >> 16) as u8,
        (target >> 8) as u8,
        target as u8,
    );
    m.load_ram_image(0x000400, &jmp).unwrap();
    let hlt = encode(Opcode::Hlt as u8, AddressingMode::None as u8, 0, 0, 0, 0, 0);
    m.load_ram_image(target, &hlt).unwrap();

    run_to_fetch1(&mut m);
    assert_eq!(m.cpu().pc(), target);
    run_to_fetch1(&mut m);
    assert!(m.cpu().flags().contains(Flags::HALT), "the instruction fetched after the jump must be the HLT at `target`");
}
