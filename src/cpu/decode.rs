//! Turns five freshly-fetched instruction bytes into the scratch fields the
//! microprogram for that `(opcode, addressing mode)` pair reads from.
//!
//! Byte layout (most significant byte fetched first):
//!
//! ```text
//! byte0: oooooo mm         opcode (6 bits) | addressing mode, high 2 bits
//! byte1: mm rrr sss        addressing mode, low 2 bits | R1 (3) | R2 (3)
//! byte2: vvvvvvvv          V1 (also selects R3 via its low 3 bits)
//! byte3: vvvvvvvv          V2
//! byte4: vvvvvvvv          Ex (also selects R4 via its low 3 bits)
//! ```
//!
//! `Vx` is the 24-bit immediate built from the raw V1/V2/Ex bytes. `Rx` is a
//! different 24-bit value built from the *current contents* of the R1/R2/R3
//! registers — it is how register-indirect addressing modes compute an
//! address, so it must be recomputed against the live register file rather
//! than cached from the fetch.

use super::isa::{AddressingMode, Opcode, Register};

#[derive(Debug, Clone, Copy)]
pub struct DecodedInstruction {
    pub opcode: Opcode,
    pub mode: AddressingMode,
    pub r1: Register,
    pub r2: Register,
    pub r3: Register,
    pub r4: Register,
    pub v1: u8,
    pub v2: u8,
    pub ex: u8,
    pub vx: u32,
    pub rx: u32,
}

pub fn decode(bytes: [u8; 5], registers: &[u8; super::isa::REGISTER_COUNT]) -> DecodedInstruction {
    let [b0, b1, v1, v2, ex] = bytes;

    let opcode = Opcode::from_bits(b0 >> 2);
    let mode = AddressingMode::from_bits(((b0 & 0x03) << 2) | (b1 >> 6));
    let r1 = Register::from_selector((b1 >> 3) & 0x07);
    let r2 = Register::from_selector(b1 & 0x07);
    let r3 = Register::from_selector(v1 & 0x07);
    let r4 = Register::from_selector(ex & 0x07);

    let vx = ((v1 as u32) << 16) | ((v2 as u32) << 8) | ex as u32;
    let rx = ((registers[r1.index()] as u32) << 16)
        | ((registers[r2.index()] as u32) << 8)
        | registers[r3.index()] as u32;

    DecodedInstruction {
        opcode,
        mode,
        r1,
        r2,
        r3,
        r4,
        v1,
        v2,
        ex,
        vx,
        rx,
    }
}
