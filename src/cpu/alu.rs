//! The arithmetic/logic unit: takes the two accumulator latches and produces
//! `alu_out` plus a flag update.
//!
//! A handful of these preserve quirks of the machine being emulated rather
//! than "fixing" them, since programs written against the real hardware
//! depend on the observable behavior, bugs included:
//!
//! - `adc` folds the carry-in as a hardwired `+1`, not the current `CARRY`
//!   flag. Chaining `ADC` to build wider additions does not work.
//! - `sub` derives `CARRY` from the same overflow check as `add` (i.e. an
//!   addition of the two operands), not from a borrow. `SUB` never actually
//!   sets `CARRY` the way a subtraction would.
//! - `shl`, `shr` and `asr` all derive `CARRY` from `accu1 << 1 > 0xFF`, so
//!   `shr`/`asr` report carry-out on the bit shifted into the *top*, not the
//!   bit shifted out the bottom.

use super::flags::Flags;

pub struct AluResult {
    pub out: u8,
    pub flags: Flags,
}

fn zero_negative(out: u8, flags: &mut Flags) {
    flags.set_flag(Flags::ZERO, out == 0x00);
    flags.set_flag(Flags::NEGATIVE, out & 0x80 != 0);
}

pub fn adc(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1.wrapping_add(accu2).wrapping_add(1);
    flags.set_flag(
        Flags::CARRY,
        accu1 as u16 + accu2 as u16 + 1 > 0xFF,
    );
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn add(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1.wrapping_add(accu2);
    flags.set_flag(Flags::CARRY, accu1 as u16 + accu2 as u16 > 0xFF);
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn sub(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1.wrapping_sub(accu2);
    // Mirrors `add`'s overflow check rather than a borrow check.
    flags.set_flag(Flags::CARRY, accu1 as u16 + accu2 as u16 > 0xFF);
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn and(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1 & accu2;
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn or(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1 | accu2;
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn xor(accu1: u8, accu2: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1 ^ accu2;
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn not(accu1: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = !accu1;
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn shl(accu1: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1 << 1;
    flags.set_flag(Flags::CARRY, (accu1 as u16) << 1 > 0xFF);
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn asr(accu1: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let mut out = accu1 >> 1;
    if accu1 & 0x80 == 0x80 {
        out |= 0x01 << 7;
    }
    flags.set_flag(Flags::CARRY, (accu1 as u16) << 1 > 0xFF);
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

pub fn shr(accu1: u8, flags_in: Flags) -> AluResult {
    let mut flags = flags_in;
    let out = accu1 >> 1;
    flags.set_flag(Flags::CARRY, (accu1 as u16) << 1 > 0xFF);
    zero_negative(out, &mut flags);
    AluResult { out, flags }
}

/// `CMP` does not produce an `alu_out`; it only updates flags from the two
/// accumulator latches.
pub fn cmp(accu1: u8, accu2: u8, flags_in: Flags) -> Flags {
    let mut flags = flags_in;
    flags.set_flag(Flags::ZERO, accu1 == 0x00);
    flags.set_flag(Flags::EQUAL, accu1 == accu2);
    flags.set_flag(Flags::INFERIOR, accu1 < accu2);
    flags.set_flag(Flags::SUPERIOR, accu1 > accu2);
    flags
}
