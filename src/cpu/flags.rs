//! Condition flags raised and cleared by the ALU and by the `STx`/`CLx`
//! instructions, and tested by the conditional jumps and `CMP`.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const CARRY     = 0b0000_0001;
        const ZERO      = 0b0000_0010;
        const HALT      = 0b0000_0100;
        const NEGATIVE  = 0b0000_1000;
        const INFERIOR  = 0b0001_0000;
        const SUPERIOR  = 0b0010_0000;
        const EQUAL     = 0b0100_0000;
        const INTERRUPT = 0b1000_0000;
    }
}

impl Flags {
    pub fn set_flag(&mut self, flag: Flags, value: bool) {
        self.set(flag, value);
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::empty()
    }
}
