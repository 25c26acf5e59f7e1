//! Shared fixtures for the end-to-end scenarios in `tests/*.rs`. Unlike the
//! `#[cfg(test)]`-only fixture device in `src/device.rs`, this one has to be
//! a real, public-API implementation of `Device` since integration tests
//! build against the crate's public surface only.

use hbc_core::device::Device;

/// Route `log::trace!`/`log::debug!` output from the core (decode, interrupt
/// entry, micro-op dispatch) to the test harness. Idempotent and safe to
/// call from every test since `try_init` no-ops after the first call.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device with one port, a software-settable byte and INT latch. Stands
/// in for "some peripheral" in the interrupt scenarios of the spec.
pub struct StubDevice {
    value: u8,
    interrupting: bool,
}

impl StubDevice {
    pub fn new() -> Self {
        Self {
            value: 0,
            interrupting: false,
        }
    }

    pub fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    pub fn raise_int(&mut self) {
        self.interrupting = true;
    }
}

impl Device for StubDevice {
    fn port_count(&self) -> u8 {
        1
    }

    fn read(&mut self, _index: u8) -> u8 {
        self.value
    }

    fn write(&mut self, _index: u8, value: u8) {
        self.value = value;
    }

    fn int(&self) -> bool {
        self.interrupting
    }

    fn acknowledge_int(&mut self) {
        self.interrupting = false;
    }

    fn tick(&mut self) {}
}

/// Pack one 5-byte instruction word from its fields, mirroring the bit
/// layout `hbc_core::cpu::decode` expects.
pub fn encode(opcode: u8, mode: u8, r1: u8, r2: u8, v1: u8, v2: u8, ex: u8) -> [u8; 5] {
    let b0 = (opcode << 2) | (mode >> 2);
    let b1 = ((mode & 0x03) << 6) | ((r1 & 0x07) << 3) | (r2 & 0x07);
    [b0, b1, v1, v2, ex]
}

/// Run ticks on `m` until the CPU lands back on `FETCH_1`, i.e. until the
/// in-flight instruction or interrupt sequence completes. Bounded so a bug
/// that never returns to `FETCH_1` fails the test instead of hanging it.
pub fn run_to_fetch1(m: &mut hbc_core::machine::Machine) {
    use hbc_core::cpu::Step;
    for _ in 0..64 {
        m.tick();
        if m.cpu().current_step() == Step::Fetch1 {
            return;
        }
    }
    panic!("CPU never returned to FETCH_1 within 64 ticks");
}
