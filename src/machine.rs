//! Composition root: owns one each of [`Cpu`], [`Motherboard`], [`Ram`] and
//! [`Iod`], and drives them through the fixed per-cycle order the rest of
//! the crate assumes (CPU, then IOD, then RAM, then every plugged device).
//!
//! This is not a sixth component — it is the crate's public assembly point.
//! A host loop (frequency metering, a step-by-step UI, a font renderer)
//! is explicitly out of scope; what this type gives that host is a single
//! owned value it can advance one tick, or many, at a time.

use crate::cpu::Cpu;
use crate::device::Device;
use crate::error::CoreError;
use crate::iod::Iod;
use crate::motherboard::{DeviceId, Motherboard};
use crate::ram::Ram;

pub struct Machine {
    cpu: Cpu,
    mb: Motherboard,
    ram: Ram,
    iod: Iod,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mb: Motherboard::new(),
            ram: Ram::new(),
            iod: Iod::new(),
        }
    }

    /// Advance every component by exactly one simulated clock cycle, in the
    /// fixed order CPU -> IOD -> RAM -> devices. Returns `true` if the CPU
    /// reached an instruction boundary (a fresh `FETCH_1`) this tick.
    pub fn tick(&mut self) -> bool {
        let boundary = self.cpu.step(&mut self.mb);
        self.iod.step(&mut self.mb);
        self.ram.step(&mut self.mb);
        self.mb.tick_devices();
        boundary
    }

    /// Advance `n` clock cycles, returning the number of instruction
    /// boundaries crossed.
    pub fn tick_n(&mut self, n: u64) -> u64 {
        (0..n).filter(|_| self.tick()).count() as u64
    }

    /// Plug a device into the first free run of contiguous port slots.
    pub fn plug_device(&mut self, device: Box<dyn Device>) -> Result<DeviceId, CoreError> {
        self.mb.plug_device(device)
    }

    pub fn unplug_device(&mut self, id: DeviceId) {
        self.mb.unplug_device(id);
    }

    /// Copy `data` into RAM starting at `address`. Used both to install a
    /// boot image at `WORK_MEMORY_START` and to populate the interrupt
    /// vector table ahead of time.
    pub fn load_ram_image(&mut self, address: u32, data: &[u8]) -> Result<(), CoreError> {
        self.ram.load(address, data)
    }

    /// Convenience wrapper around [`Ram::load_ivt_entry`].
    pub fn load_ivt_entry(&mut self, port: u8, address: u32) -> Result<(), CoreError> {
        self.ram.load_ivt_entry(port, address)
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn motherboard(&self) -> &Motherboard {
        &self.mb
    }

    pub fn motherboard_mut(&mut self) -> &mut Motherboard {
        &mut self.mb
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }
}
