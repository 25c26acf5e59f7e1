//! The shared bus fabric: data bus, 24-bit address bus, the five control
//! flip-flops, and the 256-slot device/port table.
//!
//! This is the one piece of shared mutable state in the whole core; every
//! other component reads and writes it explicitly instead of calling each
//! other directly (see the crate's top-level docs).

use crate::constants::{ADDRESS_MASK, PORT_TABLE_SIZE};
use crate::device::Device;
use crate::error::CoreError;

/// Opaque handle to a plugged device, returned by [`Motherboard::plug_device`]
/// and required by [`Motherboard::unplug_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(usize);

#[derive(Clone, Copy)]
struct PortBinding {
    device: usize,
    local: u8,
}

pub struct Motherboard {
    data_bus: u8,
    address_bus: u32,
    rw: bool,
    re: bool,
    ie: bool,
    int: bool,
    inr: bool,

    ports: Vec<Option<PortBinding>>,
    devices: Vec<Option<Box<dyn Device>>>,
}

impl Default for Motherboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Motherboard {
    pub fn new() -> Self {
        Self {
            data_bus: 0,
            address_bus: 0,
            rw: false,
            re: false,
            ie: false,
            int: false,
            inr: false,
            ports: vec![None; PORT_TABLE_SIZE],
            devices: Vec::new(),
        }
    }

    // --- Data bus ---

    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    pub fn set_data_bus(&mut self, value: u8) {
        self.data_bus = value;
    }

    // --- Address bus (upper byte always masked off on write) ---

    pub fn address_bus(&self) -> u32 {
        self.address_bus
    }

    pub fn set_address_bus(&mut self, value: u32) {
        self.address_bus = value & ADDRESS_MASK;
    }

    // --- Control lines ---

    pub fn rw(&self) -> bool {
        self.rw
    }

    pub fn set_rw(&mut self, value: bool) {
        self.rw = value;
    }

    pub fn re(&self) -> bool {
        self.re
    }

    pub fn set_re(&mut self, value: bool) {
        self.re = value;
    }

    pub fn ie(&self) -> bool {
        self.ie
    }

    pub fn set_ie(&mut self, value: bool) {
        self.ie = value;
    }

    pub fn int(&self) -> bool {
        self.int
    }

    pub fn set_int(&mut self, value: bool) {
        self.int = value;
    }

    pub fn inr(&self) -> bool {
        self.inr
    }

    pub fn set_inr(&mut self, value: bool) {
        self.inr = value;
    }

    // --- Device / port table ---

    /// Reserve the first free run of `device.port_count()` contiguous port
    /// slots and bind `device` to them. All-or-nothing: either every slot in
    /// the chosen run is free, or the table is left untouched and an error
    /// is returned.
    pub fn plug_device(&mut self, device: Box<dyn Device>) -> Result<DeviceId, CoreError> {
        let needed = device.port_count();
        if needed == 0 {
            let idx = self.devices.len();
            self.devices.push(Some(device));
            return Ok(DeviceId(idx));
        }

        let n = needed as usize;
        let run_start = (0..=PORT_TABLE_SIZE.saturating_sub(n))
            .find(|&start| self.ports[start..start + n].iter().all(Option::is_none));

        let Some(start) = run_start else {
            return Err(CoreError::PortTableExhausted { needed });
        };

        let device_idx = self.devices.len();
        for (offset, slot) in self.ports[start..start + n].iter_mut().enumerate() {
            *slot = Some(PortBinding {
                device: device_idx,
                local: offset as u8,
            });
        }
        self.devices.push(Some(device));
        Ok(DeviceId(device_idx))
    }

    /// Free every slot bound to `id` and drop the device.
    pub fn unplug_device(&mut self, id: DeviceId) {
        for slot in self.ports.iter_mut() {
            if slot.map(|b| b.device) == Some(id.0) {
                *slot = None;
            }
        }
        if let Some(entry) = self.devices.get_mut(id.0) {
            *entry = None;
        }
    }

    /// The device bound to `port`, if any, for direct capability calls
    /// (used by the IOD to poll `int()`/`acknowledge_int()` and broker I/O).
    pub fn device_at(&mut self, port: u8) -> Option<(&mut (dyn Device + 'static), u8)> {
        let binding = self.ports[port as usize]?;
        let device = self.devices[binding.device].as_deref_mut()?;
        Some((device, binding.local))
    }

    pub fn get_port_data(&mut self, port: u8) -> u8 {
        match self.device_at(port) {
            Some((device, local)) => device.read(local),
            None => 0x00,
        }
    }

    pub fn set_port_data(&mut self, port: u8, value: u8) {
        if let Some((device, local)) = self.device_at(port) {
            device.write(local, value);
        }
    }

    /// Advance every plugged device by one clock cycle. Called last in the
    /// fixed per-cycle order (CPU, then IOD, then RAM, then devices).
    pub fn tick_devices(&mut self) {
        for device in self.devices.iter_mut().flatten() {
            device.tick();
        }
    }

    /// Iterate over `(port, &mut dyn Device)` for every bound port, in port
    /// order, for components (the IOD) that must poll every device each
    /// cycle. A device occupying more than one port appears once per port
    /// it owns, since polling is driven by port index in the specification.
    pub(crate) fn bound_ports(&self) -> impl Iterator<Item = u8> + '_ {
        (0..PORT_TABLE_SIZE as u16).filter_map(|p| {
            let port = p as u8;
            self.ports[port as usize].map(|_| port)
        })
    }
}
