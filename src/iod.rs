//! The I/O Dispatcher: polls devices for pending interrupts, queues them,
//! signals the CPU, and brokers port-mapped I/O reads/writes.

use std::collections::VecDeque;

use crate::constants::{INTERRUPT_QUEUE_SIZE, PORT_TABLE_SIZE};
use crate::core::Component;
use crate::motherboard::Motherboard;

pub struct Iod {
    queue: VecDeque<(u8, u8)>,
}

impl Default for Iod {
    fn default() -> Self {
        Self::new()
    }
}

impl Iod {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::with_capacity(INTERRUPT_QUEUE_SIZE),
        }
    }

    pub fn step(&mut self, mb: &mut Motherboard) {
        self.poll(mb);
        self.signal(mb);
        if !self.deliver(mb) {
            self.broker(mb);
        }
    }

    fn poll(&mut self, mb: &mut Motherboard) {
        for port in 0..PORT_TABLE_SIZE as u16 {
            let port = port as u8;
            let Some((device, local)) = mb.device_at(port) else {
                continue;
            };
            if !device.int() {
                continue;
            }
            if self.queue.len() >= INTERRUPT_QUEUE_SIZE {
                log::warn!("interrupt queue full, dropping interrupt from port {port}");
                continue;
            }
            let value = device.read(local);
            device.acknowledge_int();
            self.queue.push_back((port, value));
        }
    }

    fn signal(&self, mb: &mut Motherboard) {
        if !self.queue.is_empty() && !mb.int() {
            mb.set_int(true);
        }
    }

    /// Returns true if an interrupt was delivered this tick (mutually
    /// exclusive with brokering a port access).
    fn deliver(&mut self, mb: &mut Motherboard) -> bool {
        if mb.int() && mb.inr() {
            mb.set_int(false);
            if let Some((port, byte)) = self.queue.pop_front() {
                mb.set_address_bus(port as u32);
                mb.set_data_bus(byte);
            }
            true
        } else {
            false
        }
    }

    fn broker(&self, mb: &mut Motherboard) {
        if !mb.ie() {
            return;
        }
        let port = (mb.address_bus() & 0xFF) as u8;
        if mb.device_at(port).is_some() {
            if mb.rw() {
                let value = mb.data_bus();
                mb.set_port_data(port, value);
            } else {
                let value = mb.get_port_data(port);
                mb.set_data_bus(value);
            }
        } else {
            log::warn!("port access to unbound port {port}");
        }
        mb.set_ie(false);
    }
}

impl Component for Iod {
    fn tick(&mut self) -> bool {
        false
    }
}
