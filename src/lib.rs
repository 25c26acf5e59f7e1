pub mod constants;
pub mod core;
pub mod cpu;
pub mod device;
pub mod error;
pub mod iod;
pub mod machine;
pub mod motherboard;
pub mod ram;

pub mod prelude {
    pub use crate::core::Component;
    pub use crate::cpu::Cpu;
    pub use crate::device::Device;
    pub use crate::error::CoreError;
    pub use crate::iod::Iod;
    pub use crate::machine::Machine;
    pub use crate::motherboard::{DeviceId, Motherboard};
    pub use crate::ram::Ram;
}
