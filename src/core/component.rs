/// Anything advanced by one call per simulated clock cycle (CPU, IOD, RAM, devices).
pub trait Component {
    /// Advance one clock cycle. Returns true if a "significant event" occurred
    /// (for the CPU: an instruction boundary was reached).
    fn tick(&mut self) -> bool;
}
