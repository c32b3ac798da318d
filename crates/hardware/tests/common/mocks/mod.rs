/// Scripted memory port.
pub mod memory;
