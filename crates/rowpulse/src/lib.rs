#![no_std]

extern crate alloc;
pub mod geom;
pub use geom::{Geometry, GeometryError, MemoryType};
pub mod lines;
pub use lines::CommandLines;
pub mod phase;
pub use phase::{PhaseCommand, PhaseRead};
pub mod phy;
pub use phy::{IdlePhy, IssuedCommand, Phy, TestingPhy};
