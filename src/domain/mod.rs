// Domain layer: value types and ports. No transport details here.

pub mod model;
pub mod ports;
