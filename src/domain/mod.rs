// Domain layer: lead records, delivery outcomes and the ports channels implement.

pub mod model;
pub mod ports;
