// Domain layer: table model, knowledge base and ports.

pub mod model;
pub mod ports;
pub mod schema;
