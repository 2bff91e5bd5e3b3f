// Domain layer: repository item models and the ports the pipeline is built on.

pub mod model;
pub mod ports;
