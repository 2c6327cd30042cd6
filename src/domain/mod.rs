// Domain layer: job records, results, and the ports the sync core talks through.

pub mod model;
pub mod ports;
