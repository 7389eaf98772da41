// Domain layer: run models and the ports the crawl is written against.

pub mod model;
pub mod ports;
