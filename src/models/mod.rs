pub mod stock;
pub mod metrics;
pub mod response;

pub use stock::*;
pub use metrics::*;
pub use response::*;
