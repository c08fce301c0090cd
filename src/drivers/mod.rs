//! Pin-level drivers.  Each one is generic over `embedded-hal` traits so
//! host tests can run it against mock pins.

pub mod bus;
pub mod dht;
pub mod pump;
