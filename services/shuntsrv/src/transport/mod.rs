pub mod serial;

pub use serial::{LinkInput, LinkOutput, SerialLink};
