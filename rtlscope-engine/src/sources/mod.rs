mod radio;

pub use radio::{RadioReader, RadioSource};
