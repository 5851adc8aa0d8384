pub use chconnect_core::*;
