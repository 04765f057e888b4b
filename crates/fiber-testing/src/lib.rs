//! Testing utilities and harness for the fiber reconciler

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
