//! Convenient re-exports of commonly used data types, designed to make crate usage painless.
//!
//! For example, when working with [`DataCursorRef`], you have to explicitly refer to
//! [`data::Error`].
//!
//! The contents of this module can be used by including the following in any module:
//! ```
//! use wmf2svg_core::prelude::*;
//! ```

#[doc(inline)]
pub use crate::data::{DataCursorRef, DataCursorTrait, Endian, EndianRead};
pub use crate::identify::*;

/// Contains [`data::Error`], which is used in Results returned by [`DataCursorRef`]
pub mod data {
    pub use crate::data::Error;
}

#[cfg(all(feature = "time", feature = "std"))]
pub mod time {
    pub use crate::time::*;
}

pub mod util {
    pub use crate::util::format_size;
}
