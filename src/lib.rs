//! crfloat is a software implementation of IEEE-754 binary floating point
//! arithmetic for arbitrary formats. A format is defined by the width of the
//! exponent and the width of the significand, so the library can model
//! Float16, Float32, Float64, Float128 and everything in between.
//!
//! Every operation is correctly rounded: the result is identical to the
//! infinitely precise result rounded once into the format of the operands.
//! This covers the arithmetic operations, the square root, the conversions
//! to and from strings and integers, and the transcendental functions
//! `ln`, `exp` and `pow`.
//!
//! ```
//! use crfloat::{FloatValue, Format};
//!
//! let f = Format::FLOAT32;
//! let one = FloatValue::from_string(f, "1.0").unwrap();
//! let three = FloatValue::from_string(f, "3.0").unwrap();
//! let third = one.divide(&three);
//! assert_eq!(third.f32_value(), 1.0 / 3.0);
//! assert_eq!(one.add(&three).to_string(), "4.0");
//!
//! let two = FloatValue::from_i64(f, 2);
//! let half = FloatValue::from_f32(0.5);
//! assert!(two.pow(&half).unwrap().is_identical(&two.sqrt()));
//! ```

mod arithmetic;
mod cast;
mod error;
mod float;
mod operations;
mod string;
mod utils;

#[cfg(feature = "python")]
mod py;

pub use self::error::{FloatError, ParseError};
pub use self::float::{apply_rounding, truncate, FloatValue, Format, RoundingMode, MAX_EXP_BITS};
pub use self::operations::constants::{ConstantsRegistry, EscalationPolicy};
