use crate::{FloatError, FloatValue, Format, ParseError, RoundingMode, MAX_EXP_BITS};
use num_bigint::BigInt;
use pyo3::exceptions::{PyArithmeticError, PyValueError};
use pyo3::prelude::*;

impl From<FloatError> for PyErr {
    fn from(err: FloatError) -> PyErr {
        match err {
            FloatError::Parse(e) => PyValueError::new_err(e.to_string()),
            e => PyArithmeticError::new_err(e.to_string()),
        }
    }
}

impl From<ParseError> for PyErr {
    fn from(err: ParseError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn parse_rounding_mode(name: &str) -> PyResult<RoundingMode> {
    RoundingMode::from_string(name)
        .ok_or_else(|| PyValueError::new_err(format!("Invalid rounding mode {:?}", name)))
}

/// The layout of a binary floating point format.
///
/// Args:
///     exp_bits: The width of the exponent field, between 2 and 25
///     sig_bits: The number of stored significand bits (without the hidden bit)
#[pyclass(name = "Format")]
#[derive(Clone)]
struct PyFormat {
    inner: Format,
}

#[pymethods]
impl PyFormat {
    #[new]
    fn new(exp_bits: u32, sig_bits: u32) -> PyResult<Self> {
        if !(2..=MAX_EXP_BITS).contains(&exp_bits) || sig_bits == 0 {
            return Err(PyValueError::new_err("Invalid format widths"));
        }
        Ok(PyFormat {
            inner: Format::new(exp_bits, sig_bits),
        })
    }
    /// Returns the width of the exponent field.
    fn exp_bits(&self) -> u32 {
        self.inner.exp_bits()
    }
    /// Returns the number of stored significand bits.
    fn sig_bits(&self) -> u32 {
        self.inner.sig_bits()
    }
    /// Returns the number of significant decimal digits that round trip.
    fn decimal_digits(&self) -> usize {
        self.inner.decimal_digits()
    }
    fn __str__(&self) -> String {
        self.inner.to_string()
    }
    fn __repr__(&self) -> String {
        self.__str__()
    }
}

/// An immutable, correctly rounded floating point number of some format.
#[pyclass(name = "FloatValue")]
struct PyFloatValue {
    inner: FloatValue,
}

impl From<FloatValue> for PyFloatValue {
    fn from(inner: FloatValue) -> Self {
        PyFloatValue { inner }
    }
}

#[pymethods]
impl PyFloatValue {
    /// Parse a decimal or hexadecimal literal.
    ///
    /// Args:
    ///     format: The format of the number
    ///     literal: The text to parse, like "1.5e3", "0x1.8p1" or "-inf"
    #[new]
    fn new(format: &PyFormat, literal: &str) -> PyResult<Self> {
        Ok(FloatValue::from_string(format.inner, literal)?.into())
    }

    /// Create a number from an integer.
    #[staticmethod]
    fn from_int(format: &PyFormat, value: i64) -> Self {
        FloatValue::from_i64(format.inner, value).into()
    }
    /// Create a number from a Python float (binary64).
    #[staticmethod]
    fn from_float(value: f64) -> Self {
        FloatValue::from_f64(value).into()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
    fn __repr__(&self) -> String {
        format!("FloatValue({}, {})", self.inner.format(), self.inner)
    }
    fn __float__(&self) -> f64 {
        self.inner.f64_value()
    }

    /// Returns the format of the number.
    fn format(&self) -> PyFormat {
        PyFormat {
            inner: self.inner.format(),
        }
    }
    /// Returns the sign, exponent and significand fields as a binary string.
    fn to_binary_string(&self) -> String {
        self.inner.to_binary_string()
    }
    /// Returns the integer value, truncated toward zero, or None for NaN and
    /// infinity.
    fn to_int(&self) -> Option<String> {
        self.inner.to_integer().map(|v| v.to_string())
    }

    fn is_nan(&self) -> bool {
        self.inner.is_nan()
    }
    fn is_infinite(&self) -> bool {
        self.inner.is_infinite()
    }
    fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }
    fn is_negative(&self) -> bool {
        self.inner.is_negative()
    }
    fn is_integer(&self) -> bool {
        self.inner.is_integer()
    }

    fn __add__(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.add(&other.inner).into()
    }
    fn __sub__(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.subtract(&other.inner).into()
    }
    fn __mul__(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.multiply(&other.inner).into()
    }
    fn __truediv__(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.divide(&other.inner).into()
    }
    fn __mod__(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.modulo(&other.inner).into()
    }
    fn __neg__(&self) -> PyFloatValue {
        self.inner.negate().into()
    }
    fn __abs__(&self) -> PyFloatValue {
        self.inner.abs().into()
    }
    fn __lt__(&self, other: &PyFloatValue) -> bool {
        self.inner.less_than(&other.inner)
    }
    fn __le__(&self, other: &PyFloatValue) -> bool {
        self.inner.less_or_equal(&other.inner)
    }
    fn __eq__(&self, other: &PyFloatValue) -> bool {
        self.inner.equal_to(&other.inner)
    }
    fn __ne__(&self, other: &PyFloatValue) -> bool {
        self.inner.not_equal_to(&other.inner)
    }
    fn __gt__(&self, other: &PyFloatValue) -> bool {
        self.inner.greater_than(&other.inner)
    }
    fn __ge__(&self, other: &PyFloatValue) -> bool {
        self.inner.greater_or_equal(&other.inner)
    }

    fn sqrt(&self) -> PyFloatValue {
        self.inner.sqrt().into()
    }
    /// Returns the natural logarithm of the number.
    fn ln(&self) -> PyResult<PyFloatValue> {
        Ok(self.inner.ln()?.into())
    }
    /// Returns e raised to the power of the number.
    fn exp(&self) -> PyResult<PyFloatValue> {
        Ok(self.inner.exp()?.into())
    }
    /// Returns the number raised to the power of `y`.
    fn pow(&self, y: &PyFloatValue) -> PyResult<PyFloatValue> {
        Ok(self.inner.pow(&y.inner)?.into())
    }
    /// Returns the number raised to the power of the integer `n`.
    fn pow_int(&self, n: i64) -> PyResult<PyFloatValue> {
        Ok(self.inner.pow_int(&BigInt::from(n))?.into())
    }
    /// Returns the IEEE remainder of the division by `other`.
    fn remainder(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.remainder(&other.inner).into()
    }
    fn min(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.min(&other.inner).into()
    }
    fn max(&self, other: &PyFloatValue) -> PyFloatValue {
        self.inner.max(&other.inner).into()
    }

    /// Convert the number into another format, rounding to nearest.
    fn with_precision(&self, format: &PyFormat) -> PyFloatValue {
        self.inner.with_precision(format.inner).into()
    }
    /// Convert the number into another format with a specific rounding mode.
    fn round_with_mode(&self, format: &PyFormat, mode: &str) -> PyResult<PyFloatValue> {
        let mode = parse_rounding_mode(mode)?;
        Ok(self.inner.round_with_mode(format.inner, mode).into())
    }
    /// Round the number to an integral value with a specific rounding mode.
    fn round_to_integer(&self, mode: &str) -> PyResult<PyFloatValue> {
        let mode = parse_rounding_mode(mode)?;
        Ok(self.inner.round_to_integer(mode).into())
    }
} // impl PyFloatValue

#[pymodule]
fn _crfloat(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFormat>()?;
    m.add_class::<PyFloatValue>()?;
    m.add("FLOAT16", PyFormat { inner: Format::FLOAT16 })?;
    m.add("FLOAT32", PyFormat { inner: Format::FLOAT32 })?;
    m.add("FLOAT64", PyFormat { inner: Format::FLOAT64 })?;
    m.add("FLOAT128", PyFormat { inner: Format::FLOAT128 })?;
    Ok(())
}
