use thiserror::Error;

/// Failures raised while constructing nodes.
///
/// Every variant is a domain error: the requested operation has no real-valued
/// result for the operands given, so no node is created.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
  #[error("cannot raise negative base {base} to non-integer exponent {exponent}")]
  NegativeBase { base: f64, exponent: f64 },

  #[error("cannot raise zero to negative exponent {exponent}")]
  ZeroBase { exponent: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Check whether `base^exponent` is defined over the reals
  pub(crate) fn check_pow(base: f64, exponent: f64) -> Result<()> {
    if base < 0.0 && exponent.is_finite() && exponent.fract() != 0.0 {
      Err(Error::NegativeBase { base, exponent })
    } else if base == 0.0 && exponent < 0.0 {
      Err(Error::ZeroBase { exponent })
    } else {
      Ok(())
    }
  }
}
