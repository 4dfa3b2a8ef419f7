use crate::error::TreeDrawError;

/// A genomic coordinate.
///
/// This is a newtype wrapper for [`f64`](std::primitive::f64).
/// Valid values are finite and non-negative.
///
/// # Examples
///
/// ```
/// let p = treedraw::Position::try_from(100.0).unwrap();
/// assert_eq!(p, 100.0);
/// assert!(treedraw::Position::try_from(-1.0).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Position(f64);

impl_newtype_traits!(Position);

impl TryFrom<f64> for Position {
    type Error = TreeDrawError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(TreeDrawError::ValueError)?;
        Ok(rv)
    }
}

impl Position {
    pub(crate) fn zero() -> Self {
        Self(0.0)
    }

    fn validate<F>(&self, f: F) -> Result<(), TreeDrawError>
    where
        F: std::ops::FnOnce(String) -> TreeDrawError,
    {
        if self.0.is_finite() && self.0.is_sign_positive() {
            Ok(())
        } else {
            Err(f(format!("invalid position value: {}", self.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_positions() {
        assert!(Position::try_from(0.0).is_ok());
        assert!(Position::try_from(1e6).is_ok());
    }

    #[test]
    fn invalid_positions() {
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Position::try_from(value),
                Err(TreeDrawError::ValueError(_))
            ));
        }
    }
}
