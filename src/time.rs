use crate::error::TreeDrawError;

/// The birth time of a [`Node`](crate::Node).
///
/// This is a newtype wrapper for [`f64`](std::primitive::f64).
///
/// # Notes
///
/// * Units are whatever the program that wrote the tables used,
///   typically generations.
/// * Input tables may record times on any finite scale.
///   [`normalize_times`](crate::normalize_times) shifts the column
///   so that the youngest node is at time zero and ages increase
///   into the past.
///
/// # Examples
///
/// The only way to create a `Time` is to apply `TryFrom<f64>`:
///
/// ```
/// let t = treedraw::Time::try_from(1.0).unwrap();
/// assert_eq!(t, 1.0);
/// assert!(treedraw::Time::try_from(f64::NAN).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Time(f64);

impl_newtype_traits!(Time);

impl TryFrom<f64> for Time {
    type Error = TreeDrawError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let rv = Self(value);
        rv.validate(TreeDrawError::ValueError)?;
        Ok(rv)
    }
}

impl Time {
    fn validate<F>(&self, f: F) -> Result<(), TreeDrawError>
    where
        F: std::ops::FnOnce(String) -> TreeDrawError,
    {
        if self.0.is_finite() {
            Ok(())
        } else {
            Err(f(format!("invalid time value: {}", self.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_values_are_accepted() {
        for value in [-3.0, 0.0, 1.5, 1e9] {
            let t = Time::try_from(value).unwrap();
            assert_eq!(t, value);
        }
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Time::try_from(value),
                Err(TreeDrawError::ValueError(_))
            ));
        }
    }

    #[test]
    fn times_are_ordered() {
        let a = Time::try_from(1.0).unwrap();
        let b = Time::try_from(2.0).unwrap();
        assert!(a < b);
        assert!(b > 1.5);
    }
}
