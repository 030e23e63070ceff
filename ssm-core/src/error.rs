
use linxal::eigenvalues::types::EigenError;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
  /// Two related quantities disagree; both are named.
  DimensionMismatch {
    left: &'static str,
    left_dim: usize,
    right: &'static str,
    right_dim: usize,
  },
  NotSquare {
    what: &'static str,
    rows: usize,
    cols: usize,
  },
  NotSymmetric {
    what: &'static str,
  },
  NotPositiveSemiDefinite {
    what: &'static str,
  },
  ZeroDimension {
    what: &'static str,
  },
  /// An element has no representation in the target scalar type.
  UnrepresentableElement {
    what: &'static str,
  },
  Eigen(EigenError),
}

impl From<EigenError> for Error {
  fn from(v: EigenError) -> Error {
    Error::Eigen(v)
  }
}

pub fn check_dim(left: &'static str, left_dim: usize,
                 right: &'static str, right_dim: usize)
                 -> Result<()>
{
  if left_dim != right_dim {
    Err(Error::DimensionMismatch {
      left: left,
      left_dim: left_dim,
      right: right,
      right_dim: right_dim,
    })
  } else {
    Ok(())
  }
}
