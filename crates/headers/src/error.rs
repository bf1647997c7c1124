use snafu::prelude::*;

/// Error conditions for header/trailer generation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Thrown if a cursor write runs past the end of its (fixed-size) buffer.
    #[snafu(display("Header generator wrote past the end of its reserved buffer"))]
    Overflow,
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<fwgen_core::data::Error> for Error {
    #[inline]
    fn from(_: fwgen_core::data::Error) -> Self {
        Self::Overflow
    }
}
