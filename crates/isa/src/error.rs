use snafu::prelude::*;

/// Error conditions for ISA family lookups.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("unknown ISA family: {name}"))]
    UnknownFamily { name: String },
}

pub type Result<T> = core::result::Result<T, Error>;
