use snafu::prelude::*;

/// Error conditions raised while constructing a layout engine or generating layouts.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("no blobs available for any ISA family"))]
    NoBlobsAvailable,
}

pub type Result<T> = core::result::Result<T, Error>;
