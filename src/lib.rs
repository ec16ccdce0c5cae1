#![deny(missing_docs)]
//! Rewrites paths that are filled with the even-odd rule so that the
//! nonzero winding rule covers exactly the same area.
//!
//! The conversion runs in a few stages:
//!
//! 1. every segment is approximated by a polyline,
//! 2. the polylines are searched for crossings, both between segments and
//!    within a single cubic,
//! 3. segments are split at the crossings, and the subpaths are re-linked at
//!    the crossing points so that no two of them cross,
//! 4. every subpath is oriented opposite to the subpath that immediately
//!    contains it.
//!
//! The whole thing runs under a time budget. If an attempt takes too long,
//! it is thrown away and retried with a coarser polyline approximation.
//!
//! ```
//! use kurbo::BezPath;
//!
//! // Two overlapping squares with the same orientation.
//! let path = BezPath::from_svg("M0 0L4 0L4 4L0 4ZM2 2L6 2L6 6L2 6Z").unwrap();
//! let conversion = fillfix::fix_even_odd_to_winding(&path).unwrap();
//! assert!(conversion.separate_path_for_stroke);
//! ```

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod convert;
pub mod curve;
mod eliminate;
mod flatten;
mod geom;
mod intersect;
mod orient;
pub mod path;

#[cfg(feature = "generators")]
pub mod generators;

pub use convert::{
    convert_path_data, fix_even_odd_to_winding, fix_even_odd_to_winding_with, Conversion,
    ConvertOptions,
};
pub use geom::BBox;
pub use path::{Path, SegIdx, Subpath, SubpathIdx};

/// The input path was faulty.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A subpath started with something other than a move.
    MissingMoveTo,
    /// At least one of the coordinates was infinite.
    Infinity,
    /// At least one of the coordinates was not a number.
    NaN,
    /// The path data couldn't be parsed.
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingMoveTo => write!(f, "a subpath didn't start with a move"),
            Error::Infinity => write!(f, "one of the coordinates was infinite"),
            Error::NaN => write!(f, "one of the coordinates was NaN"),
            Error::Parse(msg) => write!(f, "invalid path data: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
