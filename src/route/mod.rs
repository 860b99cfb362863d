//! Routes, their paths, and the selection of the paths to use.

mod bgp;
mod path;
#[allow(clippy::module_inception)]
mod route;
mod selection;

pub use bgp::{AsPath, AsPathSegment, BgpPath, Community, Origin, SegmentType};
pub use path::{
    FibPath, HiddenReason, IsisLevel, IsisPath, OspfPath, OspfPathType, Path,
    PathAttrs, Protocol, StaticPath,
};
pub use route::{paths_diff, Route};
pub use selection::{ecmp, select_cmp};
