//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use isle_router::prelude::*;
//! ```

pub use crate::{
    compile, discover, DiscoverOptions, LoadError, PatternCompiler, RouteEntry, RouteError,
    RouteLoader, RouteMatch, RoutePattern, RouteTable, RouteTableBuilder,
};
