//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use isle_server::prelude::*;
//! ```

pub use isle_router::prelude::*;

pub use crate::{
    ApiModule, BoxError, ComponentCall, Element, HeadContent, Hook, IsleApp, IsleConfig,
    IsleError, Method, Node, PageModule, PageProps, RequestContext, Response, RouteParams,
};
