//! File-based routing for Isle.
//!
//! Route files under a routes root encode their URL:
//!
//! ```text
//! pages/
//! ├── index.page.tsx       -> /
//! ├── about.page.tsx       -> /about
//! ├── blog/
//! │   ├── index.page.tsx   -> /blog/
//! │   └── $id.page.tsx     -> /blog/:id
//! ├── files/$name-$ext.tsx -> /files/:name-:ext
//! └── docs/$$rest.tsx      -> /docs/*
//! ```
//!
//! Compiled patterns are sorted by specificity and matched first-match-wins.
//!
//! # Usage
//!
//! ```rust,ignore
//! use isle_router::prelude::*;
//!
//! let table = RouteTable::builder()
//!     .route("blog/$id.page.tsx", RouteLoader::ready(blog_page))?
//!     .route("index.page.tsx", RouteLoader::ready(home_page))?
//!     .build();
//!
//! let m = table.match_url("/blog/123").unwrap();
//! assert_eq!(m.params.get("id"), Some("123"));
//! ```

pub mod prelude;
mod discover;
mod error;
mod order;
mod pattern;
mod source;
mod table;

pub use discover::*;
pub use error::*;
pub use order::*;
pub use pattern::*;
pub use source::*;
pub use table::*;
