//! # Request Module
//!
//! The immutable request configuration pipeline.
//!
//! ## Overview
//!
//! A [`RequestContext`] collects everything a request needs: base URL, the selected operation,
//! runtime parameters, headers, body, serializer table and an optional logger. Derived values
//! are computed on demand:
//!
//! - **path**: the operation's path template with path parameters expanded and percent-encoded
//! - **query**: a percent-encoded query string, present only when query parameters exist
//! - **url**: base URL + path (+ `?query`)
//!
//! Parameters are assigned to locations by [`group_parameters`](crate::spec::group_parameters);
//! names the operation does not declare go to the query.

mod context;
mod template;

pub use context::RequestContext;
pub use template::{build_query, expand};
