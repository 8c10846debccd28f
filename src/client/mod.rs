//! OpenReview API client modules.
//!
//! This module provides the authenticated HTTP client used by every
//! extraction pipeline.

pub mod openreview;

pub use openreview::{ClientError, NoteQuery, OpenReviewClient};
