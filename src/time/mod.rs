//! Time and zone normalization
//!
//! Turns the optional `begin`, `end` and `timezone` request parameters into
//! an absolute query window plus the named zone used to format responses.
//!
//! # Rules
//!
//! - A zoned `begin` (bracketed IANA zone) is authoritative
//! - A zone-less `begin` takes the `timezone` parameter, else UTC
//! - A zone-less `end` inherits the zone resolved for `begin`
//! - A `begin` carrying only an offset is ambiguous unless `timezone` is given

mod normalizer;

pub use normalizer::{format_zoned, parse_zone, TimeNormalizer, TimeWindow};
