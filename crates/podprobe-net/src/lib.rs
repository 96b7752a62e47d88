//! Internet connectivity probe for podprobe
//!
//! A single HTTPS `GET` against a well-known host. Exactly `200 OK` counts as
//! online; any other status means the network answered but is not usable.

mod probe;

pub use probe::{
    Connectivity, ConnectivityProbe, DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL, ProbeError,
};
