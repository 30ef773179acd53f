//! Fuzz target for request decoding
//!
//! Tests that both services classify arbitrary datagrams without panicking,
//! and that anything accepted survives re-encoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use shallot_core::node::NodeRequest;
use shallot_discovery::DirectoryRequest;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = NodeRequest::from_bytes(data) {
        let bytes = request.to_bytes().expect("accepted request re-encodes");
        assert_eq!(NodeRequest::from_bytes(&bytes).ok(), Some(request));
    }

    if let Ok(request) = DirectoryRequest::from_bytes(data) {
        let bytes = request.to_bytes().expect("accepted request re-encodes");
        assert_eq!(DirectoryRequest::from_bytes(&bytes).ok(), Some(request));
    }
});
