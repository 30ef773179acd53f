//! Test fixtures.

mod network;

pub use network::NetworkFixture;
