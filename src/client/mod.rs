//! Pull-protocol client boundary
//!
//! The session does not speak RTSP itself. It asks a [`PullClientFactory`]
//! to open a connection and hands it a [`FrameCallback`] that the client
//! invokes, from its own I/O thread, for every frame it receives.

pub mod pull;

pub use pull::{
    ClientError, FrameCallback, MediaMask, OpenParams, PullClient, PullClientFactory, Transport,
};
