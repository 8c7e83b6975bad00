//! Lambdas backing the 3D model loader: presigned upload/download URLs,
//! conversion job submission, job history listing, job status notifications
//! and the websocket connection registry.
//!
//! Each binary wires AWS SDK clients into the ports in [`clients`] and hands
//! them to a handler in [`handlers`].

pub mod clients;
pub mod common;
pub mod handlers;
