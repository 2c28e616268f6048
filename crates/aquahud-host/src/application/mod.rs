//! Application layer: the controller orchestrating device state and the
//! background keepalive supervisor.

pub mod controller;
pub mod keepalive;
