//! Infrastructure layer for the host application.
//!
//! Contains OS-facing adapters: the HID transport and session, the remote
//! shell channel to the device's storage, the media catalog built on it, and
//! file-system configuration persistence.
//!
//! **Dependency rule**: this layer may depend on `aquahud_core`, but the
//! `application` layer only reaches it through the traits defined here
//! (`HidTransport`, `ShellRunner`, `StatusSource`).

pub mod hid;
pub mod media;
pub mod shell;
pub mod storage;
