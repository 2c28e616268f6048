//! Device controller: the foreground orchestration layer.
//!
//! The controller owns the merged configuration and funnels every state
//! change through the same path: mutate the in-memory config, push it to the
//! display, persist it.  Persisting last means a crash mid-change leaves the
//! file describing the previous applied state, never a state the display has
//! not seen.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::infrastructure::hid::session::{DeviceSession, SessionError};
use crate::infrastructure::hid::HidTransport;
use crate::infrastructure::media::{CatalogError, MediaCatalog};
use crate::infrastructure::storage::config::{ConfigError, ConfigStore, DeviceConfig};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Orchestrates the session, the media catalog and the config store.
pub struct DeviceController<T: HidTransport> {
    session: Arc<DeviceSession<T>>,
    catalog: MediaCatalog,
    store: ConfigStore,
    config: DeviceConfig,
}

impl<T: HidTransport> DeviceController<T> {
    /// Builds a controller by enumerating the device's preset media and
    /// loading the stored configuration merged over the resulting defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Config`] when the merged configuration
    /// cannot be persisted.
    pub fn new(
        session: Arc<DeviceSession<T>>,
        catalog: MediaCatalog,
        store: ConfigStore,
    ) -> Result<Self, ControllerError> {
        let listing = catalog.list_media();
        let defaults = DeviceConfig::defaults(&listing.preset);
        let config = store.load(defaults)?;
        Ok(Self::with_config(session, catalog, store, config))
    }

    /// Builds a controller around an already-resolved configuration.
    pub fn with_config(
        session: Arc<DeviceSession<T>>,
        catalog: MediaCatalog,
        store: ConfigStore,
        config: DeviceConfig,
    ) -> Self {
        Self {
            session,
            catalog,
            store,
            config,
        }
    }

    /// The current effective configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Pushes the current configuration to the display.
    ///
    /// An empty media name selects nothing, leaving the display on whatever
    /// it is already showing.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Session`] on encode or transport failure.
    pub fn apply(&self) -> Result<(), ControllerError> {
        let media: Vec<String> = if self.config.media.is_empty() {
            Vec::new()
        } else {
            vec![self.config.media.clone()]
        };
        self.session.update_display(&media, self.config.brightness)?;
        info!(
            "applied display config: media={:?} brightness={}",
            self.config.media, self.config.brightness
        );
        Ok(())
    }

    /// Sets and applies a new brightness, then persists it.
    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), ControllerError> {
        self.config.brightness = brightness;
        self.apply()?;
        self.store.save(&self.config)?;
        Ok(())
    }

    /// Selects and applies a new media file, then persists the selection.
    ///
    /// The name is not validated against the catalog: the device ignores
    /// unknown names, and a file pushed moments ago may not be listed yet.
    pub fn set_media(&mut self, media: &str) -> Result<(), ControllerError> {
        self.config.media = media.to_string();
        self.apply()?;
        self.store.save(&self.config)?;
        Ok(())
    }

    /// Uploads a local file to the device; returns the remote name.
    pub fn upload_media(
        &self,
        local: &Path,
        remote_name: Option<&str>,
    ) -> Result<String, ControllerError> {
        Ok(self.catalog.upload(local, remote_name)?)
    }

    /// Downloads a device file to a local path.
    pub fn download_media(&self, name: &str, dest: &Path) -> Result<(), ControllerError> {
        Ok(self.catalog.download(name, dest)?)
    }

    /// Deletes a user media file.  Deleting the active selection clears it
    /// and re-applies, so the display stops referencing a file that is gone.
    pub fn delete_media(&mut self, name: &str) -> Result<(), ControllerError> {
        self.catalog.delete(name)?;
        if self.config.media == name {
            warn!("deleted the active media {name}, clearing selection");
            self.config.media.clear();
            self.apply()?;
            self.store.save(&self.config)?;
        }
        Ok(())
    }

    /// All media names on the device, user files first.
    pub fn get_media_files(&self) -> Vec<String> {
        let listing = self.catalog.list_media();
        let mut files = listing.user;
        files.extend(listing.preset);
        files
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
