//! Rename and reorganization engine for a movie library.
//!
//! Given a movie's metadata and its current set of on-disk files, the engine
//! computes a destination folder and filenames from user-configurable
//! templates, previews the resulting change set without touching the disk,
//! and executes the move/copy/cleanup with per-movie failure isolation.
//!
//! The crate deliberately has no UI, no network access and no persistence of
//! its own - embedders provide those through the [`MovieStore`],
//! [`ImageCache`] and [`Messenger`] collaborators.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cineshelf::config::RenamerSettings;
//! use cineshelf::services::executor::{NullStore, RenamerService};
//! use cineshelf::services::image_cache::NoopImageCache;
//! use cineshelf::services::notifications::LogMessenger;
//! use cineshelf::services::preview;
//!
//! # async fn demo(mut movie: cineshelf::model::Movie) -> anyhow::Result<()> {
//! let settings = RenamerSettings::default();
//! let change = preview::preview(&movie, &settings);
//! if change.needs_rename {
//!     let renamer = RenamerService::new(
//!         settings,
//!         Arc::new(NullStore),
//!         Arc::new(NoopImageCache),
//!         Arc::new(LogMessenger),
//!     );
//!     renamer.rename_movie(&mut movie).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod services;

pub use config::RenamerSettings;
pub use error::RenameError;
pub use model::{MediaFile, MediaFileKind, Movie};
pub use services::executor::{MovieStore, RenamerService, RetryPolicy};
pub use services::image_cache::ImageCache;
pub use services::notifications::Messenger;
pub use services::preview::{RenamePreview, preview};
