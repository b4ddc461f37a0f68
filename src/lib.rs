//! Read json documents stored on MediaWiki pages.
//!
//! A page is picked by host plus one of page name, page id or revision id. Its
//! content is fetched through the wiki's query api and parsed as json, which makes
//! wiki pages usable as a small, human editable configuration store.
//!
//! ```no_run
//! # use mediawiki_storage::{MediawikiStorage, PageRequest, StorageConfig};
//! # async fn run() -> Result<(), mediawiki_storage::StorageError> {
//! let storage = MediawikiStorage::from_config(&StorageConfig::from_env())?;
//! let value = storage
//!     .get(PageRequest::new("www.mediawiki.org").page_name("Project:Config.json"))?
//!     .await?;
//! println!("{}", value);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod definitions;
pub mod errors;
pub mod mediawiki_api;
pub mod page_json;
pub mod reqwest_client;
pub mod storage;

pub use config::{StorageConfig, StorageConfigBuilder};
pub use definitions::{PageRequest, PageSelector};
pub use errors::{ArgumentKind, EnvelopeStep, StorageError};
pub use mediawiki_api::{QueryUrl, build_query_url};
pub use page_json::decode_page;
pub use reqwest_client::{RustClient, RustError, Transport};
pub use storage::{MediawikiStorage, PendingPage};
