// src/publish/mod.rs
pub mod archive;
pub mod email;
pub mod feed;
pub mod site;

pub use archive::{ArchiveEntry, ArchiveIndex};
pub use email::{ButtondownClient, PublishError, PublishedEmail};
pub use site::{publish_site, SitePublication};
