//! Fake typed clients and cached listers for the `build.pivotal.io/v1alpha1`
//! `Builder` and `Image` resources.
//!
//! The fake clients record every call on a shared [`Fake`] recorder and answer
//! from an in-memory [`ObjectTracker`], so controllers can be tested without an
//! API server. The listers serve reads from a local [`cache::Store`], the
//! `kube` reflector store.
//!
//! # Examples
//!
//! ## Fake client
//!
//! ```rust
//! use build_service_client::apis::{Image, ImageSpec};
//! use build_service_client::ClientsetBuilder;
//! use kube::api::PostParams;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clientset = ClientsetBuilder::new().build()?;
//! let images = clientset.build_v1alpha1().images("build");
//!
//! let image = Image::new("petclinic", ImageSpec {
//!     tag: "registry.example.com/petclinic".to_string(),
//!     builder_ref: "default-builder".to_string(),
//!     ..Default::default()
//! });
//! let created = images.create(&image, &PostParams::default())?;
//!
//! assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));
//! assert_eq!(clientset.actions()[0].verb(), "create");
//! # Ok(())
//! # }
//! ```
//!
//! ## Lister
//!
//! ```rust
//! use build_service_client::apis::{Builder, BuilderSpec};
//! use build_service_client::cache;
//! use build_service_client::label_selector::parse_label_selector;
//! use build_service_client::listers::BuilderLister;
//! use kube::runtime::watcher::Event;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (reader, mut writer) = cache::store::<Builder>();
//! let mut builder = Builder::new("default-builder", BuilderSpec::default());
//! builder.metadata.namespace = Some("build".to_string());
//! writer.apply_watcher_event(&Event::Apply(builder));
//!
//! let lister = BuilderLister::new(Arc::new(reader));
//! assert_eq!(lister.list(&parse_label_selector("")?).len(), 1);
//! assert!(lister.builders("build").get("missing").unwrap_err().is_not_found());
//! # Ok(())
//! # }
//! ```

mod action;
pub mod apis;
mod builder;
pub mod cache;
mod client;
mod client_utils;
mod error;
pub mod label_selector;
pub mod listers;
pub mod reactor;
mod recorder;
mod tracker;
mod utils;
pub mod watch;

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod cache_test;
#[cfg(test)]
mod utils_test;

pub use action::{Action, ActionKind, PatchType};
pub use builder::{Clientset, ClientsetBuilder};
pub use client::{FakeBuildV1alpha1, FakeBuilders, FakeImages, FakeResourceClient};
pub use client_utils::GroupResource;
pub use error::{Error, Result};
pub use recorder::Fake;
pub use tracker::{ObjectTracker, GVK, GVR};
pub use watch::{WatchEvent, Watcher};
