//! Lazy service location.
//!
//! Consumers ask for a capability (usually a trait object type) and optional
//! condition tags. The [`Locator`] searches its [`DynamicSource`]s in priority
//! order; each source owns one [`Prototype`], instantiates it on first use,
//! and caches one handle per capability until it is cleared.
//!
//! # Modules
//!
//! - [`capability`] - capability identifiers and declared type graphs
//! - [`tag`] - condition tags and tag providers
//! - [`matcher`] - tag condition evaluation
//! - [`prototype`] - components, prototypes, instances, service handles
//! - [`construct`] - construction strategies
//! - [`resolver`] - capability discovery
//! - [`source`] - lazily instantiated sources
//! - [`locator`] - the facade over source sets
//! - [`search`] - type search for reports

pub mod capability;
pub mod construct;
pub mod loadability;
pub mod locator;
pub mod matcher;
pub mod prototype;
pub mod resolver;
pub mod search;
pub mod session;
pub mod source;
pub mod tag;

pub use capability::{Capability, TypeInfo};
pub use construct::{Construct, ConstructContext, ConstructError, Share, Spawn};
pub use loadability::{Loadability, NotLoadable};
pub use locator::{LocateError, Located, Locator, SourceSet};
pub use matcher::{TagMatch, matches};
pub use prototype::{AnyArc, Component, ComponentDecl, Initialize, Instance, Prototype, ServiceHandle};
pub use resolver::{CapabilityTypes, resolve_capabilities};
pub use search::{matches_type_search, search_words};
pub use session::{Epoch, Session, SessionMode};
pub use source::{DynamicSource, Resolved, SourceConfig, SourceKind, SourceStatus, Unresolved};
pub use tag::{DynamicTags, ObjectRef, Tag, TagProvider};
