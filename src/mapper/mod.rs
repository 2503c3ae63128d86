//! Object/document mapping
//!
//! Converts typed application values into [`Document`](crate::document::Document)
//! trees and back.
//!
//! - [`Serializable`] reports the [`Kind`] of a value; the serializer
//!   dispatches on it in a fixed order
//! - Structured types list their members in a [`TypeDescriptor`], built once
//!   per type and cached in a [`DescriptorRegistry`]
//! - A [`DocumentMapper`] captures its [`MapperConfig`] and custom
//!   serializers at build time
//!
//! ```ignore
//! struct User { id: i64, name: String }
//!
//! impl Entity for User {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::builder::<User>()
//!             .id(|u| &u.id)
//!             .field("name", |u| &u.name)
//!             .build()
//!     }
//! }
//! impl_entity!(User);
//!
//! let doc = DocumentMapper::default().to_document(&user)?;
//! ```

mod config;
mod descriptor;
mod deserialize;
mod errors;
mod kind;
mod serialize;

pub use config::{MapperConfig, DEFAULT_MAX_DEPTH};
pub use descriptor::{DescriptorBuilder, DescriptorRegistry, Entity, Getter, Member, MemberSerializer, TypeDescriptor};
pub use deserialize::{FromDocValue, FromDocument};
pub use errors::{BoxError, MapperError, MapperResult};
pub use kind::{Binary, Kind, Serializable, TypeKey};
pub use serialize::{CustomSerializer, DocumentMapper, MapperBuilder};
