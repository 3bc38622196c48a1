//! Canonical domain types: fields, modules, client and mesh records.

pub mod device;
pub mod field;
pub mod mac;
pub mod mesh;
pub mod module;

pub use device::Device;
pub use field::{Field, FieldMap, Value};
pub use mac::MacAddress;
pub use mesh::{MeshDevice, MeshReport, MeshStatus};
pub use module::{Module, Snapshot};
