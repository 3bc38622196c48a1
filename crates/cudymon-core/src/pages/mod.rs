//! Per-page parsers: one module per router status page.
//!
//! Every parser follows the same shape: run the generic table extractor,
//! probe each logical field's alias labels in order, normalize, and emit
//! a [`FieldMap`](crate::model::FieldMap). Alias lists are empirical --
//! they mirror the label spellings observed across real firmware builds
//! and must stay verbatim.

pub mod data_usage;
pub mod devices;
pub mod mesh;
pub mod modem;
pub mod network;
pub mod sms;
pub mod system;
pub mod wifi;
