//! Per-request visibility rules and output redaction.

pub mod policy;
pub mod redact;

pub use policy::{MaskPolicy, MaskPolicyResolver, RoleRule};
pub use redact::{apply_output_masking, MASK_PLACEHOLDER};
