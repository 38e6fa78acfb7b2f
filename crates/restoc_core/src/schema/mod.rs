//! Schema structures: the typed field tree and table description of a
//! record type.

mod def;
mod node;
mod structure;

pub use def::{
    AutoPrimaryDef, ChangesDef, FieldDef, IndexDefinition, IndexFieldsDef, SqlHintDef,
    StructureDef,
};
pub use node::{FieldNode, NodeClass, ScalarNode, ScalarType, SqlHint, StructuredNode};
pub use structure::{
    AutoPrimary, ChangesMode, Decode, IndexColumn, IndexDef, Structure, StructureBuilder,
};
