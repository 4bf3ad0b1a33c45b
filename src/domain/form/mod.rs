//! Form field model: types, the narrow field view, definitions, and the
//! schema projection sent to the extraction model.

mod definition;
mod field;
mod field_type;
mod schema;

pub use definition::{
    DefinitionError, FieldDefinition, FormDefinition, DEFAULT_THANK_YOU_MESSAGE,
};
pub use field::Field;
pub use field_type::{FieldType, WidgetKind};
pub use schema::{ExtractionSchema, FieldDescriptor};
