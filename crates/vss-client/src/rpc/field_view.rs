//! Attribute to (field, view) lookup.

use crate::domain::types::Attribute;
use crate::rpc::proto::{Field, View};

/// Field and view addressing one attribute of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldView {
    pub field: Field,
    pub view: View,
}

/// Built once per connection and only read afterwards.
#[derive(Debug, Clone)]
pub struct FieldViewTable {
    value: FieldView,
    target_value: FieldView,
    metadata: FieldView,
}

impl FieldViewTable {
    pub fn new() -> Self {
        Self {
            value: FieldView {
                field: Field::Value,
                view: View::CurrentValue,
            },
            target_value: FieldView {
                field: Field::ActuatorTarget,
                view: View::TargetValue,
            },
            metadata: FieldView {
                field: Field::Metadata,
                view: View::Metadata,
            },
        }
    }

    pub fn lookup(&self, attribute: Attribute) -> FieldView {
        match attribute {
            Attribute::Value => self.value,
            Attribute::TargetValue => self.target_value,
            Attribute::Metadata => self.metadata,
        }
    }
}

impl Default for FieldViewTable {
    fn default() -> Self {
        Self::new()
    }
}
