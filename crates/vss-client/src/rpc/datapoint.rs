//! Conversions between text and typed datapoints.

use crate::domain::array::{parse_array, parse_bool, parse_float, parse_int, ArrayValue, ElementType};
use crate::domain::error::ParseError;
use crate::domain::types::Attribute;
use crate::rpc::proto::{
    datapoint::Value, BoolArray, DataEntry, DataType, Datapoint, DoubleArray, FloatArray,
    Int32Array, Int64Array, Metadata, StringArray, Uint32Array, Uint64Array,
};
use serde_json::{json, Map};

/// Element type and array flag for a signal datatype.
///
/// `None` for types without a text encoding.
pub fn element_type(data_type: DataType) -> Option<(ElementType, bool)> {
    let mapped = match data_type {
        DataType::String => (ElementType::String, false),
        DataType::Boolean => (ElementType::Bool, false),
        DataType::Int8 => (ElementType::Int8, false),
        DataType::Int16 => (ElementType::Int16, false),
        DataType::Int32 => (ElementType::Int32, false),
        DataType::Int64 => (ElementType::Int64, false),
        DataType::Uint8 => (ElementType::Uint8, false),
        DataType::Uint16 => (ElementType::Uint16, false),
        DataType::Uint32 => (ElementType::Uint32, false),
        DataType::Uint64 => (ElementType::Uint64, false),
        DataType::Float => (ElementType::Float, false),
        DataType::Double => (ElementType::Double, false),
        DataType::StringArray => (ElementType::String, true),
        DataType::BooleanArray => (ElementType::Bool, true),
        DataType::Int8Array => (ElementType::Int8, true),
        DataType::Int16Array => (ElementType::Int16, true),
        DataType::Int32Array => (ElementType::Int32, true),
        DataType::Int64Array => (ElementType::Int64, true),
        DataType::Uint8Array => (ElementType::Uint8, true),
        DataType::Uint16Array => (ElementType::Uint16, true),
        DataType::Uint32Array => (ElementType::Uint32, true),
        DataType::Uint64Array => (ElementType::Uint64, true),
        DataType::FloatArray => (ElementType::Float, true),
        DataType::DoubleArray => (ElementType::Double, true),
        DataType::Unspecified | DataType::Timestamp | DataType::TimestampArray => return None,
    };
    Some(mapped)
}

/// Encode `text` as a datapoint of `data_type`.
pub fn encode_datapoint(data_type: DataType, text: &str) -> Result<Datapoint, ParseError> {
    let (element, is_array) = element_type(data_type)
        .ok_or_else(|| ParseError::UnsupportedDataType(data_type.type_name().to_string()))?;

    let value = if is_array {
        array_value(parse_array(text, element)?)
    } else {
        scalar_value(element, text)?
    };
    Ok(Datapoint { value: Some(value) })
}

fn scalar_value(element: ElementType, text: &str) -> Result<Value, ParseError> {
    let invalid = || ParseError::InvalidValue {
        value: text.to_string(),
        expected: element,
    };
    let value = match element {
        ElementType::String => Value::String(text.to_string()),
        ElementType::Bool => Value::Bool(parse_bool(text).ok_or_else(invalid)?),
        ElementType::Int8 => Value::Int32(parse_int::<i8>(text).ok_or_else(invalid)?.into()),
        ElementType::Int16 => Value::Int32(parse_int::<i16>(text).ok_or_else(invalid)?.into()),
        ElementType::Int32 => Value::Int32(parse_int(text).ok_or_else(invalid)?),
        ElementType::Int64 => Value::Int64(parse_int(text).ok_or_else(invalid)?),
        ElementType::Uint8 => Value::Uint32(parse_int::<u8>(text).ok_or_else(invalid)?.into()),
        ElementType::Uint16 => Value::Uint32(parse_int::<u16>(text).ok_or_else(invalid)?.into()),
        ElementType::Uint32 => Value::Uint32(parse_int(text).ok_or_else(invalid)?),
        ElementType::Uint64 => Value::Uint64(parse_int(text).ok_or_else(invalid)?),
        ElementType::Float => Value::Float(parse_float(text).ok_or_else(invalid)?),
        ElementType::Double => Value::Double(parse_float(text).ok_or_else(invalid)?),
    };
    Ok(value)
}

fn array_value(array: ArrayValue) -> Value {
    match array {
        ArrayValue::Bool(values) => Value::BoolArray(BoolArray { values }),
        ArrayValue::Int32(values) => Value::Int32Array(Int32Array { values }),
        ArrayValue::Int64(values) => Value::Int64Array(Int64Array { values }),
        ArrayValue::Uint32(values) => Value::Uint32Array(Uint32Array { values }),
        ArrayValue::Uint64(values) => Value::Uint64Array(Uint64Array { values }),
        ArrayValue::Float(values) => Value::FloatArray(FloatArray { values }),
        ArrayValue::Double(values) => Value::DoubleArray(DoubleArray { values }),
        ArrayValue::String(values) => Value::StringArray(StringArray { values }),
    }
}

/// Render a datapoint as text; arrays become JSON arrays.
pub fn datapoint_to_string(datapoint: &Datapoint) -> String {
    let Some(value) = &datapoint.value else {
        return String::new();
    };
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Uint32(v) => v.to_string(),
        Value::Uint64(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::StringArray(a) => json!(a.values).to_string(),
        Value::BoolArray(a) => json!(a.values).to_string(),
        Value::Int32Array(a) => json!(a.values).to_string(),
        Value::Int64Array(a) => json!(a.values).to_string(),
        Value::Uint32Array(a) => json!(a.values).to_string(),
        Value::Uint64Array(a) => json!(a.values).to_string(),
        Value::FloatArray(a) => json!(a.values).to_string(),
        Value::DoubleArray(a) => json!(a.values).to_string(),
    }
}

/// Render metadata as `{"<path>": {"datatype": ..., "type": ..., ...}}`.
pub fn metadata_to_json(path: &str, metadata: &Metadata) -> String {
    let mut fields = Map::new();
    fields.insert("datatype".into(), json!(metadata.data_type().type_name()));
    fields.insert("type".into(), json!(metadata.entry_type().type_name()));
    let optional = [
        ("description", &metadata.description),
        ("comment", &metadata.comment),
        ("deprecation", &metadata.deprecation),
        ("unit", &metadata.unit),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            fields.insert(key.into(), json!(value));
        }
    }

    let mut root = Map::new();
    root.insert(path.to_string(), fields.into());
    serde_json::Value::Object(root).to_string()
}

/// Text for the part of `entry` selected by `attribute`
pub fn entry_to_string(entry: &DataEntry, attribute: Attribute) -> Option<String> {
    match attribute {
        Attribute::Value => entry.value.as_ref().map(datapoint_to_string),
        Attribute::TargetValue => entry.actuator_target.as_ref().map(datapoint_to_string),
        Attribute::Metadata => entry
            .metadata
            .as_ref()
            .map(|metadata| metadata_to_json(&entry.path, metadata)),
    }
}
