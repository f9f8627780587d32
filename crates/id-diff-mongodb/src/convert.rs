//! BSON `_id` values to engine identifiers.

use bson::{Bson, Document};
use id_diff::{IdValue, SourceError};

/// Convert a BSON value into an identifier.
///
/// Types the engine has no ordering for (decimals, min/max keys, regular
/// expressions, code) are rejected rather than approximated.
pub fn id_from_bson(value: &Bson) -> Result<IdValue, SourceError> {
    let id = match value {
        Bson::Null => IdValue::Null,
        Bson::Int32(i) => IdValue::Int32(*i),
        Bson::Int64(i) => IdValue::Int64(*i),
        Bson::Double(f) => IdValue::Double(*f),
        Bson::String(s) | Bson::Symbol(s) => IdValue::String(s.clone()),
        Bson::Boolean(b) => IdValue::Bool(*b),
        Bson::ObjectId(oid) => IdValue::ObjectId(oid.bytes()),
        Bson::DateTime(dt) => IdValue::DateTime(dt.timestamp_millis()),
        Bson::Timestamp(ts) => IdValue::Timestamp {
            time: ts.time,
            increment: ts.increment,
        },
        Bson::Binary(binary) => IdValue::Binary {
            subtype: u8::from(binary.subtype),
            bytes: binary.bytes.clone(),
        },
        Bson::Document(doc) => IdValue::Document(
            doc.iter()
                .map(|(key, value)| Ok((key.clone(), id_from_bson(value)?)))
                .collect::<Result<Vec<_>, SourceError>>()?,
        ),
        Bson::Array(values) => IdValue::Array(
            values
                .iter()
                .map(id_from_bson)
                .collect::<Result<Vec<_>, SourceError>>()?,
        ),
        other => {
            return Err(SourceError::UnsupportedId(format!(
                "{:?} value {}",
                other.element_type(),
                other
            )))
        }
    };
    Ok(id)
}

/// Extract and convert the `_id` field of a projected document.
pub fn id_from_document(doc: &Document) -> Result<IdValue, SourceError> {
    let id = doc
        .get("_id")
        .ok_or_else(|| SourceError::Read(format!("document without _id: {doc}")))?;
    id_from_bson(id)
}
