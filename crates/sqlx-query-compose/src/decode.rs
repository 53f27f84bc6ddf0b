//! SQLite value to JSON decoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Decode, Row, Sqlite, TypeInfo, ValueRef};

use crate::Error;
use crate::session::Row as JsonRow;

fn decode<'r, T: Decode<'r, Sqlite>>(value: SqliteValueRef<'r>) -> Result<T, Error> {
   T::decode(value).map_err(|e| Error::Sqlx(sqlx::Error::Decode(e)))
}

/// Convert one SQLite value to JSON.
///
/// BLOBs become base64 strings; non-finite REALs become `null`.
pub(crate) fn to_json(value: SqliteValueRef<'_>) -> Result<JsonValue, Error> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_name = value.type_info().name().to_string();
   let json = match type_name.as_str() {
      "NULL" => JsonValue::Null,
      "TEXT" | "DATE" | "TIME" | "DATETIME" => JsonValue::String(decode::<String>(value)?),
      "INTEGER" | "BOOLEAN" => JsonValue::from(decode::<i64>(value)?),
      "REAL" => serde_json::Number::from_f64(decode::<f64>(value)?)
         .map(JsonValue::Number)
         .unwrap_or(JsonValue::Null),
      "NUMERIC" => {
         let number = decode::<f64>(value)?;
         if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
            JsonValue::from(number as i64)
         } else {
            serde_json::Number::from_f64(number)
               .map(JsonValue::Number)
               .unwrap_or(JsonValue::Null)
         }
      }
      "BLOB" => JsonValue::String(STANDARD.encode(decode::<Vec<u8>>(value)?)),
      other => return Err(Error::UnsupportedDatatype(other.to_string())),
   };

   Ok(json)
}

/// Decode rows to column-ordered JSON maps.
pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<JsonRow>, Error> {
   let mut values = Vec::with_capacity(rows.len());
   for row in rows {
      let mut value = JsonRow::default();
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         value.insert(column.name().to_string(), to_json(v)?);
      }
      values.push(value);
   }
   Ok(values)
}
