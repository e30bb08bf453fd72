//! JSON-encoded string list stored in a TEXT column
//!
//! Encoding an empty list writes `[]`; a NULL column reads back as an empty
//! list when fetched as `Option<JsonList>` and defaulted.

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::SqliteTypeInfo;
use sqlx::{Database, Decode, Encode, Sqlite, Type};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonList(pub Vec<String>);

impl JsonList {
    pub fn new(items: Vec<String>) -> Self {
        Self(items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// Column text for this list
    pub fn to_column(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse column text; `None` (SQL NULL) is an empty list
    pub fn from_column(value: Option<&str>) -> Result<Self, serde_json::Error> {
        match value {
            None => Ok(Self::default()),
            Some(text) => serde_json::from_str(text).map(Self),
        }
    }
}

impl From<Vec<String>> for JsonList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl Type<Sqlite> for JsonList {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for JsonList {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.to_column(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for JsonList {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Self::from_column(Some(text))?)
    }
}
