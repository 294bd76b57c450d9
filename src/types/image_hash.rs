// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;

use crate::error::Fallible;
use crate::error::fail;

/// The content address of a photo: the blake3 hash of its bytes. Items refer
/// to their photo by this hash, so identical photos are stored once.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ImageHash([u8; blake3::OUT_LEN]);

impl ImageHash {
    pub fn hash_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn to_hex(self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        match blake3::Hash::from_hex(s) {
            Ok(hash) => Ok(Self(*hash.as_bytes())),
            Err(_) => fail(format!("invalid image hash '{s}'.")),
        }
    }
}

/// Stored as lowercase hex, which is also how photos are addressed in URLs.
impl ToSql for ImageHash {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for ImageHash {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let hex = value.as_str()?;
        ImageHash::from_hex(hex).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Display for ImageHash {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
