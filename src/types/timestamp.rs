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

use chrono::DateTime;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// Milliseconds in a day.
pub const DAY_MS: i64 = 86_400_000;

/// An instant in UTC with millisecond precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_millis(Utc::now().timestamp_millis())
    }

    /// Construct a timestamp from milliseconds since the Unix epoch.
    /// Out-of-range values saturate to the nearest representable instant.
    pub fn from_millis(ms: i64) -> Self {
        match DateTime::from_timestamp_millis(ms) {
            Some(dt) => Self(dt),
            None if ms > 0 => Self::truncated(DateTime::<Utc>::MAX_UTC),
            None => Self::truncated(DateTime::<Utc>::MIN_UTC),
        }
    }

    fn truncated(dt: DateTime<Utc>) -> Self {
        match DateTime::from_timestamp_millis(dt.timestamp_millis()) {
            Some(truncated) => Self(truncated),
            None => Self(dt),
        }
    }

    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn plus_days(self, days: u32) -> Self {
        let ms = i64::from(days).saturating_mul(DAY_MS);
        Self::from_millis(self.as_millis().saturating_add(ms))
    }

    pub fn plus_millis(self, ms: u64) -> Self {
        let ms = i64::try_from(ms).unwrap_or(i64::MAX);
        Self::from_millis(self.as_millis().saturating_add(ms))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is later.
    pub fn millis_since(self, earlier: Timestamp) -> u64 {
        self.as_millis().saturating_sub(earlier.as_millis()).max(0) as u64
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_millis()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let ms: i64 = FromSql::column_result(value)?;
        DateTime::from_timestamp_millis(ms)
            .map(Timestamp)
            .ok_or(FromSqlError::OutOfRange(ms))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Backups written by browsers may carry fractional milliseconds.
        let ms = f64::deserialize(deserializer)?;
        Ok(Timestamp::from_millis(ms.round() as i64))
    }
}
