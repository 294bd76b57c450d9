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

//! Photos as opaque blobs: loading them from disk, and packing them into
//! `data:` URLs for backups. Photos are never decoded or resized here.

use std::fs::read;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::image_hash::ImageHash;

const PHOTO_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Clone, PartialEq, Debug)]
pub struct Photo {
    pub hash: ImageHash,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Photo {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            hash: ImageHash::hash_bytes(&data),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn to_data_url(&self) -> String {
        let data = BASE64.encode(&self.data);
        format!("data:{};base64,{data}", self.mime_type)
    }

    /// Parse a base64 `data:` URL, as produced by [`Photo::to_data_url`] or by
    /// a browser canvas.
    pub fn from_data_url(url: &str) -> Fallible<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ErrorReport::new("photo is not a data URL."))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ErrorReport::new("malformed data URL."))?;
        let mime_type = match header.strip_suffix(";base64") {
            Some(mime_type) => mime_type,
            None => return fail("only base64 data URLs are supported."),
        };
        if !mime_type.starts_with("image/") {
            return fail(format!("unsupported photo type: {mime_type}"));
        }
        let data = BASE64.decode(payload.trim())?;
        Ok(Self::new(mime_type, data))
    }
}

/// Whether the file extension is one of the supported photo formats.
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

pub fn load_photo(path: &Path) -> Fallible<Photo> {
    if !path.is_file() {
        return fail(format!("photo not found: {}", path.display()));
    }
    if !is_photo(path) {
        return fail(format!(
            "unsupported photo format: {} (expected one of {})",
            path.display(),
            PHOTO_EXTENSIONS.join(", ")
        ));
    }
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    let data = read(path)?;
    if data.is_empty() {
        return fail(format!("photo is empty: {}", path.display()));
    }
    Ok(Photo::new(mime_type.essence_str(), data))
}

/// Turn a file name like `ada_lovelace-2.jpg` into a display name like
/// `ada lovelace 2`.
pub fn name_from_file(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.replace(['-', '_'], " ");
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
