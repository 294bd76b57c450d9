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

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::cmd::drill::state::ServerState;
use crate::media::Photo;
use crate::types::image_hash::ImageHash;

/// Errors that can occur when looking up a photo.
#[derive(Debug, PartialEq)]
pub enum ImageLookupError {
    /// The path segment is not a hex-encoded hash.
    InvalidHash,
    /// No photo with that hash is stored.
    NotFound,
}

/// Serve a photo by its content hash. Photos never change under a given
/// hash, so they can be cached forever.
pub async fn image_handler(
    State(state): State<ServerState>,
    Path(hash): Path<String>,
) -> Response {
    match lookup_image(&state, &hash) {
        Ok(photo) => (
            StatusCode::OK,
            [
                (CONTENT_TYPE, photo.mime_type),
                (
                    CACHE_CONTROL,
                    "public, max-age=604800, immutable".to_string(),
                ),
            ],
            photo.data,
        )
            .into_response(),
        Err(ImageLookupError::InvalidHash) => StatusCode::BAD_REQUEST.into_response(),
        Err(ImageLookupError::NotFound) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn lookup_image(state: &ServerState, hash: &str) -> Result<Photo, ImageLookupError> {
    let hash = parse_hash(hash)?;
    match state.db.get_image(hash) {
        Ok(Some(photo)) => Ok(photo),
        Ok(None) => Err(ImageLookupError::NotFound),
        Err(e) => {
            log::error!("error: {e}");
            Err(ImageLookupError::NotFound)
        }
    }
}

fn parse_hash(hash: &str) -> Result<ImageHash, ImageLookupError> {
    if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ImageLookupError::InvalidHash);
    }
    ImageHash::from_hex(hash).map_err(|_| ImageLookupError::InvalidHash)
}
