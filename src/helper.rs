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

use std::fs::write;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Fallible;

/// Create a fresh temporary directory. It is not deleted when the test ends.
pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir = tempfile::tempdir()?.keep();
    Ok(dir.canonicalize()?)
}

/// Write a small fake photo and return its path. The bytes only need to be
/// distinct per name: photos are never decoded.
pub fn write_photo(dir: &Path, file_name: &str) -> Fallible<PathBuf> {
    let path = dir.join(file_name);
    write(&path, format!("not really a jpeg: {file_name}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_directory() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert!(dir.exists());
        let photo = write_photo(&dir, "ada.jpg")?;
        assert!(photo.is_file());
        Ok(())
    }
}
