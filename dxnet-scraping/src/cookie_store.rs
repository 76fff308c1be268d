use std::{
    io::{self, BufReader},
    path::Path,
};

use dxnet_scraping_utils::fs_json_util::write_json;
use fs_err::File;
use serde::{Deserialize, Serialize};

/// The authenticated session is a single `userId` cookie.  Logging in is out
/// of scope here; the cookie is expected to already exist, and is refreshed
/// whenever the server rotates it.
#[derive(Default, Debug, Serialize, Deserialize)]
pub struct CookieStore {
    pub user_id: UserIdCookie,
}

#[derive(Default, Debug, derive_more::From, derive_more::Display, Serialize, Deserialize)]
pub struct UserIdCookie(String);

impl CookieStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CookieStoreLoadError> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        write_json(path, self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CookieStoreLoadError {
    #[error("Cookie store was not found.")]
    NotFound,
    #[error("An I/O error occurred when loading the cookie store: {0:?}")]
    IOError(io::Error),
    #[error("The cookie store json file is corrupted and could not be loaded: {0:?}")]
    JsonError(#[from] serde_json::Error),
}

impl From<io::Error> for CookieStoreLoadError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::IOError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CookieStore;

    #[test]
    fn round_trips_through_json() {
        let store = CookieStore {
            user_id: "deadbeef".to_owned().into(),
        };
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"user_id":"deadbeef"}"#);
        let loaded: CookieStore = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.user_id.to_string(), "deadbeef");
    }
}
