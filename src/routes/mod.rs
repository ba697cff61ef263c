use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult};

pub mod commission;
pub mod portfolio;
pub mod settings;
pub mod system;
pub mod user;

const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// For `Option<Option<T>>` fields in partial updates, with `#[serde(default)]`:
/// absent stays `None`, an explicit `null` becomes `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `skip`/`limit` paging shared by the list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn validate(self) -> AppResult<Self> {
        if self.skip < 0 {
            return Err(AppError::bad_request("skip must be greater than or equal to 0"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(AppError::bad_request(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults() {
        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 100);
        assert!(page.validate().is_ok());
    }

    #[test]
    fn page_bounds() {
        assert!(Page { skip: -1, limit: 10 }.validate().is_err());
        assert!(Page { skip: 0, limit: 0 }.validate().is_err());
        assert!(Page { skip: 0, limit: 1001 }.validate().is_err());
        assert!(Page { skip: 5, limit: 1000 }.validate().is_ok());
    }
}
