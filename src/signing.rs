use chrono::Utc;

/// The `_t`/`_c` pair every platform request carries.
///
/// `_c` is a placeholder: it is derived from the timestamp alone and has not been
/// verified against the platform's real signature scheme. The endpoints have been
/// observed to accept it, nothing more.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RequestParams {
    pub(crate) timestamp: u64,
    pub(crate) checksum: u64,
}

impl RequestParams {
    pub(crate) fn at(timestamp: u64) -> Self {
        Self {
            timestamp,
            checksum: timestamp % 10_000,
        }
    }

    pub(crate) fn now() -> Self {
        Self::at(u64::try_from(Utc::now().timestamp()).unwrap_or_default())
    }

    pub(crate) fn to_form_body(self) -> String {
        format!("_t={}&_c={}", self.timestamp, self.checksum)
    }
}
