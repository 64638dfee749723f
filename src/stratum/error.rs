use super::*;

pub type Result<T, E = InternalError> = std::result::Result<T, E>;

/// Wire error codes. Sent to miners as the first element of the
/// `[code, message, traceback]` error array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StratumError {
    Unknown = 20,
    JobNotFound = 21,
    DuplicateShare = 22,
    LowDifficultyShare = 23,
    UnauthorizedWorker = 24,
    NotSubscribed = 25,
}

impl Display for StratumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Unknown => "Other/Unknown",
            Self::JobNotFound => "Job not found",
            Self::DuplicateShare => "Duplicate share",
            Self::LowDifficultyShare => "Low difficulty share",
            Self::UnauthorizedWorker => "Unauthorized worker",
            Self::NotSubscribed => "Not subscribed",
        };
        write!(f, "{message}")
    }
}

impl StratumError {
    pub fn into_response(self, traceback: Option<Value>) -> JsonRpcError {
        JsonRpcError {
            error_code: self as i32,
            message: self.to_string(),
            traceback,
        }
    }

    /// Same code, custom reason string.
    pub fn with_reason(self, reason: impl Into<String>) -> JsonRpcError {
        JsonRpcError {
            error_code: self as i32,
            message: reason.into(),
            traceback: None,
        }
    }
}

/// The `[code, message, traceback]` array carried in the `error` field of a
/// response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcError {
    pub error_code: i32,
    pub message: String,
    pub traceback: Option<Value>,
}

impl Serialize for JsonRpcError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.error_code, &self.message, &self.traceback).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonRpcError {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (error_code, message, traceback) =
            <(i32, String, Option<Value>)>::deserialize(deserializer)?;

        Ok(JsonRpcError {
            error_code,
            message,
            traceback,
        })
    }
}

impl Display for JsonRpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.message)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InternalError {
    #[snafu(display("Failed to parse hex string: {source}"))]
    HexParse { source: hex::FromHexError },

    #[snafu(display("Invalid length: expected {expected}, got {actual}"))]
    InvalidLength { expected: usize, actual: usize },

    #[snafu(display("Invalid value: {reason}"))]
    InvalidValue { reason: String },

    #[snafu(display("Parse error: {message}"))]
    Parse { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(StratumError::Unknown as i32, 20);
        assert_eq!(StratumError::JobNotFound as i32, 21);
        assert_eq!(StratumError::DuplicateShare as i32, 22);
        assert_eq!(StratumError::LowDifficultyShare as i32, 23);
        assert_eq!(StratumError::UnauthorizedWorker as i32, 24);
        assert_eq!(StratumError::NotSubscribed as i32, 25);
    }

    #[test]
    fn error_messages() {
        assert_eq!(StratumError::JobNotFound.to_string(), "Job not found");
        assert_eq!(
            StratumError::LowDifficultyShare.to_string(),
            "Low difficulty share"
        );
        assert_eq!(
            StratumError::UnauthorizedWorker.to_string(),
            "Unauthorized worker"
        );
        assert_eq!(StratumError::NotSubscribed.to_string(), "Not subscribed");
    }

    #[test]
    fn response_serializes_as_array() {
        let response = StratumError::JobNotFound.into_response(None);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"[21,"Job not found",null]"#
        );
    }

    #[test]
    fn response_with_reason() {
        let response = StratumError::Unknown.with_reason("parse");
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"[20,"parse",null]"#
        );
    }

    #[test]
    fn response_roundtrip() {
        let response: JsonRpcError =
            serde_json::from_str(r#"[22,"Duplicate share",null]"#).unwrap();
        assert_eq!(response.error_code, 22);
        assert_eq!(response.message, "Duplicate share");
        assert!(response.traceback.is_none());
    }
}
