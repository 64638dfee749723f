use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        match self {
            Message::Request { id, method, params } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("method", method)?;
                map.serialize_entry("params", params)?;
            }
            Message::Response { id, result, error } => {
                map.serialize_entry("id", id)?;
                map.serialize_entry("result", result)?;
                map.serialize_entry("error", error)?;
            }
            Message::Notification { method, params } => {
                map.serialize_entry("id", &Value::Null)?;
                map.serialize_entry("method", method)?;
                map.serialize_entry("params", params)?;
            }
        }
        map.end()
    }
}

/// Notifications go out with an explicit `id: null`, which is technically
/// wrong according to the JSON-RPC spec (no id field at all) but is what
/// every Stratum implementation does. Incoming messages are accepted either
/// way; a message with a method and a non-null id is a request.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let has_method = value.get("method").is_some();

        let null_id = value.get("id") == Some(&Value::Null) || value.get("id").is_none();

        let is_response = value.get("result").is_some() || value.get("error").is_some();

        if is_response {
            #[derive(Deserialize)]
            struct Resp {
                id: Id,
                result: Option<Value>,
                error: Option<JsonRpcError>,
            }

            let r: Resp = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Response {
                id: r.id,
                result: r.result,
                error: r.error,
            })
        } else if has_method && null_id {
            let method = value
                .get("method")
                .and_then(Value::as_str)
                .ok_or_else(|| de::Error::missing_field("method"))?
                .to_string();

            let params = value
                .get("params")
                .cloned()
                .ok_or_else(|| de::Error::missing_field("params"))?;

            Ok(Message::Notification { method, params })
        } else if has_method {
            #[derive(Deserialize)]
            struct Req {
                id: Id,
                method: String,
                params: Value,
            }

            let r: Req = serde_json::from_value(value).map_err(de::Error::custom)?;

            Ok(Message::Request {
                id: r.id,
                method: r.method,
                params: r.params,
            })
        } else {
            Err(de::Error::custom("unknown message format"))
        }
    }
}
