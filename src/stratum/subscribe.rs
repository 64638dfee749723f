use super::*;

/// `mining.subscribe(user_agent?, session_id?)`. Both parameters are
/// optional; some miners send an empty params array.
#[derive(Debug, PartialEq, Default)]
pub struct Subscribe {
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = match (&self.user_agent, &self.session_id) {
            (_, Some(_)) => 2,
            (Some(_), None) => 1,
            (None, None) => 0,
        };
        let mut seq = serializer.serialize_seq(Some(len))?;
        if len >= 1 {
            seq.serialize_element(&self.user_agent)?;
        }
        if len == 2 {
            seq.serialize_element(&self.session_id)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Value>::deserialize(deserializer)?;

        if values.len() > 2 {
            return Err(de::Error::custom("mining.subscribe takes at most 2 params"));
        }

        let string_at = |index: usize| -> Option<String> {
            values
                .get(index)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Subscribe {
            user_agent: string_at(0),
            session_id: string_at(1),
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SubscribeResult {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: usize,
}

impl Serialize for SubscribeResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.subscriptions)?;
        seq.serialize_element(&self.extranonce1)?;
        seq.serialize_element(&self.extranonce2_size)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (subscriptions, extranonce1, extranonce2_size) =
            <(Vec<(String, String)>, Extranonce, usize)>::deserialize(deserializer)?;

        Ok(SubscribeResult {
            subscriptions,
            extranonce1,
            extranonce2_size,
        })
    }
}
