use super::*;

#[derive(Debug, PartialEq)]
pub struct Authorize {
    pub username: String,
    pub password: Option<String>,
}

impl Serialize for Authorize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.password.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.username)?;
        if let Some(pass) = &self.password {
            seq.serialize_element(pass)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Authorize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((String,)),
            Two((String, Option<String>)),
        }

        match Raw::deserialize(deserializer)? {
            Raw::One((username,)) => Ok(Authorize {
                username,
                password: None,
            }),
            Raw::Two((username, password)) => Ok(Authorize { username, password }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_and_password() {
        let parsed: Authorize = serde_json::from_str(r#"["worker.1","x"]"#).unwrap();
        assert_eq!(
            parsed,
            Authorize {
                username: "worker.1".into(),
                password: Some("x".into()),
            }
        );
    }

    #[test]
    fn password_optional() {
        let parsed: Authorize = serde_json::from_str(r#"["worker.1"]"#).unwrap();
        assert_eq!(
            parsed,
            Authorize {
                username: "worker.1".into(),
                password: None,
            }
        );
    }

    #[test]
    fn serialize_shapes() {
        let a = Authorize {
            username: "u".into(),
            password: None,
        };
        assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::json!(["u"]));

        let b = Authorize {
            username: "u".into(),
            password: Some("p".into()),
        };
        assert_eq!(
            serde_json::to_value(&b).unwrap(),
            serde_json::json!(["u", "p"])
        );
    }
}
