use super::*;

/// `mining.configure(extensions, params)`. No extensions are supported, so
/// the options map is kept opaque; the handler only echoes an empty result.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Configure {
    pub extensions: Vec<String>,
    pub options: BTreeMap<String, Value>,
}

impl Serialize for Configure {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.extensions, &self.options).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Configure {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One((Vec<String>,)),
            Two((Vec<String>, BTreeMap<String, Value>)),
        }

        match Raw::deserialize(deserializer)? {
            Raw::One((extensions,)) => Ok(Configure {
                extensions,
                options: BTreeMap::new(),
            }),
            Raw::Two((extensions, options)) => Ok(Configure {
                extensions,
                options,
            }),
        }
    }
}
