use modelkit_model::Value;

/// Declaration of an enum: its constants and how input names are matched.
#[derive(Debug, Clone, Default)]
pub struct EnumConfig {
    pub(crate) name: Option<String>,
    pub(crate) values: Vec<(String, Value)>,
    pub(crate) auto_upper_case: bool,
}

impl EnumConfig {
    /// Constants whose raw value is their own name.
    #[must_use]
    pub fn values<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: names
                .into_iter()
                .map(|name| {
                    let name = name.into();
                    let value = Value::String(name.clone());
                    (name, value)
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Constants carrying an arbitrary raw value, usually a record.
    #[must_use]
    pub fn object_values<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Upper-case input names before matching them against constants.
    #[must_use]
    pub fn auto_upper_case(mut self, enabled: bool) -> Self {
        self.auto_upper_case = enabled;
        self
    }
}
