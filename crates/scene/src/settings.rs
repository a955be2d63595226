use serde::{Deserialize, Serialize};

/// Which record keys drive the scatter view.
///
/// `class_field` selects the category used for coloring. The other keys name
/// the task data fields requested from the backend for each point attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    pub x_field: String,
    pub y_field: String,
    pub class_field: String,
    pub text_field: Option<String>,
    pub radius_field: Option<String>,
    pub time_field: Option<String>,
    pub image_field: Option<String>,
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            x_field: "x".to_string(),
            y_field: "y".to_string(),
            class_field: "class".to_string(),
            text_field: None,
            radius_field: None,
            time_field: None,
            image_field: None,
        }
    }
}

impl ScatterSettings {
    pub fn with_class_field(mut self, field: impl Into<String>) -> Self {
        self.class_field = field.into();
        self
    }

    /// Backend parameter name paired with the configured data key.
    ///
    /// Order matches the backend's accepted parameters; unset optional keys are skipped.
    pub fn requested_fields(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![("x", self.x_field.as_str()), ("y", self.y_field.as_str())];
        if !self.class_field.is_empty() {
            out.push(("class", self.class_field.as_str()));
        }
        let optional = [
            ("text", &self.text_field),
            ("r", &self.radius_field),
            ("image", &self.image_field),
            ("time", &self.time_field),
        ];
        for (alias, key) in optional {
            if let Some(key) = key.as_deref().filter(|k| !k.is_empty()) {
                out.push((alias, key));
            }
        }
        out
    }

    /// Whether records fetched under `self` already carry the keys `other` reads.
    pub fn covers(&self, other: &ScatterSettings) -> bool {
        let mine = self.requested_fields();
        other
            .requested_fields()
            .iter()
            .all(|(alias, key)| mine.iter().any(|(a, k)| a == alias && k == key))
    }
}

#[cfg(test)]
mod tests {
    use super::ScatterSettings;

    #[test]
    fn requested_fields_skip_unset_keys() {
        let s = ScatterSettings {
            text_field: Some("caption".into()),
            radius_field: Some(String::new()),
            ..ScatterSettings::default()
        };
        assert_eq!(
            s.requested_fields(),
            vec![("x", "x"), ("y", "y"), ("class", "class"), ("text", "caption")]
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let s: ScatterSettings = serde_json::from_str(r#"{"class_field":"label"}"#).unwrap();
        assert_eq!(s.x_field, "x");
        assert_eq!(s.class_field, "label");
    }

    #[test]
    fn covers_compares_requested_keys() {
        let base = ScatterSettings::default();
        assert!(base.covers(&base.clone()));
        assert!(!base.covers(&base.clone().with_class_field("sentiment")));
    }
}
