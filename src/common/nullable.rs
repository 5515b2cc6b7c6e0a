// src/common/nullable.rs

use serde::{Deserialize, Deserializer};

// Campo de PATCH/PUT parcial que distingue "ausente" de "null":
//   ausente      -> None          (não mexe)
//   "x": null    -> Some(None)    (limpa)
//   "x": valor   -> Some(Some(v)) (troca)
// Usar junto com `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let cleared: Patch = serde_json::from_str(r#"{ "notes": null }"#).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: Patch = serde_json::from_str(r#"{ "notes": "ligar de novo" }"#).unwrap();
        assert_eq!(set.notes, Some(Some("ligar de novo".to_string())));
    }
}
