//! Request and response bodies of the render endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use service_core::error::AppError;

/// Customization fields for a fairing render.
///
/// Every field is optional; empty strings count as absent. Scalars of any
/// JSON type are taken as their text, so `"yearRange": 2015` reads as "2015".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Free-text description from the customer.
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    /// Motorcycle model, e.g. "Yamaha YZF-R1".
    #[serde(default, deserialize_with = "lenient_text")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub primary_colors: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub accents: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub finish: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub brand_logos: Option<String>,
}

/// Read any JSON value as text: strings verbatim, `null` as absent, and
/// everything else as its compact JSON form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

impl RenderRequest {
    /// Parse a request body that is either a JSON object or a JSON string
    /// holding one. An empty body, `null`, or any other non-object JSON
    /// value yields an empty request.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body).map_err(anyhow::Error::new)?;
        let value = match value {
            Value::String(inner) => serde_json::from_str(&inner).map_err(anyhow::Error::new)?,
            other => other,
        };

        if !value.is_object() {
            return Ok(Self::default());
        }

        let request: RenderRequest = serde_json::from_value(value).map_err(anyhow::Error::new)?;
        Ok(request.normalized())
    }

    /// Reject requests that carry neither a description nor a model.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.prompt.is_none() && self.model.is_none() {
            return Err(AppError::BadRequest(
                "Missing prompt or model information".to_string(),
            ));
        }
        Ok(())
    }

    fn normalized(self) -> Self {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|value| !value.is_empty())
        }

        Self {
            prompt: present(self.prompt),
            model: present(self.model),
            year_range: present(self.year_range),
            style_name: present(self.style_name),
            primary_colors: present(self.primary_colors),
            accents: present(self.accents),
            finish: present(self.finish),
            brand_logos: present(self.brand_logos),
        }
    }
}

/// Successful render: the image inlined as a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub success: bool,
    pub image_data_url: String,
}

impl RenderResponse {
    pub fn from_inline_image(mime_type: &str, base64_data: &str) -> Self {
        Self {
            success: true,
            image_data_url: format!("data:{};base64,{}", mime_type, base64_data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let body = br#"{"model":"Yamaha YZF-R1","yearRange":"2015-2020","brandLogos":"Yamaha"}"#;
        let request = RenderRequest::from_body(body).unwrap();

        assert_eq!(request.model.as_deref(), Some("Yamaha YZF-R1"));
        assert_eq!(request.year_range.as_deref(), Some("2015-2020"));
        assert_eq!(request.brand_logos.as_deref(), Some("Yamaha"));
        assert!(request.prompt.is_none());
    }

    #[test]
    fn parses_double_encoded_body() {
        let body = br#""{\"prompt\":\"exploded fairing kit\"}""#;
        let request = RenderRequest::from_body(body).unwrap();

        assert_eq!(request.prompt.as_deref(), Some("exploded fairing kit"));
    }

    #[test]
    fn empty_and_null_bodies_are_empty_requests() {
        assert_eq!(RenderRequest::from_body(b"").unwrap(), RenderRequest::default());
        assert_eq!(RenderRequest::from_body(b"  \n").unwrap(), RenderRequest::default());
        assert_eq!(RenderRequest::from_body(b"null").unwrap(), RenderRequest::default());
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let request = RenderRequest::from_body(br#"{"prompt":"","model":"","finish":""}"#).unwrap();

        assert_eq!(request, RenderRequest::default());
        assert!(matches!(request.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn either_prompt_or_model_is_enough() {
        let with_prompt = RenderRequest {
            prompt: Some("side panel in matte black".to_string()),
            ..Default::default()
        };
        let with_model = RenderRequest {
            model: Some("Honda CBR600RR".to_string()),
            ..Default::default()
        };

        assert!(with_prompt.validate().is_ok());
        assert!(with_model.validate().is_ok());
    }

    #[test]
    fn non_object_json_is_an_empty_request() {
        let bodies: [&[u8]; 5] = [
            b"42",
            b"true",
            b"[]",
            br#""7""#,
            br#"["a","b","c","d","e","f","g","h"]"#,
        ];
        for body in bodies {
            let request = RenderRequest::from_body(body).unwrap();
            assert_eq!(request, RenderRequest::default());
            assert!(matches!(request.validate(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn non_string_fields_are_read_as_text() {
        let body = br#"{"model":"R1","yearRange":2015,"accents":true,"finish":null,"brandLogos":["Yamaha"]}"#;
        let request = RenderRequest::from_body(body).unwrap();

        assert_eq!(request.model.as_deref(), Some("R1"));
        assert_eq!(request.year_range.as_deref(), Some("2015"));
        assert_eq!(request.accents.as_deref(), Some("true"));
        assert_eq!(request.finish, None);
        assert_eq!(request.brand_logos.as_deref(), Some(r#"["Yamaha"]"#));
    }

    #[test]
    fn garbage_body_is_an_internal_error() {
        let err = RenderRequest::from_body(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let request = RenderRequest::from_body(br#"{"model":"R6","quantity":3}"#).unwrap();
        assert_eq!(request.model.as_deref(), Some("R6"));
    }

    #[test]
    fn data_url_embeds_mime_and_payload() {
        let response = RenderResponse::from_inline_image("image/png", "QQ==");
        assert_eq!(response.image_data_url, "data:image/png;base64,QQ==");
        assert!(response.success);
    }
}
