use serde::Deserialize;
use thiserror::Error;

use crate::model::Catalog;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),
    /// The server answered with a non-2xx status.
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Where the activities API lives. The default is the origin that served the page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: &'static str,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig::new("")
    }
}

impl ApiConfig {
    pub fn new(base_url: &'static str) -> Self {
        ApiConfig {
            base_url: base_url.trim_end_matches('/'),
        }
    }

    /// Reads `ACTIVITIES_API_BASE` at compile time, since the WASM bundle has no environment of
    /// its own.
    pub fn from_build_env() -> Self {
        option_env!("ACTIVITIES_API_BASE")
            .map(ApiConfig::new)
            .unwrap_or_default()
    }

    pub fn activities_url(&self) -> String {
        format!("{}/activities", self.base_url)
    }

    pub fn signup_url(&self, activity: &str, email: &str) -> String {
        format!(
            "{}/activities/{}/signup?email={}",
            self.base_url,
            encode_component(activity),
            encode_component(email)
        )
    }

    pub fn unregister_url(&self, activity: &str, email: &str) -> String {
        format!(
            "{}/activities/{}/unregister?email={}",
            self.base_url,
            encode_component(activity),
            encode_component(email)
        )
    }

    pub async fn fetch_catalog(self) -> Result<Catalog, ApiError> {
        let (status, body) = send("GET", &self.activities_url()).await?;
        decode_catalog(status, &body)
    }

    pub async fn signup(self, activity: &str, email: &str) -> Result<String, ApiError> {
        let (status, body) = send("POST", &self.signup_url(activity, email)).await?;
        decode_mutation(status, &body)
    }

    pub async fn unregister(self, activity: &str, email: &str) -> Result<String, ApiError> {
        let (status, body) = send("DELETE", &self.unregister_url(activity, email)).await?;
        decode_mutation(status, &body)
    }
}

/// Percent-encodes a path segment or query value the same way `encodeURIComponent` does.
pub fn encode_component(raw: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => {
                encoded.push('%');
                encoded.push(HEX[usize::from(byte >> 4)] as char);
                encoded.push(HEX[usize::from(byte & 0x0f)] as char);
            }
        }
    }
    encoded
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Builds the error for a non-2xx reply. A body that is not JSON is a decode failure. A
/// `detail` that is not a string (validation errors, say) is kept as its JSON text.
fn rejection(status: u16, body: &str) -> ApiError {
    let reply: serde_json::Value = match serde_json::from_str(body) {
        Ok(reply) => reply,
        Err(e) => return ApiError::Decode(e),
    };
    let detail = match reply.get("detail") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    };
    ApiError::Rejected { status, detail }
}

/// Decodes the body of `GET /activities`.
pub fn decode_catalog(status: u16, body: &str) -> Result<Catalog, ApiError> {
    if !is_success(status) {
        return Err(rejection(status, body));
    }
    Ok(serde_json::from_str(body)?)
}

/// Decodes a signup or unregister reply into the message to show the user.
/// Non-2xx JSON replies become `Rejected`, carrying `detail` when the body has one.
pub fn decode_mutation(status: u16, body: &str) -> Result<String, ApiError> {
    if !is_success(status) {
        return Err(rejection(status, body));
    }
    let reply: MessageBody = serde_json::from_str(body)?;
    Ok(reply.message)
}

#[cfg(feature = "hydrate")]
fn network_error(err: wasm_bindgen::JsValue) -> ApiError {
    ApiError::Network(format!("{:?}", err))
}

/// Issues a request through the browser's `fetch` and returns the status and body text.
#[cfg(feature = "hydrate")]
async fn send(method: &str, url: &str) -> Result<(u16, String), ApiError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".to_string()))?;

    let init = web_sys::RequestInit::new();
    init.set_method(method);
    let request = web_sys::Request::new_with_str_and_init(url, &init).map_err(network_error)?;
    request
        .headers()
        .set("Accept", "application/json")
        .map_err(network_error)?;

    let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network_error)?
        .dyn_into()
        .map_err(network_error)?;
    let text = JsFuture::from(response.text().map_err(network_error)?)
        .await
        .map_err(network_error)?;

    Ok((response.status(), text.as_string().unwrap_or_default()))
}

#[cfg(not(feature = "hydrate"))]
async fn send(method: &str, url: &str) -> Result<(u16, String), ApiError> {
    Err(ApiError::Network(format!(
        "cannot {} {} outside the browser",
        method, url
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("Chess Club"), "Chess%20Club");
        assert_eq!(encode_component("a+b@x.com"), "a%2Bb%40x.com");
        assert_eq!(encode_component("Art & Design/2"), "Art%20%26%20Design%2F2");
        assert_eq!(encode_component("it's-ok_(really)!~*."), "it's-ok_(really)!~*.");
        assert_eq!(encode_component("café"), "caf%C3%A9");
        assert_eq!(encode_component(""), "");
    }

    #[test]
    fn test_urls() {
        let api = ApiConfig::default();
        assert_eq!(api.activities_url(), "/activities");
        assert_eq!(
            api.signup_url("Chess Club", "a@x.com"),
            "/activities/Chess%20Club/signup?email=a%40x.com"
        );
        assert_eq!(
            api.unregister_url("Math Club", "b+c@x.com"),
            "/activities/Math%20Club/unregister?email=b%2Bc%40x.com"
        );

        let remote = ApiConfig::new("http://localhost:8000/");
        assert_eq!(remote.activities_url(), "http://localhost:8000/activities");
    }

    #[test]
    fn test_decode_catalog() {
        let body = r#"{
            "Chess Club": {
                "description": "Play chess",
                "schedule": "Fri 3pm",
                "max_participants": 10,
                "participants": ["a@x.com"]
            }
        }"#;
        let catalog = decode_catalog(200, body).expect("valid catalog");
        assert_eq!(catalog.len(), 1);
        let chess = &catalog["Chess Club"];
        assert_eq!(chess.schedule, "Fri 3pm");
        assert_eq!(chess.spots_left(), 9);

        assert!(matches!(
            decode_catalog(200, "<html>oops</html>"),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            decode_catalog(200, r#"{"Chess Club": {"description": "x"}}"#),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            decode_catalog(503, "Service Unavailable"),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(
            decode_catalog(503, r#"{"detail":"Down for maintenance"}"#),
            Err(ApiError::Rejected { status: 503, .. })
        ));
    }

    #[test]
    fn test_decode_mutation() {
        assert_eq!(
            decode_mutation(200, r#"{"message":"Signed up a@x.com for Chess Club"}"#).unwrap(),
            "Signed up a@x.com for Chess Club"
        );

        match decode_mutation(400, r#"{"detail":"Already registered"}"#) {
            Err(ApiError::Rejected { status, detail }) => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("Already registered"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        assert!(matches!(
            decode_mutation(404, r#"{"detail":null}"#),
            Err(ApiError::Rejected {
                status: 404,
                detail: None
            })
        ));

        match decode_mutation(422, r#"{"detail":[{"loc":["query","email"]}]}"#) {
            Err(ApiError::Rejected { detail, .. }) => {
                assert_eq!(detail.as_deref(), Some(r#"[{"loc":["query","email"]}]"#));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        // A non-2xx body that is not JSON cannot be read at all.
        assert!(matches!(
            decode_mutation(500, "Internal Server Error"),
            Err(ApiError::Decode(_))
        ));

        assert!(matches!(
            decode_mutation(200, r#"{"ok":true}"#),
            Err(ApiError::Decode(_))
        ));
    }
}
