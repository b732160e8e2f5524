//! W3C WebDriver client for an Appium server.

use super::{AppDriver, DriverError, DriverResult, ElementRef, Platform, Point, Rect};
use crate::locator::Locator;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// W3C element identifier key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Pre-W3C (JSONWP) element identifier key
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// HTTP timeout per command; UiAutomator2 lookups on slow devices can
/// take most of a minute.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(90);

/// A live Appium session
#[derive(Debug)]
pub struct AppiumDriver {
    base_url: String,
    client: reqwest::Client,
    session_id: String,
    platform: Platform,
    closed: AtomicBool,
}

impl AppiumDriver {
    /// Create a session on the server at `base_url`.
    pub async fn connect(
        base_url: impl Into<String>,
        platform: Platform,
        capabilities: Value,
    ) -> DriverResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let body = json!({ "capabilities": { "alwaysMatch": capabilities, "firstMatch": [{}] } });

        info!(url = %base_url, %platform, "creating Appium session");
        let resp = client
            .post(format!("{base_url}/session"))
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let payload: Value = resp.json().await?;
        let session_id = match parse_session_id(&payload) {
            Some(id) => id,
            None => {
                unwrap_value(status, payload)?;
                return Err(DriverError::protocol("session response carried no sessionId"));
            }
        };
        info!(session = %session_id, "Appium session created");

        Ok(Self {
            base_url,
            client,
            session_id,
            platform,
            closed: AtomicBool::new(false),
        })
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> DriverResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::SessionClosed {
                session_id: self.session_id.clone(),
            });
        }
        let url = format!("{}/session/{}{path}", self.base_url, self.session_id);
        debug!(%method, %url, "appium command");
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let payload: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                DriverError::protocol(format!("invalid JSON from {url} ({status}): {e}"))
            })?
        };
        unwrap_value(status, payload)
    }

    async fn get(&self, path: &str) -> DriverResult<Value> {
        self.command(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> DriverResult<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn perform_actions(&self, actions: Vec<Value>) -> DriverResult<()> {
        let body = json!({
            "actions": [{
                "type": "pointer",
                "id": "finger1",
                "parameters": { "pointerType": "touch" },
                "actions": actions,
            }]
        });
        self.post("/actions", body).await?;
        Ok(())
    }
}

/// Extract the session id from a new-session response (W3C or JSONWP).
fn parse_session_id(payload: &Value) -> Option<String> {
    payload
        .pointer("/value/sessionId")
        .or_else(|| payload.get("sessionId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Unwrap `{"value": ...}`, turning error payloads into [`DriverError`].
fn unwrap_value(status: u16, payload: Value) -> DriverResult<Value> {
    let value = match payload {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => other,
    };
    let error = value.get("error").and_then(Value::as_str).map(str::to_string);
    if let Some(error) = error {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(DriverError::WebDriver {
            status,
            error,
            message,
        });
    }
    if !(200..300).contains(&status) {
        return Err(DriverError::WebDriver {
            status,
            error: "unknown error".to_string(),
            message: value.to_string(),
        });
    }
    Ok(value)
}

/// Element id from an element reference object
fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn locator_body(locator: &Locator) -> Value {
    json!({ "using": locator.strategy.wire_name(), "value": locator.value })
}

fn to_element(value: &Value, locator: &Locator) -> DriverResult<ElementRef> {
    element_id(value)
        .map(|id| ElementRef::new(id, locator.clone()))
        .ok_or_else(|| DriverError::protocol(format!("no element id in {value}")))
}

fn to_rect(value: &Value) -> DriverResult<Rect> {
    let num = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_f64)
            .map(|n| n.round() as i32)
            .ok_or_else(|| DriverError::protocol(format!("rect without {key}: {value}")))
    };
    Ok(Rect::new(num("x")?, num("y")?, num("width")?, num("height")?))
}

fn attribute_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl AppDriver for AppiumDriver {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> DriverResult<Option<ElementRef>> {
        match self.post("/element", locator_body(locator)).await {
            Ok(value) => to_element(&value, locator).map(Some),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementRef>> {
        let value = self.post("/elements", locator_body(locator)).await?;
        value
            .as_array()
            .map(|items| items.iter().map(|v| to_element(v, locator)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn find_child(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> DriverResult<Option<ElementRef>> {
        let path = format!("/element/{}/element", parent.id);
        match self.post(&path, locator_body(locator)).await {
            Ok(value) => to_element(&value, locator).map(Some),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn click(&self, element: &ElementRef) -> DriverResult<()> {
        self.post(&format!("/element/{}/click", element.id), json!({}))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> DriverResult<()> {
        self.post(&format!("/element/{}/clear", element.id), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        self.post(
            &format!("/element/{}/value", element.id),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> DriverResult<String> {
        let value = self.get(&format!("/element/{}/text", element.id)).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        let value = self
            .get(&format!("/element/{}/attribute/{name}", element.id))
            .await?;
        Ok(attribute_value(value))
    }

    async fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool> {
        let value = self
            .get(&format!("/element/{}/displayed", element.id))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool> {
        let value = self.get(&format!("/element/{}/enabled", element.id)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn rect(&self, element: &ElementRef) -> DriverResult<Rect> {
        let value = self.get(&format!("/element/{}/rect", element.id)).await?;
        to_rect(&value)
    }

    async fn window_rect(&self) -> DriverResult<Rect> {
        let value = self.get("/window/rect").await?;
        to_rect(&value)
    }

    async fn tap(&self, point: Point) -> DriverResult<()> {
        self.perform_actions(vec![
            json!({ "type": "pointerMove", "duration": 0, "x": point.x, "y": point.y }),
            json!({ "type": "pointerDown", "button": 0 }),
            json!({ "type": "pause", "duration": 100 }),
            json!({ "type": "pointerUp", "button": 0 }),
        ])
        .await
    }

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> DriverResult<()> {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.perform_actions(vec![
            json!({ "type": "pointerMove", "duration": 0, "x": from.x, "y": from.y }),
            json!({ "type": "pointerDown", "button": 0 }),
            json!({ "type": "pointerMove", "duration": ms, "x": to.x, "y": to.y }),
            json!({ "type": "pointerUp", "button": 0 }),
        ])
        .await
    }

    async fn press_keycode(&self, code: u32) -> DriverResult<()> {
        self.post("/appium/device/press_keycode", json!({ "keycode": code }))
            .await?;
        Ok(())
    }

    async fn hide_keyboard(&self) -> DriverResult<()> {
        self.post("/appium/device/hide_keyboard", json!({})).await?;
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        let value = self.get("/screenshot").await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| DriverError::protocol("screenshot is not a string"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| DriverError::protocol(format!("screenshot is not base64: {e}")))
    }

    async fn page_source(&self) -> DriverResult<String> {
        let value = self.get("/source").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn execute(&self, script: &str, args: Value) -> DriverResult<Value> {
        let args = match args {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn set_context(&self, name: &str) -> DriverResult<()> {
        self.post("/context", json!({ "name": name })).await?;
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.get("/timeouts").await.is_ok()
    }

    async fn quit(&self) -> DriverResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.command(Method::DELETE, "", None).await;
        self.closed.store(true, Ordering::SeqCst);
        match result {
            Ok(_) => {
                info!(session = %self.session_id, "Appium session closed");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "closing Appium session failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod response_tests {
        use super::*;

        #[test]
        fn test_unwrap_value_success() {
            let value = unwrap_value(200, json!({ "value": { "element-6066-11e4-a52e-4f735466cecf": "42" } })).unwrap();
            assert_eq!(element_id(&value).as_deref(), Some("42"));
        }

        #[test]
        fn test_unwrap_value_null_body() {
            assert_eq!(unwrap_value(200, json!({ "value": null })).unwrap(), Value::Null);
        }

        #[test]
        fn test_unwrap_value_webdriver_error() {
            let err = unwrap_value(
                404,
                json!({ "value": { "error": "no such element", "message": "not there", "stacktrace": "" } }),
            )
            .unwrap_err();
            assert!(err.is_no_such_element());
            assert!(err.to_string().contains("not there"));
        }

        #[test]
        fn test_unwrap_value_bare_failure_status() {
            let err = unwrap_value(500, json!({ "value": "boom" })).unwrap_err();
            match err {
                DriverError::WebDriver { status, error, .. } => {
                    assert_eq!(status, 500);
                    assert_eq!(error, "unknown error");
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_session_id_shapes() {
            let w3c = json!({ "value": { "sessionId": "abc", "capabilities": {} } });
            let legacy = json!({ "sessionId": "def", "status": 0, "value": {} });
            assert_eq!(parse_session_id(&w3c).as_deref(), Some("abc"));
            assert_eq!(parse_session_id(&legacy).as_deref(), Some("def"));
            assert_eq!(parse_session_id(&json!({})), None);
        }

        #[test]
        fn test_legacy_element_key() {
            assert_eq!(element_id(&json!({ "ELEMENT": "7" })).as_deref(), Some("7"));
            assert_eq!(element_id(&json!({ "other": "7" })), None);
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_rect_rounds_floats() {
            let rect = to_rect(&json!({ "x": 10.4, "y": 20.6, "width": 100, "height": 50 })).unwrap();
            assert_eq!(rect, Rect::new(10, 21, 100, 50));
            assert!(to_rect(&json!({ "x": 1 })).is_err());
        }

        #[test]
        fn test_attribute_values() {
            assert_eq!(attribute_value(Value::Null), None);
            assert_eq!(attribute_value(json!("true")).as_deref(), Some("true"));
            assert_eq!(attribute_value(json!(false)).as_deref(), Some("false"));
        }

        #[test]
        fn test_locator_body() {
            let body = locator_body(&Locator::accessibility_id("Continue as guest"));
            assert_eq!(body["using"], "accessibility id");
            assert_eq!(body["value"], "Continue as guest");
        }
    }
}
