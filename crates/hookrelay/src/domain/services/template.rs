//! Forward Body Templating
//!
//! Renders `{{...}}` tokens in a forward body template against the
//! received request. Supported tokens:
//!
//! - `{{method}}`, `{{webhookName}}`, `{{webhookPath}}`
//! - `{{time}}` (ISO-8601 UTC) and `{{time_cn}}` (UTC+8, `YYYY/M/D HH:mm:ss`)
//! - `{{payload}}` (compact JSON) and `{{payload.a.b.0}}` (path lookup)
//!
//! Any token may carry a `|time` or `|time_cn` suffix that reads the value
//! as a timestamp first, e.g. `{{payload.created_at|time_cn}}`.
//!
//! Substitutions landing inside a JSON string literal of the template are
//! JSON-escaped, so `{"text": "{{payload.msg}}"}` stays valid JSON even
//! when the message contains quotes or newlines.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::domain::entities::ForwardConfig;
use crate::ports::ForwardRequest;

/// Epoch values at or above this are read as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Values available to a template
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub method: &'a str,
    pub webhook_name: &'a str,
    pub webhook_path: &'a str,
    pub payload: Option<&'a Value>,
    pub now: DateTime<Utc>,
}

impl<'a> TemplateContext<'a> {
    pub fn from_request(request: &'a ForwardRequest, now: DateTime<Utc>) -> Self {
        Self {
            method: &request.method,
            webhook_name: &request.webhook_name,
            webhook_path: &request.webhook_path,
            payload: request.payload.as_ref(),
            now,
        }
    }
}

/// Body sent to the forward target
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardBody {
    Empty,
    Json(Value),
    Text(String),
}

/// Build the outbound body for a forward
///
/// Without a template the received payload is sent as-is. With one, the
/// rendered text is sent as JSON when it parses, otherwise as plain text.
pub fn build_forward_body(
    config: &ForwardConfig,
    request: &ForwardRequest,
    now: DateTime<Utc>,
) -> ForwardBody {
    let template = match config.body_template.as_deref() {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return match &request.payload {
                Some(payload) => ForwardBody::Json(payload.clone()),
                None => ForwardBody::Empty,
            };
        }
    };

    let rendered = render(template, &TemplateContext::from_request(request, now));
    match serde_json::from_str::<Value>(&rendered) {
        Ok(json) => ForwardBody::Json(json),
        Err(_) => ForwardBody::Text(rendered),
    }
}

/// Render every known token in `template`
pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut scanner = StringScanner::default();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (literal, after_open) = rest.split_at(start);
        scanner.feed(literal);
        out.push_str(literal);

        let body = &after_open[2..];
        let Some(end) = body.find("}}") else {
            // Unterminated token, keep the remainder as literal text
            scanner.feed(after_open);
            out.push_str(after_open);
            return out;
        };

        let inner = &body[..end];
        match render_token(inner, ctx) {
            Some(value) if scanner.in_string => out.push_str(&escape_json_string(&value)),
            Some(value) => out.push_str(&value),
            None => out.push_str(&after_open[..end + 4]),
        }
        scanner.escaped = false;
        rest = &body[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Tracks whether the cursor is inside a JSON string literal
#[derive(Debug, Default)]
struct StringScanner {
    in_string: bool,
    escaped: bool,
}

impl StringScanner {
    fn feed(&mut self, text: &str) {
        for c in text.chars() {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = self.in_string;
            } else if c == '"' {
                self.in_string = !self.in_string;
            }
        }
    }
}

/// Resolved value of a token before formatting
enum Resolved<'a> {
    Text(String),
    /// A value found under `payload.<path>`
    Field(&'a Value),
    /// The whole payload, which may be absent
    Payload(Option<&'a Value>),
    Missing,
}

#[derive(Clone, Copy)]
enum TimeFormat {
    Iso,
    China,
}

fn render_token(inner: &str, ctx: &TemplateContext<'_>) -> Option<String> {
    let (name, format) = match inner.split_once('|') {
        Some((name, format)) => (name.trim(), Some(format.trim())),
        None => (inner.trim(), None),
    };

    let format = match format {
        None => None,
        Some("time") => Some(TimeFormat::Iso),
        Some("time_cn") => Some(TimeFormat::China),
        Some(_) => return None,
    };

    let resolved = resolve(name, ctx)?;
    if let Some(format) = format {
        if let Some(formatted) = as_time(&resolved).and_then(|at| format_time(at, format)) {
            return Some(formatted);
        }
    }
    Some(to_text(resolved))
}

fn resolve<'a>(name: &str, ctx: &TemplateContext<'a>) -> Option<Resolved<'a>> {
    let resolved = match name {
        "method" => Resolved::Text(ctx.method.to_string()),
        "webhookName" => Resolved::Text(ctx.webhook_name.to_string()),
        "webhookPath" => Resolved::Text(ctx.webhook_path.to_string()),
        "time" => Resolved::Text(format_time(ctx.now, TimeFormat::Iso).unwrap_or_default()),
        "time_cn" => Resolved::Text(format_time(ctx.now, TimeFormat::China).unwrap_or_default()),
        "payload" => Resolved::Payload(ctx.payload),
        _ => {
            let path = name.strip_prefix("payload.")?;
            match ctx.payload.and_then(|p| lookup(p, path)) {
                Some(value) => Resolved::Field(value),
                None => Resolved::Missing,
            }
        }
    };
    Some(resolved)
}

/// Walk objects by key and arrays by index
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn to_text(resolved: Resolved<'_>) -> String {
    match resolved {
        Resolved::Text(text) => text,
        Resolved::Field(Value::String(s)) => s.clone(),
        Resolved::Field(value) => value.to_string(),
        Resolved::Payload(Some(value)) => value.to_string(),
        Resolved::Payload(None) => "null".to_string(),
        Resolved::Missing => String::new(),
    }
}

fn as_time(resolved: &Resolved<'_>) -> Option<DateTime<Utc>> {
    match resolved {
        Resolved::Text(text) => parse_time_str(text),
        Resolved::Field(value) | Resolved::Payload(Some(value)) => match value {
            Value::Number(n) => n.as_f64().and_then(from_epoch),
            Value::String(s) => parse_time_str(s),
            _ => None,
        },
        Resolved::Payload(None) | Resolved::Missing => None,
    }
}

fn parse_time_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return from_epoch(n);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}

/// `None` when the shifted time falls outside chrono's range
fn format_time(at: DateTime<Utc>, format: TimeFormat) -> Option<String> {
    match format {
        TimeFormat::Iso => Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        TimeFormat::China => {
            let local = at.checked_add_signed(Duration::hours(8))?.naive_utc();
            Some(local.format("%Y/%-m/%-d %H:%M:%S").to_string())
        }
    }
}

/// JSON-escape without the surrounding quotes
fn escape_json_string(value: &str) -> String {
    let quoted = Value::String(value.to_string()).to_string();
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(&quoted)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 22, 10, 0, 0).unwrap()
    }

    fn ctx(payload: Option<&Value>) -> TemplateContext<'_> {
        TemplateContext {
            method: "POST",
            webhook_name: "GitHub Push",
            webhook_path: "github",
            payload,
            now: fixed_now(),
        }
    }

    fn config(template: Option<&str>) -> ForwardConfig {
        ForwardConfig {
            enabled: true,
            target_url: "https://example.com/in".to_string(),
            method: Default::default(),
            headers: BTreeMap::new(),
            body_template: template.map(str::to_string),
            timeout_ms: None,
            retry_count: None,
        }
    }

    fn request(payload: Option<Value>) -> ForwardRequest {
        ForwardRequest {
            method: "POST".to_string(),
            headers: BTreeMap::new(),
            payload,
            webhook_name: "GitHub Push".to_string(),
            webhook_path: "github".to_string(),
        }
    }

    #[test]
    fn test_simple_variables() {
        let out = render("{{method}} {{ webhookName }} /{{webhookPath}}", &ctx(None));
        assert_eq!(out, "POST GitHub Push /github");
    }

    #[test]
    fn test_time_variables() {
        let out = render("{{time}}|{{time_cn}}", &ctx(None));
        assert_eq!(out, "2026-01-22T10:00:00.000Z|2026/1/22 18:00:00");
    }

    #[test]
    fn test_time_cn_crosses_midnight() {
        let mut c = ctx(None);
        c.now = Utc.with_ymd_and_hms(2026, 3, 5, 17, 4, 9).unwrap();
        assert_eq!(render("{{time_cn}}", &c), "2026/3/6 01:04:09");
    }

    #[test]
    fn test_whole_payload() {
        let payload = json!({"a": 1, "b": [true]});
        assert_eq!(render("{{payload}}", &ctx(Some(&payload))), r#"{"a":1,"b":[true]}"#);
        assert_eq!(render("{{payload}}", &ctx(None)), "null");
    }

    #[test]
    fn test_payload_paths() {
        let payload = json!({
            "repo": {"name": "hookrelay", "stars": 42},
            "commits": [{"id": "abc"}, {"id": "def"}],
            "flag": false,
            "nothing": null
        });
        let c = ctx(Some(&payload));
        assert_eq!(render("{{payload.repo.name}}", &c), "hookrelay");
        assert_eq!(render("{{payload.repo.stars}}", &c), "42");
        assert_eq!(render("{{payload.commits.1.id}}", &c), "def");
        assert_eq!(render("{{payload.flag}}", &c), "false");
        assert_eq!(render("{{payload.nothing}}", &c), "null");
        assert_eq!(render("{{payload.repo}}", &c), r#"{"name":"hookrelay","stars":42}"#);
        assert_eq!(render("[{{payload.missing.deep}}]", &c), "[]");
        assert_eq!(render("[{{payload.commits.9}}]", &c), "[]");
    }

    #[test]
    fn test_payload_path_without_payload_is_empty() {
        assert_eq!(render("<{{payload.x}}>", &ctx(None)), "<>");
    }

    #[test]
    fn test_unknown_tokens_left_verbatim() {
        let out = render("{{unknown}} {{payload|upper}} {{ method }}", &ctx(None));
        assert_eq!(out, "{{unknown}} {{payload|upper}} POST");
    }

    #[test]
    fn test_unterminated_token() {
        assert_eq!(render("hello {{method", &ctx(None)), "hello {{method");
    }

    #[test]
    fn test_escapes_inside_json_strings() {
        let payload = json!({"msg": "say \"hi\"\nnow \\ done"});
        let c = ctx(Some(&payload));
        let out = render(r#"{"text": "{{payload.msg}}"}"#, &c);
        assert_eq!(out, r#"{"text": "say \"hi\"\nnow \\ done"}"#);

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["text"], "say \"hi\"\nnow \\ done");
    }

    #[test]
    fn test_raw_outside_json_strings() {
        let payload = json!({"count": 3, "user": {"id": 7}});
        let c = ctx(Some(&payload));
        let out = render(r#"{"count": {{payload.count}}, "user": {{payload.user}}}"#, &c);
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({"count": 3, "user": {"id": 7}}));
    }

    #[test]
    fn test_whole_payload_inside_string_is_escaped() {
        let payload = json!({"a": "b"});
        let out = render(r#"{"raw": "{{payload}}"}"#, &ctx(Some(&payload)));
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["raw"], r#"{"a":"b"}"#);
    }

    #[test]
    fn test_escaped_quote_does_not_toggle_string_state() {
        let payload = json!({"q": "\""});
        let out = render(r#"{"a": "x\"{{payload.q}}"}"#, &ctx(Some(&payload)));
        assert_eq!(out, r#"{"a": "x\"\""}"#);
        assert!(serde_json::from_str::<Value>(&out).is_ok());
    }

    #[test]
    fn test_time_format_suffix() {
        let payload = json!({
            "secs": 1769076000,
            "millis": 1769076000000i64,
            "text": "1769076000",
            "iso": "2026-01-22T10:00:00+00:00",
            "bad": "yesterday"
        });
        let c = ctx(Some(&payload));
        assert_eq!(render("{{payload.secs|time}}", &c), "2026-01-22T10:00:00.000Z");
        assert_eq!(render("{{payload.millis|time}}", &c), "2026-01-22T10:00:00.000Z");
        assert_eq!(render("{{payload.text | time_cn}}", &c), "2026/1/22 18:00:00");
        assert_eq!(render("{{payload.iso|time_cn}}", &c), "2026/1/22 18:00:00");
        assert_eq!(render("{{payload.bad|time}}", &c), "yesterday");
        assert_eq!(render("{{time|time_cn}}", &c), "2026/1/22 18:00:00");
    }

    #[test]
    fn test_time_cn_near_max_date_keeps_value() {
        let max = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        let payload = json!({"t": max});
        let c = ctx(Some(&payload));
        assert_eq!(render("{{payload.t|time_cn}}", &c), max.to_string());
        assert!(!render("{{payload.t|time}}", &c).is_empty());
    }

    #[test]
    fn test_build_body_without_template() {
        let body = build_forward_body(&config(None), &request(Some(json!({"a": 1}))), fixed_now());
        assert_eq!(body, ForwardBody::Json(json!({"a": 1})));

        let body = build_forward_body(&config(Some("  ")), &request(None), fixed_now());
        assert_eq!(body, ForwardBody::Empty);
    }

    #[test]
    fn test_build_body_json_template() {
        let template = r#"{"msgtype": "text", "text": {"content": "{{webhookName}}: {{payload.msg}}"}}"#;
        let body = build_forward_body(
            &config(Some(template)),
            &request(Some(json!({"msg": "line1\nline2"}))),
            fixed_now(),
        );
        assert_eq!(
            body,
            ForwardBody::Json(json!({
                "msgtype": "text",
                "text": {"content": "GitHub Push: line1\nline2"}
            }))
        );
    }

    #[test]
    fn test_build_body_text_fallback() {
        let body = build_forward_body(
            &config(Some("Received {{method}} on {{webhookPath}}")),
            &request(None),
            fixed_now(),
        );
        assert_eq!(body, ForwardBody::Text("Received POST on github".to_string()));
    }
}
