//! Template helper library.
//!
//! A fixed set of filters and functions registered into every template set.
//! The pure functions are exposed for direct use; [`Helpers::register`]
//! wires them into a `Tera` instance.
//!
//! | Name              | Kind     | Call                                        |
//! |-------------------|----------|---------------------------------------------|
//! | `format_time`     | filter   | `item.publishedAt \| format_time`           |
//! | `trim_sample`     | filter   | `b.body \| trim_sample`                     |
//! | `replace_webp`    | filter   | `b.body \| replace_webp`                    |
//! | `sub`             | function | `sub(a=x, b=y)`                             |
//! | `total_greater`   | function | `total_greater(total=t, limit=l)`           |
//! | `is_not_first`    | function | `is_not_first(offset=o)`                    |
//! | `is_not_last`     | function | `is_not_last(limit=l, offset=o, total=t)`   |
//! | `get_total_pages` | function | `get_total_pages(total=t, per_page=p)`      |
//! | `get_pagination`  | function | `get_pagination(current=c, all=a, range=r)` |
//! | `build_time`      | function | `build_time()`                              |
//!
//! `build_time` is the only helper whose output changes between runs.

use crate::pagination::{page_count, page_window};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use tera::{Tera, Value};

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]*\bsrc\s*=\s*['"]?([^'">]+)['"]?[^>]*>"#).expect("img pattern is valid")
});

const SAMPLE_CHARS: usize = 100;

/// Calendar date (`YYYY-MM-DD`) of `instant` in `tz`.
pub fn format_time(instant: &DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d").to_string()
}

/// Plain-text teaser: tags stripped, first 100 characters, then `…`.
///
/// The ellipsis is appended even when nothing was cut.
pub fn trim_sample(body: &str) -> String {
    let text = HTML_TAG.replace_all(body, "");
    let mut sample: String = text.chars().take(SAMPLE_CHARS).collect();
    sample.push('…');
    sample
}

/// Append `?fm=webp` to `<img>` sources under `prefix` that end in `.jpg`
/// or `.png`. Everything else is left untouched.
pub fn convert_webp(html: &str, prefix: &str) -> String {
    IMG_SRC
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let url = &caps[1];
            if url.starts_with(prefix) && (url.ends_with(".jpg") || url.ends_with(".png")) {
                tag.replace(url, &format!("{url}?fm=webp"))
            } else {
                tag.to_string()
            }
        })
        .into_owned()
}

/// Page count for templates; zero when `per_page` is not positive.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if per_page <= 0 || total <= 0 {
        return 0;
    }
    page_count(total as usize, per_page as usize) as i64
}

/// Current Unix time in seconds, as a string.
pub fn build_time() -> String {
    Utc::now().timestamp().to_string()
}

/// Helper configuration shared by every template set of a build.
#[derive(Debug, Clone)]
pub struct Helpers {
    pub timezone: Tz,
    pub webp_prefix: String,
}

impl Helpers {
    pub fn new(timezone: Tz, webp_prefix: &str) -> Self {
        Self {
            timezone,
            webp_prefix: webp_prefix.to_string(),
        }
    }

    /// Register every filter and function into `tera`.
    pub fn register(&self, tera: &mut Tera) {
        let tz = self.timezone;
        tera.register_filter(
            "format_time",
            move |value: &Value, _: &HashMap<String, Value>| {
                if value.is_null() {
                    return Ok(Value::String(String::new()));
                }
                let raw = value
                    .as_str()
                    .ok_or_else(|| tera::Error::msg("format_time expects an RFC 3339 string"))?;
                let instant = DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| tera::Error::msg(format!("format_time: '{raw}': {e}")))?;
                Ok(Value::String(format_time(&instant.with_timezone(&Utc), tz)))
            },
        );

        tera.register_filter(
            "trim_sample",
            |value: &Value, _: &HashMap<String, Value>| {
                Ok(Value::String(trim_sample(value.as_str().unwrap_or_default())))
            },
        );

        let prefix = self.webp_prefix.clone();
        tera.register_filter(
            "replace_webp",
            move |value: &Value, _: &HashMap<String, Value>| {
                Ok(Value::String(convert_webp(
                    value.as_str().unwrap_or_default(),
                    &prefix,
                )))
            },
        );

        tera.register_function("sub", |args: &HashMap<String, Value>| {
            let a = int_arg(args, "sub", "a")?;
            let b = int_arg(args, "sub", "b")?;
            a.checked_sub(b)
                .map(Value::from)
                .ok_or_else(|| tera::Error::msg(format!("sub: {a} - {b} overflows")))
        });

        tera.register_function("total_greater", |args: &HashMap<String, Value>| {
            let total = int_arg(args, "total_greater", "total")?;
            let limit = int_arg(args, "total_greater", "limit")?;
            Ok(Value::Bool(total > limit))
        });

        tera.register_function("is_not_first", |args: &HashMap<String, Value>| {
            Ok(Value::Bool(int_arg(args, "is_not_first", "offset")? != 0))
        });

        tera.register_function("is_not_last", |args: &HashMap<String, Value>| {
            let limit = int_arg(args, "is_not_last", "limit")?;
            let offset = int_arg(args, "is_not_last", "offset")?;
            let total = int_arg(args, "is_not_last", "total")?;
            Ok(Value::Bool(limit.saturating_add(offset) < total))
        });

        tera.register_function("get_total_pages", |args: &HashMap<String, Value>| {
            let total = int_arg(args, "get_total_pages", "total")?;
            let per_page = int_arg(args, "get_total_pages", "per_page")?;
            Ok(Value::from(total_pages(total, per_page)))
        });

        tera.register_function("get_pagination", |args: &HashMap<String, Value>| {
            let current = int_arg(args, "get_pagination", "current")?;
            let all = int_arg(args, "get_pagination", "all")?;
            let range = int_arg(args, "get_pagination", "range")?;
            Ok(Value::Array(
                page_window(current, all, range)
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ))
        });

        tera.register_function("build_time", |_: &HashMap<String, Value>| {
            Ok(Value::String(build_time()))
        });
    }
}

fn int_arg(args: &HashMap<String, Value>, helper: &str, name: &str) -> tera::Result<i64> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| tera::Error::msg(format!("{helper}: missing integer argument `{name}`")))
}
