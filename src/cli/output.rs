use colored::Colorize;
use serde_json::Value;

use crate::error::ApiError;
use crate::feed::FeedItem;
use crate::normalize::{parse_error, NormalizedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Raw,
    Json,
}

impl OutputMode {
    pub fn from_flags(json: bool, raw: bool) -> Self {
        if json {
            OutputMode::Json
        } else if raw {
            OutputMode::Raw
        } else {
            OutputMode::Pretty
        }
    }
}

/// Render a success payload. Failures are reported through [`print_error`].
pub fn render_data(data: &Value, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let envelope = serde_json::json!({ "success": true, "data": data });
            serde_json::to_string_pretty(&envelope).unwrap_or_default()
        }
        OutputMode::Raw => match data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        OutputMode::Pretty => serde_json::to_string_pretty(data).unwrap_or_default(),
    }
}

pub fn print_result(result: NormalizedResult, mode: OutputMode) -> Result<(), ApiError> {
    let data = result.into_data()?;
    println!("{}", render_data(&data, mode));
    Ok(())
}

/// One line per feed item: title, top offer, and buyer.
pub fn render_feed_line(item: &FeedItem, usd_per_eth: Option<f64>) -> String {
    let title = if item.post.title.is_empty() {
        "(untitled)"
    } else {
        item.post.title.as_str()
    };
    let kind = if item.is_video() { " [video]" } else { "" };

    let Some(offer) = item.top_offer() else {
        return format!("{title}{kind} | no offers");
    };

    let mut line = format!("{title}{kind} | {} ETH", offer.price);
    if let Some(rate) = usd_per_eth {
        line.push_str(&format!(" (${})", offer.dollar_price(rate)));
    }
    if let Some(buyer) = &offer.buyer {
        let name = buyer.full_name.as_deref().unwrap_or(&buyer.username);
        line.push_str(&format!(" by @{name}"));
    }
    if let Some(at) = offer.created_at {
        line.push_str(&format!(" at {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    line
}

pub fn print_feed(items: &[FeedItem], usd_per_eth: Option<f64>, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => {
            let json = serde_json::json!({ "success": true, "data": items });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputMode::Raw | OutputMode::Pretty => {
            if items.is_empty() && mode == OutputMode::Pretty {
                let msg = "No feed items.";
                if is_tty {
                    println!("{}", msg.dimmed());
                } else {
                    println!("{msg}");
                }
            }
            for item in items {
                println!("{}", render_feed_line(item, usd_per_eth));
            }
        }
    }
}

/// Human-readable message for an error: the backend's own message when it
/// sent one, else the error's display text.
pub fn error_message(err: &ApiError) -> String {
    parse_error(err, Some(&err.to_string()))
}

pub fn print_error(err: &ApiError, json_mode: bool, is_tty: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else {
        let label = if is_tty {
            "Error".red().bold().to_string()
        } else {
            "Error".to_string()
        };
        eprintln!("{label}: {}", error_message(err));
    }
}
